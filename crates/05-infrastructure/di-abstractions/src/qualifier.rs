//! 限定符抽象
//!
//! 限定符是候选 Bean 定义上的过滤器，提供求交（`reduce`）与包含（`contains`）两种操作，
//! 并要求结构相等与稳定哈希，使相同的限定符表达式彼此相等。

use infrastructure_common::{BeanDefinition, DependencyResult, TypeInfo, VALUE_MEMBER};
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// 共享的限定符引用
pub type QualifierRef = Arc<dyn Qualifier>;

/// 限定符 trait
pub trait Qualifier: fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// 从候选中过滤出满足限定的定义
    ///
    /// 只能删除候选，不能引入新的候选，且保持幸存候选的相对顺序。
    fn reduce(
        &self,
        bean_type: &TypeInfo,
        candidates: Vec<Arc<BeanDefinition>>,
    ) -> DependencyResult<Vec<Arc<BeanDefinition>>>;

    /// 是否包含另一个限定符，默认按结构相等判断
    fn contains(&self, other: &dyn Qualifier) -> bool {
        self.eq_qualifier(other)
    }

    /// 转换为 `Any` 以便向下转型
    fn as_any(&self) -> &dyn Any;

    /// 结构相等
    fn eq_qualifier(&self, other: &dyn Qualifier) -> bool;

    /// 稳定哈希
    fn hash_qualifier(&self, state: &mut dyn Hasher);
}

/// 基于 `PartialEq` 的 [`Qualifier::eq_qualifier`] 实现
pub fn qualifier_eq<Q>(this: &Q, other: &dyn Qualifier) -> bool
where
    Q: Qualifier + PartialEq,
{
    other
        .as_any()
        .downcast_ref::<Q>()
        .map_or(false, |other| this == other)
}

/// 基于 `Hash` 的 [`Qualifier::hash_qualifier`] 实现
pub fn qualifier_hash<Q>(this: &Q, mut state: &mut dyn Hasher)
where
    Q: Qualifier + Hash,
{
    TypeId::of::<Q>().hash(&mut state);
    this.hash(&mut state);
}

impl dyn Qualifier {
    /// 是否为指定的限定符类型
    pub fn is<Q: Qualifier>(&self) -> bool {
        self.as_any().is::<Q>()
    }

    /// 向下转型
    pub fn downcast_ref<Q: Qualifier>(&self) -> Option<&Q> {
        self.as_any().downcast_ref::<Q>()
    }
}

impl PartialEq for dyn Qualifier {
    fn eq(&self, other: &Self) -> bool {
        self.eq_qualifier(other)
    }
}

impl Eq for dyn Qualifier {}

impl Hash for dyn Qualifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash_qualifier(state);
    }
}

/// 任意限定符
///
/// 表示“无约束”。作为注入点限定符时必须先归一化为无限定符，否则它会包含任何限定符。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AnyQualifier;

impl Qualifier for AnyQualifier {
    fn reduce(
        &self,
        _bean_type: &TypeInfo,
        candidates: Vec<Arc<BeanDefinition>>,
    ) -> DependencyResult<Vec<Arc<BeanDefinition>>> {
        Ok(candidates)
    }

    fn contains(&self, _other: &dyn Qualifier) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_qualifier(&self, other: &dyn Qualifier) -> bool {
        qualifier_eq(self, other)
    }

    fn hash_qualifier(&self, state: &mut dyn Hasher) {
        qualifier_hash(self, state);
    }
}

impl fmt::Display for AnyQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("@Any")
    }
}

/// 按 Bean 名称限定
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedQualifier {
    name: String,
}

impl NamedQualifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Qualifier for NamedQualifier {
    fn reduce(
        &self,
        _bean_type: &TypeInfo,
        candidates: Vec<Arc<BeanDefinition>>,
    ) -> DependencyResult<Vec<Arc<BeanDefinition>>> {
        Ok(candidates
            .into_iter()
            .filter(|definition| definition.name == self.name)
            .collect())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_qualifier(&self, other: &dyn Qualifier) -> bool {
        qualifier_eq(self, other)
    }

    fn hash_qualifier(&self, state: &mut dyn Hasher) {
        qualifier_hash(self, state);
    }
}

impl fmt::Display for NamedQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@Named({})", self.name)
    }
}

/// 按声明的注解限定
///
/// `value` 为 `Some` 时还要求注解的默认成员等于该值。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnotationQualifier {
    annotation: String,
    value: Option<String>,
}

impl AnnotationQualifier {
    pub fn new(annotation: impl Into<String>) -> Self {
        Self {
            annotation: annotation.into(),
            value: None,
        }
    }

    pub fn with_value(annotation: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            annotation: annotation.into(),
            value: Some(value.into()),
        }
    }

    fn matches(&self, definition: &BeanDefinition) -> bool {
        match definition.annotation_metadata.annotation(&self.annotation) {
            Some(annotation) => match &self.value {
                Some(expected) => annotation.string_value(VALUE_MEMBER) == Some(expected.as_str()),
                None => true,
            },
            None => false,
        }
    }
}

impl Qualifier for AnnotationQualifier {
    fn reduce(
        &self,
        _bean_type: &TypeInfo,
        candidates: Vec<Arc<BeanDefinition>>,
    ) -> DependencyResult<Vec<Arc<BeanDefinition>>> {
        Ok(candidates
            .into_iter()
            .filter(|definition| self.matches(definition))
            .collect())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_qualifier(&self, other: &dyn Qualifier) -> bool {
        qualifier_eq(self, other)
    }

    fn hash_qualifier(&self, state: &mut dyn Hasher) {
        qualifier_hash(self, state);
    }
}

impl fmt::Display for AnnotationQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "@{}({})", self.annotation, value),
            None => write!(f, "@{}", self.annotation),
        }
    }
}

/// 组合限定符
///
/// 候选必须依次满足全部限定符。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeQualifier {
    qualifiers: Vec<QualifierRef>,
}

impl CompositeQualifier {
    pub fn new(qualifiers: Vec<QualifierRef>) -> Self {
        Self { qualifiers }
    }

    pub fn qualifiers(&self) -> &[QualifierRef] {
        &self.qualifiers
    }
}

impl Qualifier for CompositeQualifier {
    fn reduce(
        &self,
        bean_type: &TypeInfo,
        candidates: Vec<Arc<BeanDefinition>>,
    ) -> DependencyResult<Vec<Arc<BeanDefinition>>> {
        self.qualifiers
            .iter()
            .try_fold(candidates, |remaining, qualifier| {
                qualifier.reduce(bean_type, remaining)
            })
    }

    fn contains(&self, other: &dyn Qualifier) -> bool {
        if let Some(composite) = other.downcast_ref::<CompositeQualifier>() {
            return composite
                .qualifiers
                .iter()
                .all(|part| self.contains(part.as_ref()));
        }
        self.qualifiers
            .iter()
            .any(|qualifier| qualifier.contains(other))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_qualifier(&self, other: &dyn Qualifier) -> bool {
        qualifier_eq(self, other)
    }

    fn hash_qualifier(&self, state: &mut dyn Hasher) {
        qualifier_hash(self, state);
    }
}

impl fmt::Display for CompositeQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self
            .qualifiers
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" and ");
        f.write_str(&parts)
    }
}

/// 限定符工厂方法
pub struct Qualifiers;

impl Qualifiers {
    /// 无约束限定符
    pub fn any() -> QualifierRef {
        Arc::new(AnyQualifier)
    }

    /// 按名称限定
    pub fn by_name(name: impl Into<String>) -> QualifierRef {
        Arc::new(NamedQualifier::new(name))
    }

    /// 按注解限定
    pub fn by_annotation(annotation: impl Into<String>) -> QualifierRef {
        Arc::new(AnnotationQualifier::new(annotation))
    }

    /// 按注解及其默认成员值限定
    pub fn by_annotation_value(
        annotation: impl Into<String>,
        value: impl Into<String>,
    ) -> QualifierRef {
        Arc::new(AnnotationQualifier::with_value(annotation, value))
    }

    /// 组合两个限定符，先 `first` 后 `second`
    pub fn by_qualifiers(first: QualifierRef, second: QualifierRef) -> QualifierRef {
        Arc::new(CompositeQualifier::new(vec![first, second]))
    }

    /// 求交：两者都存在时组合，否则取存在的一方
    pub fn intersect(
        injection_point: Option<QualifierRef>,
        requested: Option<QualifierRef>,
    ) -> Option<QualifierRef> {
        match (injection_point, requested) {
            (None, None) => None,
            (None, Some(requested)) => Some(requested),
            (Some(injection_point), None) => Some(injection_point),
            (Some(injection_point), Some(requested)) => {
                Some(Self::by_qualifiers(injection_point, requested))
            }
        }
    }

    /// 是否为任意限定符
    pub fn is_any(qualifier: &dyn Qualifier) -> bool {
        qualifier.is::<AnyQualifier>()
    }

    /// 把任意限定符归一化为无限定符
    pub fn normalize_any(qualifier: Option<QualifierRef>) -> Option<QualifierRef> {
        qualifier.filter(|qualifier| !Self::is_any(qualifier.as_ref()))
    }
}
