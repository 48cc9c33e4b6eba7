//! 运行时限定符
//!
//! 带有 `RuntimeQualified` 注解的注入点，其限定符由注解指定的工厂根据调用方元数据生成。
//! 立即模式在构造时生成委托限定符，延迟模式推迟到第一次使用。

use crate::factory_registry::QualifierFactoryRegistry;
use di_abstractions::{qualifier_eq, qualifier_hash, Qualifier, QualifierFactoryRef, QualifierRef};
use infrastructure_common::{
    AnnotationMetadata, AnnotationValue, Argument, BeanDefinition, ClassValue, DependencyResult,
    QualifierError, QualifierResult, TypeInfo, VALUE_MEMBER,
};
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{debug, error};

/// 运行时限定注解名称
pub const RUNTIME_QUALIFIED: &str = "RuntimeQualified";

/// 是否延迟解析的注解成员
pub const MEMBER_LAZY: &str = "lazy";

/// 使用全局工厂注册表为参数创建运行时限定符
pub fn create(argument: &Argument) -> QualifierResult<QualifierRef> {
    create_with(argument, &QualifierFactoryRegistry::global())
}

/// 使用指定工厂注册表为参数创建运行时限定符
///
/// 非提供者参数总是立即解析；提供者参数按注解的 `lazy` 成员选择立即或延迟解析。
pub fn create_with(
    argument: &Argument,
    registry: &QualifierFactoryRegistry,
) -> QualifierResult<QualifierRef> {
    let metadata = argument.annotation_metadata();
    if !argument.is_provider() {
        return Ok(Arc::new(RuntimeQualifiedQualifier::from_metadata(
            metadata, registry,
        )?));
    }

    let annotation = annotation_value(metadata)?;
    let lazy = annotation.bool_value(MEMBER_LAZY).unwrap_or(false);
    if !lazy {
        return Ok(Arc::new(RuntimeQualifiedQualifier::from_metadata(
            metadata, registry,
        )?));
    }

    Ok(Arc::new(LazyRuntimeQualifiedQualifier::from_metadata(
        metadata, registry,
    )?))
}

fn annotation_value(metadata: &AnnotationMetadata) -> QualifierResult<&AnnotationValue> {
    metadata
        .annotation(RUNTIME_QUALIFIED)
        .ok_or_else(|| QualifierError::MissingAnnotation {
            annotation: RUNTIME_QUALIFIED.to_string(),
        })
}

fn class_value(annotation: &AnnotationValue) -> QualifierResult<&ClassValue> {
    annotation
        .class_value(VALUE_MEMBER)
        .ok_or_else(|| QualifierError::MissingMember {
            annotation: RUNTIME_QUALIFIED.to_string(),
            member: VALUE_MEMBER.to_string(),
        })
}

fn resolve_factory(
    metadata: &AnnotationMetadata,
    registry: &QualifierFactoryRegistry,
) -> QualifierResult<(String, QualifierFactoryRef)> {
    let class_value = class_value(annotation_value(metadata)?)?;
    let factory = registry.resolve_factory(class_value)?;
    Ok((class_value.name().to_string(), factory))
}

/// 构造时生成委托的运行时限定符
#[derive(Debug, Clone, Hash)]
pub struct RuntimeQualifiedQualifier {
    delegate: QualifierRef,
}

impl RuntimeQualifiedQualifier {
    /// 直接包装一个限定符
    pub fn new(delegate: QualifierRef) -> Self {
        Self { delegate }
    }

    /// 按元数据中的 `RuntimeQualified` 注解解析工厂并生成委托
    pub fn from_metadata(
        metadata: &AnnotationMetadata,
        registry: &QualifierFactoryRegistry,
    ) -> QualifierResult<Self> {
        let (reference, factory) = resolve_factory(metadata, registry)?;
        let delegate = factory
            .create_qualifier(metadata)?
            .ok_or(QualifierError::NoQualifierProduced { reference })?;
        debug!("运行时限定符已生成: {}", delegate);
        Ok(Self { delegate })
    }

    /// 委托限定符
    pub fn delegate(&self) -> &QualifierRef {
        &self.delegate
    }
}

impl PartialEq for RuntimeQualifiedQualifier {
    fn eq(&self, other: &Self) -> bool {
        *self.delegate == *other.delegate
    }
}

impl Eq for RuntimeQualifiedQualifier {}

impl Qualifier for RuntimeQualifiedQualifier {
    fn reduce(
        &self,
        bean_type: &TypeInfo,
        candidates: Vec<Arc<BeanDefinition>>,
    ) -> DependencyResult<Vec<Arc<BeanDefinition>>> {
        self.delegate.reduce(bean_type, candidates)
    }

    fn contains(&self, other: &dyn Qualifier) -> bool {
        self.eq_qualifier(other) || self.delegate.contains(other)
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

impl fmt::Display for RuntimeQualifiedQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}({})", RUNTIME_QUALIFIED, self.delegate)
    }
}

/// 第一次使用时才生成委托的运行时限定符
///
/// 工厂返回空时不缓存，下次使用会再次调用工厂，直到得到限定符为止。并发的首次使用
/// 可能多次调用工厂，最终只保留先写入的结果。相等性与哈希基于捕获的元数据，与解析
/// 发生的时间无关。
pub struct LazyRuntimeQualifiedQualifier {
    metadata: AnnotationMetadata,
    reference: String,
    factory: QualifierFactoryRef,
    delegate: RwLock<Option<QualifierRef>>,
    memoize: bool,
}

impl LazyRuntimeQualifiedQualifier {
    /// 解析工厂引用，但不调用工厂
    pub fn from_metadata(
        metadata: &AnnotationMetadata,
        registry: &QualifierFactoryRegistry,
    ) -> QualifierResult<Self> {
        let (reference, factory) = resolve_factory(metadata, registry)?;
        Ok(Self {
            metadata: metadata.clone(),
            reference,
            factory,
            delegate: RwLock::new(None),
            memoize: true,
        })
    }

    /// 设置是否缓存首个非空结果
    pub fn with_memoization(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    /// 委托是否已缓存
    pub fn is_resolved(&self) -> bool {
        self.delegate.read().is_some()
    }

    fn resolve(&self) -> QualifierResult<Option<QualifierRef>> {
        if let Some(delegate) = self.delegate.read().as_ref() {
            return Ok(Some(delegate.clone()));
        }

        let produced = self.factory.create_qualifier(&self.metadata)?;
        match produced {
            Some(qualifier) if self.memoize => {
                let mut slot = self.delegate.write();
                let delegate = slot.get_or_insert(qualifier).clone();
                debug!("延迟运行时限定符已解析: {} -> {}", self.reference, delegate);
                Ok(Some(delegate))
            }
            produced => Ok(produced),
        }
    }
}

impl Qualifier for LazyRuntimeQualifiedQualifier {
    fn reduce(
        &self,
        bean_type: &TypeInfo,
        candidates: Vec<Arc<BeanDefinition>>,
    ) -> DependencyResult<Vec<Arc<BeanDefinition>>> {
        match self.resolve()? {
            Some(delegate) => delegate.reduce(bean_type, candidates),
            None => {
                debug!(
                    "延迟运行时限定符尚未解析，{} 的候选全部排除: {}",
                    bean_type.short_name(),
                    self.reference
                );
                Ok(Vec::new())
            }
        }
    }

    fn contains(&self, other: &dyn Qualifier) -> bool {
        if self.eq_qualifier(other) {
            return true;
        }
        match self.resolve() {
            Ok(Some(delegate)) => delegate.contains(other),
            Ok(None) => false,
            Err(e) => {
                error!("延迟运行时限定符解析失败: {}", e);
                false
            }
        }
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

impl PartialEq for LazyRuntimeQualifiedQualifier {
    fn eq(&self, other: &Self) -> bool {
        self.metadata == other.metadata
    }
}

impl Eq for LazyRuntimeQualifiedQualifier {}

impl Hash for LazyRuntimeQualifiedQualifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.metadata.hash(state);
    }
}

impl fmt::Debug for LazyRuntimeQualifiedQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRuntimeQualifiedQualifier")
            .field("reference", &self.reference)
            .field("delegate", &*self.delegate.read())
            .field("memoize", &self.memoize)
            .finish()
    }
}

impl fmt::Display for LazyRuntimeQualifiedQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.delegate.read().as_ref() {
            Some(delegate) => write!(f, "@{}(lazy, {})", RUNTIME_QUALIFIED, delegate),
            None => write!(f, "@{}(lazy, unresolved)", RUNTIME_QUALIFIED),
        }
    }
}
