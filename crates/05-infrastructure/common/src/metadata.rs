//! 元数据定义
//!
//! 提供类型信息以及注解元数据的只读视图。注解元数据由外部的元数据子系统构造，
//! 这里只负责按名称查找注解及其成员。

use serde_json::Value;
use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// 注解的默认成员名称
pub const VALUE_MEMBER: &str = "value";

/// 类型信息
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    /// 类型名称
    pub name: String,
    /// 类型ID
    pub id: TypeId,
    /// 模块路径
    pub module_path: String,
}

impl TypeInfo {
    /// 从类型获取类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        let full_name = std::any::type_name::<T>();
        Self {
            name: short_type_name(full_name).to_string(),
            id: TypeId::of::<T>(),
            module_path: full_name.to_string(),
        }
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &str {
        &self.name
    }

    /// 是否为指定类型
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.module_path)
    }
}

// 泛型参数中的 `::` 不参与截断
fn short_type_name(full_name: &str) -> &str {
    let head = full_name.split('<').next().unwrap_or(full_name);
    match head.rfind("::") {
        Some(index) => &full_name[index + 2..],
        None => full_name,
    }
}

/// 类引用
///
/// 对应注解中以类为值的成员。`name` 是稳定的引用标识，`instance` 是元数据子系统
/// 可能已经提供的实例。
#[derive(Clone)]
pub struct ClassValue {
    name: String,
    instance: Option<Arc<dyn Any + Send + Sync>>,
}

impl ClassValue {
    /// 创建只有名称的类引用
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance: None,
        }
    }

    /// 创建带实例的类引用
    ///
    /// 作为限定符工厂使用时，实例必须是 `Arc<dyn QualifierFactory>` 本身，
    /// 即外层 `Arc` 包裹的是工厂引用而不是具体的工厂类型。
    pub fn with_instance(name: impl Into<String>, instance: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            name: name.into(),
            instance: Some(instance),
        }
    }

    /// 引用名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 已有的实例
    pub fn instance(&self) -> Option<&Arc<dyn Any + Send + Sync>> {
        self.instance.as_ref()
    }
}

impl fmt::Debug for ClassValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassValue")
            .field("name", &self.name)
            .field("instance", &self.instance.as_ref().map(|_| "<instance>"))
            .finish()
    }
}

impl PartialEq for ClassValue {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ClassValue {}

impl Hash for ClassValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// 注解值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationValue {
    annotation: String,
    members: BTreeMap<String, Value>,
    class_members: BTreeMap<String, ClassValue>,
}

impl AnnotationValue {
    /// 创建没有成员的注解值
    pub fn new(annotation: impl Into<String>) -> Self {
        Self {
            annotation: annotation.into(),
            members: BTreeMap::new(),
            class_members: BTreeMap::new(),
        }
    }

    /// 添加普通成员
    pub fn with_member(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members.insert(name.into(), value.into());
        self
    }

    /// 添加以类为值的成员
    pub fn with_class_member(mut self, name: impl Into<String>, value: ClassValue) -> Self {
        self.class_members.insert(name.into(), value);
        self
    }

    /// 注解名称
    pub fn annotation_name(&self) -> &str {
        &self.annotation
    }

    /// 获取成员原始值
    pub fn member(&self, name: &str) -> Option<&Value> {
        self.members.get(name)
    }

    /// 获取布尔成员
    pub fn bool_value(&self, name: &str) -> Option<bool> {
        self.members.get(name).and_then(Value::as_bool)
    }

    /// 获取字符串成员
    pub fn string_value(&self, name: &str) -> Option<&str> {
        self.members.get(name).and_then(Value::as_str)
    }

    /// 获取默认成员的字符串值
    pub fn value(&self) -> Option<&str> {
        self.string_value(VALUE_MEMBER)
    }

    /// 获取以类为值的成员
    pub fn class_value(&self, name: &str) -> Option<&ClassValue> {
        self.class_members.get(name)
    }
}

impl Hash for AnnotationValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.annotation.hash(state);
        for (name, value) in &self.members {
            name.hash(state);
            // serde_json::Value 未实现 Hash，按规范化文本计算
            value.to_string().hash(state);
        }
        for (name, value) in &self.class_members {
            name.hash(state);
            value.hash(state);
        }
    }
}

impl fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.annotation)?;
        if self.members.is_empty() && self.class_members.is_empty() {
            return Ok(());
        }
        let members = self
            .members
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .chain(
                self.class_members
                    .iter()
                    .map(|(name, value)| format!("{}={}", name, value.name())),
            )
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "({})", members)
    }
}

/// 注解元数据
///
/// 按声明顺序保存注解，同名注解后声明者覆盖先声明者。
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AnnotationMetadata {
    annotations: Vec<AnnotationValue>,
}

impl AnnotationMetadata {
    /// 空元数据
    pub fn empty() -> Self {
        Self::default()
    }

    /// 添加注解
    pub fn with_annotation(mut self, annotation: AnnotationValue) -> Self {
        self.annotations
            .retain(|existing| existing.annotation_name() != annotation.annotation_name());
        self.annotations.push(annotation);
        self
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// 是否存在指定注解
    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotation(name).is_some()
    }

    /// 获取指定注解
    pub fn annotation(&self, name: &str) -> Option<&AnnotationValue> {
        self.annotations
            .iter()
            .find(|annotation| annotation.annotation_name() == name)
    }

    /// 获取指定注解成员的字符串值
    pub fn string_value(&self, annotation: &str, member: &str) -> Option<&str> {
        self.annotation(annotation)
            .and_then(|value| value.string_value(member))
    }

    /// 遍历所有注解
    pub fn annotations(&self) -> impl Iterator<Item = &AnnotationValue> {
        self.annotations.iter()
    }
}
