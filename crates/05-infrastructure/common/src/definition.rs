//! Bean 定义
//!
//! 注册表为每个受管组件保存的元数据记录，限定符在这些记录上做过滤。

use crate::lifecycle::Lifetime;
use crate::metadata::{AnnotationMetadata, AnnotationValue, TypeInfo};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 受管实例
pub type BeanInstance = Arc<dyn Any + Send + Sync>;

/// Bean 定义
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeanDefinition {
    /// Bean 名称
    pub name: String,
    /// Bean 类型
    pub type_info: TypeInfo,
    /// 生命周期
    pub lifetime: Lifetime,
    /// 优先级
    pub priority: i32,
    /// 是否启用
    pub enabled: bool,
    /// 多个候选时是否作为首选
    pub primary: bool,
    /// 声明的注解
    pub annotation_metadata: AnnotationMetadata,
}

impl BeanDefinition {
    /// 创建类型为 `T` 的 Bean 定义，名称默认为类型短名
    pub fn of<T: ?Sized + 'static>() -> Self {
        let type_info = TypeInfo::of::<T>();
        Self {
            name: type_info.short_name().to_string(),
            type_info,
            lifetime: Lifetime::default(),
            priority: 0,
            enabled: true,
            primary: false,
            annotation_metadata: AnnotationMetadata::empty(),
        }
    }

    /// 设置名称
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 设置生命周期
    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 设置启用状态
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// 标记为首选
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// 添加注解
    pub fn with_annotation(mut self, annotation: AnnotationValue) -> Self {
        self.annotation_metadata = self.annotation_metadata.with_annotation(annotation);
        self
    }

    /// 是否为单例
    pub fn is_singleton(&self) -> bool {
        self.lifetime.is_singleton()
    }
}

impl fmt::Display for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.type_info.short_name())
    }
}
