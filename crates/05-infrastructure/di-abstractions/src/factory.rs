//! 限定符工厂抽象接口
//!
//! 运行时限定符由工厂根据调用方的注解元数据生成。工厂可以以三种形式声明：
//! 现成的实例、可无参构造的类型，以及接受元数据的可调用对象。

use crate::qualifier::QualifierRef;
use infrastructure_common::{AnnotationMetadata, ClassValue, QualifierResult};
use std::any::Any;
use std::sync::Arc;

/// 限定符工厂 trait
pub trait QualifierFactory: Send + Sync {
    /// 根据元数据创建限定符
    ///
    /// 返回 `Ok(None)` 表示当前还无法给出限定符，延迟限定符会在下次使用时重试。
    fn create_qualifier(&self, metadata: &AnnotationMetadata) -> QualifierResult<Option<QualifierRef>>;
}

impl<F> QualifierFactory for F
where
    F: Fn(&AnnotationMetadata) -> Option<QualifierRef> + Send + Sync,
{
    fn create_qualifier(&self, metadata: &AnnotationMetadata) -> QualifierResult<Option<QualifierRef>> {
        Ok(self(metadata))
    }
}

/// 以元数据调用的可调用对象
///
/// 返回值是不透明的，由适配器校验它是否为限定符。
pub trait MetadataCallable: Send + Sync {
    /// 以元数据调用
    fn call(&self, metadata: &AnnotationMetadata) -> Option<Box<dyn Any + Send + Sync>>;
}

/// 共享的工厂引用
pub type QualifierFactoryRef = Arc<dyn QualifierFactory>;

/// 创建携带工厂实例的类引用
///
/// 工厂注册表只识别以 [`QualifierFactoryRef`] 形式保存的实例。
pub fn factory_class_value(name: impl Into<String>, factory: QualifierFactoryRef) -> ClassValue {
    ClassValue::with_instance(name, Arc::new(factory))
}

/// 无参构造函数，构造失败时返回 `None`
pub type QualifierFactoryConstructor = fn() -> Option<QualifierFactoryRef>;

/// 可调用对象的双参数构造函数，两个参数是不透明的捕获值
pub type CallableConstructor = Arc<
    dyn Fn(
            Option<Box<dyn Any + Send + Sync>>,
            Option<Box<dyn Any + Send + Sync>>,
        ) -> Option<Arc<dyn MetadataCallable>>
        + Send
        + Sync,
>;

/// 工厂声明形式
#[derive(Clone)]
pub enum QualifierFactoryDeclaration {
    /// 现成的实例
    Instance(QualifierFactoryRef),
    /// 通过无参构造函数实例化的类型
    Type(QualifierFactoryConstructor),
    /// 需要适配的可调用对象
    Callable(CallableConstructor),
}

impl std::fmt::Debug for QualifierFactoryDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Instance(_) => f.write_str("Instance(<factory>)"),
            Self::Type(_) => f.write_str("Type(<constructor>)"),
            Self::Callable(_) => f.write_str("Callable(<constructor>)"),
        }
    }
}
