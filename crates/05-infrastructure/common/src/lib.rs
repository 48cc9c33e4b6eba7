//! # Infrastructure Common
//!
//! 依赖注入基础设施的公共类型。
//!
//! ## 核心类型
//!
//! - [`Argument`] - 注入点参数描述
//! - [`BeanDefinition`] - 注册表中的 Bean 定义
//! - [`AnnotationMetadata`] - 注解元数据视图
//! - [`TypeInfo`] - 类型信息
//! - [`DependencyError`] / [`QualifierError`] - 解析错误与装配错误

pub mod argument;
pub mod definition;
pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use argument::*;
pub use definition::*;
pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
