//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义限定符、延迟提供者与注册表查找的核心接口。
//!
//! ## 核心接口
//!
//! - [`Qualifier`] - 候选 Bean 过滤器
//! - [`QualifierFactory`] - 根据元数据生成限定符的工厂
//! - [`BeanLocator`] - 注册表查找接口
//! - [`BeanProvider`] - 延迟提供者接口
//! - [`ProviderDefinition`] - 提供者定义接口

pub mod container;
pub mod factory;
pub mod provider;
pub mod qualifier;
pub mod registry;
pub mod resolver;

pub use container::*;
pub use factory::*;
pub use provider::*;
pub use qualifier::*;
pub use registry::*;
pub use resolver::*;
