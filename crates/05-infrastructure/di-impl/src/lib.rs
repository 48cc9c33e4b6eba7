//! # 依赖注入具体实现
//!
//! 提供运行时限定符、延迟提供者以及内存中的 Bean 上下文。
//!
//! ## 主要组件
//!
//! - [`QualifierFactoryRegistry`] - 限定符工厂的登记与解析
//! - [`RuntimeQualifiedQualifier`] / [`LazyRuntimeQualifiedQualifier`] - 运行时限定符
//! - [`BeanProviderDefinition`] / [`DefaultBeanProvider`] - 延迟提供者
//! - [`DefaultBeanContext`] / [`BeanContextBuilder`] - Bean 上下文
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let context = BeanContextBuilder::new()
//!     .register_singleton(BeanDefinition::of::<Engine>().named("v8"), Arc::new(Engine))
//!     .build()?;
//! let provider = context.get_provider::<Engine>(&BeanProviderDefinition::injection_point::<Engine>())?;
//! let engine = provider.get()?;
//! ```

pub mod builder;
pub mod configuration;
pub mod context;
pub mod factory_registry;
pub mod injection;
pub mod provider;
pub mod runtime_qualifier;

pub use builder::BeanContextBuilder;
pub use configuration::{load_container_config, load_container_config_from, CONFIG_ENV_PREFIX};
pub use context::{BeanFactoryFn, DefaultBeanContext};
pub use factory_registry::QualifierFactoryRegistry;
pub use injection::{injection_point_qualifier, ANY, NAMED};
pub use provider::{BeanProviderDefinition, DefaultBeanProvider};
pub use runtime_qualifier::{
    LazyRuntimeQualifiedQualifier, RuntimeQualifiedQualifier, MEMBER_LAZY, RUNTIME_QUALIFIED,
};
