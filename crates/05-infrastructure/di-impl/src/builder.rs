//! 上下文构建器

use crate::context::{BeanFactoryFn, DefaultBeanContext};
use crate::factory_registry::QualifierFactoryRegistry;
use di_abstractions::{ContainerConfig, ResolutionContext};
use infrastructure_common::{BeanDefinition, BeanInstance, DependencyResult};
use std::any::Any;
use std::sync::Arc;
use tracing::info;

enum PendingRegistration {
    Singleton {
        definition: BeanDefinition,
        register: Box<dyn FnOnce(&DefaultBeanContext, BeanDefinition) -> DependencyResult<()>>,
    },
    Factory {
        definition: BeanDefinition,
        factory: BeanFactoryFn,
    },
}

/// 上下文构建器
pub struct BeanContextBuilder {
    config: ContainerConfig,
    qualifier_factories: Option<Arc<QualifierFactoryRegistry>>,
    registrations: Vec<PendingRegistration>,
}

impl BeanContextBuilder {
    pub fn new() -> Self {
        Self {
            config: ContainerConfig::default(),
            qualifier_factories: None,
            registrations: Vec::new(),
        }
    }

    /// 设置容器配置
    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// 使用指定的限定符工厂注册表，默认使用全局注册表
    pub fn with_qualifier_factories(mut self, registry: Arc<QualifierFactoryRegistry>) -> Self {
        self.qualifier_factories = Some(registry);
        self
    }

    /// 注册现成的单例实例
    pub fn register_singleton<T>(mut self, definition: BeanDefinition, instance: Arc<T>) -> Self
    where
        T: Any + Send + Sync,
    {
        self.registrations.push(PendingRegistration::Singleton {
            definition,
            register: Box::new(move |context, definition| {
                context.register_singleton(definition, instance).map(|_| ())
            }),
        });
        self
    }

    /// 注册创建函数
    pub fn register_factory<T, F>(mut self, definition: BeanDefinition, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&mut ResolutionContext, &DefaultBeanContext) -> DependencyResult<T>
            + Send
            + Sync
            + 'static,
    {
        self.registrations.push(PendingRegistration::Factory {
            definition,
            factory: Arc::new(
                move |resolution_context: &mut ResolutionContext, context: &DefaultBeanContext| {
                    factory(resolution_context, context).map(|bean| Arc::new(bean) as BeanInstance)
                },
            ),
        });
        self
    }

    /// 构建上下文
    ///
    /// 单例实例的类型与定义不符时失败。
    pub fn build(self) -> DependencyResult<Arc<DefaultBeanContext>> {
        let context = match self.qualifier_factories {
            Some(registry) => DefaultBeanContext::with_qualifier_factories(self.config, registry),
            None => DefaultBeanContext::new(self.config),
        };

        let registration_count = self.registrations.len();
        for registration in self.registrations {
            match registration {
                PendingRegistration::Singleton {
                    definition,
                    register,
                } => register(&context, definition)?,
                PendingRegistration::Factory {
                    definition,
                    factory,
                } => {
                    context.register(definition, factory);
                }
            }
        }

        info!("构建上下文完成，注册了 {} 个 Bean", registration_count);
        Ok(context)
    }
}

impl Default for BeanContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
