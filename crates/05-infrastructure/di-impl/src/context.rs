//! 内存中的 Bean 上下文
//!
//! 按注册顺序保存 Bean 定义与创建函数，实现 [`BeanLocator`] 查找契约，并把延迟提供者
//! 作为可注入类型对外提供。

use crate::factory_registry::QualifierFactoryRegistry;
use crate::injection::injection_point_qualifier;
use crate::provider::{BeanProviderDefinition, DefaultBeanProvider};
use di_abstractions::{
    downcast_instance, BeanDefinitions, BeanLocator, BeanStream, ContainerConfig,
    ProviderDefinition, Qualifier, ResolutionContext,
};
use infrastructure_common::{
    Argument, BeanDefinition, BeanInstance, DependencyError, DependencyResult, Lifetime,
};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};
use tracing::{debug, info, warn};

/// Bean 创建函数
pub type BeanFactoryFn = Arc<
    dyn Fn(&mut ResolutionContext, &DefaultBeanContext) -> DependencyResult<BeanInstance>
        + Send
        + Sync,
>;

/// 注册信息
struct Registration {
    definition: Arc<BeanDefinition>,
    factory: BeanFactoryFn,
    /// 单例实例
    singleton: OnceCell<BeanInstance>,
    /// 正在初始化单例的线程
    initializing: Mutex<Option<ThreadId>>,
}

/// 默认 Bean 上下文
pub struct DefaultBeanContext {
    registrations: RwLock<Vec<Arc<Registration>>>,
    config: ContainerConfig,
    qualifier_factories: Arc<QualifierFactoryRegistry>,
    provider_definition: BeanProviderDefinition,
    this: Weak<DefaultBeanContext>,
}

impl DefaultBeanContext {
    /// 使用全局限定符工厂注册表创建上下文
    pub fn new(config: ContainerConfig) -> Arc<Self> {
        Self::with_qualifier_factories(config, QualifierFactoryRegistry::global())
    }

    /// 使用指定限定符工厂注册表创建上下文
    pub fn with_qualifier_factories(
        config: ContainerConfig,
        qualifier_factories: Arc<QualifierFactoryRegistry>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            registrations: RwLock::new(Vec::new()),
            config,
            qualifier_factories,
            provider_definition: BeanProviderDefinition::new(),
            this: this.clone(),
        })
    }

    /// 限定符工厂注册表
    pub fn qualifier_factories(&self) -> &Arc<QualifierFactoryRegistry> {
        &self.qualifier_factories
    }

    /// 注册 Bean 定义及其创建函数
    pub fn register(&self, definition: BeanDefinition, factory: BeanFactoryFn) -> Arc<BeanDefinition> {
        info!(
            "注册 Bean: {} ({:?}, 优先级 {})",
            definition, definition.lifetime, definition.priority
        );
        let definition = Arc::new(definition);
        self.registrations.write().push(Arc::new(Registration {
            definition: definition.clone(),
            factory,
            singleton: OnceCell::new(),
            initializing: Mutex::new(None),
        }));
        definition
    }

    /// 注册现成的单例实例
    pub fn register_singleton<T>(
        &self,
        definition: BeanDefinition,
        instance: Arc<T>,
    ) -> DependencyResult<Arc<BeanDefinition>>
    where
        T: Any + Send + Sync,
    {
        Self::check_type::<T>(&definition)?;
        let definition = Arc::new(definition.with_lifetime(Lifetime::Singleton));
        info!("注册单例 Bean: {}", definition);

        let instance: BeanInstance = instance;
        let singleton = OnceCell::new();
        // 新建的单元格必然为空
        let _ = singleton.set(instance.clone());
        self.registrations.write().push(Arc::new(Registration {
            definition: definition.clone(),
            factory: Arc::new(move |_: &mut ResolutionContext, _: &DefaultBeanContext| {
                Ok(instance.clone())
            }),
            singleton,
            initializing: Mutex::new(None),
        }));
        Ok(definition)
    }

    /// 注册带类型的创建函数
    pub fn register_factory<T, F>(
        &self,
        definition: BeanDefinition,
        factory: F,
    ) -> DependencyResult<Arc<BeanDefinition>>
    where
        T: Any + Send + Sync,
        F: Fn(&mut ResolutionContext, &DefaultBeanContext) -> DependencyResult<T>
            + Send
            + Sync
            + 'static,
    {
        Self::check_type::<T>(&definition)?;
        Ok(self.register(
            definition,
            Arc::new(
                move |resolution_context: &mut ResolutionContext, context: &DefaultBeanContext| {
                    factory(resolution_context, context).map(|bean| Arc::new(bean) as BeanInstance)
                },
            ),
        ))
    }

    fn check_type<T: Any>(definition: &BeanDefinition) -> DependencyResult<()> {
        if definition.type_info.is::<T>() {
            Ok(())
        } else {
            Err(DependencyError::RegistrationError {
                type_name: std::any::type_name::<T>().to_string(),
                message: format!("定义的类型为 {}", definition.type_info),
            })
        }
    }

    /// 新的解析上下文
    pub fn resolution_context(&self) -> ResolutionContext {
        ResolutionContext::with_options(self.config.resolve_options())
    }

    /// 已注册的定义，按注册顺序
    pub fn definitions(&self) -> Vec<Arc<BeanDefinition>> {
        self.registrations
            .read()
            .iter()
            .map(|registration| registration.definition.clone())
            .collect()
    }

    /// 按类型获取唯一实例
    pub fn resolve<T>(&self, qualifier: Option<&dyn Qualifier>) -> DependencyResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.resolve_in(&mut self.resolution_context(), qualifier)
    }

    /// 在给定解析上下文中按类型获取唯一实例，供创建函数解析自身依赖
    pub fn resolve_in<T>(
        &self,
        resolution_context: &mut ResolutionContext,
        qualifier: Option<&dyn Qualifier>,
    ) -> DependencyResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let argument = Argument::of::<T>();
        let instance = self.get_bean(resolution_context, &argument, qualifier)?;
        downcast_instance::<T>(instance, argument.name())
    }

    /// 为注入点构造延迟提供者
    pub fn get_provider<T>(&self, injection_point: &Argument) -> DependencyResult<DefaultBeanProvider<T>>
    where
        T: Send + Sync + 'static,
    {
        self.get_provider_in(self.resolution_context(), injection_point)
    }

    /// 在给定解析上下文中为注入点构造延迟提供者
    ///
    /// 在创建函数中调用时，提供者会记录当前正在创建的 Bean 是否为单例。
    pub fn get_provider_in<T>(
        &self,
        resolution_context: ResolutionContext,
        injection_point: &Argument,
    ) -> DependencyResult<DefaultBeanProvider<T>>
    where
        T: Send + Sync + 'static,
    {
        let provider_type = self.provider_definition.provider_type();
        if !self.provider_definition.is_present()
            || !self.provider_definition.is_enabled(self, &resolution_context)
        {
            return Err(DependencyError::no_such_bean(provider_type.to_string(), None));
        }

        if let Some(target) = injection_point.first_type_parameter() {
            if !target.type_info().is::<T>() {
                return Err(DependencyError::TypeMismatch {
                    expected: std::any::type_name::<T>().to_string(),
                    bean_name: target.to_string(),
                });
            }
        }

        let context: Arc<dyn BeanLocator> =
            self.this
                .upgrade()
                .ok_or_else(|| DependencyError::RegistrationError {
                    type_name: provider_type.to_string(),
                    message: "上下文已释放".to_string(),
                })?;
        let qualifier = injection_point_qualifier(injection_point, &self.qualifier_factories)?;
        self.provider_definition
            .provide::<T>(resolution_context, context, injection_point, qualifier)
    }

    fn candidates(
        &self,
        argument: &Argument,
        qualifier: Option<&dyn Qualifier>,
    ) -> DependencyResult<Vec<Arc<Registration>>> {
        let type_id = argument.type_info().id;
        let registrations: Vec<Arc<Registration>> = self
            .registrations
            .read()
            .iter()
            .filter(|registration| {
                registration.definition.enabled && registration.definition.type_info.id == type_id
            })
            .cloned()
            .collect();

        let Some(qualifier) = qualifier else {
            return Ok(registrations);
        };

        let definitions = registrations
            .iter()
            .map(|registration| registration.definition.clone())
            .collect();
        let reduced = qualifier.reduce(argument.type_info(), definitions)?;
        Ok(reduced
            .iter()
            .filter_map(|definition| {
                registrations
                    .iter()
                    .find(|registration| Arc::ptr_eq(&registration.definition, definition))
                    .cloned()
            })
            .collect())
    }

    /// 选出唯一候选：只有一个候选时直接返回，否则先收窄到首选 Bean，
    /// 再取优先级最高且唯一的候选
    fn select_single(
        &self,
        argument: &Argument,
        qualifier: Option<&dyn Qualifier>,
    ) -> DependencyResult<Option<Arc<Registration>>> {
        let mut candidates = self.candidates(argument, qualifier)?;
        if candidates.len() <= 1 {
            return Ok(candidates.pop());
        }

        let primaries: Vec<&Arc<Registration>> = candidates
            .iter()
            .filter(|registration| registration.definition.primary)
            .collect();
        let pool = if primaries.is_empty() {
            candidates.iter().collect()
        } else {
            primaries
        };
        if let [only] = pool.as_slice() {
            debug!("多个候选中选择首选 Bean: {}", only.definition);
            return Ok(Some(Arc::clone(only)));
        }

        let highest = pool
            .iter()
            .map(|registration| registration.definition.priority)
            .max();
        let mut top = pool
            .iter()
            .filter(|registration| Some(registration.definition.priority) == highest);
        if let (Some(winner), None) = (top.next(), top.next()) {
            debug!(
                "多个候选中选择优先级最高的 Bean: {} (优先级 {})",
                winner.definition, winner.definition.priority
            );
            return Ok(Some(Arc::clone(winner)));
        }

        Err(DependencyError::NonUniqueBean {
            type_name: argument.type_info().to_string(),
            qualifier: qualifier.map(|q| q.to_string()),
            candidates: candidates
                .iter()
                .map(|registration| registration.definition.name.clone())
                .collect(),
        })
    }

    fn instantiate(
        &self,
        resolution_context: &mut ResolutionContext,
        registration: &Registration,
    ) -> DependencyResult<BeanInstance> {
        let definition = &registration.definition;
        if !definition.is_singleton() {
            resolution_context.push(definition.clone())?;
            let result = (registration.factory)(resolution_context, self);
            resolution_context.pop();
            return result;
        }

        if let Some(instance) = registration.singleton.get() {
            return Ok(instance.clone());
        }
        // 单例在初始化期间被再次请求时不能进入同一个单元格，
        // 经由提供者的请求不带解析链，只能按线程识别
        let current = thread::current().id();
        if resolution_context.contains(definition)
            || *registration.initializing.lock() == Some(current)
        {
            warn!("单例在创建过程中被再次请求: {}", definition);
            return Err(DependencyError::CircularDependency {
                dependency_chain: format!("{} -> {}", definition, definition),
            });
        }

        resolution_context.push(definition.clone())?;
        let result = registration
            .singleton
            .get_or_try_init(|| {
                debug!("创建单例 Bean: {}", definition);
                *registration.initializing.lock() = Some(current);
                let instance = (registration.factory)(resolution_context, self);
                *registration.initializing.lock() = None;
                instance
            })
            .cloned();
        resolution_context.pop();
        result
    }

    fn no_such_bean(argument: &Argument, qualifier: Option<&dyn Qualifier>) -> DependencyError {
        DependencyError::no_such_bean(
            argument.type_info().to_string(),
            qualifier.map(|q| q.to_string()),
        )
    }
}

impl BeanLocator for DefaultBeanContext {
    fn get_bean(
        &self,
        context: &mut ResolutionContext,
        argument: &Argument,
        qualifier: Option<&dyn Qualifier>,
    ) -> DependencyResult<BeanInstance> {
        match self.select_single(argument, qualifier)? {
            Some(registration) => self.instantiate(context, &registration),
            None => Err(Self::no_such_bean(argument, qualifier)),
        }
    }

    fn find_bean(
        &self,
        context: &mut ResolutionContext,
        argument: &Argument,
        qualifier: Option<&dyn Qualifier>,
    ) -> DependencyResult<Option<BeanInstance>> {
        self.select_single(argument, qualifier)?
            .map(|registration| self.instantiate(context, &registration))
            .transpose()
    }

    fn get_beans_of_type(
        &self,
        context: &mut ResolutionContext,
        argument: &Argument,
        qualifier: Option<&dyn Qualifier>,
    ) -> DependencyResult<Vec<BeanInstance>> {
        self.candidates(argument, qualifier)?
            .iter()
            .map(|registration| self.instantiate(context, registration))
            .collect()
    }

    fn stream_of_type<'a>(
        &'a self,
        mut context: ResolutionContext,
        argument: &Argument,
        qualifier: Option<&dyn Qualifier>,
    ) -> DependencyResult<BeanStream<'a>> {
        let candidates = self.candidates(argument, qualifier)?;
        Ok(Box::new(candidates.into_iter().map(move |registration| {
            self.instantiate(&mut context, &registration)
        })))
    }

    fn get_bean_definition(
        &self,
        argument: &Argument,
        qualifier: Option<&dyn Qualifier>,
    ) -> DependencyResult<Arc<BeanDefinition>> {
        match self.select_single(argument, qualifier)? {
            Some(registration) => Ok(registration.definition.clone()),
            None => Err(Self::no_such_bean(argument, qualifier)),
        }
    }

    fn get_bean_definitions(
        &self,
        argument: &Argument,
        qualifier: Option<&dyn Qualifier>,
    ) -> DependencyResult<BeanDefinitions> {
        let definitions = self
            .candidates(argument, qualifier)?
            .iter()
            .map(|registration| registration.definition.clone())
            .collect();
        Ok(BeanDefinitions::from_candidates(definitions))
    }

    fn contains_bean(
        &self,
        argument: &Argument,
        qualifier: Option<&dyn Qualifier>,
    ) -> DependencyResult<bool> {
        Ok(!self.candidates(argument, qualifier)?.is_empty())
    }

    fn config(&self) -> &ContainerConfig {
        &self.config
    }
}

impl fmt::Debug for DefaultBeanContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultBeanContext")
            .field("registrations", &self.registrations.read().len())
            .field("config", &self.config)
            .field("qualifier_factories", &self.qualifier_factories)
            .finish()
    }
}
