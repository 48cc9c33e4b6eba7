//! 延迟提供者实现
//!
//! [`BeanProviderDefinition`] 把 [`BeanProvider`] 本身作为可注入类型，为每个注入点生成
//! [`DefaultBeanProvider`]。提供者构造后不可变，每次调用都重新向注册表查询。

use di_abstractions::{
    downcast_instance, BeanDefinitions, BeanLocator, BeanProvider, ProviderDefinition,
    ProviderStream, QualifierRef, QualifierSupplier, Qualifiers, ResolutionContext, ResolveOptions,
};
use infrastructure_common::{Argument, BeanDefinition, DependencyResult, TypeInfo};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// 延迟提供者定义
///
/// 允许空提供者：没有候选时仍然构造提供者，失败推迟到第一次取值。
#[derive(Debug, Clone, Copy, Default)]
pub struct BeanProviderDefinition;

impl BeanProviderDefinition {
    pub fn new() -> Self {
        Self
    }

    /// `BeanProvider<T>` 注入点参数
    pub fn injection_point<T: Send + Sync + 'static>() -> Argument {
        Argument::provider_of::<dyn BeanProvider<T>, T>()
    }
}

impl ProviderDefinition for BeanProviderDefinition {
    type Provider<T: Send + Sync + 'static> = DefaultBeanProvider<T>;

    fn provider_type(&self) -> TypeInfo {
        TypeInfo::of::<dyn BeanProvider<()>>()
    }

    fn is_allow_empty_providers(&self, _context: &dyn BeanLocator) -> bool {
        true
    }

    fn build_provider<T: Send + Sync + 'static>(
        &self,
        options: ResolveOptions,
        context: Arc<dyn BeanLocator>,
        argument: Argument,
        qualifier_supplier: QualifierSupplier,
        singleton: bool,
    ) -> DefaultBeanProvider<T> {
        DefaultBeanProvider {
            options,
            context,
            argument,
            qualifier_supplier,
            singleton,
            _marker: PhantomData,
        }
    }
}

/// 默认延迟提供者
///
/// 每次调用都从新的解析上下文开始，不继承构造时的解析链。
pub struct DefaultBeanProvider<T> {
    options: ResolveOptions,
    context: Arc<dyn BeanLocator>,
    argument: Argument,
    qualifier_supplier: QualifierSupplier,
    singleton: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> DefaultBeanProvider<T> {
    /// 目标类型参数
    pub fn argument(&self) -> &Argument {
        &self.argument
    }

    /// 是否在单例组件的创建过程中构造
    pub fn is_singleton(&self) -> bool {
        self.singleton
    }

    /// 注入点限定符，任意限定符视为无限定
    fn qualifier(&self) -> Option<QualifierRef> {
        Qualifiers::normalize_any((self.qualifier_supplier)())
    }

    fn resolution_context(&self) -> ResolutionContext {
        ResolutionContext::with_options(self.options.clone())
    }

    fn describe(&self) -> String {
        self.argument.type_info().short_name().to_string()
    }
}

impl<T> BeanProvider<T> for DefaultBeanProvider<T>
where
    T: Send + Sync + 'static,
{
    fn get(&self) -> DependencyResult<Arc<T>> {
        self.get_with(self.qualifier())
    }

    fn get_with(&self, qualifier: Option<QualifierRef>) -> DependencyResult<Arc<T>> {
        let qualifier = Qualifiers::normalize_any(qualifier);
        let mut resolution_context = self.resolution_context();
        debug!(
            "提供者取值: {}, 限定符: {}",
            self.argument,
            qualifier.as_ref().map_or("<none>".to_string(), |q| q.to_string())
        );
        let instance =
            self.context
                .get_bean(&mut resolution_context, &self.argument, qualifier.as_deref())?;
        downcast_instance::<T>(instance, &self.describe())
    }

    fn find(&self, qualifier: Option<QualifierRef>) -> DependencyResult<Option<Arc<T>>> {
        let qualifier =
            Qualifiers::normalize_any(Qualifiers::intersect(self.qualifier(), qualifier));
        let mut resolution_context = self.resolution_context();
        self.context
            .find_bean(&mut resolution_context, &self.argument, qualifier.as_deref())?
            .map(|instance| downcast_instance::<T>(instance, &self.describe()))
            .transpose()
    }

    fn get_definition(&self) -> DependencyResult<Arc<BeanDefinition>> {
        self.context
            .get_bean_definition(&self.argument, self.qualifier().as_deref())
    }

    fn is_unique(&self) -> DependencyResult<bool> {
        let definitions = self
            .context
            .get_bean_definitions(&self.argument, self.qualifier().as_deref())?;
        Ok(match definitions {
            BeanDefinitions::Found(candidates) => candidates.len() == 1,
            BeanDefinitions::NotFound => false,
        })
    }

    fn is_present(&self) -> DependencyResult<bool> {
        self.context
            .contains_bean(&self.argument, self.qualifier().as_deref())
    }

    fn iter(&self) -> DependencyResult<std::vec::IntoIter<Arc<T>>> {
        let mut resolution_context = self.resolution_context();
        let name = self.describe();
        let instances = self
            .context
            .get_beans_of_type(&mut resolution_context, &self.argument, self.qualifier().as_deref())?
            .into_iter()
            .map(|instance| downcast_instance::<T>(instance, &name))
            .collect::<DependencyResult<Vec<_>>>()?;
        Ok(instances.into_iter())
    }

    fn stream(&self) -> DependencyResult<ProviderStream<'_, T>> {
        let name = self.describe();
        let stream = self.context.stream_of_type(
            self.resolution_context(),
            &self.argument,
            self.qualifier().as_deref(),
        )?;
        Ok(Box::new(stream.map(move |instance| {
            instance.and_then(|instance| downcast_instance::<T>(instance, &name))
        })))
    }
}

impl<T> fmt::Debug for DefaultBeanProvider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultBeanProvider")
            .field("argument", &self.argument)
            .field("qualifier", &(self.qualifier_supplier)())
            .field("singleton", &self.singleton)
            .field("options", &self.options)
            .finish()
    }
}
