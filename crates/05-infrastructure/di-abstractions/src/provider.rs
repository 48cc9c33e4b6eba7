//! 延迟提供者抽象接口
//!
//! 延迟提供者把组件解析推迟到第一次使用时，而不是在注入时完成。

use crate::qualifier::{QualifierRef, Qualifiers};
use crate::registry::BeanLocator;
use crate::resolver::{ResolutionContext, ResolveOptions};
use infrastructure_common::{
    Argument, BeanDefinition, DependencyError, DependencyResult, QualifierError, TypeInfo,
};
use std::sync::Arc;
use tracing::debug;

/// 注入点限定符的提供函数
pub type QualifierSupplier = Arc<dyn Fn() -> Option<QualifierRef> + Send + Sync>;

/// 惰性的实例序列
pub type ProviderStream<'a, T> = Box<dyn Iterator<Item = DependencyResult<Arc<T>>> + Send + 'a>;

/// 延迟提供者 trait
pub trait BeanProvider<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    /// 按注入点限定符获取唯一实例
    fn get(&self) -> DependencyResult<Arc<T>>;

    /// 按调用方给出的限定符获取唯一实例，忽略注入点限定符
    fn get_with(&self, qualifier: Option<QualifierRef>) -> DependencyResult<Arc<T>>;

    /// 查找实例，没有匹配时返回 `None`；注入点限定符与调用方限定符取交集
    fn find(&self, qualifier: Option<QualifierRef>) -> DependencyResult<Option<Arc<T>>>;

    /// 获取匹配组件的定义
    fn get_definition(&self) -> DependencyResult<Arc<BeanDefinition>>;

    /// 是否恰好有一个候选定义
    fn is_unique(&self) -> DependencyResult<bool>;

    /// 是否存在候选定义
    fn is_present(&self) -> DependencyResult<bool>;

    /// 全部匹配的实例，每次调用都重新查询
    fn iter(&self) -> DependencyResult<std::vec::IntoIter<Arc<T>>>;

    /// 惰性地遍历全部匹配的实例，每次调用都重新查询
    fn stream(&self) -> DependencyResult<ProviderStream<'_, T>>;
}

/// 提供者定义 trait
///
/// 把延迟提供者类型本身注册为可注入组件，为每个注入点生成提供者。
/// 提供者只保留解析选项，每次延迟调用都从新的解析链开始。
pub trait ProviderDefinition: Send + Sync {
    /// 生成的提供者类型
    type Provider<T: Send + Sync + 'static>: BeanProvider<T>;

    /// 是否启用
    fn is_enabled(&self, _context: &dyn BeanLocator, _resolution_context: &ResolutionContext) -> bool {
        true
    }

    /// 提供者类型
    fn provider_type(&self) -> TypeInfo;

    /// 提供者类型是否可用
    fn is_present(&self) -> bool {
        true
    }

    /// 没有候选时是否仍然构造提供者
    fn is_allow_empty_providers(&self, _context: &dyn BeanLocator) -> bool {
        false
    }

    /// 构造提供者
    fn build_provider<T: Send + Sync + 'static>(
        &self,
        options: ResolveOptions,
        context: Arc<dyn BeanLocator>,
        argument: Argument,
        qualifier_supplier: QualifierSupplier,
        singleton: bool,
    ) -> Self::Provider<T>;

    /// 为注入点构造提供者
    ///
    /// `qualifier` 是已经解析好的注入点限定符。不允许空提供者时在这里检查候选是否存在。
    fn provide<T: Send + Sync + 'static>(
        &self,
        resolution_context: ResolutionContext,
        context: Arc<dyn BeanLocator>,
        injection_point: &Argument,
        qualifier: Option<QualifierRef>,
    ) -> DependencyResult<Self::Provider<T>>
    where
        Self: Sized,
    {
        let argument = injection_point
            .first_type_parameter()
            .cloned()
            .ok_or_else(|| QualifierError::MissingTypeArgument {
                type_name: injection_point.type_info().to_string(),
            })?;

        let allow_empty = context
            .config()
            .allow_empty_providers
            .unwrap_or_else(|| self.is_allow_empty_providers(context.as_ref()));
        if !allow_empty {
            let effective = Qualifiers::normalize_any(qualifier.clone());
            if !context.contains_bean(&argument, effective.as_deref())? {
                return Err(DependencyError::no_such_bean(
                    argument.type_info().to_string(),
                    effective.map(|q| q.to_string()),
                ));
            }
        }

        let singleton = resolution_context
            .current_lifetime()
            .map_or(false, |lifetime| lifetime.is_singleton());
        debug!(
            "构造提供者: {} -> {}, 单例: {}",
            self.provider_type().short_name(),
            argument,
            singleton
        );

        let qualifier_supplier: QualifierSupplier = Arc::new(move || qualifier.clone());
        Ok(self.build_provider(
            resolution_context.options,
            context,
            argument,
            qualifier_supplier,
            singleton,
        ))
    }
}
