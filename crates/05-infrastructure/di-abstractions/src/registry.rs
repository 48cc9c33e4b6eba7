//! Bean 注册表抽象接口
//!
//! 注册表负责保存与实例化组件，这里只定义延迟提供者所依赖的查找契约。

use crate::container::ContainerConfig;
use crate::qualifier::Qualifier;
use crate::resolver::ResolutionContext;
use infrastructure_common::{Argument, BeanDefinition, BeanInstance, DependencyError, DependencyResult};
use std::any::Any;
use std::sync::Arc;

/// 惰性的实例序列
pub type BeanStream<'a> = Box<dyn Iterator<Item = DependencyResult<BeanInstance>> + Send + 'a>;

/// 定义查找结果
#[derive(Debug, Clone)]
pub enum BeanDefinitions {
    /// 找到的候选定义，至少一个
    Found(Vec<Arc<BeanDefinition>>),
    /// 没有候选定义
    NotFound,
}

impl BeanDefinitions {
    /// 从候选列表构造
    pub fn from_candidates(candidates: Vec<Arc<BeanDefinition>>) -> Self {
        if candidates.is_empty() {
            Self::NotFound
        } else {
            Self::Found(candidates)
        }
    }

    /// 候选数量
    pub fn len(&self) -> usize {
        match self {
            Self::Found(definitions) => definitions.len(),
            Self::NotFound => 0,
        }
    }

    /// 是否没有候选
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 转换为候选列表
    pub fn into_vec(self) -> Vec<Arc<BeanDefinition>> {
        match self {
            Self::Found(definitions) => definitions,
            Self::NotFound => Vec::new(),
        }
    }
}

/// Bean 查找 trait
///
/// 所有查找都是同步调用。`qualifier` 为 `None` 表示不加约束。
pub trait BeanLocator: Send + Sync {
    /// 获取唯一匹配的实例，零个或多个匹配时失败
    fn get_bean(
        &self,
        context: &mut ResolutionContext,
        argument: &Argument,
        qualifier: Option<&dyn Qualifier>,
    ) -> DependencyResult<BeanInstance>;

    /// 查找唯一匹配的实例，没有匹配时返回 `None`
    fn find_bean(
        &self,
        context: &mut ResolutionContext,
        argument: &Argument,
        qualifier: Option<&dyn Qualifier>,
    ) -> DependencyResult<Option<BeanInstance>>;

    /// 获取全部匹配的实例
    fn get_beans_of_type(
        &self,
        context: &mut ResolutionContext,
        argument: &Argument,
        qualifier: Option<&dyn Qualifier>,
    ) -> DependencyResult<Vec<BeanInstance>>;

    /// 惰性地获取全部匹配的实例，每次迭代到时才实例化
    fn stream_of_type<'a>(
        &'a self,
        context: ResolutionContext,
        argument: &Argument,
        qualifier: Option<&dyn Qualifier>,
    ) -> DependencyResult<BeanStream<'a>>;

    /// 获取唯一匹配的定义
    fn get_bean_definition(
        &self,
        argument: &Argument,
        qualifier: Option<&dyn Qualifier>,
    ) -> DependencyResult<Arc<BeanDefinition>>;

    /// 获取全部匹配的定义
    fn get_bean_definitions(
        &self,
        argument: &Argument,
        qualifier: Option<&dyn Qualifier>,
    ) -> DependencyResult<BeanDefinitions>;

    /// 是否存在匹配的定义，不会实例化
    fn contains_bean(
        &self,
        argument: &Argument,
        qualifier: Option<&dyn Qualifier>,
    ) -> DependencyResult<bool>;

    /// 容器配置
    fn config(&self) -> &ContainerConfig;
}

/// 把受管实例转换为具体类型
pub fn downcast_instance<T>(
    instance: BeanInstance,
    definition_name: &str,
) -> DependencyResult<Arc<T>>
where
    T: Any + Send + Sync,
{
    instance
        .downcast::<T>()
        .map_err(|_| DependencyError::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            bean_name: definition_name.to_string(),
        })
}
