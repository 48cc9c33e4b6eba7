//! 解析上下文
//!
//! 在一次解析调用中传递，记录正在进行的依赖链，用于检测循环依赖与解析深度。

use infrastructure_common::{BeanDefinition, DependencyError, Lifetime};
use std::sync::Arc;

/// 解析链中的一个节点
#[derive(Debug, Clone)]
pub struct ResolutionSegment {
    /// 正在创建的 Bean 定义
    pub definition: Arc<BeanDefinition>,
}

/// 解析上下文
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    /// 当前解析链，用于检测循环依赖
    resolution_chain: Vec<ResolutionSegment>,
    /// 解析选项
    pub options: ResolveOptions,
}

impl ResolutionContext {
    /// 创建新的解析上下文
    pub fn new() -> Self {
        Self::with_options(ResolveOptions::default())
    }

    /// 使用指定选项创建解析上下文
    pub fn with_options(options: ResolveOptions) -> Self {
        Self {
            resolution_chain: Vec::new(),
            options,
        }
    }

    /// 添加定义到解析链
    pub fn push(&mut self, definition: Arc<BeanDefinition>) -> Result<(), DependencyError> {
        if self.options.detect_circular_dependencies && self.contains(&definition) {
            return Err(DependencyError::CircularDependency {
                dependency_chain: format!("{} -> {}", self.describe_chain(), definition),
            });
        }
        if self.resolution_chain.len() >= self.options.max_depth {
            return Err(DependencyError::ResolutionDepthExceeded {
                max_depth: self.options.max_depth,
                dependency_chain: self.describe_chain(),
            });
        }
        self.resolution_chain.push(ResolutionSegment { definition });
        Ok(())
    }

    /// 定义是否已在解析链中
    pub fn contains(&self, definition: &Arc<BeanDefinition>) -> bool {
        self.resolution_chain
            .iter()
            .any(|segment| Arc::ptr_eq(&segment.definition, definition))
    }

    /// 从解析链中移除最后一个定义
    pub fn pop(&mut self) {
        self.resolution_chain.pop();
    }

    /// 当前解析深度
    pub fn depth(&self) -> usize {
        self.resolution_chain.len()
    }

    /// 当前正在创建的 Bean
    pub fn current(&self) -> Option<&ResolutionSegment> {
        self.resolution_chain.last()
    }

    /// 当前正在创建的 Bean 的生命周期
    pub fn current_lifetime(&self) -> Option<Lifetime> {
        self.current().map(|segment| segment.definition.lifetime)
    }

    fn describe_chain(&self) -> String {
        self.resolution_chain
            .iter()
            .map(|segment| segment.definition.to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

impl Default for ResolutionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// 解析选项
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// 是否检测循环依赖
    pub detect_circular_dependencies: bool,
    /// 最大递归深度
    pub max_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            detect_circular_dependencies: true,
            max_depth: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Engine;

    #[test]
    fn test_circular_dependency_is_detected() {
        let mut context = ResolutionContext::new();
        let engine = Arc::new(BeanDefinition::of::<Engine>().with_lifetime(Lifetime::Singleton));

        context.push(engine.clone()).unwrap();
        assert_eq!(context.current_lifetime(), Some(Lifetime::Singleton));

        let error = context.push(engine.clone()).unwrap_err();
        assert!(matches!(error, DependencyError::CircularDependency { .. }));

        context.pop();
        assert_eq!(context.depth(), 0);
        assert!(context.push(engine).is_ok());
    }

    #[test]
    fn test_depth_limit() {
        let mut context = ResolutionContext::with_options(ResolveOptions {
            detect_circular_dependencies: true,
            max_depth: 1,
        });
        context
            .push(Arc::new(BeanDefinition::of::<Engine>().named("first")))
            .unwrap();
        let error = context
            .push(Arc::new(BeanDefinition::of::<Engine>().named("second")))
            .unwrap_err();
        assert!(matches!(
            error,
            DependencyError::ResolutionDepthExceeded { max_depth: 1, .. }
        ));
    }
}
