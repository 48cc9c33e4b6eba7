//! 容器配置

use crate::resolver::ResolveOptions;
use serde::{Deserialize, Serialize};

/// 容器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 是否启用循环依赖检测
    pub enable_circular_dependency_detection: bool,
    /// 最大解析深度
    pub max_resolution_depth: usize,
    /// 覆盖提供者定义自身的“允许空提供者”策略，`None` 表示沿用定义的策略
    pub allow_empty_providers: Option<bool>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            enable_circular_dependency_detection: true,
            max_resolution_depth: 100,
            allow_empty_providers: None,
        }
    }
}

impl ContainerConfig {
    /// 生成解析选项
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            detect_circular_dependencies: self.enable_circular_dependency_detection,
            max_depth: self.max_resolution_depth,
        }
    }
}
