//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

/// 限定符配置错误类型
///
/// 这类错误表示装配错误，在限定符或提供者构造时立即返回，不做恢复。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QualifierError {
    #[error("注解元数据中不存在 [{annotation}] 注解")]
    MissingAnnotation { annotation: String },

    #[error("无法从注解 [{annotation}] 中获取必需成员 [{member}]")]
    MissingMember { annotation: String, member: String },

    #[error("无法实例化 QualifierFactory: {reference}")]
    FactoryNotResolvable { reference: String },

    #[error("以可调用对象表示的 QualifierFactory 返回了错误类型: ({actual} vs Qualifier), 引用: {reference}")]
    IncorrectReturnType { reference: String, actual: String },

    #[error("QualifierFactory 未生成限定符: {reference}")]
    NoQualifierProduced { reference: String },

    #[error("提供者注入点缺少类型参数: {type_name}")]
    MissingTypeArgument { type_name: String },
}

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("不存在类型为 [{type_name}] 的 Bean{}", qualifier_suffix(.qualifier))]
    NoSuchBean {
        type_name: String,
        qualifier: Option<String>,
    },

    #[error("类型为 [{type_name}] 的 Bean 不唯一{}, 候选: {candidates:?}", qualifier_suffix(.qualifier))]
    NonUniqueBean {
        type_name: String,
        qualifier: Option<String>,
        candidates: Vec<String>,
    },

    #[error("组件创建失败: {type_name}, 原因: {source}")]
    ComponentCreationFailed {
        type_name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("循环依赖检测到: {dependency_chain}")]
    CircularDependency { dependency_chain: String },

    #[error("解析深度超过上限 {max_depth}: {dependency_chain}")]
    ResolutionDepthExceeded {
        max_depth: usize,
        dependency_chain: String,
    },

    #[error("实例类型不匹配: 期望 {expected}, Bean {bean_name}")]
    TypeMismatch { expected: String, bean_name: String },

    #[error("组件注册失败: {type_name}, 原因: {message}")]
    RegistrationError { type_name: String, message: String },

    #[error("限定符配置错误: {source}")]
    Qualifier {
        #[from]
        source: QualifierError,
    },
}

fn qualifier_suffix(qualifier: &Option<String>) -> String {
    qualifier
        .as_ref()
        .map(|q| format!(" (限定符: {})", q))
        .unwrap_or_default()
}

impl DependencyError {
    /// 创建 Bean 不存在错误
    pub fn no_such_bean(type_name: impl Into<String>, qualifier: Option<String>) -> Self {
        Self::NoSuchBean {
            type_name: type_name.into(),
            qualifier,
        }
    }

    /// 是否为 Bean 不存在错误
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoSuchBean { .. })
    }

    /// 是否为 Bean 不唯一错误
    pub fn is_non_unique(&self) -> bool {
        matches!(self, Self::NonUniqueBean { .. })
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("限定符错误: {source}")]
    QualifierError {
        #[from]
        source: QualifierError,
    },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type QualifierResult<T> = Result<T, QualifierError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
