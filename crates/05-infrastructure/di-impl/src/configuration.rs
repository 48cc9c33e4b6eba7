//! 容器配置加载
//!
//! 依次叠加默认值、配置文件与 `ADSP_DI_` 前缀的环境变量，例如
//! `ADSP_DI_MAX_RESOLUTION_DEPTH=32`。

use di_abstractions::ContainerConfig;
use infrastructure_common::{ConfigError, ConfigResult};
use std::path::Path;
use tracing::{debug, error};

/// 环境变量前缀
pub const CONFIG_ENV_PREFIX: &str = "ADSP_DI";

/// 默认配置文件，扩展名决定格式
pub const DEFAULT_CONFIG_FILE: &str = "config/container";

/// 从默认位置加载容器配置，配置文件可以不存在
pub fn load_container_config() -> ConfigResult<ContainerConfig> {
    build(config::File::with_name(DEFAULT_CONFIG_FILE).required(false))
}

/// 从指定文件加载容器配置
pub fn load_container_config_from(path: impl AsRef<Path>) -> ConfigResult<ContainerConfig> {
    let path = path.as_ref();
    if !path.exists() {
        error!("配置文件不存在: {}", path.display());
        return Err(ConfigError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    build(config::File::from(path))
}

fn build<S>(file: S) -> ConfigResult<ContainerConfig>
where
    S: config::Source + Send + Sync + 'static,
{
    let settings = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(CONFIG_ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| {
            error!("容器配置构建失败: {}", e);
            ConfigError::ParseError {
                source: Box::new(e),
            }
        })?;

    let container_config: ContainerConfig = settings.try_deserialize().map_err(|e| {
        error!("容器配置绑定失败: {}", e);
        ConfigError::ParseError {
            source: Box::new(e),
        }
    })?;

    validate(&container_config)?;
    debug!("容器配置加载完成: {:?}", container_config);
    Ok(container_config)
}

fn validate(container_config: &ContainerConfig) -> ConfigResult<()> {
    if container_config.max_resolution_depth == 0 {
        error!("容器配置验证失败: max_resolution_depth 为 0");
        return Err(ConfigError::ValidationError {
            message: "max_resolution_depth 必须大于 0".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file_and_environment() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "max_resolution_depth = 16").unwrap();
        writeln!(file, "allow_empty_providers = false").unwrap();

        let loaded = load_container_config_from(file.path()).unwrap();
        assert_eq!(loaded.max_resolution_depth, 16);
        assert_eq!(loaded.allow_empty_providers, Some(false));
        assert!(loaded.enable_circular_dependency_detection);

        // 环境变量覆盖文件
        std::env::set_var("ADSP_DI_ENABLE_CIRCULAR_DEPENDENCY_DETECTION", "false");
        let overridden = load_container_config_from(file.path());
        std::env::remove_var("ADSP_DI_ENABLE_CIRCULAR_DEPENDENCY_DETECTION");
        let overridden = overridden.unwrap();
        assert!(!overridden.enable_circular_dependency_detection);
        assert_eq!(overridden.max_resolution_depth, 16);
    }

    #[test]
    fn test_missing_file() {
        let error = load_container_config_from("does/not/exist.toml").unwrap_err();
        assert!(matches!(error, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_zero_depth_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "max_resolution_depth = 0").unwrap();

        let error = load_container_config_from(file.path()).unwrap_err();
        assert!(matches!(error, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_invalid_value_is_parse_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "max_resolution_depth = \"deep\"").unwrap();

        let error = load_container_config_from(file.path()).unwrap_err();
        assert!(matches!(error, ConfigError::ParseError { .. }));
    }
}
