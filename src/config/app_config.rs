use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::Level;

use super::loader::ConfigLoader;
use crate::errors::ConfigError;
use crate::logging::{LogFormat, LoggingConfig};
use crate::registry::RawSettings;

// Configuration location constants
pub const CONFIG_FILE_NAME: &str = "aliasdi.toml";

// Environment overrides
pub const ENV_CONFIG_PATH: &str = "ALIASDI_CONFIG";
pub const ENV_BASE_DIR: &str = "ALIASDI_BASE_DIR";
pub const ENV_LOG_LEVEL: &str = "ALIASDI_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "ALIASDI_LOG_FORMAT";

/// Main Application Configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub registry: RegistryConfig,
    pub logging: LoggingConfig,
    /// Alias definitions, in alias order.
    pub aliases: BTreeMap<String, RawSettings>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryConfig {
    /// Directory relative unit paths are resolved against.
    pub base_dir: Option<PathBuf>,
}

/// Partial Application Configuration for loading from files
#[derive(Deserialize, Debug, Default)]
pub struct PartialAppConfig {
    registry: Option<PartialRegistryConfig>,
    logging: Option<PartialLoggingConfig>,
    aliases: Option<BTreeMap<String, RawSettings>>,
}

#[derive(Deserialize, Debug, Default)]
struct PartialRegistryConfig {
    base_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
struct PartialLoggingConfig {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load_config()
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        ConfigLoader::with_path(path.into()).load_config()
    }

    /// Create AppConfig from partial config and environment.
    ///
    /// Environment values win over file values. A relative `base_dir` from
    /// the file is resolved against `config_dir` when one is given.
    pub fn from_partial_and_env(
        partial: Option<PartialAppConfig>,
        env_map: HashMap<String, String>,
        config_dir: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let partial = partial.unwrap_or_default();
        let file_registry = partial.registry.unwrap_or_default();
        let file_logging = partial.logging.unwrap_or_default();

        let base_dir = match env_map.get(ENV_BASE_DIR) {
            Some(dir) => Some(PathBuf::from(dir)),
            None => file_registry.base_dir.map(|dir| match config_dir {
                Some(root) if dir.is_relative() => root.join(dir),
                _ => dir,
            }),
        };

        let mut logging = LoggingConfig::default();
        if let Some(level) = env_map.get(ENV_LOG_LEVEL).cloned().or(file_logging.level) {
            logging.level = Level::from_str(&level).map_err(|_| ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                value: level.clone(),
            })?;
        }
        if let Some(format) = env_map.get(ENV_LOG_FORMAT) {
            logging.format = LogFormat::from_str(format).map_err(|_| ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                value: format.clone(),
            })?;
        } else if let Some(format) = file_logging.format {
            logging.format = format;
        }

        Ok(Self {
            registry: RegistryConfig { base_dir },
            logging,
            aliases: partial.aliases.unwrap_or_default(),
        })
    }
}
