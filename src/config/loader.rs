use std::{collections::HashMap, env, fs, path::Path, path::PathBuf};
use crate::errors::ConfigError;

use super::app_config::{
    AppConfig, PartialAppConfig, CONFIG_FILE_NAME, ENV_BASE_DIR, ENV_CONFIG_PATH,
    ENV_LOG_FORMAT, ENV_LOG_LEVEL,
};

/// Configuration loader responsible for loading config from files and environment
pub struct ConfigLoader {
    path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader using `ALIASDI_CONFIG` or `./aliasdi.toml`
    pub fn new() -> Self {
        Self { path: None }
    }

    /// Create a config loader for an explicit file
    pub fn with_path(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    /// Load complete application configuration
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let config_path = self.config_path();

        // Load partial config from file
        let partial_config = self.load_partial_config(&config_path)?;

        // Collect environment variables
        let env_map = self.collect_env_vars();

        let config_dir = config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());
        let config = AppConfig::from_partial_and_env(partial_config, env_map, config_dir)?;

        tracing::debug!(
            path = %config_path.display(),
            aliases = config.aliases.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Path of the configuration file this loader reads
    pub fn config_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(CONFIG_FILE_NAME))
    }

    /// Load partial configuration from TOML file
    fn load_partial_config(&self, config_path: &Path) -> Result<Option<PartialAppConfig>, ConfigError> {
        if !config_path.exists() {
            tracing::info!("配置文件 {:?} 不存在，将使用默认配置", config_path);
            return Ok(None);
        }

        let content = fs::read_to_string(config_path).map_err(|e| {
            ConfigError::FileRead(config_path.to_string_lossy().to_string(), e)
        })?;

        let partial_config: PartialAppConfig = toml::from_str(&content).map_err(|e| {
            ConfigError::TomlParse(config_path.to_string_lossy().to_string(), e)
        })?;

        Ok(Some(partial_config))
    }

    /// Collect relevant environment variables
    fn collect_env_vars(&self) -> HashMap<String, String> {
        let env_keys = [ENV_BASE_DIR, ENV_LOG_LEVEL, ENV_LOG_FORMAT];

        let mut env_map = HashMap::new();
        for key in &env_keys {
            if let Ok(value) = env::var(key) {
                env_map.insert(key.to_string(), value);
            }
        }
        env_map
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_loader(content: Option<&str>) -> (ConfigLoader, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        if let Some(content) = content {
            fs::write(&path, content).unwrap();
        }
        (ConfigLoader::with_path(path), temp_dir)
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let (loader, _temp_dir) = create_test_loader(None);
        let partial = loader.load_partial_config(&loader.config_path()).unwrap();
        assert!(partial.is_none());
    }

    #[test]
    fn test_load_partial_config() {
        let (loader, _temp_dir) = create_test_loader(Some(
            "[aliases.normal]\nclassName = \"Widget\"\npath = \"widget\"\n",
        ));
        let partial = loader.load_partial_config(&loader.config_path()).unwrap();
        assert!(partial.is_some());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let (loader, _temp_dir) = create_test_loader(Some("[aliases.normal\n"));
        let err = loader.load_partial_config(&loader.config_path()).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(..)));
    }

    #[test]
    fn test_explicit_path_wins() {
        let loader = ConfigLoader::with_path(PathBuf::from("/tmp/custom.toml"));
        assert_eq!(loader.config_path(), PathBuf::from("/tmp/custom.toml"));
    }
}
