pub mod app_config;
pub mod loader;

// Re-export commonly used types
pub use app_config::{AppConfig, RegistryConfig};
pub use loader::ConfigLoader;

// Re-export constants
pub use app_config::{
    CONFIG_FILE_NAME, ENV_BASE_DIR, ENV_CONFIG_PATH, ENV_LOG_FORMAT, ENV_LOG_LEVEL,
};
