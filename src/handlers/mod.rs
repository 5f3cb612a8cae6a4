//! Command handlers for the `aliasdi` binary.

pub mod check;
pub mod list;

pub use check::check_aliases;
pub use list::list_aliases;

use crate::config::AppConfig;
use crate::errors::RegistryError;
use crate::registry::{ClassTable, Registry};

/// Registry rooted at the configured `base_dir`, or the working directory.
pub fn build_registry(config: &AppConfig, classes: ClassTable) -> Registry {
    match &config.registry.base_dir {
        Some(dir) => Registry::with_base_dir(classes, dir.clone()),
        None => Registry::new(classes),
    }
}

/// Register every configured alias. Invalid entries are returned instead
/// of stopping the rest from registering.
pub fn register_aliases(registry: &Registry, config: &AppConfig) -> Vec<RegistryError> {
    config
        .aliases
        .iter()
        .filter_map(|(alias, raw)| registry.set(alias, raw.clone()).err())
        .collect()
}
