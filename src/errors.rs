use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for the `aliasdi` binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Logging setup failed: {0}")]
    Logging(String),
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Registration field that must be present and non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    ClassName,
    Path,
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequiredField::ClassName => f.write_str("className"),
            RequiredField::Path => f.write_str("path"),
        }
    }
}

/// Failures surfaced by [`crate::registry::Registry`].
///
/// Every variant carries the alias it was raised for. None of them leave
/// partial state behind: a failed `set` keeps the previous settings and a
/// failed `get` never populates the singleton cache.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{field} is required (alias: '{alias}')")]
    Configuration { alias: String, field: RequiredField },

    #[error("alias '{0}' is not defined")]
    UnknownAlias(String),

    #[error("source unit '{}' not found (alias: '{alias}'): {reason}", path.display())]
    SourceNotFound {
        alias: String,
        path: PathBuf,
        reason: String,
    },

    #[error("class '{class_name}' not found (alias: '{alias}', path: '{}')", path.display())]
    ClassNotFound {
        alias: String,
        class_name: String,
        path: PathBuf,
    },

    #[error("failed to instantiate class '{class_name}' (alias: '{alias}'): {source}")]
    Instantiation {
        alias: String,
        class_name: String,
        #[source]
        source: ConstructError,
    },
}

impl RegistryError {
    /// Alias the failing operation was called with.
    pub fn alias(&self) -> &str {
        match self {
            RegistryError::Configuration { alias, .. }
            | RegistryError::SourceNotFound { alias, .. }
            | RegistryError::ClassNotFound { alias, .. }
            | RegistryError::Instantiation { alias, .. } => alias,
            RegistryError::UnknownAlias(alias) => alias,
        }
    }
}

/// Raised by class factories when they cannot build an instance from the
/// positional arguments they were given.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConstructError {
    #[error("expected {expected} argument(s), got {actual}")]
    Arity { expected: String, actual: usize },
    #[error("argument #{index} is invalid: {reason}")]
    InvalidArgument { index: usize, reason: String },
    #[error("no constructor registered for class '{0}'")]
    NoConstructor(String),
    #[error("constructed value is not a '{0}'")]
    TypeMismatch(&'static str),
}

/// Raised by a [`crate::registry::SourceLoader`] when a unit cannot be read.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{0}': {1}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("failed to parse '{0}': {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("'{0}' is not a known source unit")]
    Missing(PathBuf),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from file '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Invalid value '{value}' for '{key}'")]
    InvalidValue { key: String, value: String },
}
