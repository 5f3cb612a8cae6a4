//! Alias settings: the raw registration record and its validated form.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use crate::errors::{RegistryError, RequiredField};

/// Canonical extension of a source unit file.
pub const SOURCE_EXTENSION: &str = "toml";

/// Registration record as supplied by the caller or a config file.
///
/// Every field is optional here; [`AliasSettings::from_raw`] decides what
/// is required and fills the rest with defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, alias = "sourcePath", skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<Value>>,
    #[serde(default, alias = "singletone", skip_serializing_if = "Option::is_none")]
    pub singleton: Option<bool>,
}

impl RawSettings {
    pub fn new(class_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            class_name: Some(class_name.into()),
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = Some(args);
        self
    }

    pub fn singleton(mut self, singleton: bool) -> Self {
        self.singleton = Some(singleton);
        self
    }
}

/// Validated, normalized settings for one alias.
///
/// Serializes with the same keys a config file uses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AliasSettings {
    #[serde(rename = "className")]
    pub class_name: String,
    #[serde(rename = "path")]
    pub source_path: PathBuf,
    #[serde(rename = "args")]
    pub constructor_args: Vec<Value>,
    #[serde(rename = "singleton")]
    pub is_singleton: bool,
}

impl AliasSettings {
    /// Validate `raw` for `alias`. The class name is checked before the path,
    /// and an empty string counts as missing.
    pub fn from_raw(alias: &str, raw: RawSettings) -> Result<Self, RegistryError> {
        let class_name = required(raw.class_name, alias, RequiredField::ClassName)?;
        let path = required(raw.path, alias, RequiredField::Path)?;

        Ok(Self {
            class_name,
            source_path: normalize_source_path(&path),
            constructor_args: raw.args.unwrap_or_default(),
            is_singleton: raw.singleton.unwrap_or(false),
        })
    }
}

fn required(
    value: Option<String>,
    alias: &str,
    field: RequiredField,
) -> Result<String, RegistryError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(RegistryError::Configuration {
            alias: alias.to_string(),
            field,
        }),
    }
}

/// Strip one trailing `.toml` marker, then append it again.
///
/// `"widget"` and `"widget.toml"` both become `widget.toml`; anything else
/// after the last dot is kept, so `"widget."` becomes `widget..toml`.
pub fn normalize_source_path(raw: &str) -> PathBuf {
    let marker = format!(".{}", SOURCE_EXTENSION);
    let stem = raw.strip_suffix(marker.as_str()).unwrap_or(raw);
    PathBuf::from(format!("{}{}", stem, marker))
}
