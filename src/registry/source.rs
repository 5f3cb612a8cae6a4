//! Source units and the loaders that read them.
//!
//! A source unit is the file an alias points at. Loading it makes the class
//! names it declares visible to the registry. On disk a unit is a TOML
//! document:
//!
//! ```toml
//! classes = ["Widget", "Gadget"]
//! ```

use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::LoadError;

/// Class names declared by one loaded unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SourceUnit {
    #[serde(default)]
    pub classes: BTreeSet<String>,
}

impl SourceUnit {
    pub fn new<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn defines(&self, class_name: &str) -> bool {
        self.classes.contains(class_name)
    }
}

/// Resolves normalized paths to source units.
///
/// The registry decides when to call a loader and how often; implementations
/// only answer "does this exist" and "what does it define".
pub trait SourceLoader: Send + Sync {
    /// Whether `path` names an existing unit.
    fn exists(&self, path: &Path) -> bool;

    /// Read and parse the unit at `path`.
    fn load(&self, path: &Path) -> Result<SourceUnit, LoadError>;
}

/// Loads units from the filesystem, resolving relative paths against an
/// optional base directory.
#[derive(Debug, Clone, Default)]
pub struct FsSourceLoader {
    base_dir: Option<PathBuf>,
}

impl FsSourceLoader {
    pub fn new() -> Self {
        Self { base_dir: None }
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl SourceLoader for FsSourceLoader {
    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }

    fn load(&self, path: &Path) -> Result<SourceUnit, LoadError> {
        let full_path = self.resolve(path);
        let content =
            fs::read_to_string(&full_path).map_err(|e| LoadError::Read(full_path.clone(), e))?;
        let unit: SourceUnit =
            toml::from_str(&content).map_err(|e| LoadError::Parse(full_path.clone(), e))?;

        tracing::debug!(
            path = %full_path.display(),
            classes = unit.classes.len(),
            "Parsed source unit"
        );
        Ok(unit)
    }
}

/// In-process loader keyed by normalized path.
#[derive(Debug, Default)]
pub struct MemorySourceLoader {
    units: RwLock<HashMap<PathBuf, SourceUnit>>,
}

impl MemorySourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the unit at `path`. The path is stored as given, so
    /// pass the normalized form (e.g. `widget.toml`).
    pub fn insert(&self, path: impl Into<PathBuf>, unit: SourceUnit) {
        self.units.write().insert(path.into(), unit);
    }

    pub fn with_unit(self, path: impl Into<PathBuf>, unit: SourceUnit) -> Self {
        self.insert(path, unit);
        self
    }
}

impl SourceLoader for MemorySourceLoader {
    fn exists(&self, path: &Path) -> bool {
        self.units.read().contains_key(path)
    }

    fn load(&self, path: &Path) -> Result<SourceUnit, LoadError> {
        self.units
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::Missing(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_unit(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_fs_loader_reads_classes() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_unit(&temp_dir, "widget.toml", "classes = [\"Widget\", \"Gadget\"]\n");

        let loader = FsSourceLoader::new();
        assert!(loader.exists(&path));

        let unit = loader.load(&path).unwrap();
        assert!(unit.defines("Widget"));
        assert!(unit.defines("Gadget"));
        assert!(!unit.defines("Sprocket"));
    }

    #[test]
    fn test_fs_loader_resolves_against_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        write_unit(&temp_dir, "widget.toml", "classes = [\"Widget\"]\n");

        let loader = FsSourceLoader::with_base_dir(temp_dir.path());
        assert!(loader.exists(Path::new("widget.toml")));
        assert!(!loader.exists(Path::new("missing.toml")));
        assert!(loader.load(Path::new("widget.toml")).unwrap().defines("Widget"));
    }

    #[test]
    fn test_fs_loader_empty_unit_defines_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_unit(&temp_dir, "empty.toml", "");

        let unit = FsSourceLoader::new().load(&path).unwrap();
        assert!(unit.classes.is_empty());
    }

    #[test]
    fn test_fs_loader_reports_parse_errors() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_unit(&temp_dir, "broken.toml", "classes = [\n");

        let err = FsSourceLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, LoadError::Parse(..)));
    }

    #[test]
    fn test_fs_loader_directory_is_not_a_unit() {
        let temp_dir = TempDir::new().unwrap();
        assert!(!FsSourceLoader::new().exists(temp_dir.path()));
    }

    #[test]
    fn test_memory_loader() {
        let loader = MemorySourceLoader::new().with_unit("widget.toml", SourceUnit::new(["Widget"]));

        assert!(loader.exists(Path::new("widget.toml")));
        assert!(!loader.exists(Path::new("widget")));
        assert!(loader.load(Path::new("widget.toml")).unwrap().defines("Widget"));
        assert!(matches!(
            loader.load(Path::new("other.toml")),
            Err(LoadError::Missing(_))
        ));
    }
}
