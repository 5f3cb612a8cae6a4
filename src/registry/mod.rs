//! Alias registry.
//!
//! Maps an alias to [`AliasSettings`] and resolves it into an [`Instance`]:
//! - settings are validated and normalized on [`Registry::set`]
//! - the backing source unit is loaded lazily, once per path, on first resolution
//! - singleton aliases are constructed at most once and cached
//! - transient aliases are constructed on every resolution

pub mod classes;
pub mod settings;
pub mod source;

pub use classes::{ClassFactory, ClassTable, ConstructArgs, FnClassFactory, Instance};
pub use settings::{normalize_source_path, AliasSettings, RawSettings, SOURCE_EXTENSION};
pub use source::{FsSourceLoader, MemorySourceLoader, SourceLoader, SourceUnit};

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use crate::errors::{ConstructError, RegistryError};

/// Paths already loaded and the class names they made visible.
#[derive(Default)]
struct LoadedSources {
    paths: HashSet<PathBuf>,
    classes: HashSet<String>,
}

/// Cache cell for one singleton alias. `init` serializes the first
/// construction for this alias only; readers go through `instance`.
#[derive(Default)]
struct SingletonSlot {
    instance: OnceLock<Instance>,
    init: Mutex<()>,
}

#[derive(Default)]
struct InnerStats {
    resolutions: AtomicUsize,
    singleton_hits: AtomicUsize,
    constructions: AtomicUsize,
    sources_loaded: AtomicUsize,
}

/// Alias → settings → instance registry.
///
/// Cloning is cheap and every clone shares the same state. All operations
/// take `&self`, so a registry can be shared across threads.
#[derive(Clone)]
pub struct Registry {
    settings: Arc<RwLock<HashMap<String, AliasSettings>>>,
    /// Keyed independently of `settings`; re-registering an alias does not
    /// touch its cached instance.
    singletons: Arc<DashMap<String, Arc<SingletonSlot>>>,
    sources: Arc<RwLock<LoadedSources>>,
    /// One gate per path, held only while that path is being loaded.
    loading: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>,
    loader: Arc<dyn SourceLoader>,
    classes: Arc<ClassTable>,
    stats: Arc<InnerStats>,
}

impl Registry {
    /// Registry reading units from the filesystem, relative to the working directory.
    pub fn new(classes: ClassTable) -> Self {
        Self::with_loader(classes, Arc::new(FsSourceLoader::new()))
    }

    /// Registry reading units from the filesystem, relative to `base_dir`.
    pub fn with_base_dir(classes: ClassTable, base_dir: impl Into<PathBuf>) -> Self {
        Self::with_loader(classes, Arc::new(FsSourceLoader::with_base_dir(base_dir)))
    }

    pub fn with_loader(classes: ClassTable, loader: Arc<dyn SourceLoader>) -> Self {
        Self {
            settings: Arc::new(RwLock::new(HashMap::new())),
            singletons: Arc::new(DashMap::new()),
            sources: Arc::new(RwLock::new(LoadedSources::default())),
            loading: Arc::new(DashMap::new()),
            loader,
            classes: Arc::new(classes),
            stats: Arc::new(InnerStats::default()),
        }
    }

    /// Register `alias`, replacing any previous settings for it.
    ///
    /// Only validates and normalizes the record; the source unit is not
    /// touched until the alias is resolved. On error the previous settings
    /// for `alias` are left as they were.
    pub fn set(&self, alias: &str, raw: RawSettings) -> Result<(), RegistryError> {
        let settings = AliasSettings::from_raw(alias, raw)?;

        tracing::debug!(
            alias,
            class_name = %settings.class_name,
            path = %settings.source_path.display(),
            singleton = settings.is_singleton,
            "Registered alias"
        );

        self.settings.write().insert(alias.to_string(), settings);
        Ok(())
    }

    /// Register several aliases in order, stopping at the first invalid one.
    /// Entries before the failing one stay registered.
    pub fn register_all<I, K>(&self, entries: I) -> Result<usize, RegistryError>
    where
        I: IntoIterator<Item = (K, RawSettings)>,
        K: AsRef<str>,
    {
        let mut count = 0;
        for (alias, raw) in entries {
            self.set(alias.as_ref(), raw)?;
            count += 1;
        }
        Ok(count)
    }

    /// Resolve `alias` with its registered constructor arguments.
    pub fn get(&self, alias: &str) -> Result<Instance, RegistryError> {
        self.resolve(alias, None)
    }

    /// Resolve `alias` with `args` instead of the registered arguments.
    ///
    /// Singleton aliases ignore `args`: they are always built from the
    /// registered arguments, and only once.
    pub fn get_with_args(&self, alias: &str, args: Vec<Value>) -> Result<Instance, RegistryError> {
        self.resolve(alias, Some(args.as_slice()))
    }

    /// Resolve `alias` and downcast the instance to `T`.
    pub fn get_as<T: Send + Sync + 'static>(&self, alias: &str) -> Result<Arc<T>, RegistryError> {
        let instance = self.get(alias)?;
        instance
            .downcast::<T>()
            .ok_or_else(|| RegistryError::Instantiation {
                alias: alias.to_string(),
                class_name: instance.class_name().to_string(),
                source: ConstructError::TypeMismatch(std::any::type_name::<T>()),
            })
    }

    /// Resolve `alias`. `args_override`, when present (even if empty),
    /// replaces the registered arguments for transient aliases.
    pub fn resolve(
        &self,
        alias: &str,
        args_override: Option<&[Value]>,
    ) -> Result<Instance, RegistryError> {
        let settings = self.lookup(alias)?;
        self.require_source(alias, &settings)?;
        self.stats.resolutions.fetch_add(1, Ordering::Relaxed);

        if settings.is_singleton {
            return self.resolve_singleton(alias, &settings);
        }

        let args = args_override.unwrap_or(&settings.constructor_args);
        self.build(alias, &settings, args)
    }

    /// Look up `alias` and make sure its source unit loads and defines the
    /// configured class, without constructing anything.
    pub fn verify(&self, alias: &str) -> Result<AliasSettings, RegistryError> {
        let settings = self.lookup(alias)?;
        self.require_source(alias, &settings)?;
        Ok(settings)
    }

    pub fn settings(&self, alias: &str) -> Option<AliasSettings> {
        self.settings.read().get(alias).cloned()
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.settings.read().contains_key(alias)
    }

    /// Registered aliases, sorted.
    pub fn aliases(&self) -> Vec<String> {
        let mut aliases: Vec<String> = self.settings.read().keys().cloned().collect();
        aliases.sort();
        aliases
    }

    /// Whether a singleton instance is cached for `alias`.
    pub fn is_cached(&self, alias: &str) -> bool {
        self.singletons
            .get(alias)
            .is_some_and(|slot| slot.instance.get().is_some())
    }

    /// Drop the cached singleton for `alias`, if any. The next resolution
    /// constructs a fresh instance from the current settings. A construction
    /// still in flight when the slot is evicted is returned to its caller
    /// but not cached.
    pub fn evict_singleton(&self, alias: &str) -> bool {
        let evicted = self
            .singletons
            .remove(alias)
            .is_some_and(|(_, slot)| slot.instance.get().is_some());
        if evicted {
            tracing::debug!(alias, "Evicted cached singleton");
        }
        evicted
    }

    /// Whether the unit at `path` has been loaded by this registry.
    pub fn is_loaded(&self, path: &Path) -> bool {
        self.sources.read().paths.contains(path)
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            resolutions: self.stats.resolutions.load(Ordering::Relaxed),
            singleton_hits: self.stats.singleton_hits.load(Ordering::Relaxed),
            constructions: self.stats.constructions.load(Ordering::Relaxed),
            sources_loaded: self.stats.sources_loaded.load(Ordering::Relaxed),
            registered_aliases: self.settings.read().len(),
            cached_singletons: self.cached_singletons(),
        }
    }

    fn cached_singletons(&self) -> usize {
        self.singletons
            .iter()
            .filter(|slot| slot.value().instance.get().is_some())
            .count()
    }

    fn lookup(&self, alias: &str) -> Result<AliasSettings, RegistryError> {
        self.settings
            .read()
            .get(alias)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownAlias(alias.to_string()))
    }

    /// Existence is checked on every call; the unit itself is loaded once.
    fn require_source(&self, alias: &str, settings: &AliasSettings) -> Result<(), RegistryError> {
        let path = &settings.source_path;

        if !self.loader.exists(path) {
            return Err(RegistryError::SourceNotFound {
                alias: alias.to_string(),
                path: path.clone(),
                reason: "no such unit".to_string(),
            });
        }

        if !self.sources.read().paths.contains(path) {
            self.load_source(alias, path)?;
        }

        if !self.sources.read().classes.contains(&settings.class_name) {
            return Err(RegistryError::ClassNotFound {
                alias: alias.to_string(),
                class_name: settings.class_name.clone(),
                path: path.clone(),
            });
        }

        Ok(())
    }

    /// Loads of the same path are serialized on that path's gate, so a unit
    /// is read once. Resolutions of other paths never wait on it.
    fn load_source(&self, alias: &str, path: &Path) -> Result<(), RegistryError> {
        let gate = Arc::clone(&self.loading.entry(path.to_path_buf()).or_default());
        let _loading = gate.lock();

        if self.sources.read().paths.contains(path) {
            return Ok(());
        }

        let unit = self.loader.load(path).map_err(|e| {
            tracing::warn!(alias, path = %path.display(), error = %e, "Failed to load source unit");
            RegistryError::SourceNotFound {
                alias: alias.to_string(),
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        tracing::info!(
            alias,
            path = %path.display(),
            classes = ?unit.classes,
            "Loaded source unit"
        );
        let mut sources = self.sources.write();
        sources.paths.insert(path.to_path_buf());
        sources.classes.extend(unit.classes);
        self.stats.sources_loaded.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// The first construction runs under the alias's own slot lock, so
    /// concurrent first access builds at most one instance without holding
    /// any map guard. Nothing is cached on error.
    fn resolve_singleton(
        &self,
        alias: &str,
        settings: &AliasSettings,
    ) -> Result<Instance, RegistryError> {
        let existing = self.singletons.get(alias).map(|slot| Arc::clone(slot.value()));
        let slot = match existing {
            Some(slot) => slot,
            None => Arc::clone(&self.singletons.entry(alias.to_string()).or_default()),
        };

        if let Some(cached) = slot.instance.get() {
            self.stats.singleton_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached.clone());
        }

        let _init = slot.init.lock();
        if let Some(cached) = slot.instance.get() {
            self.stats.singleton_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached.clone());
        }

        let instance = self.build(alias, settings, &settings.constructor_args)?;
        let instance = slot.instance.get_or_init(|| instance).clone();
        tracing::info!(alias, class_name = %settings.class_name, "Cached singleton instance");
        Ok(instance)
    }

    fn build(
        &self,
        alias: &str,
        settings: &AliasSettings,
        args: &[Value],
    ) -> Result<Instance, RegistryError> {
        let instance = self
            .classes
            .construct(&settings.class_name, args)
            .map_err(|source| RegistryError::Instantiation {
                alias: alias.to_string(),
                class_name: settings.class_name.clone(),
                source,
            })?;

        self.stats.constructions.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(alias, class_name = %settings.class_name, args = args.len(), "Constructed instance");
        Ok(instance)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(ClassTable::new())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("aliases", &self.aliases())
            .field("classes", &self.classes)
            .field("cached_singletons", &self.cached_singletons())
            .finish_non_exhaustive()
    }
}

/// Counters since the registry was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStats {
    /// Resolutions whose alias was known and whose unit defined the class.
    /// Lookup and source failures are not counted.
    pub resolutions: usize,
    pub singleton_hits: usize,
    pub constructions: usize,
    pub sources_loaded: usize,
    pub registered_aliases: usize,
    pub cached_singletons: usize,
}

impl RegistryStats {
    /// Share of resolutions served from the singleton cache.
    pub fn hit_rate(&self) -> f64 {
        if self.resolutions == 0 {
            0.0
        } else {
            self.singleton_hits as f64 / self.resolutions as f64
        }
    }
}
