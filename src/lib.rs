//! `aliasdi` — an alias-based dependency injection registry.
//!
//! Register an alias that points at a class name and the source unit that
//! defines it, then resolve the alias into a constructed [`Instance`]:
//!
//! ```no_run
//! use aliasdi::{ClassTable, ConstructArgs, RawSettings, Registry};
//!
//! struct Mailer {
//!     host: String,
//! }
//!
//! let classes = ClassTable::new().with("Mailer", |args: ConstructArgs<'_>| {
//!     args.expect_len(1..=1)?;
//!     Ok(Mailer { host: args.str(0)?.to_string() })
//! });
//!
//! let registry = Registry::with_base_dir(classes, "units");
//! registry
//!     .set("mailer", RawSettings::new("Mailer", "mail").with_args(vec!["smtp.local".into()]).singleton(true))
//!     .unwrap();
//!
//! let mailer = registry.get_as::<Mailer>("mailer").unwrap();
//! assert_eq!(mailer.host, "smtp.local");
//! ```

pub mod config;
pub mod errors;
pub mod handlers;
pub mod logging;
pub mod registry;

// Re-export commonly used items for convenience
pub use config::AppConfig;
pub use errors::{AppError, ConstructError, RegistryError};
pub use registry::{
    AliasSettings, ClassTable, ConstructArgs, Instance, RawSettings, Registry, RegistryStats,
};
