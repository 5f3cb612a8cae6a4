use std::io::Write;

use crate::errors::AppError;
use crate::logging::OperationTimer;
use crate::registry::Registry;

/// Verify `requested` aliases, or every registered alias when empty.
/// Returns how many failed.
pub fn check_aliases(
    registry: &Registry,
    requested: Vec<String>,
    out: &mut impl Write,
) -> Result<usize, AppError> {
    let timer = OperationTimer::new("check");
    let targets = if requested.is_empty() {
        registry.aliases()
    } else {
        requested
    };

    let mut failures = 0;
    for alias in &targets {
        match registry.verify(alias) {
            Ok(settings) => writeln!(
                out,
                "✅ {} -> {} ({})",
                alias,
                settings.class_name,
                settings.source_path.display()
            )?,
            Err(e) => {
                writeln!(out, "❌ {}", e)?;
                failures += 1;
            }
        }
    }

    writeln!(
        out,
        "checked {} alias(es), loaded {} source unit(s)",
        targets.len(),
        registry.stats().sources_loaded
    )?;
    timer.finish();
    Ok(failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::handlers::{build_registry, register_aliases};
    use crate::registry::{ClassTable, RawSettings};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn demo_config() -> AppConfig {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/aliasdi.toml");
        AppConfig::load_from(path).unwrap()
    }

    #[test]
    fn test_check_demo_config_reports_broken_alias() {
        let config = demo_config();
        let registry = build_registry(&config, ClassTable::new());
        assert!(register_aliases(&registry, &config).is_empty());

        let mut out = Vec::new();
        let failures = check_aliases(&registry, vec![], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(failures, 1);
        assert!(text.contains("class 'Sprocket' not found (alias: 'broken'"));
        assert!(text.contains("✅ normal -> Widget (widget.toml)"));
        assert!(text.contains("checked 4 alias(es), loaded 1 source unit(s)"));
    }

    #[test]
    fn test_check_selected_aliases_only() {
        let config = demo_config();
        let registry = build_registry(&config, ClassTable::new());
        register_aliases(&registry, &config);

        let mut out = Vec::new();
        let failures =
            check_aliases(&registry, vec!["normal".into(), "singleton".into()], &mut out).unwrap();
        assert_eq!(failures, 0);
        // Verification never constructs, so no singleton is cached.
        assert!(!registry.is_cached("singleton"));
    }

    #[test]
    fn test_check_clean_config_passes() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("clock.toml"), "classes = [\"Clock\"]\n").unwrap();

        let mut config = AppConfig::default();
        config.registry.base_dir = Some(temp_dir.path().to_path_buf());
        config
            .aliases
            .insert("clock".to_string(), RawSettings::new("Clock", "clock"));

        let registry = build_registry(&config, ClassTable::new());
        assert!(register_aliases(&registry, &config).is_empty());

        let mut out = Vec::new();
        assert_eq!(check_aliases(&registry, vec![], &mut out).unwrap(), 0);
    }

    #[test]
    fn test_check_unknown_and_missing_aliases_fail() {
        let temp_dir = TempDir::new().unwrap();
        let registry = Registry::with_base_dir(ClassTable::new(), temp_dir.path());
        registry.set("gone", RawSettings::new("Clock", "clock")).unwrap();

        let mut out = Vec::new();
        let failures =
            check_aliases(&registry, vec!["gone".into(), "nope".into()], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(failures, 2);
        assert!(text.contains("alias 'nope' is not defined"));
    }
}
