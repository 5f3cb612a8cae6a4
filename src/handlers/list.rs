use std::collections::BTreeMap;
use std::io::Write;

use crate::errors::AppError;
use crate::registry::{AliasSettings, Registry};

/// Print every registered alias with its normalized settings, sorted by alias.
pub fn list_aliases(registry: &Registry, json: bool, out: &mut impl Write) -> Result<(), AppError> {
    let entries: BTreeMap<String, AliasSettings> = registry
        .aliases()
        .into_iter()
        .filter_map(|alias| registry.settings(&alias).map(|s| (alias, s)))
        .collect();

    if json {
        serde_json::to_writer_pretty(&mut *out, &entries)?;
        writeln!(out)?;
        return Ok(());
    }

    for (alias, settings) in &entries {
        writeln!(
            out,
            "{:<20} {} ({}){}{}",
            alias,
            settings.class_name,
            settings.source_path.display(),
            if settings.is_singleton { " [singleton]" } else { "" },
            if settings.constructor_args.is_empty() {
                String::new()
            } else {
                format!(" args={}", serde_json::Value::from(settings.constructor_args.clone()))
            },
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RawSettings;
    use serde_json::json;

    fn registry() -> Registry {
        let registry = Registry::default();
        registry
            .set(
                "mailer",
                RawSettings::new("Mailer", "mail.toml")
                    .with_args(vec![json!("smtp.local")])
                    .singleton(true),
            )
            .unwrap();
        registry.set("clock", RawSettings::new("Clock", "clock")).unwrap();
        registry
    }

    #[test]
    fn test_list_text_shows_normalized_settings() {
        let mut out = Vec::new();
        list_aliases(&registry(), false, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("clock"));
        assert!(lines[0].contains("Clock (clock.toml)"));
        assert!(lines[1].contains("Mailer (mail.toml) [singleton] args=[\"smtp.local\"]"));
    }

    #[test]
    fn test_list_json_uses_config_vocabulary() {
        let mut out = Vec::new();
        list_aliases(&registry(), true, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(
            value["mailer"],
            json!({
                "className": "Mailer",
                "path": "mail.toml",
                "args": ["smtp.local"],
                "singleton": true
            })
        );
        assert_eq!(value["clock"]["path"], "clock.toml");
    }
}
