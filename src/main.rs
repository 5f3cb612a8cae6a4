mod args;

use anyhow::Context;
use clap::Parser;
use std::io;
use std::process::ExitCode;

use aliasdi::config::ConfigLoader;
use aliasdi::handlers::{build_registry, check_aliases, list_aliases, register_aliases};
use aliasdi::logging::init_logging;
use aliasdi::registry::ClassTable;

use args::{Args, Command};

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::with_path(path.clone()),
        None => ConfigLoader::new(),
    };
    let mut config = loader
        .load_config()
        .with_context(|| format!("failed to load {}", loader.config_path().display()))?;
    if let Some(base_dir) = args.base_dir.clone() {
        config.registry.base_dir = Some(base_dir);
    }

    init_logging(&config.logging)?;

    // The binary has no class factories; it only registers and verifies.
    let registry = build_registry(&config, ClassTable::new());
    let invalid = register_aliases(&registry, &config);
    for e in &invalid {
        eprintln!("❌ {}", e);
    }
    let mut failures = invalid.len();

    let mut stdout = io::stdout().lock();
    match args.command {
        Command::List { json } => list_aliases(&registry, json, &mut stdout)?,
        Command::Check { aliases } => failures += check_aliases(&registry, aliases, &mut stdout)?,
    }

    if failures > 0 {
        eprintln!("{} alias(es) failed", failures);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
