//! `megg config` command
//!
//! Shows the effective configuration and where it was loaded from.
//!
//! # Usage
//! ```bash
//! megg config                          # Show all config
//! megg config knowledge.full_threshold # Get specific value
//! megg config --path                   # Show config file locations
//! megg config --init                   # Write defaults for this scope or user
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use crate::config::{Config, ConfigSource, CONFIG_FILE_NAME};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Config key (e.g., knowledge.full_threshold, scope.marker_dir)
    pub key: Option<String>,

    /// Show config file locations
    #[arg(long)]
    pub path: bool,

    /// Write the default configuration into the enclosing scope, or the
    /// per-user config file outside any scope
    #[arg(long)]
    pub init: bool,

    /// Overwrite an existing file with --init
    #[arg(short, long)]
    pub force: bool,
}

pub fn run(args: ConfigArgs, config: &Config, source: &ConfigSource) -> Result<()> {
    let cwd = std::env::current_dir()?;

    if args.path {
        if let Some(global) = Config::global_config_path() {
            println!("Global: {}", global.display());
        }
        match config.locator().find_nearest_scope(&cwd) {
            Some(scope) => println!("Local:  {}", scope.marker.join(CONFIG_FILE_NAME).display()),
            None => println!("Local:  {}", "(no enclosing scope)".dimmed()),
        }
        println!();
        println!("{} Active: {}", "✓".green(), source);
        return Ok(());
    }

    if args.init {
        let path = init_target(config, &cwd)?;
        if path.exists() && !args.force {
            bail!("{} already exists. Use --force to overwrite.", path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, Config::default().to_toml()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{} Wrote default configuration to {}", "✓".green(), path.display());
        return Ok(());
    }

    if let Some(key) = &args.key {
        match lookup(config, key)? {
            Some(value) => println!("{}", value),
            None => bail!("Unknown config key: {}", key),
        }
        return Ok(());
    }

    println!("{}", format!("Configuration ({})", source).bold());
    println!();
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Marker of the scope enclosing `cwd`, else the per-user file.
/// Never creates a marker directory.
fn init_target(config: &Config, cwd: &Path) -> Result<PathBuf> {
    if let Some(scope) = config.locator().find_nearest_scope(cwd) {
        return Ok(scope.marker.join(CONFIG_FILE_NAME));
    }
    Config::global_config_path().context("Could not determine the user config directory")
}

/// Dotted-key lookup over the serialized configuration
fn lookup(config: &Config, key: &str) -> Result<Option<String>> {
    let mut current = toml::Value::try_from(config)?;
    for part in key.split('.') {
        current = match current.get(part) {
            Some(value) => value.clone(),
            None => return Ok(None),
        };
    }

    Ok(Some(match current {
        toml::Value::String(s) => s,
        other => other.to_string(),
    }))
}
