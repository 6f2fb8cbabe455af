//! `megg scopes` command
//!
//! Lists every scope under a directory with the size of its knowledge.
//!
//! # Usage
//! ```bash
//! megg scopes            # Table of scopes below the current directory
//! megg scopes --map      # Indented memory map instead
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::config::Config;
use crate::core::context::memory_map;
use crate::core::hierarchy::resolve_target;
use crate::core::parser::parse_log;
use crate::core::tokens::format_token_count;

#[derive(Args, Debug)]
pub struct ScopesArgs {
    /// Root to scan (default: current directory)
    pub path: Option<PathBuf>,

    /// Print the memory map instead of a table
    #[arg(long)]
    pub map: bool,
}

#[derive(Tabled)]
struct ScopeRow {
    #[tabled(rename = "Scope")]
    scope: String,
    #[tabled(rename = "Identity")]
    identity: &'static str,
    #[tabled(rename = "Entries")]
    entries: String,
    #[tabled(rename = "Tokens")]
    tokens: String,
    #[tabled(rename = "Other files")]
    files: String,
}

pub fn run(args: ScopesArgs, config: &Config) -> Result<()> {
    let root = resolve_target(&super::target_or_cwd(args.path));

    if args.map {
        println!("{}", memory_map(&root, config));
        return Ok(());
    }

    let locator = config.locator();
    let scopes = locator.find_all_scopes(&root);
    if scopes.is_empty() {
        println!("No {} found under {}", config.scope.marker_dir, root.display());
        return Ok(());
    }

    let rows: Vec<ScopeRow> = scopes
        .iter()
        .map(|scope| {
            let rel = scope
                .dir
                .strip_prefix(&root)
                .ok()
                .map(|p| p.to_string_lossy().into_owned())
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| ".".to_string());

            let (entries, tokens) = match fs::read_to_string(scope.knowledge_path()) {
                Ok(raw) => {
                    let parsed = parse_log(&raw);
                    (
                        parsed.entry_count().to_string(),
                        format_token_count(parsed.token_count),
                    )
                }
                Err(_) => ("-".to_string(), "-".to_string()),
            };

            let files: Vec<String> = scope
                .memory_files(locator.layout())
                .iter()
                .map(|role| locator.layout().file_name(role).to_string())
                .collect();

            ScopeRow {
                scope: rel,
                identity: if scope.has_identity() { "yes" } else { "missing" },
                entries,
                tokens,
                files: files.join(", "),
            }
        })
        .collect();

    println!("{}", format!("Scopes under {}", root.display()).bold());
    println!("{}", Table::new(rows).with(Style::rounded()));
    Ok(())
}
