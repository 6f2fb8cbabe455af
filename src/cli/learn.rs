//! `megg learn` command
//!
//! Appends a knowledge entry to the nearest scope.
//!
//! # Usage
//! ```bash
//! megg learn "Use JWT" decision auth,security "We chose JWT because..."
//! megg learn "Cache gotcha" gotcha cache --file notes.md
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use crate::config::Config;
use crate::core::writer::{append_entry, NewEntry};

#[derive(Args, Debug)]
pub struct LearnArgs {
    /// Short title for the entry
    pub title: String,

    /// Entry type: decision, pattern, gotcha or context
    #[arg(value_name = "TYPE")]
    pub entry_type: String,

    /// Topics (comma-separated)
    pub topics: String,

    /// Entry body
    pub content: Option<String>,

    /// Read the body from a file
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Path inside the target scope (default: current directory)
    #[arg(short, long)]
    pub path: Option<PathBuf>,
}

pub fn run(args: LearnArgs, config: &Config) -> Result<()> {
    let body = match (&args.file, args.content) {
        (Some(file), _) => fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?,
        (None, Some(content)) => content,
        (None, None) => bail!("Entry body is required. Pass it as an argument or use --file."),
    };

    let topics = args.topics.split(',').map(str::trim);
    let entry = NewEntry::new(args.title, args.entry_type, topics, body);
    let outcome = append_entry(&super::target_or_cwd(args.path), &entry, config)?;

    println!(
        "{} Added entry \"{}\" to {}",
        "✓".green(),
        entry.title.trim(),
        outcome.path.display()
    );
    if let Some(warning) = outcome.warning {
        println!("\n{} {}", "⚠️ Warning:".yellow().bold(), warning);
    }

    Ok(())
}
