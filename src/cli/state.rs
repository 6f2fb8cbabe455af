//! `megg state` command
//!
//! # Usage
//! ```bash
//! megg state                         # Show current session state
//! megg state --set "Next: wire up"   # Overwrite it
//! megg state --done                  # Clear it
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::config::Config;
use crate::core::error::MemoryError;
use crate::core::state::{
    clear_state, format_state_for_display, read_state, validate_state, write_state,
};

#[derive(Args, Debug)]
pub struct StateArgs {
    /// Path inside the target scope (default: current directory)
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Replace the state with this content
    #[arg(long, conflicts_with = "done")]
    pub set: Option<String>,

    /// Mark the session done and remove the state
    #[arg(long)]
    pub done: bool,
}

pub fn run(args: StateArgs, config: &Config) -> Result<()> {
    let target = super::target_or_cwd(args.path);

    if args.done {
        let outcome = clear_state(&target, config)?;
        match outcome.warning {
            Some(warning) => println!("{} {}", "Warning:".yellow(), warning),
            None => println!("{} State cleared", "✓".green()),
        }
        return Ok(());
    }

    if let Some(content) = args.set {
        let outcome = write_state(&target, &content, config)?;
        if let Some(state) = &outcome.state {
            println!(
                "{} State saved to {} ({} tokens)",
                "✓".green(),
                state.path.display(),
                state.tokens
            );
        }
        if let Some(warning) = outcome.warning {
            println!("{} {}", "Warning:".yellow(), warning);
        }
        return Ok(());
    }

    let state = read_state(&target, config)?;
    if state.is_none() {
        if let Err(e @ MemoryError::MalformedContent { .. }) = validate_state(&target, config) {
            println!("{} {}", "Warning:".yellow(), e);
        }
    }
    println!("{}", format_state_for_display(state.as_ref()));
    Ok(())
}
