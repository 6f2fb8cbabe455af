//! `megg maintain` command
//!
//! Reports bloated, stale and duplicated knowledge under a directory.
//! Read-only: suggested actions are for the user or agent to apply.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::config::Config;
use crate::core::maintenance::{analyze, format_maintenance_report};

#[derive(Args, Debug)]
pub struct MaintainArgs {
    /// Root to scan (default: current directory)
    pub path: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: MaintainArgs, config: &Config) -> Result<()> {
    let report = analyze(&super::target_or_cwd(args.path), config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", format_maintenance_report(&report));
    }

    Ok(())
}
