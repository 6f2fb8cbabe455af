//! `megg context` command
//!
//! Loads the identity chain, knowledge and session state for a path.
//!
//! # Usage
//! ```bash
//! megg context                  # Context for the current directory
//! megg context src/api          # Context for a subdirectory
//! megg context --topic auth     # Only entries about auth
//! megg context --json           # SessionStart hook payload
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::config::Config;
use crate::core::context::{
    format_context_for_display, load_context, session_start_payload, ContextRequest,
};

#[derive(Args, Debug)]
pub struct ContextArgs {
    /// Path to load context for (default: current directory)
    pub path: Option<PathBuf>,

    /// Only entries matching this topic
    #[arg(short, long)]
    pub topic: Option<String>,

    /// Print the SessionStart hook payload as JSON
    #[arg(long)]
    pub json: bool,

    /// Include root identity and the memory map
    #[arg(long)]
    pub orient: bool,
}

pub fn run(args: ContextArgs, config: &Config) -> Result<()> {
    let request = ContextRequest::new(super::target_or_cwd(args.path))
        .with_topic(args.topic)
        .with_orientation(args.orient);
    let result = load_context(&request, config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&session_start_payload(&result))?);
        return Ok(());
    }

    let text = format_context_for_display(&result);
    if text.is_empty() {
        println!(
            "No memory found for {}. Run 'megg init' to create it.",
            result.target.display()
        );
    } else {
        println!("{}", text);
    }

    Ok(())
}
