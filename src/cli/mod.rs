//! CLI module - Command definitions and handlers

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod config;
pub mod context;
pub mod init;
pub mod learn;
pub mod maintain;
pub mod scopes;
pub mod serve;
pub mod state;

/// megg - memory for AI agents
///
/// Hierarchical, file-backed knowledge that lives next to the code it
/// describes.
#[derive(Parser, Debug)]
#[command(name = "megg")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, env = "MEGG_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the context chain and knowledge for a path
    Context(context::ContextArgs),

    /// Record a knowledge entry
    Learn(learn::LearnArgs),

    /// Initialize memory in a directory
    Init(init::InitArgs),

    /// Analyze knowledge health and suggest cleanup
    Maintain(maintain::MaintainArgs),

    /// Read, write or clear session state
    State(state::StateArgs),

    /// List every memory scope under a directory
    Scopes(scopes::ScopesArgs),

    /// Show the effective configuration
    Config(config::ConfigArgs),

    /// Start MCP server on stdio
    Serve(serve::ServeArgs),
}

/// Directory argument or the working directory
pub(crate) fn target_or_cwd(path: Option<PathBuf>) -> PathBuf {
    path.unwrap_or_else(|| PathBuf::from("."))
}
