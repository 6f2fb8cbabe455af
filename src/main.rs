//! megg CLI - Entry point
//!
//! Usage: megg <command> [options]

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use megg::cli::{Cli, Commands};
use megg::config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command output and MCP traffic
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let (config, source) = Config::load_with_source(cli.config.as_deref())?;
    debug!(source = %source, "Loaded config");

    match cli.command {
        Commands::Context(args) => megg::cli::context::run(args, &config),
        Commands::Learn(args) => megg::cli::learn::run(args, &config),
        Commands::Init(args) => megg::cli::init::run(args, &config),
        Commands::Maintain(args) => megg::cli::maintain::run(args, &config),
        Commands::State(args) => megg::cli::state::run(args, &config),
        Commands::Scopes(args) => megg::cli::scopes::run(args, &config),
        Commands::Config(args) => megg::cli::config::run(args, &config, &source),
        Commands::Serve(args) => megg::cli::serve::run(args, config),
    }
}
