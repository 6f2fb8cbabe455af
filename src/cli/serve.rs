//! Serve command - Start MCP server

use anyhow::Result;
use clap::Args;

use crate::config::Config;

/// Start MCP server for AI integration
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Transport mode (only stdio is supported)
    #[arg(long, default_value = "stdio")]
    pub transport: String,
}

pub fn run(args: ServeArgs, config: Config) -> Result<()> {
    if args.transport != "stdio" {
        anyhow::bail!("Unknown transport: {}. Use 'stdio'.", args.transport);
    }

    eprintln!("🚀 Starting MCP server (transport: stdio)");
    crate::mcp::run_mcp_server(config)
}
