//! MCP (Model Context Protocol) Server
//!
//! Exposes megg memory via MCP tools for AI integration.
//!
//! # Tools
//! - `context` - Identity chain, knowledge and state for a path
//! - `learn` - Append a knowledge entry
//! - `init` - Analyze a directory or create its scope
//! - `maintain` - Knowledge health report
//! - `state` - Session handoff state

mod handlers;
mod jsonrpc;
mod server;
mod state;
mod tools;

pub use server::{run_mcp_server, McpServer};
