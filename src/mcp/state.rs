//! MCP Server state management

use std::path::PathBuf;

use ulid::Ulid;

use crate::config::Config;

/// MCP Server state - holds all runtime data
pub struct ServerState {
    pub config: Config,
    /// Whether client has sent initialize
    pub initialized: bool,
    /// Unique session ID for this MCP connection
    pub session_id: String,
    /// Whether this session has been given orientation yet
    oriented: bool,
}

impl ServerState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            initialized: false,
            session_id: format!("mcp-{}", Ulid::new()),
            oriented: false,
        }
    }

    /// Orientation is given with the first successful context load
    pub fn needs_orientation(&self) -> bool {
        !self.oriented
    }

    pub fn mark_oriented(&mut self) {
        self.oriented = true;
    }

    /// Tool path argument, or the working directory
    pub fn resolve_path(&self, path: Option<&str>) -> PathBuf {
        path.filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
