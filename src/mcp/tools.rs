//! MCP tool argument structs
//!
//! Paths default to the server's working directory when omitted.

use serde::{Deserialize, Serialize};

/// Load context for a path
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ContextTool {
    #[serde(default)]
    pub path: Option<String>,
    /// Only entries matching this topic
    #[serde(default)]
    pub topic: Option<String>,
}

/// Record a knowledge entry
#[derive(Debug, Deserialize, Serialize)]
pub struct LearnTool {
    pub title: String,
    /// decision, pattern, gotcha or context
    #[serde(rename = "type")]
    pub entry_type: String,
    pub topics: Vec<String>,
    pub content: String,
    #[serde(default)]
    pub path: Option<String>,
}

/// Analyze a directory, or create its scope when `info` is given
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct InitTool {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub knowledge: Option<String>,
}

/// Maintenance report for a tree
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct MaintainTool {
    #[serde(default)]
    pub path: Option<String>,
}

/// Read, write or clear session state
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StateTool {
    #[serde(default)]
    pub path: Option<String>,
    /// New state content
    #[serde(default)]
    pub content: Option<String>,
    /// `done` clears the state
    #[serde(default)]
    pub status: Option<String>,
}
