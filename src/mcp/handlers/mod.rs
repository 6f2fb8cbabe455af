//! MCP Tool handlers
//!
//! Each module handles a group of related tools.

pub mod knowledge;
pub mod lifecycle;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::state::ServerState;

/// Result type for tool handlers
pub type ToolResult = Result<String, String>;

/// Dispatch a tool call to the appropriate handler
pub fn dispatch_tool(state: &mut ServerState, name: &str, args: &Value) -> ToolResult {
    match name {
        // Knowledge tools
        "context" => knowledge::do_context(state, args),
        "learn" => knowledge::do_learn(state, args),

        // Scope lifecycle tools
        "init" => lifecycle::do_init(state, args),
        "maintain" => lifecycle::do_maintain(state, args),
        "state" => lifecycle::do_state(state, args),

        _ => Err(format!("Unknown tool: {}", name)),
    }
}

/// Deserialize tool arguments; a missing argument object counts as empty
pub(crate) fn parse_args<T: DeserializeOwned>(args: &Value) -> Result<T, String> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args.clone()
    };
    serde_json::from_value(args).map_err(|e| format!("Invalid params: {}", e))
}
