//! Knowledge handlers for MCP

use serde_json::Value;
use tracing::debug;

use super::{parse_args, ToolResult};
use crate::core::context::{format_context_for_display, load_context, ContextRequest};
use crate::core::writer::{append_entry, NewEntry};
use crate::mcp::state::ServerState;
use crate::mcp::tools::{ContextTool, LearnTool};

/// Load context; the session's first load also carries orientation
pub fn do_context(state: &mut ServerState, args: &Value) -> ToolResult {
    let tool_args: ContextTool = parse_args(args)?;
    let orientation = state.needs_orientation();

    let request = ContextRequest::new(state.resolve_path(tool_args.path.as_deref()))
        .with_topic(tool_args.topic)
        .with_orientation(orientation);
    let result = load_context(&request, &state.config).map_err(|e| e.to_string())?;

    if orientation {
        debug!(session = %state.session_id, "Session oriented");
        state.mark_oriented();
    }

    let text = format_context_for_display(&result);
    if text.is_empty() {
        return Ok(format!(
            "No memory found for {}. Use init to create it.",
            result.target.display()
        ));
    }
    Ok(text)
}

/// Append a knowledge entry
pub fn do_learn(state: &mut ServerState, args: &Value) -> ToolResult {
    let tool_args: LearnTool = parse_args(args)?;
    let target = state.resolve_path(tool_args.path.as_deref());

    let entry = NewEntry::new(
        tool_args.title,
        tool_args.entry_type,
        tool_args.topics,
        tool_args.content,
    );
    let outcome = append_entry(&target, &entry, &state.config).map_err(|e| e.to_string())?;

    let mut text = format!(
        "✓ Added entry \"{}\" to {}",
        entry.title.trim(),
        outcome.path.display()
    );
    if let Some(warning) = outcome.warning {
        text.push_str(&format!("\n\n⚠️ Warning: {}", warning));
    }
    Ok(text)
}
