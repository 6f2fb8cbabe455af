//! Scope lifecycle handlers for MCP: init, maintain, state

use serde_json::Value;

use super::{parse_args, ToolResult};
use crate::core::init::{analyze_project, format_init_analysis};
use crate::core::maintenance::{analyze, format_maintenance_report};
use crate::core::state::{clear_state, format_state_for_display, read_state, write_state};
use crate::core::writer::init_scope;
use crate::mcp::state::ServerState;
use crate::mcp::tools::{InitTool, MaintainTool, StateTool};

/// Analyze a directory, or create its scope when identity content is given
pub fn do_init(state: &mut ServerState, args: &Value) -> ToolResult {
    let tool_args: InitTool = parse_args(args)?;
    let root = state.resolve_path(tool_args.path.as_deref());

    match tool_args.info {
        Some(info) => {
            let marker = init_scope(&root, &info, tool_args.knowledge.as_deref(), &state.config)
                .map_err(|e| e.to_string())?;
            Ok(format!("✓ megg initialized in {}", marker.display()))
        }
        None => Ok(format_init_analysis(&analyze_project(&root, &state.config))),
    }
}

pub fn do_maintain(state: &mut ServerState, args: &Value) -> ToolResult {
    let tool_args: MaintainTool = parse_args(args)?;
    let root = state.resolve_path(tool_args.path.as_deref());
    Ok(format_maintenance_report(&analyze(&root, &state.config)))
}

/// No content reads, `content` overwrites, `status: done` clears
pub fn do_state(state: &mut ServerState, args: &Value) -> ToolResult {
    let tool_args: StateTool = parse_args(args)?;
    let target = state.resolve_path(tool_args.path.as_deref());

    if let Some(status) = tool_args.status.as_deref() {
        if status != "done" {
            return Err(format!(
                "Invalid input (status): \"{}\" is not supported. Use \"done\" to clear state.",
                status
            ));
        }
        let outcome = clear_state(&target, &state.config).map_err(|e| e.to_string())?;
        return Ok(match outcome.warning {
            Some(warning) => format!("Warning: {}", warning),
            None => "✓ State cleared".to_string(),
        });
    }

    if let Some(content) = tool_args.content {
        let outcome = write_state(&target, &content, &state.config).map_err(|e| e.to_string())?;
        let mut text = format_state_for_display(outcome.state.as_ref());
        if let Some(warning) = outcome.warning {
            text = format!("Warning: {}\n\n{}", warning, text);
        }
        return Ok(text);
    }

    let current = read_state(&target, &state.config).map_err(|e| e.to_string())?;
    Ok(format_state_for_display(current.as_ref()))
}
