//! MCP Server implementation for megg
//!
//! Implements the Model Context Protocol (JSON-RPC 2.0) over stdio
//! directly, without an SDK. One request per line in, one response per
//! line out. Logs go to stderr.

use std::io::{BufRead, BufReader, Write};

use serde_json::{json, Value};
use tracing::{debug, info, info_span, warn};

use super::handlers::dispatch_tool;
use super::jsonrpc::{
    JsonRpcRequest, JsonRpcResponse, INVALID_PARAMS, METHOD_NOT_FOUND, PARSE_ERROR,
};
use super::state::ServerState;
use crate::config::Config;

const PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP Server handler
pub struct McpServer {
    state: ServerState,
}

impl McpServer {
    pub fn new(config: Config) -> Self {
        Self {
            state: ServerState::new(config),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.state.session_id
    }

    /// Handle a JSON-RPC request
    pub fn handle_request(&mut self, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        // Notifications (no id) don't get responses
        let Some(id) = request.id.clone() else {
            match request.method.as_str() {
                "notifications/initialized" => {
                    self.state.initialized = true;
                    info!("Client initialized");
                }
                "notifications/cancelled" => debug!("Request cancelled"),
                other => debug!(method = other, "Unknown notification"),
            }
            return None;
        };

        let result = match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize()),
            "tools/list" => Ok(Self::tool_list()),
            "tools/call" => self.handle_call_tool(&request.params),
            "ping" => Ok(json!({})),
            _ => Err((
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            )),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err((code, msg)) => JsonRpcResponse::error(id, code, msg),
        })
    }

    fn handle_initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {
                    "listChanged": false
                }
            },
            "serverInfo": {
                "name": "megg",
                "version": env!("CARGO_PKG_VERSION")
            },
            "instructions": "megg is hierarchical memory for this project. Call context when starting work somewhere, learn to record decisions, patterns and gotchas, and maintain when knowledge is reported as bloated."
        })
    }

    fn tool_list() -> Value {
        json!({
            "tools": [
                {
                    "name": "context",
                    "description": "Load the identity chain, knowledge and session state for a path. Knowledge comes back in full, as a summary, or BLOCKED when the log is too large; when blocked, run maintain or pass a topic instead of reading the file.",
                    "inputSchema": {
                        "type": "object",
                        "properties": {
                            "path": { "type": "string", "description": "Directory or file to load context for (default: working directory)" },
                            "topic": { "type": "string", "description": "Only return entries matching this topic" }
                        }
                    }
                },
                {
                    "name": "learn",
                    "description": "Append a knowledge entry to the nearest memory scope.",
                    "inputSchema": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "description": "Short title" },
                            "type": { "type": "string", "enum": ["decision", "pattern", "gotcha", "context"] },
                            "topics": { "type": "array", "items": { "type": "string" }, "description": "At least one topic tag" },
                            "content": { "type": "string", "description": "Entry body in Markdown" },
                            "path": { "type": "string", "description": "Path inside the target scope" }
                        },
                        "required": ["title", "type", "topics", "content"]
                    }
                },
                {
                    "name": "init",
                    "description": "Without info: analyze a directory and return questions to ask. With info: create the memory scope.",
                    "inputSchema": {
                        "type": "object",
                        "properties": {
                            "path": { "type": "string" },
                            "info": { "type": "string", "description": "Identity content (Markdown)" },
                            "knowledge": { "type": "string", "description": "Optional initial knowledge" }
                        }
                    }
                },
                {
                    "name": "maintain",
                    "description": "Report bloated, stale and duplicated knowledge under a directory with suggested actions. Never modifies files.",
                    "inputSchema": {
                        "type": "object",
                        "properties": {
                            "path": { "type": "string", "description": "Root to scan" }
                        }
                    }
                },
                {
                    "name": "state",
                    "description": "Session handoff state. No arguments reads it, content overwrites it, status \"done\" clears it. Expires after 48 hours.",
                    "inputSchema": {
                        "type": "object",
                        "properties": {
                            "path": { "type": "string" },
                            "content": { "type": "string" },
                            "status": { "type": "string", "enum": ["done"] }
                        }
                    }
                }
            ]
        })
    }

    fn handle_call_tool(&mut self, params: &Value) -> Result<Value, (i64, String)> {
        let name = params["name"]
            .as_str()
            .ok_or((INVALID_PARAMS, "Missing tool name".to_string()))?;
        let arguments = &params["arguments"];

        debug!(tool = name, "Tool call");
        let result = dispatch_tool(&mut self.state, name, arguments);

        Ok(match result {
            Ok(text) => json!({
                "content": [{
                    "type": "text",
                    "text": text
                }]
            }),
            Err(e) => {
                warn!(tool = name, error = %e, "Tool failed");
                json!({
                    "content": [{
                        "type": "text",
                        "text": e
                    }],
                    "isError": true
                })
            }
        })
    }
}

/// Run the MCP server with STDIO transport
pub fn run_mcp_server(config: Config) -> anyhow::Result<()> {
    let mut server = McpServer::new(config);
    let span = info_span!("mcp", session = %server.session_id());
    let _enter = span.enter();
    info!("MCP server starting");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let reader = BufReader::new(stdin.lock());

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
            Ok(request) => server.handle_request(&request),
            Err(e) => Some(JsonRpcResponse::error(
                Value::Null,
                PARSE_ERROR,
                format!("Parse error: {}", e),
            )),
        };

        if let Some(response) = response {
            writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
            stdout.flush()?;
        }
    }

    info!("MCP server stopping");
    Ok(())
}
