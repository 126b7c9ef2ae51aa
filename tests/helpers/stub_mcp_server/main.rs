//! Stub MCP server binary for integration tests
//!
//! This binary implements a minimal, cooperative MCP server that
//! communicates over stdin/stdout using newline-delimited JSON. It is used
//! exclusively by integration tests to exercise the probe without requiring
//! a real external MCP server.
//!
//! # Handled Methods
//!
//! - `initialize` -- echoes the client's `protocolVersion` back and reports
//!   a `tools` capability.
//! - `initialized` -- a notification; swallowed silently (no response).
//! - `capabilities.get` -- returns the same capability set as `initialize`.
//! - `tools/list` -- returns one tool: `"echo"` with a string `message`
//!   parameter.
//! - `tools/call` with `name: "echo"` -- echoes back the `message` argument.
//! - All other methods -- returns a JSON-RPC `-32601 Method not found` error.
//!
//! # Environment
//!
//! `STUB_CALL_DELAY_MS` delays the `tools/call` response by the given number
//! of milliseconds, so tests can exercise the probe's timeout path.

use std::io::{self, BufRead, Write};
use std::time::Duration;

fn main() {
    let call_delay = std::env::var("STUB_CALL_DELAY_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let request: serde_json::Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(_) => {
                let response = serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": null,
                    "error": { "code": -32700, "message": "Parse error" }
                });
                let _ = writeln!(out, "{}", serde_json::to_string(&response).unwrap());
                let _ = out.flush();
                continue;
            }
        };

        let method = request.get("method").and_then(|m| m.as_str()).unwrap_or("");

        // Notifications get no reply.
        if request.get("id").is_none() {
            continue;
        }
        let id = request.get("id").cloned().unwrap_or(serde_json::Value::Null);

        if method == "tools/call" {
            if let Some(delay) = call_delay {
                std::thread::sleep(delay);
            }
        }

        let response = match method {
            "initialize" => handle_initialize(&id, &request),
            "capabilities.get" => handle_capabilities_get(&id),
            "tools/list" => handle_tools_list(&id),
            "tools/call" => handle_tools_call(&id, &request),
            _ => make_error(&id, -32601, &format!("Method not found: {}", method)),
        };

        let serialized = match serde_json::to_string(&response) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("stub_mcp_server: failed to serialize response: {}", e);
                continue;
            }
        };

        if writeln!(out, "{}", serialized).is_err() {
            break;
        }
        if out.flush().is_err() {
            break;
        }
    }
}

/// Handle the `initialize` request.
///
/// Echoes the client's advertised `protocolVersion` back and advertises a
/// `tools` capability.
fn handle_initialize(id: &serde_json::Value, request: &serde_json::Value) -> serde_json::Value {
    let protocol_version = request
        .get("params")
        .and_then(|p| p.get("protocolVersion"))
        .and_then(|v| v.as_str())
        .unwrap_or("2024-11-05");

    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": {
            "protocolVersion": protocol_version,
            "capabilities": { "tools": {} },
            "serverInfo": { "name": "stub-mcp-server", "version": "0.1.0" }
        }
    })
}

/// Handle the `capabilities.get` request.
fn handle_capabilities_get(id: &serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": { "capabilities": { "tools": {} } }
    })
}

/// Handle the `tools/list` request.
///
/// Returns a single tool named `"echo"` with a `message` string parameter.
fn handle_tools_list(id: &serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": {
            "tools": [
                {
                    "name": "echo",
                    "description": "Echoes input",
                    "inputSchema": {
                        "type": "object",
                        "properties": {
                            "message": { "type": "string" }
                        }
                    }
                }
            ]
        }
    })
}

/// Handle the `tools/call` request.
///
/// If `name` is `"echo"`, returns the value of `arguments.message` as a
/// `Text` content item. For any other tool name, returns a JSON-RPC error.
fn handle_tools_call(id: &serde_json::Value, request: &serde_json::Value) -> serde_json::Value {
    let params = request.get("params").unwrap_or(&serde_json::Value::Null);

    let tool_name = params.get("name").and_then(|n| n.as_str()).unwrap_or("");

    if tool_name != "echo" {
        return make_error(id, -32602, &format!("Unknown tool: {}", tool_name));
    }

    let message = params
        .get("arguments")
        .and_then(|a| a.get("message"))
        .and_then(|m| m.as_str())
        .unwrap_or("");

    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": {
            "content": [
                { "type": "text", "text": message }
            ],
            "isError": false
        }
    })
}

/// Build a JSON-RPC error response.
fn make_error(id: &serde_json::Value, code: i32, message: &str) -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
}
