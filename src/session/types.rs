//! Shared types for the session client.
//!
//! JSON-RPC 2.0 message types and the MCP structures exchanged with the
//! remote tool server.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::SessionError;

// ─── Protocol Constants ──────────────────────────────────────────────────────

/// MCP protocol version sent with `sessions/create`.
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Header carrying the session id, on requests and on the create response.
pub const SESSION_HEADER: &str = "Mcp-Session-Id";

/// Header the runtime uses to echo its request id.
pub const REQUEST_ID_HEADER: &str = "x-amzn-requestid";

/// JSON-RPC method names.
pub mod methods {
    pub const SESSIONS_CREATE: &str = "sessions/create";
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
}

/// Fixed request ids, one per method.
pub mod request_ids {
    pub const SESSIONS_CREATE: u64 = 1;
    pub const TOOLS_LIST: u64 = 2;
    pub const TOOLS_CALL: u64 = 3;
}

// ─── JSON-RPC 2.0 ───────────────────────────────────────────────────────────

/// JSON-RPC 2.0 request message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC request.
    pub fn new(id: u64, method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method: method.to_string(),
            params,
        }
    }

    /// `sessions/create` with the fixed protocol version.
    pub fn create_session() -> Self {
        Self::new(
            request_ids::SESSIONS_CREATE,
            methods::SESSIONS_CREATE,
            Some(serde_json::json!({ "protocolVersion": PROTOCOL_VERSION })),
        )
    }

    /// `tools/list`, no params.
    pub fn list_tools() -> Self {
        Self::new(request_ids::TOOLS_LIST, methods::TOOLS_LIST, None)
    }

    /// `tools/call` for one named tool.
    pub fn call_tool(name: &str, arguments: &ToolArguments) -> Self {
        Self::new(
            request_ids::TOOLS_CALL,
            methods::TOOLS_CALL,
            Some(serde_json::json!({
                "name": name,
                "arguments": arguments,
            })),
        )
    }
}

/// JSON-RPC 2.0 response message (success or error).
///
/// `jsonrpc` and `id` are optional: some gateways strip them from error
/// bodies and the caller only cares about `result` / `error`.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    #[allow(dead_code)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

// ─── MCP Protocol Types ──────────────────────────────────────────────────────

/// Tool arguments: a string-keyed mapping of JSON values.
pub type ToolArguments = Map<String, Value>;

/// A remote tool as enumerated by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "inputSchema", alias = "input_schema")]
    pub input_schema: Value,
}

/// `result` payload of `tools/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListToolsResult {
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
}

/// One content block of a `tools/call` result.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlock {
    #[serde(default)]
    pub text: Option<String>,
}

/// `result` payload of `tools/call`.
#[derive(Debug, Clone, Deserialize)]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl CallToolResult {
    /// Text of the first content block, the primary result of a call.
    pub fn primary_text(&self) -> Option<&str> {
        self.content.first().and_then(|c| c.text.as_deref())
    }
}

/// A queued tool call: name plus arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: ToolArguments,
}

impl ToolInvocation {
    /// Build an invocation from a JSON value, which must be an object (or null).
    pub fn new(name: &str, arguments: Value) -> Result<Self, SessionError> {
        let arguments = match arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(SessionError::InvalidArguments {
                    tool: name.to_string(),
                    reason: format!("arguments must be a JSON object, got {other}"),
                })
            }
        };
        Ok(Self {
            name: name.to_string(),
            arguments,
        })
    }
}

/// Result of a tool call execution.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallResult {
    pub tool_name: String,
    pub success: bool,
    /// `result.content[0].text`, when present.
    pub text: Option<String>,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub execution_time_ms: u64,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
