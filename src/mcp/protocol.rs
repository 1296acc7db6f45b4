//! JSON-RPC 2.0 message structures for the MCP wire protocol.
//!
//! Defines the envelope shapes exchanged with MCP clients plus the
//! tool-call result shapes. Requests carry an integer `id`; messages
//! without an id are notifications and never receive a response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MCP protocol version reported by `initialize`.
pub const MCP_VERSION: &str = "2024-11-05";

/// JSON-RPC 2.0 request or notification.
///
/// A populated `id` marks a request; an absent `id` marks a notification.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Notifications carry no id and must never be answered.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 response.
///
/// The `id` field is always serialized; the synthetic parse-error
/// response is the one case where it is `null`.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Create a successful response.
    pub fn success(id: Option<i64>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<i64>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
        }
    }

    /// The synthetic response for malformed JSON: parse error with a
    /// null id, since no request id could be correlated.
    pub fn parse_error(detail: String) -> Self {
        Self::error(None, error_codes::PARSE_ERROR, format!("Parse error: {}", detail))
    }
}

/// Parameters of a `tools/call` request.
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Map<String, Value>,
}

/// Result payload of a `tools/call` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

/// A single content block inside a tool result.
#[derive(Debug, Serialize, Deserialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

impl ToolCallResult {
    /// Wrap human-readable text in the standard content envelope.
    pub fn text(text: String) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text,
            }],
            is_error: false,
        }
    }

    /// Wrap a domain-level failure. This is a *successful* JSON-RPC
    /// response whose content reports the problem; callers distinguish
    /// it from protocol errors.
    pub fn error(message: String) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text: format!("Error: {}", message),
            }],
            is_error: true,
        }
    }
}

/// `initialize` result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
}

#[derive(Debug, Serialize)]
pub struct ServerCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    pub list_changed: bool,
}

#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    /// Invalid JSON was received by the server.
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON sent is not a valid Request object.
    #[allow(dead_code)]
    pub const INVALID_REQUEST: i32 = -32600;
    /// The requested method doesn't exist.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Method exists but parameters are malformed.
    pub const INVALID_PARAMS: i32 = -32602;
    /// Any uncaught handler failure.
    pub const INTERNAL_ERROR: i32 = -32000;
}
