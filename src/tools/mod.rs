//! Tool handlers.
//!
//! Every tool has a typed argument struct decoded at the boundary and
//! returns `Result<ToolReply, ToolError>`. The wire adapter at the
//! bottom folds both sides into the `tools/call` result shape: tool
//! errors travel as successful envelopes whose content carries the
//! error text, so callers can tell "the RPC failed" apart from "the
//! tool ran and reported a problem".

pub mod browser;
pub mod code;
pub mod database;
pub mod interactive;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

use crate::analyzer::{BrowserDriver, CodeAnalyzer};
use crate::mcp::protocol::ToolCallResult;
use crate::streaming::{SessionManager, StreamingError};

/// Everything a tool handler may touch.
#[derive(Clone)]
pub struct ToolContext {
    pub analyzer: Arc<dyn CodeAnalyzer>,
    pub browser: Arc<dyn BrowserDriver>,
    pub streaming: Arc<SessionManager>,
}

/// Domain-level tool failures. These are reported inside a successful
/// `tools/call` result, never as JSON-RPC protocol errors.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Streaming(#[from] StreamingError),

    #[error("{0}")]
    Failed(String),
}

impl From<crate::analyzer::DriverError> for ToolError {
    fn from(e: crate::analyzer::DriverError) -> Self {
        ToolError::Failed(e.to_string())
    }
}

/// What a successful tool run produced.
#[derive(Debug)]
pub enum ToolReply {
    /// Human-readable summary text.
    Text(String),
    /// A structured payload, serialized into the text content slot.
    Json(Value),
}

impl ToolReply {
    /// Structured reply, or a fallback message when serialization of
    /// the payload itself fails.
    pub fn json<T: serde::Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => ToolReply::Json(v),
            Err(e) => ToolReply::Text(format!("serialization failed: {}", e)),
        }
    }
}

/// Decode a tool's argument object into its typed parameter struct.
fn decode_args<T: DeserializeOwned>(arguments: Map<String, Value>) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(arguments))
        .map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Route one `tools/call` to its handler. `shutdown` flips when the
/// connection is winding down; long-running tools observe it and
/// answer early instead of being abandoned.
pub async fn dispatch(
    ctx: &ToolContext,
    name: &str,
    arguments: Map<String, Value>,
    shutdown: watch::Receiver<bool>,
) -> Result<ToolReply, ToolError> {
    debug!(tool = name, "dispatching tool call");
    match name {
        // Database
        "get_database_schema" => database::get_database_schema(ctx).await,
        "get_database_stats" => database::get_database_stats(ctx).await,
        "get_backend_openapi_schema" => database::get_backend_openapi_schema(ctx).await,

        // Code analysis
        "get_backend_data_models" => code::get_backend_data_models(ctx).await,
        "get_backend_api_routes" => code::get_backend_api_routes(ctx).await,
        "get_backend_request_handlers" => code::get_backend_request_handlers(ctx).await,
        "get_backend_services" => code::get_backend_services(ctx).await,
        "get_interfaces" => code::get_interfaces(ctx).await,
        "find_implementations" => code::find_implementations(ctx, decode_args(arguments)?).await,
        "get_call_graph" => code::get_call_graph(ctx, decode_args(arguments)?).await,

        // Configuration
        "get_config" => code::get_config(ctx).await,
        "get_middleware" => code::get_middleware(ctx).await,
        "get_env_vars" => code::get_env_vars(ctx).await,

        // Search and structure
        "search_code" => code::search_code(ctx, decode_args(arguments)?).await,
        "get_package_structure" => code::get_package_structure(ctx).await,
        "get_dependencies" => code::get_dependencies(ctx).await,
        "get_dependency_graph" => code::get_dependency_graph(ctx).await,

        // Interactive
        "run_terminal_command" => {
            interactive::run_terminal_command(decode_args(arguments)?, shutdown).await
        }

        // Browser / streaming
        "browse_with_playwright" => {
            browser::browse_with_playwright(ctx, decode_args(arguments)?).await
        }
        "browse_with_playwright_incremental" => {
            browser::browse_incremental(ctx, decode_args(arguments)?).await
        }
        "process_ui_action_incremental" => {
            browser::process_ui_action(ctx, decode_args(arguments)?).await
        }
        "get_incremental_ui_state" => browser::get_ui_state(ctx, decode_args(arguments)?).await,
        "set_streaming_mode" => browser::set_streaming_mode(ctx, decode_args(arguments)?).await,
        "get_stream_stats" => browser::get_stream_stats(ctx, decode_args(arguments)?).await,
        "cleanup_incremental_session" => {
            browser::cleanup_session(ctx, decode_args(arguments)?).await
        }
        "get_incremental_debug_info" => browser::get_debug_info(ctx, decode_args(arguments)?).await,

        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}

/// Fold a handler outcome into the `tools/call` result shape.
pub fn into_call_result(outcome: Result<ToolReply, ToolError>) -> ToolCallResult {
    match outcome {
        Ok(ToolReply::Text(text)) => ToolCallResult::text(text),
        Ok(ToolReply::Json(value)) => {
            let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
            ToolCallResult::text(text)
        }
        Err(e) => ToolCallResult::error(e.to_string()),
    }
}
