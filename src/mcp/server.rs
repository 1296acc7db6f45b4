//! The JSON-RPC read loop and request dispatcher.
//!
//! One task reads frames; each request is handled on its own task from
//! a bounded pool, with a shared writer lock serializing responses.
//! Responses are always written line-delimited regardless of the
//! framing the client used. On shutdown the pool is drained, not
//! abandoned, so every in-flight request still writes its response.

use std::sync::Arc;

use futures::FutureExt;
use serde_json::json;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{watch, Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::framing::{read_frame, Frame};
use super::protocol::{
    error_codes, InitializeResult, JsonRpcRequest, JsonRpcResponse, ServerCapabilities, ServerInfo,
    ToolCallParams, ToolCallResult, ToolsCapability, MCP_VERSION,
};
use super::registry::ToolRegistry;
use crate::tools::{self, ToolContext};

/// Upper bound on concurrently executing request handlers.
const MAX_CONCURRENT_REQUESTS: usize = 32;

/// Methods handled on the worker pool. The lifecycle methods
/// (`shutdown`, `exit`) control the read loop itself and are
/// intercepted there; they never reach the pool. Anything else is
/// `MethodNotFound` for requests and silence for notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Initialize,
    Initialized,
    ToolsList,
    ToolsCall,
}

impl Method {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "initialize" => Some(Method::Initialize),
            "notifications/initialized" => Some(Method::Initialized),
            "tools/list" => Some(Method::ToolsList),
            "tools/call" => Some(Method::ToolsCall),
            _ => None,
        }
    }
}

/// Ties the tool handlers and the catalog to one client connection.
pub struct McpServer {
    ctx: ToolContext,
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    pub fn new(ctx: ToolContext, registry: Arc<ToolRegistry>) -> Self {
        Self { ctx, registry }
    }

    /// Serve one connection until EOF, `exit`, or a transport failure.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> std::io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let mut reader = BufReader::new(reader);
        let writer = Arc::new(Mutex::new(writer));
        let permits = Arc::new(Semaphore::new(MAX_CONCURRENT_REQUESTS));
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let mut tasks: JoinSet<()> = JoinSet::new();

        info!(tools = self.registry.len(), "serving MCP connection");

        loop {
            let payload = match read_frame(&mut reader).await {
                Ok(Frame::Message(payload)) => payload,
                Ok(Frame::Eof) => {
                    debug!("client closed the connection");
                    break;
                }
                Err(e) => {
                    // A broken transport has no request to answer;
                    // close without inventing an envelope.
                    warn!(error = %e, "framing error, closing connection");
                    break;
                }
            };

            let request: JsonRpcRequest = match serde_json::from_slice(&payload) {
                Ok(request) => request,
                Err(e) => {
                    // No id can be correlated with malformed JSON, so a
                    // null-id parse error goes out and the connection ends.
                    warn!(error = %e, "malformed request, closing connection");
                    write_response(&writer, &JsonRpcResponse::parse_error(e.to_string())).await;
                    break;
                }
            };

            // Lifecycle methods are handled inline; everything else runs
            // on the pool.
            match request.method.as_str() {
                "exit" => {
                    debug!("exit received");
                    if !request.is_notification() {
                        write_response(&writer, &JsonRpcResponse::success(request.id, json!(null)))
                            .await;
                    }
                    // Long-running handlers observe the token and wind
                    // down early; their responses still go out during
                    // the drain below.
                    let _ = cancel_tx.send(true);
                    break;
                }
                "shutdown" => {
                    if !request.is_notification() {
                        write_response(&writer, &JsonRpcResponse::success(request.id, json!(null)))
                            .await;
                    }
                    continue;
                }
                _ => {}
            }

            let permit = match permits.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break, // semaphore closed, not reachable in practice
            };
            let ctx = self.ctx.clone();
            let registry = Arc::clone(&self.registry);
            let writer = Arc::clone(&writer);
            let cancel = cancel_rx.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let id = request.id;
                let notification = request.is_notification();
                // Panic isolation only: the handler is never raced
                // against shutdown, so each request keeps its exactly
                // one response.
                let handler = handle_request(&ctx, &registry, request, cancel);
                let response = match std::panic::AssertUnwindSafe(handler).catch_unwind().await {
                    Ok(response) => response,
                    Err(_) => {
                        error!("request handler panicked");
                        // A panicked notification still stays silent;
                        // a request gets its one response.
                        (!notification)
                            .then(|| internal_error(id, "handler panicked".to_string()))
                    }
                };
                if let Some(response) = response {
                    write_response(&writer, &response).await;
                }
            });

            // Reap finished tasks without blocking the read loop.
            while tasks.try_join_next().is_some() {}
        }

        // Drain, not abandon: serve returns only after every spawned
        // handler has written its response.
        while tasks.join_next().await.is_some() {}
        info!("MCP connection closed");
        Ok(())
    }
}

/// Handle one pooled request or notification. `None` means no response
/// goes out (notifications, including unknown ones).
async fn handle_request(
    ctx: &ToolContext,
    registry: &ToolRegistry,
    request: JsonRpcRequest,
    cancel: watch::Receiver<bool>,
) -> Option<JsonRpcResponse> {
    let method = match Method::from_name(&request.method) {
        Some(method) => method,
        None => {
            if request.is_notification() {
                debug!(method = %request.method, "dropping unknown notification");
                return None;
            }
            return Some(JsonRpcResponse::error(
                request.id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ));
        }
    };

    if request.is_notification() {
        // Only lifecycle notifications are meaningful; all are silent.
        debug!(method = %request.method, "notification received");
        return None;
    }

    let response = match method {
        Method::Initialize => handle_initialize(request.id),
        Method::Initialized => JsonRpcResponse::success(request.id, json!(null)),
        Method::ToolsList => handle_tools_list(registry, request.id),
        Method::ToolsCall => handle_tools_call(ctx, registry, request, cancel).await,
    };
    Some(response)
}

fn handle_initialize(id: Option<i64>) -> JsonRpcResponse {
    let result = InitializeResult {
        protocol_version: MCP_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability {
                list_changed: false,
            }),
        },
        server_info: ServerInfo {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    };
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => internal_error(id, e.to_string()),
    }
}

fn handle_tools_list(registry: &ToolRegistry, id: Option<i64>) -> JsonRpcResponse {
    match serde_json::to_value(registry.descriptors()) {
        Ok(tools) => JsonRpcResponse::success(id, json!({ "tools": tools })),
        Err(e) => internal_error(id, e.to_string()),
    }
}

async fn handle_tools_call(
    ctx: &ToolContext,
    registry: &ToolRegistry,
    request: JsonRpcRequest,
    cancel: watch::Receiver<bool>,
) -> JsonRpcResponse {
    let params: ToolCallParams = match serde_json::from_value(request.params.unwrap_or(json!({}))) {
        Ok(params) => params,
        Err(e) => {
            return JsonRpcResponse::error(
                request.id,
                error_codes::INVALID_PARAMS,
                format!("Invalid params: {}", e),
            )
        }
    };

    let result = if !registry.contains(&params.name) {
        ToolCallResult::error(format!("Unknown tool: {}", params.name))
    } else {
        tools::into_call_result(
            tools::dispatch(ctx, &params.name, params.arguments, cancel).await,
        )
    };
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(request.id, value),
        Err(e) => internal_error(request.id, e.to_string()),
    }
}

fn internal_error(id: Option<i64>, detail: String) -> JsonRpcResponse {
    JsonRpcResponse::error(
        id,
        error_codes::INTERNAL_ERROR,
        format!("Internal error: {}", detail),
    )
}

/// Serialize and write one line-delimited response under the writer
/// lock, so concurrent handlers never interleave bytes.
async fn write_response<W>(writer: &Arc<Mutex<W>>, response: &JsonRpcResponse)
where
    W: AsyncWrite + Unpin,
{
    let mut line = match serde_json::to_string(response) {
        Ok(line) => line,
        Err(e) => {
            error!(error = %e, "failed to serialize response");
            return;
        }
    };
    line.push('\n');
    let mut writer = writer.lock().await;
    if let Err(e) = writer.write_all(line.as_bytes()).await {
        error!(error = %e, "failed to write response");
        return;
    }
    if let Err(e) = writer.flush().await {
        error!(error = %e, "failed to flush response");
    }
}
