//! Public library interface for the Studio MCP server.
//!
//! Exposes project introspection, terminal execution, and incremental
//! browser-state streaming as MCP tools over JSON-RPC on stdin/stdout.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};

pub mod analyzer;
pub mod mcp;
pub mod streaming;
pub mod tools;

pub use analyzer::browser::{CommandDriver, ScriptedDriver, UnconfiguredDriver};
pub use analyzer::project::ProjectAnalyzer;
pub use analyzer::{BrowserDriver, CodeAnalyzer, DriverError};
pub use mcp::{McpServer, ToolRegistry};
pub use streaming::{SessionManager, StreamingConfig, StreamingMode};
pub use tools::ToolContext;

/// Errors that can occur during server operation.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// How to assemble a [`StudioServer`].
pub struct ServerConfig {
    /// Root of the project tree the analyzer introspects.
    pub project_root: PathBuf,
    /// External browser capture command; unset means browser tools
    /// report unavailability.
    pub browser_command: Option<String>,
    pub streaming: StreamingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            browser_command: None,
            streaming: StreamingConfig::default(),
        }
    }
}

/// The assembled server: analyzer, browser driver, streaming manager,
/// and tool catalog behind one handle.
pub struct StudioServer {
    ctx: ToolContext,
    registry: Arc<ToolRegistry>,
}

impl StudioServer {
    pub fn new(config: ServerConfig) -> Self {
        let browser: Arc<dyn BrowserDriver> = match config.browser_command {
            Some(command) => Arc::new(CommandDriver::new(command)),
            None => Arc::new(UnconfiguredDriver),
        };
        Self::with_components(
            Arc::new(ProjectAnalyzer::new(config.project_root)),
            browser,
            Arc::new(SessionManager::new(config.streaming)),
        )
    }

    /// Assemble from explicit components, used by tests to substitute
    /// scripted drivers.
    pub fn with_components(
        analyzer: Arc<dyn CodeAnalyzer>,
        browser: Arc<dyn BrowserDriver>,
        streaming: Arc<SessionManager>,
    ) -> Self {
        Self {
            ctx: ToolContext {
                analyzer,
                browser,
                streaming,
            },
            registry: Arc::new(ToolRegistry::new()),
        }
    }

    /// The streaming manager handle, for the idle-eviction sweep.
    pub fn streaming(&self) -> Arc<SessionManager> {
        Arc::clone(&self.ctx.streaming)
    }

    /// Serve MCP over stdin/stdout until the client disconnects.
    pub async fn run(&self) -> Result<(), ServerError> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve MCP over an arbitrary transport.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<(), ServerError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let server = McpServer::new(self.ctx.clone(), Arc::clone(&self.registry));
        server.serve(reader, writer).await?;
        Ok(())
    }
}
