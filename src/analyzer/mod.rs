//! Boundary collaborators.
//!
//! The concrete introspection analyzers and the browser-automation
//! driver live behind these traits; the protocol core only depends on
//! the seam. `ProjectAnalyzer` ships a best-effort filesystem
//! implementation, `CommandDriver` shells out to a configured capture
//! command, and `ScriptedDriver` replays canned snapshots for tests.

pub mod browser;
pub mod project;
pub mod types;

use async_trait::async_trait;

use crate::streaming::Snapshot;
use types::*;

/// Read-only codebase/database introspection.
///
/// Implementations are expected to bound their own latency; handlers
/// do not impose timeouts on these calls.
#[async_trait]
pub trait CodeAnalyzer: Send + Sync {
    async fn database_schema(&self) -> Vec<Table>;
    async fn database_stats(&self) -> DatabaseStats;
    async fn api_routes(&self) -> Vec<Route>;
    async fn data_models(&self) -> Vec<DataModel>;
    async fn request_handlers(&self) -> Vec<HandlerInfo>;
    async fn services(&self) -> Vec<Service>;
    async fn interfaces(&self) -> Vec<InterfaceDefinition>;
    async fn implementations_of(&self, interface: &str) -> Vec<Implementation>;
    async fn call_graph(&self, root: &str) -> Vec<CallGraphNode>;
    async fn config_fields(&self) -> Vec<ConfigField>;
    async fn middleware_list(&self) -> Vec<MiddlewareInfo>;
    async fn env_vars(&self) -> Vec<EnvVar>;
    async fn search(&self, query: &str) -> Vec<SearchResult>;
    async fn package_structure(&self) -> Vec<PackageNode>;
    async fn dependencies(&self) -> Vec<Dependency>;
}

/// Errors from the browser-automation driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("no browser capture command configured")]
    Unavailable,

    #[error("capture command failed: {0}")]
    CaptureFailed(String),

    #[error("capture command timed out after {0}s")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Produces raw UI snapshots, already segmented into regions.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Load `url` and capture the resulting UI state.
    async fn capture(&self, url: &str) -> Result<Snapshot, DriverError>;

    /// Perform one UI action in the context of `url` and capture the
    /// state that follows it.
    async fn perform(&self, url: &str, action: &UiAction) -> Result<Snapshot, DriverError>;
}
