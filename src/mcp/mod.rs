//! MCP protocol layer: wire shapes, framing, the tool catalog, and the
//! request loop.

pub mod framing;
pub mod protocol;
pub mod registry;
pub mod server;

pub use registry::ToolRegistry;
pub use server::McpServer;
