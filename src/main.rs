//! Entry point for the Studio MCP server.
//!
//! Sets up logging, parses command line arguments, starts the idle
//! session sweep, and serves JSON-RPC over stdin/stdout.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use studio_mcp::{ServerConfig, StreamingConfig, StudioServer};

/// How often idle streaming sessions are swept.
const EVICTION_INTERVAL_SECS: u64 = 60;

/// Command line arguments for the Studio MCP server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Root of the project tree to analyze. Defaults to the current
    /// directory.
    #[arg(long)]
    project_root: Option<PathBuf>,

    /// External command used to capture browser UI state. Browser
    /// tools report unavailability when unset.
    #[arg(long)]
    browser_command: Option<String>,

    /// Fraction of the full snapshot size above which adaptive mode
    /// forces a resync.
    #[arg(long, default_value_t = 0.5)]
    adaptive_threshold: f64,

    /// Seconds of inactivity after which a streaming session is evicted.
    #[arg(long, default_value_t = 600)]
    session_idle_secs: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("studio_mcp={}", log_level))
        .with_writer(std::io::stderr) // Logs must not pollute the protocol stream
        .init();

    info!("Starting Studio MCP server");

    let project_root = match args.project_root {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    info!("Analyzing project at: {}", project_root.display());

    let server = StudioServer::new(ServerConfig {
        project_root,
        browser_command: args.browser_command,
        streaming: StreamingConfig {
            adaptive_threshold: args.adaptive_threshold,
            idle_timeout: Duration::from_secs(args.session_idle_secs),
        },
    });

    // Background sweep for abandoned streaming sessions.
    let streaming = server.streaming();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(EVICTION_INTERVAL_SECS));
        loop {
            ticker.tick().await;
            let evicted = streaming.evict_idle().await;
            if evicted > 0 {
                info!(evicted, "evicted idle streaming sessions");
            }
        }
    });

    server.run().await?;

    info!("Studio MCP server shutdown complete");
    Ok(())
}
