//! End-to-end tests that drive the server over an in-memory transport
//! exactly as an MCP client would over stdio.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{
    AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf,
};
use tokio::task::JoinHandle;

use studio_mcp::streaming::{CapturedRegion, Snapshot};
use studio_mcp::{ProjectAnalyzer, ScriptedDriver, SessionManager, StreamingConfig, StudioServer};

mod server_tests;

pub fn snapshot(url: &str, regions: &[(&str, &str)]) -> Snapshot {
    Snapshot::new(
        url,
        regions
            .iter()
            .map(|(selector, content)| CapturedRegion {
                selector: selector.to_string(),
                content: content.to_string(),
            })
            .collect(),
    )
}

/// A server whose browser driver replays `snapshots` in order.
pub fn scripted_server(snapshots: Vec<Snapshot>) -> StudioServer {
    StudioServer::with_components(
        Arc::new(ProjectAnalyzer::new(std::env::temp_dir())),
        Arc::new(ScriptedDriver::new(snapshots)),
        Arc::new(SessionManager::new(StreamingConfig::default())),
    )
}

/// Feed raw bytes to a server over an in-memory pipe and collect every
/// line it writes back, parsed as JSON.
pub async fn exchange(server: StudioServer, input: &[u8]) -> Vec<Value> {
    let (client, service) = tokio::io::duplex(256 * 1024);
    let (service_read, service_write) = tokio::io::split(service);
    let (mut client_read, mut client_write) = tokio::io::split(client);

    let serve = tokio::spawn(async move { server.serve(service_read, service_write).await });

    client_write
        .write_all(input)
        .await
        .expect("write request bytes");
    client_write.shutdown().await.expect("close client side");

    let mut output = Vec::new();
    client_read
        .read_to_end(&mut output)
        .await
        .expect("read responses");
    serve.await.expect("serve task").expect("serve result");

    String::from_utf8(output)
        .expect("responses are UTF-8")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("response line is JSON"))
        .collect()
}

/// Lock-step client: sends one request at a time and waits for its
/// response, for tests where call order matters.
pub struct Client {
    reader: BufReader<ReadHalf<DuplexStream>>,
    writer: WriteHalf<DuplexStream>,
    serve: JoinHandle<Result<(), studio_mcp::ServerError>>,
}

impl Client {
    pub fn start(server: StudioServer) -> Self {
        let (client, service) = tokio::io::duplex(256 * 1024);
        let (service_read, service_write) = tokio::io::split(service);
        let (client_read, client_write) = tokio::io::split(client);
        let serve = tokio::spawn(async move { server.serve(service_read, service_write).await });
        Self {
            reader: BufReader::new(client_read),
            writer: client_write,
            serve,
        }
    }

    /// Send one request line and read its response.
    pub async fn request(&mut self, line: &str) -> Value {
        self.writer
            .write_all(line.as_bytes())
            .await
            .expect("write request");
        let mut response = String::new();
        self.reader
            .read_line(&mut response)
            .await
            .expect("read response");
        serde_json::from_str(&response).expect("response line is JSON")
    }

    pub async fn finish(mut self) {
        self.writer.shutdown().await.expect("close client side");
        self.serve.await.expect("serve task").expect("serve result");
    }
}

/// Wrap a request body in Content-Length framing.
pub fn content_length_frame(body: &str) -> Vec<u8> {
    format!("Content-Length: {}\r\n\r\n{}", body.len(), body).into_bytes()
}

/// The text of the first content block of a `tools/call` result.
pub fn result_text(response: &Value) -> &str {
    response["result"]["content"][0]["text"]
        .as_str()
        .expect("tool result has text content")
}
