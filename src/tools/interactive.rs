//! Terminal command execution.

use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tokio::sync::watch;
use tracing::debug;

use super::{ToolError, ToolReply};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_OUTPUT_BYTES: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCommandParams {
    pub command: String,
    #[serde(default)]
    pub working_dir: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Run a shell command, bounded by a timeout and by the connection's
/// shutdown signal. Cancellation produces a tool error reply, so the
/// request still receives its one response.
pub async fn run_terminal_command(
    params: RunCommandParams,
    mut shutdown: watch::Receiver<bool>,
) -> Result<ToolReply, ToolError> {
    if params.command.trim().is_empty() {
        return Err(ToolError::InvalidArguments(
            "command must not be empty".to_string(),
        ));
    }
    let timeout_secs = params.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);

    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(&params.command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &params.working_dir {
        cmd.current_dir(dir);
    }

    debug!(command = %params.command, timeout_secs, "running terminal command");
    let output = tokio::select! {
        result = tokio::time::timeout(Duration::from_secs(timeout_secs), cmd.output()) => result
            .map_err(|_| ToolError::Failed(format!("command timed out after {}s", timeout_secs)))?
            .map_err(|e| ToolError::Failed(format!("failed to run command: {}", e)))?,
        _ = shutdown.changed() => {
            debug!(command = %params.command, "command cancelled during shutdown");
            return Err(ToolError::Failed("command cancelled during shutdown".to_string()));
        }
    };

    let mut text = format!(
        "exit code: {}\n",
        output.status.code().map_or_else(|| "signal".to_string(), |c| c.to_string())
    );
    if !output.stdout.is_empty() {
        text.push_str("stdout:\n");
        text.push_str(&truncated(&output.stdout));
        text.push('\n');
    }
    if !output.stderr.is_empty() {
        text.push_str("stderr:\n");
        text.push_str(&truncated(&output.stderr));
        text.push('\n');
    }
    Ok(ToolReply::Text(text))
}

fn truncated(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    if text.len() <= MAX_OUTPUT_BYTES {
        return text.into_owned();
    }
    let mut end = MAX_OUTPUT_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n... (output truncated)", &text[..end])
}
