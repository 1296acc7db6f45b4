//! Browser-automation drivers.
//!
//! `CommandDriver` shells out to an external capture tool (a
//! Playwright wrapper in the usual deployment) and parses its stdout
//! into regions. `ScriptedDriver` replays queued snapshots so the
//! streaming stack can be exercised without a browser.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use super::types::UiAction;
use super::{BrowserDriver, DriverError};
use crate::streaming::{CapturedRegion, Snapshot};

const DEFAULT_CAPTURE_TIMEOUT_SECS: u64 = 30;

/// Drives a configured external capture command.
pub struct CommandDriver {
    command: String,
    timeout: Duration,
}

impl CommandDriver {
    pub fn new(command: String) -> Self {
        Self {
            command,
            timeout: Duration::from_secs(DEFAULT_CAPTURE_TIMEOUT_SECS),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<Snapshot, DriverError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(command = %self.command, ?args, "spawning capture command");
        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| DriverError::Timeout(self.timeout.as_secs()))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DriverError::CaptureFailed(stderr.trim().to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let url = args.last().copied().unwrap_or_default();
        Ok(parse_capture_output(url, &stdout))
    }
}

/// The capture tool emits a JSON array of `{selector, content}`
/// objects; anything else is treated as a single opaque body region.
fn parse_capture_output(url: &str, stdout: &str) -> Snapshot {
    match serde_json::from_str::<Vec<CapturedRegion>>(stdout) {
        Ok(regions) => Snapshot::new(url, regions),
        Err(e) => {
            warn!(error = %e, "capture output is not region JSON, wrapping as body");
            Snapshot::new(
                url,
                vec![CapturedRegion {
                    selector: "body".to_string(),
                    content: stdout.to_string(),
                }],
            )
        }
    }
}

#[async_trait]
impl BrowserDriver for CommandDriver {
    async fn capture(&self, url: &str) -> Result<Snapshot, DriverError> {
        self.run(&["capture", url]).await
    }

    async fn perform(&self, url: &str, action: &UiAction) -> Result<Snapshot, DriverError> {
        let action_json = serde_json::to_string(action)
            .map_err(|e| DriverError::CaptureFailed(e.to_string()))?;
        self.run(&["action", &action_json, url]).await
    }
}

/// Always-unavailable driver, used when no capture command is
/// configured.
pub struct UnconfiguredDriver;

#[async_trait]
impl BrowserDriver for UnconfiguredDriver {
    async fn capture(&self, _url: &str) -> Result<Snapshot, DriverError> {
        Err(DriverError::Unavailable)
    }

    async fn perform(&self, _url: &str, _action: &UiAction) -> Result<Snapshot, DriverError> {
        Err(DriverError::Unavailable)
    }
}

/// Replays a queue of canned snapshots, for tests.
pub struct ScriptedDriver {
    snapshots: std::sync::Mutex<std::collections::VecDeque<Snapshot>>,
}

impl ScriptedDriver {
    pub fn new(snapshots: Vec<Snapshot>) -> Self {
        Self {
            snapshots: std::sync::Mutex::new(snapshots.into()),
        }
    }

    fn next(&self) -> Result<Snapshot, DriverError> {
        let mut queue = self
            .snapshots
            .lock()
            .map_err(|_| DriverError::CaptureFailed("snapshot queue poisoned".to_string()))?;
        queue
            .pop_front()
            .ok_or_else(|| DriverError::CaptureFailed("snapshot queue exhausted".to_string()))
    }
}

#[async_trait]
impl BrowserDriver for ScriptedDriver {
    async fn capture(&self, _url: &str) -> Result<Snapshot, DriverError> {
        self.next()
    }

    async fn perform(&self, _url: &str, _action: &UiAction) -> Result<Snapshot, DriverError> {
        self.next()
    }
}
