//! The streaming session manager.
//!
//! Owns the session table and all savings accounting. Two concurrent
//! tool calls may reference the same session id (a capture racing a
//! cleanup), so every operation takes the table lock; a cleanup that
//! wins the race leaves a tombstone and the losing capture observes
//! "session not found" instead of resurrecting stale state.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::session::{
    delta_byte_size, diff_regions, tokens_for_bytes, CaptureKind, CaptureResponse, ModeChange,
    SessionState, Snapshot, StreamSession, StreamStats, StreamingMode,
};

/// Tunables for the manager.
#[derive(Debug, Clone)]
pub struct StreamingConfig {
    /// Fraction of the full snapshot size above which an adaptive
    /// delta is discarded in favor of a forced resync.
    pub adaptive_threshold: f64,
    /// Sessions idle longer than this are removed by the sweep.
    pub idle_timeout: Duration,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            adaptive_threshold: 0.5,
            idle_timeout: Duration::from_secs(600),
        }
    }
}

/// Session-level failures, reported to clients on the tool-error
/// channel rather than as protocol errors.
#[derive(Debug, Error)]
pub enum StreamingError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("No active streaming sessions")]
    NoSessions,
}

#[derive(Default)]
struct ManagerState {
    sessions: HashMap<String, StreamSession>,
    /// Ids retired by explicit cleanup; captures must not recreate them.
    retired: HashSet<String>,
}

/// Owns every streaming session for the process lifetime.
pub struct SessionManager {
    config: StreamingConfig,
    state: Mutex<ManagerState>,
}

impl SessionManager {
    pub fn new(config: StreamingConfig) -> Self {
        Self {
            config,
            state: Mutex::new(ManagerState::default()),
        }
    }

    /// Record a capture for `session_id`, creating the session when the
    /// id is fresh. The first capture is always a full snapshot.
    pub async fn record_capture(
        &self,
        session_id: &str,
        requested_mode: Option<StreamingMode>,
        snapshot: Snapshot,
    ) -> Result<CaptureResponse, StreamingError> {
        let mut state = self.state.lock().await;
        if state.retired.contains(session_id) {
            return Err(StreamingError::SessionNotFound(session_id.to_string()));
        }

        if !state.sessions.contains_key(session_id) {
            let mode = requested_mode.unwrap_or(StreamingMode::Adaptive);
            let mut session =
                StreamSession::new(session_id.to_string(), snapshot.url.clone(), mode);
            let full_size = snapshot.byte_size();
            session.full_equivalent_bytes += full_size;
            session.actual_bytes_sent += full_size;
            session.last_snapshot = Some(snapshot.clone());
            session.touch();
            info!(session_id, mode = %mode, "created streaming session");
            state.sessions.insert(session_id.to_string(), session);

            return Ok(CaptureResponse {
                kind: CaptureKind::Initial,
                session_id: session_id.to_string(),
                mode,
                token_savings: 0,
                url: Some(snapshot.url),
                regions: None,
                forced_resync: false,
            });
        }

        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| StreamingError::SessionNotFound(session_id.to_string()))?;
        if let Some(mode) = requested_mode {
            session.set_mode(mode);
        }
        Ok(apply_snapshot(session, snapshot, &self.config))
    }

    /// Record the snapshot that resulted from a UI action. Unlike a
    /// capture this never creates a session.
    pub async fn record_action(
        &self,
        session_id: &str,
        snapshot: Snapshot,
    ) -> Result<CaptureResponse, StreamingError> {
        let mut state = self.state.lock().await;
        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| StreamingError::SessionNotFound(session_id.to_string()))?;
        Ok(apply_snapshot(session, snapshot, &self.config))
    }

    /// The URL the session started at, for drivers that replay actions.
    pub async fn session_url(&self, session_id: &str) -> Result<String, StreamingError> {
        let state = self.state.lock().await;
        state
            .sessions
            .get(session_id)
            .map(|s| s.start_url.clone())
            .ok_or_else(|| StreamingError::SessionNotFound(session_id.to_string()))
    }

    pub async fn session_state(&self, session_id: &str) -> Result<SessionState, StreamingError> {
        let state = self.state.lock().await;
        let session = state
            .sessions
            .get(session_id)
            .ok_or_else(|| StreamingError::SessionNotFound(session_id.to_string()))?;
        Ok(SessionState {
            session_id: session.session_id.clone(),
            url: session.start_url.clone(),
            mode: session.mode,
            total_changes: session.total_changes,
            bytes_saved: session.bytes_saved,
            tokens_saved: session.tokens_saved,
            created_at: session.created_at,
            last_activity_at: session.last_activity,
        })
    }

    pub async fn set_mode(
        &self,
        session_id: &str,
        mode: StreamingMode,
    ) -> Result<(), StreamingError> {
        let mut state = self.state.lock().await;
        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| StreamingError::SessionNotFound(session_id.to_string()))?;
        session.set_mode(mode);
        session.touch();
        Ok(())
    }

    /// Savings metrics for one session, or aggregated over all live
    /// sessions when no id is given.
    pub async fn stats(&self, session_id: Option<&str>) -> Result<StreamStats, StreamingError> {
        let state = self.state.lock().await;
        match session_id {
            Some(id) => {
                let session = state
                    .sessions
                    .get(id)
                    .ok_or_else(|| StreamingError::SessionNotFound(id.to_string()))?;
                Ok(StreamStats {
                    session_id: Some(session.session_id.clone()),
                    streaming_mode: Some(session.mode),
                    total_deltas: session.deltas_sent,
                    tokens_saved: session.tokens_saved,
                    compression_ratio: session.compression_ratio(),
                    session_duration_secs: session.duration_secs(),
                    active_sessions: 1,
                })
            }
            None => {
                if state.sessions.is_empty() {
                    return Err(StreamingError::NoSessions);
                }
                let mut total_deltas = 0;
                let mut tokens_saved = 0;
                let mut full_equivalent = 0u64;
                let mut actual_sent = 0u64;
                let mut longest = 0.0f64;
                for session in state.sessions.values() {
                    total_deltas += session.deltas_sent;
                    tokens_saved += session.tokens_saved;
                    full_equivalent += session.full_equivalent_bytes;
                    actual_sent += session.actual_bytes_sent;
                    longest = longest.max(session.duration_secs());
                }
                let compression_ratio = if actual_sent == 0 || full_equivalent == actual_sent {
                    1.0
                } else {
                    full_equivalent as f64 / actual_sent as f64
                };
                Ok(StreamStats {
                    session_id: None,
                    streaming_mode: None,
                    total_deltas,
                    tokens_saved,
                    compression_ratio,
                    session_duration_secs: longest,
                    active_sessions: state.sessions.len(),
                })
            }
        }
    }

    /// Internal counters and mode history. Never includes snapshot
    /// payloads, only their sizes.
    pub async fn debug_info(&self, session_id: &str) -> Result<DebugInfo, StreamingError> {
        let state = self.state.lock().await;
        let session = state
            .sessions
            .get(session_id)
            .ok_or_else(|| StreamingError::SessionNotFound(session_id.to_string()))?;
        Ok(DebugInfo {
            session_id: session.session_id.clone(),
            url: session.start_url.clone(),
            mode: session.mode,
            mode_history: session.mode_history.clone(),
            total_changes: session.total_changes,
            deltas_sent: session.deltas_sent,
            bytes_saved: session.bytes_saved,
            tokens_saved: session.tokens_saved,
            full_equivalent_bytes: session.full_equivalent_bytes,
            actual_bytes_sent: session.actual_bytes_sent,
            forced_resyncs: session.forced_resyncs,
            has_snapshot: session.last_snapshot.is_some(),
            snapshot_bytes: session
                .last_snapshot
                .as_ref()
                .map(|s| s.byte_size())
                .unwrap_or(0),
            created_at: session.created_at,
            last_activity_at: session.last_activity,
        })
    }

    /// Release the session and tombstone its id. Later references to
    /// the id fail with "session not found"; they never recreate it.
    pub async fn cleanup(&self, session_id: &str) -> Result<(), StreamingError> {
        let mut state = self.state.lock().await;
        if state.sessions.remove(session_id).is_none() {
            return Err(StreamingError::SessionNotFound(session_id.to_string()));
        }
        state.retired.insert(session_id.to_string());
        info!(session_id, "cleaned up streaming session");
        Ok(())
    }

    /// Remove sessions idle past the configured window. Evicted ids
    /// are not tombstoned: a fresh client may start a new lifecycle
    /// under the same id.
    pub async fn evict_idle(&self) -> usize {
        let mut state = self.state.lock().await;
        let cutoff = chrono::Utc::now()
            - chrono::Duration::from_std(self.config.idle_timeout)
                .unwrap_or_else(|_| chrono::Duration::seconds(600));
        let before = state.sessions.len();
        state.sessions.retain(|id, session| {
            let keep = session.last_activity >= cutoff;
            if !keep {
                debug!(session_id = %id, "evicting idle streaming session");
            }
            keep
        });
        before - state.sessions.len()
    }

    pub async fn active_sessions(&self) -> usize {
        self.state.lock().await.sessions.len()
    }
}

/// Diff the new snapshot against the session's last one and update the
/// savings counters according to the session mode.
fn apply_snapshot(
    session: &mut StreamSession,
    snapshot: Snapshot,
    config: &StreamingConfig,
) -> CaptureResponse {
    session.touch();
    let full_size = snapshot.byte_size();
    session.full_equivalent_bytes += full_size;

    let response = match session.mode {
        StreamingMode::Full => respond_full(session, full_size, &snapshot.url, false),
        StreamingMode::Incremental => {
            let deltas = compute_deltas(session, &snapshot);
            respond_delta(session, full_size, deltas)
        }
        StreamingMode::Adaptive => {
            let deltas = compute_deltas(session, &snapshot);
            let delta_size = delta_byte_size(&deltas);
            let budget = (full_size as f64 * config.adaptive_threshold) as u64;
            if delta_size > budget {
                // The delta stopped paying for itself: resync with a
                // full snapshot and do not count it as savings.
                debug!(
                    session_id = %session.session_id,
                    delta_size, full_size, "adaptive threshold exceeded, forcing resync"
                );
                respond_full(session, full_size, &snapshot.url, true)
            } else {
                respond_delta(session, full_size, deltas)
            }
        }
    };
    session.last_snapshot = Some(snapshot);
    response
}

fn respond_full(
    session: &mut StreamSession,
    full_size: u64,
    url: &str,
    forced: bool,
) -> CaptureResponse {
    session.actual_bytes_sent += full_size;
    if forced {
        session.forced_resyncs += 1;
    }
    CaptureResponse {
        kind: CaptureKind::Full,
        session_id: session.session_id.clone(),
        mode: session.mode,
        token_savings: 0,
        url: Some(url.to_string()),
        regions: None,
        forced_resync: forced,
    }
}

fn compute_deltas(session: &StreamSession, snapshot: &Snapshot) -> Vec<super::RegionDelta> {
    let old = session
        .last_snapshot
        .as_ref()
        .map(|s| s.regions.as_slice())
        .unwrap_or(&[]);
    diff_regions(old, &snapshot.regions)
}

fn respond_delta(
    session: &mut StreamSession,
    full_size: u64,
    deltas: Vec<super::RegionDelta>,
) -> CaptureResponse {
    let delta_size = delta_byte_size(&deltas);
    let saved = full_size.saturating_sub(delta_size);
    let token_savings = tokens_for_bytes(saved);

    session.actual_bytes_sent += delta_size.min(full_size);
    session.bytes_saved += saved;
    session.tokens_saved += token_savings;
    session.total_changes += deltas.len() as u64;
    session.deltas_sent += 1;

    CaptureResponse {
        kind: CaptureKind::Delta,
        session_id: session.session_id.clone(),
        mode: session.mode,
        token_savings,
        url: None,
        regions: Some(deltas),
        forced_resync: false,
    }
}

/// Full internal view of one session (`get_incremental_debug_info`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub session_id: String,
    pub url: String,
    pub mode: StreamingMode,
    pub mode_history: Vec<ModeChange>,
    pub total_changes: u64,
    pub deltas_sent: u64,
    pub bytes_saved: u64,
    pub tokens_saved: u64,
    pub full_equivalent_bytes: u64,
    pub actual_bytes_sent: u64,
    pub forced_resyncs: u64,
    pub has_snapshot: bool,
    pub snapshot_bytes: u64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_activity_at: chrono::DateTime<chrono::Utc>,
}
