//! Session state and wire shapes for incremental streaming.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Rough chars-per-token heuristic used for savings estimates.
const BYTES_PER_TOKEN: u64 = 4;

/// Capture strategy for a streaming session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StreamingMode {
    /// Every capture returns the complete snapshot.
    Full,
    /// Every capture returns only the changed regions.
    Incremental,
    /// Incremental until the delta stops paying for itself, then a
    /// forced full resync.
    Adaptive,
}

impl FromStr for StreamingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(StreamingMode::Full),
            "incremental" => Ok(StreamingMode::Incremental),
            "adaptive" => Ok(StreamingMode::Adaptive),
            other => Err(format!(
                "mode must be 'full', 'incremental', or 'adaptive', got '{}'",
                other
            )),
        }
    }
}

impl fmt::Display for StreamingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamingMode::Full => write!(f, "full"),
            StreamingMode::Incremental => write!(f, "incremental"),
            StreamingMode::Adaptive => write!(f, "adaptive"),
        }
    }
}

/// One addressable region of a captured UI snapshot.
///
/// Segmentation is the browser driver's job; the manager only diffs
/// regions by selector key and content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapturedRegion {
    pub selector: String,
    pub content: String,
}

impl CapturedRegion {
    pub fn content_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.content.hash(&mut hasher);
        hasher.finish()
    }
}

/// A full UI capture produced by the browser driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub url: String,
    pub regions: Vec<CapturedRegion>,
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(url: impl Into<String>, regions: Vec<CapturedRegion>) -> Self {
        Self {
            url: url.into(),
            regions,
            captured_at: Utc::now(),
        }
    }

    /// Payload size of the full snapshot, used as the baseline for
    /// savings accounting.
    pub fn byte_size(&self) -> u64 {
        self.regions
            .iter()
            .map(|r| (r.selector.len() + r.content.len()) as u64)
            .sum()
    }
}

/// What changed in one region since the previous snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RegionChangeKind {
    Added,
    Changed,
    Removed,
}

/// One entry of a computed delta.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionDelta {
    pub kind: RegionChangeKind,
    pub selector: String,
    /// New content for added/changed regions; absent for removals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Selector-keyed diff between two region sets.
///
/// Regions present only in `new` are added, present in both with a
/// different content hash are changed, present only in `old` are
/// removed. Order follows the new snapshot, removals last.
pub fn diff_regions(old: &[CapturedRegion], new: &[CapturedRegion]) -> Vec<RegionDelta> {
    let old_by_selector: std::collections::HashMap<&str, &CapturedRegion> =
        old.iter().map(|r| (r.selector.as_str(), r)).collect();
    let new_selectors: std::collections::HashSet<&str> =
        new.iter().map(|r| r.selector.as_str()).collect();

    let mut deltas = Vec::new();
    for region in new {
        match old_by_selector.get(region.selector.as_str()) {
            None => deltas.push(RegionDelta {
                kind: RegionChangeKind::Added,
                selector: region.selector.clone(),
                content: Some(region.content.clone()),
            }),
            Some(previous) if previous.content_hash() != region.content_hash() => {
                deltas.push(RegionDelta {
                    kind: RegionChangeKind::Changed,
                    selector: region.selector.clone(),
                    content: Some(region.content.clone()),
                })
            }
            Some(_) => {}
        }
    }
    for region in old {
        if !new_selectors.contains(region.selector.as_str()) {
            deltas.push(RegionDelta {
                kind: RegionChangeKind::Removed,
                selector: region.selector.clone(),
                content: None,
            });
        }
    }
    deltas
}

/// Serialized size of a delta, compared against the full snapshot when
/// deciding whether incremental delivery pays off.
pub fn delta_byte_size(deltas: &[RegionDelta]) -> u64 {
    serde_json::to_string(deltas)
        .map(|s| s.len() as u64)
        .unwrap_or(0)
}

/// Kind of payload a capture call returned.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CaptureKind {
    /// First capture of a fresh session: always a full snapshot.
    Initial,
    /// A full snapshot (full mode, or an adaptive forced resync).
    Full,
    /// Only the changed regions.
    Delta,
}

/// Response of a capture or action call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResponse {
    #[serde(rename = "type")]
    pub kind: CaptureKind,
    pub session_id: String,
    pub mode: StreamingMode,
    pub token_savings: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<RegionDelta>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub forced_resync: bool,
}

/// A timestamped mode transition, kept for debug introspection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeChange {
    pub at: DateTime<Utc>,
    pub mode: StreamingMode,
}

/// Publicly visible session state (`get_incremental_ui_state`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub session_id: String,
    pub url: String,
    pub mode: StreamingMode,
    pub total_changes: u64,
    pub bytes_saved: u64,
    pub tokens_saved: u64,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

/// Derived savings metrics (`get_stream_stats`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streaming_mode: Option<StreamingMode>,
    pub total_deltas: u64,
    pub tokens_saved: u64,
    pub compression_ratio: f64,
    pub session_duration_secs: f64,
    pub active_sessions: usize,
}

/// Internal per-session bookkeeping, owned by the manager.
#[derive(Debug)]
pub(crate) struct StreamSession {
    pub session_id: String,
    pub start_url: String,
    pub mode: StreamingMode,
    pub last_snapshot: Option<Snapshot>,
    pub total_changes: u64,
    pub deltas_sent: u64,
    pub bytes_saved: u64,
    pub tokens_saved: u64,
    pub full_equivalent_bytes: u64,
    pub actual_bytes_sent: u64,
    pub forced_resyncs: u64,
    pub mode_history: Vec<ModeChange>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl StreamSession {
    pub fn new(session_id: String, start_url: String, mode: StreamingMode) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            start_url,
            mode,
            last_snapshot: None,
            total_changes: 0,
            deltas_sent: 0,
            bytes_saved: 0,
            tokens_saved: 0,
            full_equivalent_bytes: 0,
            actual_bytes_sent: 0,
            forced_resyncs: 0,
            mode_history: vec![ModeChange { at: now, mode }],
            created_at: now,
            last_activity: now,
        }
    }

    pub fn set_mode(&mut self, mode: StreamingMode) {
        if self.mode != mode {
            self.mode = mode;
            self.mode_history.push(ModeChange {
                at: Utc::now(),
                mode,
            });
        }
    }

    /// Whole lifetime full-equivalent vs actual transmitted bytes.
    /// Exactly 1.0 while every response has been a full snapshot.
    pub fn compression_ratio(&self) -> f64 {
        if self.actual_bytes_sent == 0 || self.full_equivalent_bytes == self.actual_bytes_sent {
            1.0
        } else {
            self.full_equivalent_bytes as f64 / self.actual_bytes_sent as f64
        }
    }

    pub fn duration_secs(&self) -> f64 {
        let millis = (Utc::now() - self.created_at).num_milliseconds().max(0);
        millis as f64 / 1000.0
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}

pub(crate) fn tokens_for_bytes(bytes: u64) -> u64 {
    bytes / BYTES_PER_TOKEN
}
