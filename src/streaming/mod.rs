//! Incremental UI-state streaming.
//!
//! Tracks per-session UI snapshots, computes region-level deltas
//! against the previous capture, switches capture strategy adaptively,
//! and accumulates token/byte savings telemetry. All state lives in
//! process memory; sessions end by explicit cleanup or idle eviction.

pub mod manager;
pub mod session;

pub use manager::{DebugInfo, SessionManager, StreamingConfig, StreamingError};
pub use session::{
    CaptureKind, CaptureResponse, CapturedRegion, RegionChangeKind, RegionDelta, SessionState,
    Snapshot, StreamStats, StreamingMode,
};
