use std::time::Duration;

use studio_mcp::streaming::{
    CaptureKind, CapturedRegion, SessionManager, Snapshot, StreamingConfig, StreamingError,
    StreamingMode,
};

fn snapshot(url: &str, regions: &[(&str, &str)]) -> Snapshot {
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

fn big_page() -> Snapshot {
    let filler = "x".repeat(200);
    snapshot(
        "https://app.local",
        &[
            ("#header", filler.as_str()),
            ("#body", filler.as_str()),
            ("#footer", filler.as_str()),
        ],
    )
}

fn manager() -> SessionManager {
    SessionManager::new(StreamingConfig::default())
}

#[tokio::test]
async fn first_capture_is_initial_with_no_savings() {
    let manager = manager();
    let response = manager
        .record_capture("s1", Some(StreamingMode::Full), big_page())
        .await
        .unwrap();
    assert_eq!(response.kind, CaptureKind::Initial);
    assert_eq!(response.session_id, "s1");
    assert_eq!(response.mode, StreamingMode::Full);
    assert_eq!(response.token_savings, 0);
    assert_eq!(response.url.as_deref(), Some("https://app.local"));
}

#[tokio::test]
async fn unchanged_page_yields_empty_delta_with_savings() {
    let manager = manager();
    manager
        .record_capture("s1", Some(StreamingMode::Full), big_page())
        .await
        .unwrap();
    let response = manager
        .record_capture("s1", Some(StreamingMode::Incremental), big_page())
        .await
        .unwrap();
    assert_eq!(response.kind, CaptureKind::Delta);
    assert_eq!(response.regions.as_deref(), Some(&[][..]));
    assert!(response.token_savings > 0);
}

#[tokio::test]
async fn requested_mode_defaults_to_adaptive() {
    let manager = manager();
    let response = manager
        .record_capture("s1", None, big_page())
        .await
        .unwrap();
    assert_eq!(response.mode, StreamingMode::Adaptive);
}

#[tokio::test]
async fn adaptive_forces_resync_when_delta_outgrows_threshold() {
    let manager = manager();
    manager
        .record_capture("s1", Some(StreamingMode::Adaptive), big_page())
        .await
        .unwrap();

    // Rewrite every region so the delta costs more than half the full
    // snapshot.
    let rewritten = "y".repeat(200);
    let changed = snapshot(
        "https://app.local",
        &[
            ("#header", rewritten.as_str()),
            ("#body", rewritten.as_str()),
            ("#footer", rewritten.as_str()),
        ],
    );
    let response = manager.record_capture("s1", None, changed).await.unwrap();
    assert_eq!(response.kind, CaptureKind::Full);
    assert!(response.forced_resync);

    let info = manager.debug_info("s1").await.unwrap();
    assert_eq!(info.forced_resyncs, 1);
}

#[tokio::test]
async fn small_delta_stays_incremental_under_adaptive() {
    let manager = manager();
    manager
        .record_capture("s1", Some(StreamingMode::Adaptive), big_page())
        .await
        .unwrap();

    let mut next = big_page();
    next.regions[1].content = format!("{}!", next.regions[1].content);
    let response = manager.record_capture("s1", None, next).await.unwrap();
    assert_eq!(response.kind, CaptureKind::Delta);
    assert!(!response.forced_resync);
    let regions = response.regions.unwrap();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].selector, "#body");
}

#[tokio::test]
async fn full_only_session_reports_ratio_of_exactly_one() {
    let manager = manager();
    manager
        .record_capture("s1", Some(StreamingMode::Full), big_page())
        .await
        .unwrap();
    manager
        .record_capture("s1", None, big_page())
        .await
        .unwrap();

    let stats = manager.stats(Some("s1")).await.unwrap();
    assert_eq!(stats.compression_ratio, 1.0);
    assert_eq!(stats.total_deltas, 0);
}

#[tokio::test]
async fn ratio_exceeds_one_after_a_delta() {
    let manager = manager();
    manager
        .record_capture("s1", Some(StreamingMode::Incremental), big_page())
        .await
        .unwrap();
    let mut next = big_page();
    next.regions[0].content = "changed".to_string();
    manager.record_capture("s1", None, next).await.unwrap();

    let stats = manager.stats(Some("s1")).await.unwrap();
    assert!(stats.compression_ratio > 1.0);
    assert_eq!(stats.total_deltas, 1);
    assert!(stats.tokens_saved > 0);
}

#[tokio::test]
async fn cleanup_tombstones_the_session_id() {
    let manager = manager();
    manager
        .record_capture("s1", None, big_page())
        .await
        .unwrap();
    manager.cleanup("s1").await.unwrap();

    // A later capture must not resurrect the id.
    let err = manager
        .record_capture("s1", None, big_page())
        .await
        .unwrap_err();
    assert!(matches!(err, StreamingError::SessionNotFound(_)));
    let err = manager.session_state("s1").await.unwrap_err();
    assert_eq!(err.to_string(), "Session not found: s1");
}

#[tokio::test]
async fn cleanup_of_unknown_session_fails() {
    let manager = manager();
    assert!(matches!(
        manager.cleanup("ghost").await,
        Err(StreamingError::SessionNotFound(_))
    ));
}

#[tokio::test]
async fn idle_eviction_frees_the_id_for_reuse() {
    let manager = SessionManager::new(StreamingConfig {
        idle_timeout: Duration::from_secs(0),
        ..StreamingConfig::default()
    });
    manager
        .record_capture("s1", None, big_page())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(manager.evict_idle().await, 1);
    assert_eq!(manager.active_sessions().await, 0);

    // Unlike cleanup, eviction leaves no tombstone.
    let response = manager
        .record_capture("s1", None, big_page())
        .await
        .unwrap();
    assert_eq!(response.kind, CaptureKind::Initial);
}

#[tokio::test]
async fn aggregate_stats_require_a_session() {
    let manager = manager();
    assert!(matches!(
        manager.stats(None).await,
        Err(StreamingError::NoSessions)
    ));

    manager
        .record_capture("s1", None, big_page())
        .await
        .unwrap();
    manager
        .record_capture("s2", None, big_page())
        .await
        .unwrap();
    let stats = manager.stats(None).await.unwrap();
    assert_eq!(stats.active_sessions, 2);
    assert!(stats.session_id.is_none());
}

#[tokio::test]
async fn mode_changes_are_recorded() {
    let manager = manager();
    manager
        .record_capture("s1", Some(StreamingMode::Full), big_page())
        .await
        .unwrap();
    manager
        .set_mode("s1", StreamingMode::Incremental)
        .await
        .unwrap();

    let state = manager.session_state("s1").await.unwrap();
    assert_eq!(state.mode, StreamingMode::Incremental);
    let info = manager.debug_info("s1").await.unwrap();
    assert_eq!(info.mode_history.len(), 2);
}

#[tokio::test]
async fn set_mode_on_unknown_session_fails() {
    let manager = manager();
    assert!(matches!(
        manager.set_mode("ghost", StreamingMode::Full).await,
        Err(StreamingError::SessionNotFound(_))
    ));
}
