//! Browser capture and incremental streaming tools.

use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{ToolContext, ToolError, ToolReply};
use crate::analyzer::types::UiAction;
use crate::streaming::StreamingMode;

#[derive(Debug, Deserialize)]
pub struct BrowseParams {
    pub url: String,
}

/// One-shot capture with no session bookkeeping.
pub async fn browse_with_playwright(
    ctx: &ToolContext,
    params: BrowseParams,
) -> Result<ToolReply, ToolError> {
    let snapshot = ctx.browser.capture(&params.url).await?;
    Ok(ToolReply::json(&json!({
        "url": snapshot.url,
        "regionCount": snapshot.regions.len(),
        "regions": snapshot.regions,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseIncrementalParams {
    pub url: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub streaming_mode: Option<String>,
}

pub async fn browse_incremental(
    ctx: &ToolContext,
    params: BrowseIncrementalParams,
) -> Result<ToolReply, ToolError> {
    let mode = parse_mode(params.streaming_mode.as_deref())?;
    let session_id = params
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let snapshot = ctx.browser.capture(&params.url).await?;
    let response = ctx
        .streaming
        .record_capture(&session_id, mode, snapshot)
        .await?;
    Ok(ToolReply::json(&response))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiActionParams {
    pub session_id: String,
    pub action: String,
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

pub async fn process_ui_action(
    ctx: &ToolContext,
    params: UiActionParams,
) -> Result<ToolReply, ToolError> {
    // Resolve the session before touching the browser so an unknown id
    // fails fast without a capture round-trip.
    let url = ctx.streaming.session_url(&params.session_id).await?;
    let action = UiAction {
        action: params.action,
        selector: params.selector,
        text: params.text,
        url: params.url,
        timeout: params.timeout,
        x: params.x,
        y: params.y,
    };
    let snapshot = ctx.browser.perform(&url, &action).await?;
    let response = ctx
        .streaming
        .record_action(&params.session_id, snapshot)
        .await?;
    Ok(ToolReply::json(&response))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionParams {
    pub session_id: String,
}

pub async fn get_ui_state(
    ctx: &ToolContext,
    params: SessionParams,
) -> Result<ToolReply, ToolError> {
    let state = ctx.streaming.session_state(&params.session_id).await?;
    Ok(ToolReply::json(&state))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetModeParams {
    pub session_id: String,
    pub mode: String,
}

pub async fn set_streaming_mode(
    ctx: &ToolContext,
    params: SetModeParams,
) -> Result<ToolReply, ToolError> {
    // Validate before looking up the session: a bogus mode must not
    // disturb existing state.
    let mode: StreamingMode = params
        .mode
        .parse()
        .map_err(ToolError::InvalidArguments)?;
    ctx.streaming.set_mode(&params.session_id, mode).await?;
    Ok(ToolReply::Text(format!(
        "Streaming mode set to '{}' for session {}",
        mode, params.session_id
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsParams {
    #[serde(default)]
    pub session_id: Option<String>,
}

pub async fn get_stream_stats(
    ctx: &ToolContext,
    params: StatsParams,
) -> Result<ToolReply, ToolError> {
    let stats = ctx.streaming.stats(params.session_id.as_deref()).await?;
    Ok(ToolReply::json(&stats))
}

pub async fn cleanup_session(
    ctx: &ToolContext,
    params: SessionParams,
) -> Result<ToolReply, ToolError> {
    ctx.streaming.cleanup(&params.session_id).await?;
    Ok(ToolReply::Text(format!(
        "Session {} cleaned up",
        params.session_id
    )))
}

pub async fn get_debug_info(
    ctx: &ToolContext,
    params: SessionParams,
) -> Result<ToolReply, ToolError> {
    let info = ctx.streaming.debug_info(&params.session_id).await?;
    Ok(ToolReply::json(&info))
}

fn parse_mode(mode: Option<&str>) -> Result<Option<StreamingMode>, ToolError> {
    mode.map(|m| m.parse().map_err(ToolError::InvalidArguments))
        .transpose()
}
