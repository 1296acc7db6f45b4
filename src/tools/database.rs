//! Database introspection tools.

use serde_json::json;

use super::{ToolContext, ToolError, ToolReply};

pub async fn get_database_schema(ctx: &ToolContext) -> Result<ToolReply, ToolError> {
    let tables = ctx.analyzer.database_schema().await;
    Ok(ToolReply::json(&json!({
        "tableCount": tables.len(),
        "tables": tables,
    })))
}

pub async fn get_database_stats(ctx: &ToolContext) -> Result<ToolReply, ToolError> {
    let stats = ctx.analyzer.database_stats().await;
    Ok(ToolReply::json(&stats))
}

/// Routes rendered as a minimal OpenAPI path map.
pub async fn get_backend_openapi_schema(ctx: &ToolContext) -> Result<ToolReply, ToolError> {
    let routes = ctx.analyzer.api_routes().await;
    let mut paths = serde_json::Map::new();
    for route in &routes {
        let entry = paths
            .entry(route.path.clone())
            .or_insert_with(|| json!({}));
        if let Some(obj) = entry.as_object_mut() {
            obj.insert(
                route.method.to_lowercase(),
                json!({ "operationId": route.handler }),
            );
        }
    }
    Ok(ToolReply::json(&json!({
        "openapi": "3.0.0",
        "paths": paths,
    })))
}
