//! Code analysis, configuration, and search tools.

use serde::Deserialize;
use serde_json::json;

use super::{ToolContext, ToolError, ToolReply};

pub async fn get_backend_data_models(ctx: &ToolContext) -> Result<ToolReply, ToolError> {
    let models = ctx.analyzer.data_models().await;
    Ok(ToolReply::json(&json!({
        "modelCount": models.len(),
        "models": models,
    })))
}

pub async fn get_backend_api_routes(ctx: &ToolContext) -> Result<ToolReply, ToolError> {
    let routes = ctx.analyzer.api_routes().await;
    Ok(ToolReply::json(&json!({
        "routeCount": routes.len(),
        "routes": routes,
    })))
}

pub async fn get_backend_request_handlers(ctx: &ToolContext) -> Result<ToolReply, ToolError> {
    let handlers = ctx.analyzer.request_handlers().await;
    Ok(ToolReply::json(&json!({
        "handlerCount": handlers.len(),
        "handlers": handlers,
    })))
}

pub async fn get_backend_services(ctx: &ToolContext) -> Result<ToolReply, ToolError> {
    let services = ctx.analyzer.services().await;
    Ok(ToolReply::json(&json!({
        "serviceCount": services.len(),
        "services": services,
    })))
}

pub async fn get_interfaces(ctx: &ToolContext) -> Result<ToolReply, ToolError> {
    let interfaces = ctx.analyzer.interfaces().await;
    Ok(ToolReply::json(&json!({
        "interfaceCount": interfaces.len(),
        "interfaces": interfaces,
    })))
}

#[derive(Debug, Deserialize)]
pub struct FindImplementationsParams {
    pub interface: String,
}

pub async fn find_implementations(
    ctx: &ToolContext,
    params: FindImplementationsParams,
) -> Result<ToolReply, ToolError> {
    let implementations = ctx.analyzer.implementations_of(&params.interface).await;
    Ok(ToolReply::json(&json!({
        "interface": params.interface,
        "implementations": implementations,
    })))
}

#[derive(Debug, Deserialize)]
pub struct CallGraphParams {
    #[serde(default)]
    pub function: Option<String>,
}

pub async fn get_call_graph(
    ctx: &ToolContext,
    params: CallGraphParams,
) -> Result<ToolReply, ToolError> {
    let root = params.function.as_deref().unwrap_or("main");
    let nodes = ctx.analyzer.call_graph(root).await;
    Ok(ToolReply::json(&json!({
        "root": root,
        "nodes": nodes,
    })))
}

pub async fn get_config(ctx: &ToolContext) -> Result<ToolReply, ToolError> {
    let fields = ctx.analyzer.config_fields().await;
    Ok(ToolReply::json(&json!({ "config": fields })))
}

pub async fn get_middleware(ctx: &ToolContext) -> Result<ToolReply, ToolError> {
    let middleware = ctx.analyzer.middleware_list().await;
    Ok(ToolReply::json(&json!({ "middleware": middleware })))
}

pub async fn get_env_vars(ctx: &ToolContext) -> Result<ToolReply, ToolError> {
    let vars = ctx.analyzer.env_vars().await;
    Ok(ToolReply::json(&json!({
        "count": vars.len(),
        "envVars": vars,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
}

pub async fn search_code(ctx: &ToolContext, params: SearchParams) -> Result<ToolReply, ToolError> {
    if params.query.trim().is_empty() {
        return Err(ToolError::InvalidArguments(
            "query must not be empty".to_string(),
        ));
    }
    let hits = ctx.analyzer.search(&params.query).await;
    Ok(ToolReply::json(&json!({
        "query": params.query,
        "matchCount": hits.len(),
        "matches": hits,
    })))
}

pub async fn get_package_structure(ctx: &ToolContext) -> Result<ToolReply, ToolError> {
    let tree = ctx.analyzer.package_structure().await;
    Ok(ToolReply::json(&json!({ "packages": tree })))
}

pub async fn get_dependencies(ctx: &ToolContext) -> Result<ToolReply, ToolError> {
    let deps = ctx.analyzer.dependencies().await;
    Ok(ToolReply::json(&json!({
        "count": deps.len(),
        "dependencies": deps,
    })))
}

/// Dependency edges keyed by package; with only manifest data available
/// every edge originates at the project root.
pub async fn get_dependency_graph(ctx: &ToolContext) -> Result<ToolReply, ToolError> {
    let deps = ctx.analyzer.dependencies().await;
    let edges: Vec<_> = deps
        .iter()
        .map(|d| json!({ "from": "root", "to": d.name, "version": d.version }))
        .collect();
    Ok(ToolReply::json(&json!({ "edges": edges })))
}
