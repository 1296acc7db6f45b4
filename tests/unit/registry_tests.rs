use serde_json::json;
use studio_mcp::ToolRegistry;

#[test]
fn catalog_is_not_empty() {
    let registry = ToolRegistry::new();
    assert!(!registry.is_empty());
    assert_eq!(registry.len(), registry.descriptors().len());
}

#[test]
fn database_schema_tool_has_empty_object_schema() {
    let registry = ToolRegistry::new();
    let descriptor = registry.get("get_database_schema").unwrap();
    assert_eq!(
        descriptor.input_schema,
        json!({"type": "object", "properties": {}})
    );
}

#[test]
fn streaming_tools_are_registered() {
    let registry = ToolRegistry::new();
    for name in [
        "browse_with_playwright_incremental",
        "process_ui_action_incremental",
        "get_incremental_ui_state",
        "set_streaming_mode",
        "get_stream_stats",
        "cleanup_incremental_session",
        "get_incremental_debug_info",
    ] {
        assert!(registry.contains(name), "missing tool: {}", name);
    }
}

#[test]
fn unknown_names_are_absent() {
    let registry = ToolRegistry::new();
    assert!(!registry.contains("does_not_exist"));
    assert!(registry.get("does_not_exist").is_none());
}

#[test]
fn names_are_unique() {
    let registry = ToolRegistry::new();
    let mut names: Vec<_> = registry.descriptors().iter().map(|d| &d.name).collect();
    let before = names.len();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), before);
}

#[test]
fn required_arguments_are_declared() {
    let registry = ToolRegistry::new();
    let search = registry.get("search_code").unwrap();
    assert_eq!(search.input_schema["required"], json!(["query"]));
    let set_mode = registry.get("set_streaming_mode").unwrap();
    assert_eq!(
        set_mode.input_schema["required"],
        json!(["sessionId", "mode"])
    );
}

#[test]
fn descriptor_serializes_with_camel_case_schema_key() {
    let registry = ToolRegistry::new();
    let descriptor = registry.get("get_database_schema").unwrap();
    let value = serde_json::to_value(descriptor).unwrap();
    assert!(value.get("inputSchema").is_some());
    assert!(value.get("input_schema").is_none());
}
