use serde_json::{json, Value};
use studio_mcp::mcp::protocol::*;

#[test]
fn request_with_id_is_not_a_notification() {
    let request: JsonRpcRequest =
        serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#).unwrap();
    assert_eq!(request.id, Some(1));
    assert!(!request.is_notification());
}

#[test]
fn request_without_id_is_a_notification() {
    let request: JsonRpcRequest =
        serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
    assert!(request.is_notification());
}

#[test]
fn request_params_are_optional() {
    let request: JsonRpcRequest =
        serde_json::from_str(r#"{"jsonrpc":"2.0","id":7,"method":"tools/list"}"#).unwrap();
    assert!(request.params.is_none());
}

#[test]
fn success_response_wire_shape() {
    let response = JsonRpcResponse::success(Some(3), json!({"ok": true}));
    let value: Value = serde_json::to_value(&response).unwrap();
    assert_eq!(
        value,
        json!({"jsonrpc": "2.0", "id": 3, "result": {"ok": true}})
    );
}

#[test]
fn error_response_wire_shape() {
    let response = JsonRpcResponse::error(
        Some(1),
        error_codes::METHOD_NOT_FOUND,
        "Method not found: ping".to_string(),
    );
    let value: Value = serde_json::to_value(&response).unwrap();
    assert_eq!(
        value,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32601, "message": "Method not found: ping"}
        })
    );
}

#[test]
fn parse_error_has_null_id() {
    let response = JsonRpcResponse::parse_error("unexpected end of input".to_string());
    let value: Value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["id"], Value::Null);
    assert_eq!(value["error"]["code"], json!(-32700));
    assert!(value["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Parse error:"));
}

#[test]
fn tool_result_text_shape() {
    let result = ToolCallResult::text("Found 3 tables".to_string());
    let value: Value = serde_json::to_value(&result).unwrap();
    assert_eq!(
        value,
        json!({
            "content": [{"type": "text", "text": "Found 3 tables"}],
            "isError": false
        })
    );
}

#[test]
fn tool_result_error_is_a_successful_shape() {
    let result = ToolCallResult::error("Session not found: s9".to_string());
    assert!(result.is_error);
    assert_eq!(result.content[0].text, "Error: Session not found: s9");
}

#[test]
fn tool_call_params_default_to_empty_arguments() {
    let params: ToolCallParams =
        serde_json::from_value(json!({"name": "get_database_schema"})).unwrap();
    assert_eq!(params.name, "get_database_schema");
    assert!(params.arguments.is_empty());
}
