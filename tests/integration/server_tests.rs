//! Protocol-level behavior: framing, dispatch, errors, concurrency.

use serde_json::{json, Value};

use super::{content_length_frame, exchange, result_text, scripted_server};

#[tokio::test]
async fn unknown_method_in_content_length_frame() {
    let input = content_length_frame(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#);
    let responses = exchange(scripted_server(vec![]), &input).await;
    assert_eq!(responses.len(), 1);
    assert_eq!(
        responses[0],
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32601, "message": "Method not found: ping"}
        })
    );
}

#[tokio::test]
async fn notifications_produce_no_output() {
    let input = b"{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n\
                  {\"jsonrpc\":\"2.0\",\"method\":\"no/such/method\"}\n";
    let responses = exchange(scripted_server(vec![]), input).await;
    assert!(responses.is_empty());
}

#[tokio::test]
async fn both_framings_are_accepted_on_one_connection() {
    let mut input = content_length_frame(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#);
    input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/list\"}\n");
    let responses = exchange(scripted_server(vec![]), &input).await;
    assert_eq!(responses.len(), 2);
    let mut ids: Vec<i64> = responses.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2]);
    for response in &responses {
        assert!(response["result"]["tools"].is_array());
    }
}

#[tokio::test]
async fn initialize_reports_capabilities() {
    let input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\"}\n";
    let responses = exchange(scripted_server(vec![]), input).await;
    assert_eq!(responses.len(), 1);
    let result = &responses[0]["result"];
    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert!(result["capabilities"]["tools"].is_object());
    assert_eq!(result["serverInfo"]["name"], "studio-mcp");
}

#[tokio::test]
async fn tools_list_includes_database_schema_tool() {
    let input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\n";
    let responses = exchange(scripted_server(vec![]), input).await;
    let tools = responses[0]["result"]["tools"].as_array().unwrap();
    let entry = tools
        .iter()
        .find(|t| t["name"] == "get_database_schema")
        .expect("get_database_schema is listed");
    assert_eq!(
        entry["inputSchema"],
        json!({"type": "object", "properties": {}})
    );
}

#[tokio::test]
async fn unknown_tool_is_a_tool_error_not_a_protocol_error() {
    let input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\
                  \"params\":{\"name\":\"does_not_exist\",\"arguments\":{}}}\n";
    let responses = exchange(scripted_server(vec![]), input).await;
    assert_eq!(responses.len(), 1);
    let response = &responses[0];
    assert!(response.get("error").is_none());
    assert_eq!(response["result"]["isError"], json!(true));
    assert!(result_text(response).contains("Unknown tool: does_not_exist"));
}

#[tokio::test]
async fn malformed_json_yields_parse_error_and_closes() {
    let input = b"{not json at all\n\
                  {\"jsonrpc\":\"2.0\",\"id\":9,\"method\":\"tools/list\"}\n";
    let responses = exchange(scripted_server(vec![]), input).await;
    // The connection terminates after the parse error; the following
    // well-formed request is never answered.
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], Value::Null);
    assert_eq!(responses[0]["error"]["code"], json!(-32700));
}

#[tokio::test]
async fn missing_tool_name_is_invalid_params() {
    let input = b"{\"jsonrpc\":\"2.0\",\"id\":4,\"method\":\"tools/call\",\"params\":{}}\n";
    let responses = exchange(scripted_server(vec![]), input).await;
    assert_eq!(responses[0]["error"]["code"], json!(-32602));
}

#[tokio::test]
async fn concurrent_requests_each_get_exactly_one_response() {
    // More requests than the handler pool has permits.
    let mut input = Vec::new();
    for id in 1..=50 {
        input.extend_from_slice(
            format!("{{\"jsonrpc\":\"2.0\",\"id\":{},\"method\":\"tools/list\"}}\n", id).as_bytes(),
        );
    }
    let responses = exchange(scripted_server(vec![]), &input).await;
    assert_eq!(responses.len(), 50);
    let mut ids: Vec<i64> = responses.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=50).collect::<Vec<i64>>());
}

#[tokio::test]
async fn inflight_request_is_answered_after_input_closes() {
    // The input stream closes while the command still runs; the drain
    // must wait for the handler instead of dropping its response.
    let input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\
                  \"params\":{\"name\":\"run_terminal_command\",\
                  \"arguments\":{\"command\":\"sleep 0.3; printf done\"}}}\n";
    let responses = exchange(scripted_server(vec![]), input).await;
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], json!(1));
    assert_eq!(responses[0]["result"]["isError"], json!(false));
    assert!(result_text(&responses[0]).contains("done"));
}

#[tokio::test]
async fn exit_cancels_a_long_running_command_with_a_response() {
    let input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\
                  \"params\":{\"name\":\"run_terminal_command\",\
                  \"arguments\":{\"command\":\"sleep 5\"}}}\n\
                  {\"jsonrpc\":\"2.0\",\"method\":\"exit\"}\n";
    let responses = exchange(scripted_server(vec![]), input).await;
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], json!(1));
    assert_eq!(responses[0]["result"]["isError"], json!(true));
    assert!(result_text(&responses[0]).contains("cancelled during shutdown"));
}

#[tokio::test]
async fn framing_error_closes_without_a_response() {
    let input = b"Content-Length: nope\r\n\r\n{}";
    let responses = exchange(scripted_server(vec![]), input).await;
    assert!(responses.is_empty());
}

#[tokio::test]
async fn exit_stops_the_read_loop() {
    let input = b"{\"jsonrpc\":\"2.0\",\"method\":\"exit\"}\n\
                  {\"jsonrpc\":\"2.0\",\"id\":5,\"method\":\"tools/list\"}\n";
    let responses = exchange(scripted_server(vec![]), input).await;
    assert!(responses.is_empty());
}

#[tokio::test]
async fn terminal_command_runs_in_project_context() {
    let input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\
                  \"params\":{\"name\":\"run_terminal_command\",\
                  \"arguments\":{\"command\":\"printf ok\"}}}\n";
    let responses = exchange(scripted_server(vec![]), input).await;
    let response = &responses[0];
    assert_eq!(response["result"]["isError"], json!(false));
    let text = result_text(response);
    assert!(text.contains("exit code: 0"));
    assert!(text.contains("ok"));
}

#[tokio::test]
async fn browser_tools_report_unavailability_without_a_driver() {
    // A scripted driver with an empty queue fails every capture.
    let input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\
                  \"params\":{\"name\":\"browse_with_playwright\",\
                  \"arguments\":{\"url\":\"https://x\"}}}\n";
    let responses = exchange(scripted_server(vec![]), input).await;
    assert_eq!(responses[0]["result"]["isError"], json!(true));
}
