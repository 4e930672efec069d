// yapi-mcp/src/server/tests.rs
// ============================================================================
// Module: MCP Server Unit Tests
// Description: Unit tests for stdio framing and JSON-RPC dispatch.
// Purpose: Validate server module behavior with in-memory fixtures.
// Dependencies: yapi-mcp
// ============================================================================

//! ## Overview
//! Exercises framing detection, method dispatch, error codes, and request
//! logging with stub interface sources in place of HTTP clients.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only framing assertions."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::BufReader;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::Mutex;

use serde_json::Value;
use serde_json::json;
use yapi_mcp_config::ServerTransport;

use super::Frame;
use super::FrameBody;
use super::Framing;
use super::RequestContext;
use super::ServerState;
use super::read_message;
use super::respond;
use super::serve_stdio;
use crate::interface::InterfaceDetail;
use crate::log::LogOutcome;
use crate::log::McpLogSink;
use crate::log::McpRequestEvent;
use crate::log::Upstream;
use crate::tools::ToolRouter;
use crate::yapi::InterfaceSource;
use crate::yapi::YapiError;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Interface source returning a fixed record or a fixed failure.
struct StubSource {
    /// Record returned on success.
    detail: Option<Value>,
}

impl InterfaceSource for StubSource {
    fn interface_detail(
        &self,
        _interface_id: &str,
        _project_id: &str,
    ) -> Result<InterfaceDetail, YapiError> {
        match &self.detail {
            Some(value) => Ok(InterfaceDetail::from_value(value.clone()).unwrap()),
            None => Err(YapiError::Api(Upstream::Yapi, "token invalid".to_string())),
        }
    }
}

/// Sink collecting request events.
#[derive(Default)]
struct RecordingSink {
    /// Recorded events.
    events: Mutex<Vec<McpRequestEvent>>,
}

impl McpLogSink for RecordingSink {
    fn record_request(&self, event: &McpRequestEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

fn fixed_clock() -> String {
    "2024/1/5 09:03:07".to_string()
}

fn state_with(detail: Option<Value>, max_body_bytes: usize) -> (ServerState, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let router = ToolRouter::new(Arc::new(StubSource { detail }), None, sink.clone())
        .with_clock(fixed_clock);
    let state = ServerState {
        router,
        max_body_bytes,
        log: sink.clone(),
    };
    (state, sink)
}

fn default_state() -> ServerState {
    state_with(Some(json!({"title": "查询", "path": "/q", "method": "GET"})), 4096).0
}

fn stdio_context() -> RequestContext {
    RequestContext {
        transport: ServerTransport::Stdio,
        peer_ip: None,
    }
}

fn call(state: &ServerState, request: &Value) -> Value {
    let bytes = serde_json::to_vec(request).unwrap();
    let (_, payload) = respond(state, &stdio_context(), &bytes).expect("response expected");
    serde_json::from_str(&payload).unwrap()
}

// ============================================================================
// SECTION: Framing
// ============================================================================

#[test]
fn read_message_detects_content_length_framing() {
    let payload = br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#;
    let mut input = format!("Content-Length: {}\r\n\r\n", payload.len()).into_bytes();
    input.extend_from_slice(payload);
    let mut reader = BufReader::new(Cursor::new(input));
    let frame = read_message(&mut reader, 1024).unwrap().unwrap();
    assert_eq!(
        frame,
        Frame {
            framing: Framing::ContentLength,
            body: FrameBody::Payload(payload.to_vec()),
        }
    );
    assert!(read_message(&mut reader, 1024).unwrap().is_none());
}

#[test]
fn read_message_detects_line_framing() {
    let input = b"\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n".to_vec();
    let mut reader = BufReader::new(Cursor::new(input));
    let frame = read_message(&mut reader, 1024).unwrap().unwrap();
    assert_eq!(frame.framing, Framing::Line);
}

#[test]
fn oversized_framed_payload_is_skipped() {
    let big = vec![b'x'; 64];
    let mut input = format!("Content-Length: {}\r\n\r\n", big.len()).into_bytes();
    input.extend_from_slice(&big);
    input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n");
    let mut reader = BufReader::new(Cursor::new(input));
    let first = read_message(&mut reader, 32).unwrap().unwrap();
    assert_eq!(first.body, FrameBody::TooLarge);
    let second = read_message(&mut reader, 64).unwrap().unwrap();
    assert_eq!(second.framing, Framing::Line);
}

#[test]
fn missing_content_length_is_a_transport_error() {
    let input = b"X-Other: 1\r\n\r\n{}".to_vec();
    let mut reader = BufReader::new(Cursor::new(input));
    assert!(read_message(&mut reader, 1024).is_err());
}

#[test]
fn serve_stdio_answers_in_request_framing() {
    let state = default_state();
    let request = br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#;
    let mut input = format!("Content-Length: {}\r\n\r\n", request.len()).into_bytes();
    input.extend_from_slice(request);
    input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n");
    input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n");
    let mut output = Vec::new();
    serve_stdio(&state, BufReader::new(Cursor::new(input)), &mut output).unwrap();
    let text = String::from_utf8(output).unwrap();
    let framed = r#"{"jsonrpc":"2.0","id":1,"result":{}}"#;
    let expected = format!(
        "Content-Length: {}\r\n\r\n{framed}{{\"jsonrpc\":\"2.0\",\"id\":2,\"result\":{{}}}}\n",
        framed.len()
    );
    assert_eq!(text, expected);
}

// ============================================================================
// SECTION: Dispatch
// ============================================================================

#[test]
fn initialize_reports_server_info() {
    let state = default_state();
    let response = call(
        &state,
        &json!({"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05"}}),
    );
    assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(response["result"]["serverInfo"]["name"], "Yapi-MCP");
    assert!(response["result"]["capabilities"]["tools"].is_object());
}

#[test]
fn notifications_get_no_response() {
    let state = default_state();
    let bytes = br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
    assert!(respond(&state, &stdio_context(), bytes).is_none());
}

#[test]
fn tools_list_exposes_both_tools() {
    let state = default_state();
    let response = call(&state, &json!({"jsonrpc":"2.0","id":"a","method":"tools/list"}));
    let tools = response["result"]["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().map(|tool| tool["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["get_interface", "debug_api"]);
    assert_eq!(tools[0]["inputSchema"]["required"], json!(["projectId", "interfaceId"]));
}

#[test]
fn get_interface_returns_markdown_text() {
    let state = default_state();
    let response = call(
        &state,
        &json!({"jsonrpc":"2.0","id":3,"method":"tools/call","params":{
            "name":"get_interface","arguments":{"projectId":"1","interfaceId":"2"}}}),
    );
    let result = &response["result"];
    assert!(result.get("isError").is_none());
    assert_eq!(result["content"][0]["type"], "text");
    let text = result["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("# 🚀 YApi 接口文档\n\n---\n## 📋 接口详情\n---\n\n"));
    assert!(text.ends_with("---\n*📅 生成时间: 2024/1/5 09:03:07*\n"));
}

#[test]
fn unparsable_schema_text_becomes_error_result() {
    let (state, _) = state_with(
        Some(json!({"title": "查询", "path": "/q", "method": "POST", "res_body": "{\"type\":"})),
        4096,
    );
    let response = call(
        &state,
        &json!({"jsonrpc":"2.0","id":5,"method":"tools/call","params":{
            "name":"get_interface","arguments":{"projectId":"1","interfaceId":"2"}}}),
    );
    assert!(response.get("error").is_none());
    assert_eq!(response["result"]["isError"], true);
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("接口请求失败：schema parse error: "));
}

#[test]
fn upstream_failure_becomes_error_result() {
    let (state, sink) = state_with(None, 4096);
    let response = call(
        &state,
        &json!({"jsonrpc":"2.0","id":4,"method":"tools/call","params":{
            "name":"get_interface","arguments":{"projectId":"1","interfaceId":"2"}}}),
    );
    assert_eq!(response["result"]["isError"], true);
    assert_eq!(
        response["result"]["content"][0]["text"],
        "接口请求失败：Failed to make request to YApi API: token invalid"
    );
    let events = sink.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].outcome, LogOutcome::Error);
    assert_eq!(events[0].tool.as_deref(), Some("get_interface"));
}

#[test]
fn debug_without_host_reports_not_configured() {
    let state = default_state();
    let response = call(
        &state,
        &json!({"jsonrpc":"2.0","id":5,"method":"tools/call","params":{
            "name":"debug_api","arguments":{"projectId":"1","interfaceId":"2"}}}),
    );
    assert_eq!(
        response["result"]["content"][0]["text"],
        "接口请求失败：debug.base_url is not configured"
    );
}

#[test]
fn protocol_errors_use_jsonrpc_codes() {
    let state = default_state();
    let unknown = call(
        &state,
        &json!({"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"nope","arguments":{}}}),
    );
    assert_eq!(unknown["error"]["code"], -32601);
    let invalid = call(
        &state,
        &json!({"jsonrpc":"2.0","id":7,"method":"tools/call","params":{
            "name":"get_interface","arguments":{"projectId":"1"}}}),
    );
    assert_eq!(invalid["error"]["code"], -32602);
    let version = call(&state, &json!({"jsonrpc":"1.0","id":8,"method":"ping"}));
    assert_eq!(version["error"]["code"], -32600);
    let missing = call(&state, &json!({"jsonrpc":"2.0","id":9,"method":"resources/list"}));
    assert_eq!(missing["error"]["code"], -32601);
}

#[test]
fn oversized_body_is_rejected() {
    let (state, _) = state_with(None, 16);
    let bytes = br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#;
    let (status, payload) = respond(&state, &stdio_context(), bytes).unwrap();
    assert_eq!(status, axum::http::StatusCode::PAYLOAD_TOO_LARGE);
    let response: Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(response["error"]["code"], -32070);
}

#[test]
fn malformed_json_is_an_invalid_request() {
    let state = default_state();
    let (_, payload) = respond(&state, &stdio_context(), b"{not json").unwrap();
    let response: Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(response["error"]["code"], -32600);
    assert_eq!(response["id"], Value::Null);
}
