// yapi-mcp/tests/tools_end_to_end.rs
// ============================================================================
// Module: Tool End-to-End Tests
// Description: Tool calls routed through real HTTP clients and stub upstreams.
// Purpose: Validate fetch, synthesis, debug replay, and document output together.
// Dependencies: yapi-mcp, yapi-mcp-config, tiny_http
// ============================================================================

//! ## Overview
//! Builds a [`ToolRouter`] from configuration, points it at a stub YApi and a
//! stub debug host, and checks both what was sent and what came back.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use serde_json::Value;
use serde_json::json;
use yapi_mcp::ToolRouter;
use yapi_mcp_config::YapiMcpConfig;

use crate::common::debug_config;
use crate::common::envelope;
use crate::common::noop_log;
use crate::common::spawn_once;
use crate::common::spawn_stub;
use crate::common::yapi_config;

fn fixed_clock() -> String {
    "2024/3/9 18:00:00".to_string()
}

fn router(yapi_base: &str, debug_base: Option<&str>) -> ToolRouter {
    let config = YapiMcpConfig {
        yapi: yapi_config(yapi_base),
        debug: debug_base.map(debug_config).unwrap_or_default(),
        ..YapiMcpConfig::default()
    };
    ToolRouter::from_config(&config, noop_log()).unwrap().with_clock(fixed_clock)
}

fn add_user_record() -> Value {
    json!({
        "_id": 11,
        "title": "新增用户",
        "path": "/user/add",
        "method": "POST",
        "req_body_other": r#"{"type":"object","required":["name"],"properties":{
            "name":{"type":"string","description":"姓名","mock":{"mock":"@cname"}},
            "age":{"type":"integer","mock":{"mock":"18"}},
            "tags":{"type":"array","items":{"type":"string"}}}}"#,
        "res_body": r#"{"type":"object","properties":{"code":{"type":"integer"}}}"#
    })
}

// ============================================================================
// SECTION: get_interface
// ============================================================================

#[test]
fn get_interface_renders_fetched_record() {
    let yapi = spawn_once(200, &envelope(&add_user_record()));
    let router = router(&yapi.base_url, None);
    let result = router
        .handle_tool_call("get_interface", json!({"projectId": "7", "interfaceId": 11}))
        .unwrap();
    assert_eq!(result.is_error, None);
    let text = result.first_text();
    assert!(text.starts_with("# 🚀 YApi 接口文档\n\n"));
    assert!(text.contains("**🔗 接口路径:** `/user/add`"));
    assert!(text.contains("## 📦 请求体 (Request Body)"));
    assert!(text.contains("**name** | `string` | "));
    assert!(text.contains("## 🔧 原始数据 (Raw Data)"));
    assert!(text.ends_with("---\n*📅 生成时间: 2024/3/9 18:00:00*\n"));
    let requests = yapi.finish();
    assert_eq!(requests[0].url, "/api/interface/get?id=11&project_id=7&token=project-token");
}

// ============================================================================
// SECTION: debug_api
// ============================================================================

#[test]
fn debug_api_sends_synthesized_body() {
    let yapi = spawn_once(200, &envelope(&add_user_record()));
    let host = spawn_once(200, r#"{"code":0,"msg":"ok"}"#);
    let router = router(&yapi.base_url, Some(&host.base_url));
    let result = router
        .handle_tool_call("debug_api", json!({"projectId": "7", "interfaceId": "11"}))
        .unwrap();
    assert_eq!(result.is_error, None);

    let sent = host.finish();
    assert_eq!(sent[0].method, "POST");
    assert_eq!(sent[0].url, "/user/add");
    let body: Value = serde_json::from_str(&sent[0].body).unwrap();
    assert_eq!(body, json!({"name": "@cname", "age": 18, "tags": [""]}));
    yapi.finish();

    let text = result.first_text();
    assert!(text.starts_with("# 🧪 接口调试结果\n\n---\n## 📋 接口详情\n---\n\n"));
    assert!(text.contains("### 📦 请求 Body 参数\n```json\n"));
    assert!(!text.contains("### 📤 请求 Query 参数"));
    assert!(text.contains("**✅ 调试成功!**"));
    assert!(text.contains("```json\n{\n  \"code\": 0,\n  \"msg\": \"ok\"\n}\n```\n\n"));
    assert!(text.ends_with("---\n*📅 调试时间: 2024/3/9 18:00:00*\n"));
    assert!(!text.contains("原始数据"));
}

#[test]
fn debug_api_overrides_replace_synthesized_values() {
    let record = json!({
        "title": "用户列表",
        "path": "/user/list",
        "method": "GET",
        "req_query": [
            {"name": "page", "required": "1", "example": "1"},
            {"name": "size", "required": "0", "example": "20"}
        ]
    });
    let yapi = spawn_once(200, &envelope(&record));
    let host = spawn_once(200, "[]");
    let router = router(&yapi.base_url, Some(&host.base_url));
    let result = router
        .handle_tool_call(
            "debug_api",
            json!({"projectId": "7", "interfaceId": "3", "debugQueryParams": {"page": 2}}),
        )
        .unwrap();
    let sent = host.finish();
    yapi.finish();
    assert_eq!(sent[0].url, "/user/list?page=2");
    let text = result.first_text();
    assert!(text.contains("### 📤 请求 Query 参数\n```json\n{\n  \"page\": 2\n}\n```\n\n"));
}

#[test]
fn synthesized_query_is_shown_as_strings() {
    let record = json!({
        "path": "/user/list",
        "method": "GET",
        "req_query": [{"name": "page", "required": "1", "example": "1"}]
    });
    let yapi = spawn_once(200, &envelope(&record));
    let host = spawn_once(200, "[]");
    let router = router(&yapi.base_url, Some(&host.base_url));
    let result = router
        .handle_tool_call("debug_api", json!({"projectId": "7", "interfaceId": "3"}))
        .unwrap();
    assert_eq!(host.finish()[0].url, "/user/list?page=1");
    yapi.finish();
    assert!(result.first_text().contains("{\n  \"page\": \"1\"\n}"));
}

#[test]
fn debug_host_failure_is_an_error_result() {
    let yapi = spawn_once(200, &envelope(&add_user_record()));
    let host = spawn_once(401, r#"{"message":"unauthorized"}"#);
    let router = router(&yapi.base_url, Some(&host.base_url));
    let result = router
        .handle_tool_call("debug_api", json!({"projectId": "7", "interfaceId": "11"}))
        .unwrap();
    host.finish();
    yapi.finish();
    assert_eq!(result.is_error, Some(true));
    assert_eq!(
        result.first_text(),
        "接口请求失败：Failed to make request to debug API: HTTP status 401"
    );
}

// ============================================================================
// SECTION: Invalid Schema Text
// ============================================================================

fn record_with(field: &str) -> Value {
    let mut record = add_user_record();
    record[field] = json!("{not json");
    record
}

#[test]
fn get_interface_reports_unparsable_response_schema() {
    let yapi = spawn_once(200, &envelope(&record_with("res_body")));
    let router = router(&yapi.base_url, None);
    let result = router
        .handle_tool_call("get_interface", json!({"projectId": "7", "interfaceId": "11"}))
        .unwrap();
    yapi.finish();
    assert_eq!(result.is_error, Some(true));
    assert!(result.first_text().starts_with("接口请求失败：schema parse error: "));
}

#[test]
fn debug_api_reports_unparsable_body_schema_before_sending() {
    let yapi = spawn_once(200, &envelope(&record_with("req_body_other")));
    let host = spawn_stub(Vec::new());
    let router = router(&yapi.base_url, Some(&host.base_url));
    let result = router
        .handle_tool_call("debug_api", json!({"projectId": "7", "interfaceId": "11"}))
        .unwrap();
    yapi.finish();
    assert!(host.finish().is_empty());
    assert_eq!(result.is_error, Some(true));
    assert!(result.first_text().starts_with("接口请求失败：schema parse error: "));
}

#[test]
fn debug_api_with_body_override_fails_after_sending() {
    let yapi = spawn_once(200, &envelope(&record_with("req_body_other")));
    let host = spawn_once(200, r#"{"code":0}"#);
    let router = router(&yapi.base_url, Some(&host.base_url));
    let result = router
        .handle_tool_call(
            "debug_api",
            json!({"projectId": "7", "interfaceId": "11", "debugBodyParams": {"name": "李四"}}),
        )
        .unwrap();
    yapi.finish();
    let sent = host.finish();
    assert_eq!(sent.len(), 1);
    let body: Value = serde_json::from_str(&sent[0].body).unwrap();
    assert_eq!(body, json!({"name": "李四"}));
    assert_eq!(result.is_error, Some(true));
    assert!(result.first_text().starts_with("接口请求失败：schema parse error: "));
}
