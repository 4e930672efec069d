// yapi-mcp/tests/common/mod.rs
// ============================================================================
// Module: Stub Upstream Servers
// Description: tiny_http servers standing in for YApi and the debug host.
// Purpose: Capture outgoing requests and replay canned responses.
// Dependencies: tiny_http, yapi-mcp-config
// ============================================================================

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Shared helpers are not used by every test binary."
)]

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;
use yapi_mcp::McpNoopLogSink;
use yapi_mcp::SharedLogSink;
use yapi_mcp_config::DebugConfig;
use yapi_mcp_config::RetryConfig;
use yapi_mcp_config::YapiConfig;

/// Request observed by a stub server.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// HTTP method.
    pub method: String,
    /// Path and query.
    pub url: String,
    /// Header name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: String,
}

impl CapturedRequest {
    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Running stub server.
pub struct StubServer {
    /// Base URL, e.g. `http://127.0.0.1:40123`.
    pub base_url: String,
    /// Captured requests in arrival order.
    requests: mpsc::Receiver<CapturedRequest>,
    /// Server thread.
    handle: thread::JoinHandle<()>,
}

impl StubServer {
    /// Waits for the server thread and returns every captured request.
    pub fn finish(self) -> Vec<CapturedRequest> {
        self.handle.join().unwrap();
        self.requests.try_iter().collect()
    }
}

/// Serves `responses` in order, one per incoming request, then stops.
pub fn spawn_stub(responses: Vec<(u16, String)>) -> StubServer {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let base_url = format!("http://{addr}");
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        for (status, body) in responses {
            let Ok(mut request) = server.recv() else {
                return;
            };
            let mut request_body = String::new();
            let _ = request.as_reader().read_to_string(&mut request_body);
            let _ = tx.send(CapturedRequest {
                method: request.method().to_string(),
                url: request.url().to_string(),
                headers: request
                    .headers()
                    .iter()
                    .map(|header| (header.field.to_string(), header.value.to_string()))
                    .collect(),
                body: request_body,
            });
            let content_type =
                Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
            let response =
                Response::from_string(body).with_status_code(status).with_header(content_type);
            let _ = request.respond(response);
        }
    });
    StubServer {
        base_url,
        requests: rx,
        handle,
    }
}

/// Single-response stub.
pub fn spawn_once(status: u16, body: &str) -> StubServer {
    spawn_stub(vec![(status, body.to_string())])
}

/// Log sink discarding everything.
pub fn noop_log() -> SharedLogSink {
    Arc::new(McpNoopLogSink)
}

/// Retry policy without sleeping.
pub const fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        backoff_ms: 0,
    }
}

/// YApi config pointed at `base_url`.
pub fn yapi_config(base_url: &str) -> YapiConfig {
    YapiConfig {
        base_url: Some(format!("{base_url}/api")),
        token: Some("project-token".to_string()),
        retry: fast_retry(1),
        ..YapiConfig::default()
    }
}

/// Debug config pointed at `base_url`.
pub fn debug_config(base_url: &str) -> DebugConfig {
    DebugConfig {
        base_url: Some(base_url.to_string()),
        retry: fast_retry(1),
        ..DebugConfig::default()
    }
}

/// Wraps an interface record in the YApi envelope.
pub fn envelope(data: &serde_json::Value) -> String {
    serde_json::json!({"errcode": 0, "errmsg": "成功！", "data": data}).to_string()
}
