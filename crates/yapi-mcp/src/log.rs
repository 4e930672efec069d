// yapi-mcp/src/log.rs
// ============================================================================
// Module: MCP Structured Logging
// Description: JSON-line log events for requests, upstream calls, and server notices.
// Purpose: Emit redacted, machine-readable logs through a pluggable sink.
// Dependencies: serde, serde_json, url, yapi-mcp-config
// ============================================================================

//! ## Overview
//! Every event serializes to a single JSON line. Sinks are trait objects chosen
//! from [`LoggingConfig`] and passed explicitly to the router and server, so
//! the transport never changes where logs go behind their back. Stdout is
//! never a sink: in stdio mode it carries the protocol.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use url::Url;
use yapi_mcp_config::LogSinkKind;
use yapi_mcp_config::LoggingConfig;
use yapi_mcp_config::ServerTransport;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Replacement text for secrets in logged URLs.
const REDACTED: &str = "<redacted>";

/// Query keys whose values never reach a log line.
const SECRET_QUERY_KEYS: &[&str] = &["token", "access_token", "app_client_secret"];

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome label shared by request and upstream events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogOutcome {
    /// Completed successfully.
    Ok,
    /// Completed with an error.
    Error,
}

/// Upstream service a client call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Upstream {
    /// The YApi open API.
    Yapi,
    /// The host that debug requests are replayed against.
    Debug,
}

impl Upstream {
    /// Returns the label used in error messages.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Yapi => "YApi API",
            Self::Debug => "debug API",
        }
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Severity for free-form server notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Informational notice.
    Info,
    /// Recoverable problem.
    Warn,
    /// Failure surfaced to a caller.
    Error,
}

/// Per-request MCP log event.
#[derive(Debug, Clone, Serialize)]
pub struct McpRequestEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// JSON-RPC request identifier when provided.
    pub request_id: Option<String>,
    /// Transport used for the request.
    pub transport: ServerTransport,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// JSON-RPC method name.
    pub method: String,
    /// Tool name for `tools/call`.
    pub tool: Option<String>,
    /// Request outcome.
    pub outcome: LogOutcome,
    /// JSON-RPC error code when present.
    pub error_code: Option<i64>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response body size in bytes.
    pub response_bytes: usize,
}

/// Inputs for [`McpRequestEvent::new`].
pub struct McpRequestEventParams {
    /// JSON-RPC request identifier when provided.
    pub request_id: Option<String>,
    /// Transport used for the request.
    pub transport: ServerTransport,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// JSON-RPC method name.
    pub method: String,
    /// Tool name for `tools/call`.
    pub tool: Option<String>,
    /// Request outcome.
    pub outcome: LogOutcome,
    /// JSON-RPC error code when present.
    pub error_code: Option<i64>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response body size in bytes.
    pub response_bytes: usize,
}

impl McpRequestEvent {
    /// Builds a request event stamped with the current time.
    #[must_use]
    pub fn new(params: McpRequestEventParams) -> Self {
        Self {
            event: "mcp_request",
            timestamp_ms: now_ms(),
            request_id: params.request_id,
            transport: params.transport,
            peer_ip: params.peer_ip,
            method: params.method,
            tool: params.tool,
            outcome: params.outcome,
            error_code: params.error_code,
            request_bytes: params.request_bytes,
            response_bytes: params.response_bytes,
        }
    }
}

/// One attempt of an upstream HTTP call.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamCallEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Upstream targeted by the call.
    pub upstream: Upstream,
    /// HTTP method.
    pub method: String,
    /// Request URL with secret query values redacted.
    pub url: String,
    /// Attempt number, starting at 1.
    pub attempt: u32,
    /// HTTP status when a response arrived.
    pub status: Option<u16>,
    /// Wall-clock duration of the attempt.
    pub duration_ms: u128,
    /// Attempt outcome.
    pub outcome: LogOutcome,
    /// Failure description when the attempt failed.
    pub error: Option<String>,
}

/// Inputs for [`UpstreamCallEvent::new`].
pub struct UpstreamCallEventParams<'a> {
    /// Upstream targeted by the call.
    pub upstream: Upstream,
    /// HTTP method.
    pub method: &'a str,
    /// Request URL; redacted before it is stored.
    pub url: &'a Url,
    /// Attempt number, starting at 1.
    pub attempt: u32,
    /// HTTP status when a response arrived.
    pub status: Option<u16>,
    /// Wall-clock duration of the attempt.
    pub duration_ms: u128,
    /// Attempt outcome.
    pub outcome: LogOutcome,
    /// Failure description when the attempt failed.
    pub error: Option<String>,
}

impl UpstreamCallEvent {
    /// Builds an upstream call event with the URL redacted.
    #[must_use]
    pub fn new(params: UpstreamCallEventParams<'_>) -> Self {
        Self {
            event: "yapi_call",
            timestamp_ms: now_ms(),
            upstream: params.upstream,
            method: params.method.to_string(),
            url: redact_url(params.url),
            attempt: params.attempt,
            status: params.status,
            duration_ms: params.duration_ms,
            outcome: params.outcome,
            error: params.error,
        }
    }
}

/// Free-form server notice (startup, shutdown, tool failures).
#[derive(Debug, Clone, Serialize)]
pub struct ServerLogEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Severity.
    pub level: LogLevel,
    /// Message text.
    pub message: String,
}

impl ServerLogEvent {
    /// Builds a server notice.
    #[must_use]
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            event: "server_log",
            timestamp_ms: now_ms(),
            level,
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Log sink for MCP events.
pub trait McpLogSink: Send + Sync {
    /// Record an MCP request event.
    fn record_request(&self, event: &McpRequestEvent);

    /// Record an upstream call attempt.
    fn record_upstream(&self, _event: &UpstreamCallEvent) {}

    /// Record a server notice.
    fn record_server(&self, _event: &ServerLogEvent) {}
}

/// Shared sink handle threaded through clients, router, and server.
pub type SharedLogSink = Arc<dyn McpLogSink>;

/// Log sink that writes JSON lines to stderr.
pub struct McpStderrLogSink;

impl McpStderrLogSink {
    /// Serializes one event onto stderr.
    fn emit<T: Serialize>(event: &T) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

impl McpLogSink for McpStderrLogSink {
    fn record_request(&self, event: &McpRequestEvent) {
        Self::emit(event);
    }

    fn record_upstream(&self, event: &UpstreamCallEvent) {
        Self::emit(event);
    }

    fn record_server(&self, event: &ServerLogEvent) {
        Self::emit(event);
    }
}

/// Log sink that appends JSON lines to a file.
pub struct McpFileLogSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl McpFileLogSink {
    /// Opens the log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Serializes one event onto the file.
    fn emit<T: Serialize>(&self, event: &T) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl McpLogSink for McpFileLogSink {
    fn record_request(&self, event: &McpRequestEvent) {
        self.emit(event);
    }

    fn record_upstream(&self, event: &UpstreamCallEvent) {
        self.emit(event);
    }

    fn record_server(&self, event: &ServerLogEvent) {
        self.emit(event);
    }
}

/// No-op log sink.
pub struct McpNoopLogSink;

impl McpLogSink for McpNoopLogSink {
    fn record_request(&self, _event: &McpRequestEvent) {}
}

/// Builds the sink selected by configuration.
///
/// # Errors
///
/// Returns an I/O error when the file sink cannot open its path.
pub fn build_log_sink(config: &LoggingConfig) -> io::Result<SharedLogSink> {
    match (config.sink, config.path.as_deref()) {
        (LogSinkKind::Stderr, _) => Ok(Arc::new(McpStderrLogSink)),
        (LogSinkKind::File, Some(path)) => Ok(Arc::new(McpFileLogSink::new(Path::new(path))?)),
        (LogSinkKind::File, None) => {
            Err(io::Error::new(io::ErrorKind::InvalidInput, "file log sink requires a path"))
        }
        (LogSinkKind::None, _) => Ok(Arc::new(McpNoopLogSink)),
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Milliseconds since the Unix epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

/// Renders `url` with secret query values replaced.
#[must_use]
pub fn redact_url(url: &Url) -> String {
    let needs_redaction =
        url.query_pairs().any(|(key, _)| SECRET_QUERY_KEYS.contains(&key.as_ref()));
    if !needs_redaction {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if SECRET_QUERY_KEYS.contains(&key.as_ref()) {
                REDACTED.to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions use unwrap for clarity."
    )]

    use std::fs;

    use super::*;

    #[test]
    fn redact_url_masks_token_only() {
        let url = Url::parse("https://yapi.example.com/api/interface/get?id=1&token=abc").unwrap();
        let redacted = redact_url(&url);
        assert!(redacted.contains("id=1"));
        assert!(!redacted.contains("abc"));
        assert!(redacted.contains("token=%3Credacted%3E"));
    }

    #[test]
    fn redact_url_leaves_plain_urls_untouched() {
        let url = Url::parse("http://127.0.0.1:9000/user/list?page=2").unwrap();
        assert_eq!(redact_url(&url), "http://127.0.0.1:9000/user/list?page=2");
    }

    #[test]
    fn file_sink_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp.log");
        let sink = McpFileLogSink::new(&path).unwrap();
        sink.record_server(&ServerLogEvent::new(LogLevel::Info, "started"));
        sink.record_server(&ServerLogEvent::new(LogLevel::Error, "接口请求失败"));
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "server_log");
        assert_eq!(first["level"], "info");
        assert_eq!(first["message"], "started");
    }

    #[test]
    fn upstream_event_stores_redacted_url() {
        let url = Url::parse("http://yapi.local/api/interface/get?id=9&token=s3cret").unwrap();
        let event = UpstreamCallEvent::new(UpstreamCallEventParams {
            upstream: Upstream::Yapi,
            method: "GET",
            url: &url,
            attempt: 1,
            status: Some(200),
            duration_ms: 3,
            outcome: LogOutcome::Ok,
            error: None,
        });
        assert_eq!(event.event, "yapi_call");
        assert!(!event.url.contains("s3cret"));
        let payload = serde_json::to_value(&event).unwrap();
        assert_eq!(payload["upstream"], "yapi");
    }

    #[test]
    fn build_log_sink_requires_path_for_file() {
        let config = LoggingConfig {
            sink: LogSinkKind::File,
            path: None,
        };
        assert!(build_log_sink(&config).is_err());
    }
}
