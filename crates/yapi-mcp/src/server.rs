// yapi-mcp/src/server.rs
// ============================================================================
// Module: MCP Server
// Description: MCP server implementations for stdio, HTTP, and SSE transports.
// Purpose: Expose the YApi tools via JSON-RPC 2.0.
// Dependencies: axum, tokio, tokio-stream, yapi-mcp-config
// ============================================================================

//! ## Overview
//! The MCP server speaks JSON-RPC 2.0 over stdio, HTTP, or SSE and routes every
//! tool call through [`crate::tools::ToolRouter`]. Requests are untrusted: body
//! size is capped before parsing and every request emits an `mcp_request` log
//! event.
//!
//! On stdio each message may arrive either Content-Length framed or as a single
//! line of JSON; the reply uses the same framing as the request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::convert::Infallible;
use std::io;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::ConnectInfo;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::response::Sse;
use axum::response::sse::Event;
use axum::routing::post;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use tokio_stream::wrappers::ReceiverStream;
use yapi_mcp_config::ServerConfig;
use yapi_mcp_config::ServerTransport;
use yapi_mcp_config::YapiMcpConfig;

use crate::log::LogLevel;
use crate::log::LogOutcome;
use crate::log::McpRequestEvent;
use crate::log::McpRequestEventParams;
use crate::log::ServerLogEvent;
use crate::log::SharedLogSink;
use crate::log::build_log_sink;
use crate::tools::ToolCallResult;
use crate::tools::ToolDefinition;
use crate::tools::ToolError;
use crate::tools::ToolRouter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Server name reported by `initialize`.
pub const SERVER_NAME: &str = "Yapi-MCP";

/// Protocol version answered when the client does not name one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2025-03-26";

/// HTTP routes accepting JSON-RPC posts.
const RPC_ROUTES: [&str; 2] = ["/rpc", "/mcp"];

/// Response used when a response cannot be serialized.
const SERIALIZATION_FALLBACK: &str =
    "{\"jsonrpc\":\"2.0\",\"id\":null,\"error\":{\"code\":-32060,\"message\":\"serialization \
     failed\"}}";

// ============================================================================
// SECTION: MCP Server
// ============================================================================

/// MCP server instance.
pub struct McpServer {
    /// Server section of the configuration.
    config: ServerConfig,
    /// Tool router for request dispatch.
    router: ToolRouter,
    /// Log sink.
    log: SharedLogSink,
}

impl McpServer {
    /// Builds a new MCP server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when validation or client setup fails.
    pub fn from_config(config: YapiMcpConfig) -> Result<Self, McpServerError> {
        config.validate().map_err(|err| McpServerError::Config(err.to_string()))?;
        let log = build_log_sink(&config.logging)
            .map_err(|err| McpServerError::Init(format!("log sink: {err}")))?;
        let router = ToolRouter::from_config(&config, Arc::clone(&log))
            .map_err(|err| McpServerError::Init(err.to_string()))?;
        Ok(Self::new(config.server, router, log))
    }

    /// Builds a server over an existing router.
    #[must_use]
    pub const fn new(config: ServerConfig, router: ToolRouter, log: SharedLogSink) -> Self {
        Self {
            config,
            router,
            log,
        }
    }

    /// Serves requests using the configured transport.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when the server fails.
    pub async fn serve(self) -> Result<(), McpServerError> {
        let transport = self.config.transport;
        let bind = self.config.bind_addr();
        let state = Arc::new(ServerState {
            router: self.router,
            max_body_bytes: self.config.max_body_bytes,
            log: self.log,
        });
        let started = match transport {
            ServerTransport::Stdio => "YApi MCP server listening on stdio".to_string(),
            ServerTransport::Http | ServerTransport::Sse => {
                format!("YApi MCP server listening on {bind} ({})", transport.as_str())
            }
        };
        state.log.record_server(&ServerLogEvent::new(LogLevel::Info, started));
        match transport {
            ServerTransport::Stdio => {
                let reader = BufReader::new(io::stdin());
                serve_stdio(&state, reader, io::stdout())
            }
            ServerTransport::Http | ServerTransport::Sse => {
                serve_http(state, transport, &bind).await
            }
        }
    }
}

/// Shared server state for all transports.
struct ServerState {
    /// Tool router for request dispatch.
    router: ToolRouter,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
    /// Log sink.
    log: SharedLogSink,
}

/// Per-request transport details.
struct RequestContext {
    /// Transport the request arrived on.
    transport: ServerTransport,
    /// Peer IP address for network transports.
    peer_ip: Option<String>,
}

// ============================================================================
// SECTION: Stdio Transport
// ============================================================================

/// Stdio message framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    /// `Content-Length` headers followed by the payload.
    ContentLength,
    /// One JSON document per line.
    Line,
}

/// Body of one stdio message.
#[derive(Debug, PartialEq, Eq)]
enum FrameBody {
    /// Payload within the size limit.
    Payload(Vec<u8>),
    /// Payload over the size limit; already discarded from the stream.
    TooLarge,
}

/// One stdio message.
#[derive(Debug, PartialEq, Eq)]
struct Frame {
    /// Framing the message arrived in.
    framing: Framing,
    /// Message body.
    body: FrameBody,
}

/// Serves JSON-RPC requests over a reader/writer pair until end of input.
fn serve_stdio(
    state: &ServerState,
    mut reader: impl BufRead,
    mut writer: impl Write,
) -> Result<(), McpServerError> {
    let context = RequestContext {
        transport: ServerTransport::Stdio,
        peer_ip: None,
    };
    while let Some(frame) = read_message(&mut reader, state.max_body_bytes)? {
        let reply = match frame.body {
            FrameBody::Payload(bytes) => respond(state, &context, &bytes).map(|(_, payload)| payload),
            FrameBody::TooLarge => Some(serialize_response(&payload_too_large().1)),
        };
        if let Some(payload) = reply {
            match frame.framing {
                Framing::ContentLength => write_framed(&mut writer, payload.as_bytes())?,
                Framing::Line => write_line(&mut writer, payload.as_bytes())?,
            }
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: HTTP Transport
// ============================================================================

/// Serves JSON-RPC requests over HTTP or SSE.
async fn serve_http(
    state: Arc<ServerState>,
    transport: ServerTransport,
    bind: &str,
) -> Result<(), McpServerError> {
    let addr: SocketAddr =
        bind.parse().map_err(|_| McpServerError::Config("invalid bind address".to_string()))?;
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);
    let mut app = Router::new();
    for route in RPC_ROUTES {
        app = match transport {
            ServerTransport::Sse => app.route(route, post(handle_sse)),
            ServerTransport::Http | ServerTransport::Stdio => app.route(route, post(handle_http)),
        };
    }
    let app = app.layer(body_limit).with_state(state);
    let label = transport.as_str();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|_| McpServerError::Transport(format!("{label} bind failed")))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(|_| McpServerError::Transport(format!("{label} server failed")))
}

/// Handles HTTP JSON-RPC requests.
async fn handle_http(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    bytes: Bytes,
) -> Response {
    let context = RequestContext {
        transport: ServerTransport::Http,
        peer_ip: Some(peer.ip().to_string()),
    };
    match respond(&state, &context, &bytes) {
        Some((status, payload)) => {
            (status, [(CONTENT_TYPE, "application/json")], payload).into_response()
        }
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Handles SSE JSON-RPC requests with a single-event stream.
async fn handle_sse(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    bytes: Bytes,
) -> Response {
    let context = RequestContext {
        transport: ServerTransport::Sse,
        peer_ip: Some(peer.ip().to_string()),
    };
    let Some((_, payload)) = respond(&state, &context, &bytes) else {
        return StatusCode::ACCEPTED.into_response();
    };
    let (tx, rx) = tokio::sync::mpsc::channel::<Result<Event, Infallible>>(1);
    let _ = tx.send(Ok(Event::default().data(payload))).await;
    Sse::new(ReceiverStream::new(rx)).into_response()
}

// ============================================================================
// SECTION: JSON-RPC Handling
// ============================================================================

/// Incoming JSON-RPC request payload.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    /// JSON-RPC protocol version.
    jsonrpc: String,
    /// Request identifier; absent for notifications.
    #[serde(default)]
    id: Option<Value>,
    /// Method name.
    method: String,
    /// Optional parameters payload.
    #[serde(default)]
    params: Option<Value>,
}

/// JSON-RPC response envelope.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    /// JSON-RPC protocol version.
    jsonrpc: &'static str,
    /// Request identifier.
    id: Value,
    /// Successful result payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    /// Error payload when the request fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Successful response.
    const fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Error response.
    const fn failure(id: Value, code: i64, message: String) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
            }),
        }
    }
}

/// JSON-RPC error payload.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    /// Error code.
    code: i64,
    /// Human-readable error message.
    message: String,
}

/// Tool call parameters for JSON-RPC requests.
#[derive(Debug, Deserialize)]
struct ToolCallParams {
    /// Tool name.
    name: String,
    /// Raw JSON arguments.
    #[serde(default)]
    arguments: Value,
}

/// Tool list response payload.
#[derive(Debug, Serialize)]
struct ToolListResult {
    /// Registered tool definitions.
    tools: Vec<ToolDefinition>,
}

/// Result of dispatching one request, with the fields the log event needs.
struct Dispatched {
    /// Request id rendered as text.
    request_id: Option<String>,
    /// JSON-RPC method.
    method: String,
    /// Tool name for `tools/call`.
    tool: Option<String>,
    /// True when a tool result was flagged `isError`.
    tool_failed: bool,
    /// Response; `None` for notifications.
    response: Option<(StatusCode, JsonRpcResponse)>,
}

/// Parses, dispatches, serializes, and logs one request.
fn respond(
    state: &ServerState,
    context: &RequestContext,
    bytes: &[u8],
) -> Option<(StatusCode, String)> {
    let dispatched = parse_request(state, bytes);
    let reply = dispatched
        .response
        .as_ref()
        .map(|(status, response)| (*status, serialize_response(response)));
    let error_code = dispatched
        .response
        .as_ref()
        .and_then(|(_, response)| response.error.as_ref().map(|error| error.code));
    let outcome = if error_code.is_some() || dispatched.tool_failed {
        LogOutcome::Error
    } else {
        LogOutcome::Ok
    };
    state.log.record_request(&McpRequestEvent::new(McpRequestEventParams {
        request_id: dispatched.request_id,
        transport: context.transport,
        peer_ip: context.peer_ip.clone(),
        method: dispatched.method,
        tool: dispatched.tool,
        outcome,
        error_code,
        request_bytes: bytes.len(),
        response_bytes: reply.as_ref().map_or(0, |(_, payload)| payload.len()),
    }));
    reply
}

/// Parses and validates a JSON-RPC request payload.
fn parse_request(state: &ServerState, bytes: &[u8]) -> Dispatched {
    if bytes.len() > state.max_body_bytes {
        return Dispatched {
            request_id: None,
            method: String::new(),
            tool: None,
            tool_failed: false,
            response: Some(payload_too_large()),
        };
    }
    match serde_json::from_slice::<JsonRpcRequest>(bytes) {
        Ok(request) => handle_request(&state.router, request),
        Err(_) => Dispatched {
            request_id: None,
            method: String::new(),
            tool: None,
            tool_failed: false,
            response: Some((
                StatusCode::BAD_REQUEST,
                JsonRpcResponse::failure(
                    Value::Null,
                    -32600,
                    "invalid json-rpc request".to_string(),
                ),
            )),
        },
    }
}

/// Dispatches a JSON-RPC request to the tool router.
fn handle_request(router: &ToolRouter, request: JsonRpcRequest) -> Dispatched {
    let mut dispatched = Dispatched {
        request_id: request.id.as_ref().map(Value::to_string),
        method: request.method.clone(),
        tool: None,
        tool_failed: false,
        response: None,
    };
    let Some(id) = request.id else {
        return dispatched;
    };
    if request.jsonrpc != "2.0" {
        dispatched.response = Some((
            StatusCode::BAD_REQUEST,
            JsonRpcResponse::failure(id, -32600, "invalid json-rpc version".to_string()),
        ));
        return dispatched;
    }
    let response = match request.method.as_str() {
        "initialize" => success(id, initialize_result(request.params.as_ref())),
        "ping" => success(id, json!({})),
        "tools/list" => serde_json::to_value(ToolListResult {
            tools: router.list_tools(),
        })
        .map_or_else(|_| jsonrpc_error(id.clone(), ToolError::Serialization), |value| {
            success(id.clone(), value)
        }),
        "tools/call" => {
            let params = request.params.unwrap_or(Value::Null);
            match serde_json::from_value::<ToolCallParams>(params) {
                Ok(call) => {
                    dispatched.tool = Some(call.name.clone());
                    match call_tool_with_blocking(router, &call.name, call.arguments) {
                        Ok(result) => {
                            dispatched.tool_failed = result.is_error == Some(true);
                            serde_json::to_value(&result).map_or_else(
                                |_| jsonrpc_error(id.clone(), ToolError::Serialization),
                                |value| success(id.clone(), value),
                            )
                        }
                        Err(err) => jsonrpc_error(id, err),
                    }
                }
                Err(_) => (
                    StatusCode::BAD_REQUEST,
                    JsonRpcResponse::failure(id, -32602, "invalid tool params".to_string()),
                ),
            }
        }
        _ => (
            StatusCode::BAD_REQUEST,
            JsonRpcResponse::failure(id, -32601, "method not found".to_string()),
        ),
    };
    dispatched.response = Some(response);
    dispatched
}

/// Result payload for `initialize`.
fn initialize_result(params: Option<&Value>) -> Value {
    let protocol_version = params
        .and_then(|params| params.get("protocolVersion"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_PROTOCOL_VERSION);
    json!({
        "protocolVersion": protocol_version,
        "capabilities": {"tools": {"listChanged": false}},
        "serverInfo": {"name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION")}
    })
}

/// Executes a tool call, shifting to a blocking context when available.
fn call_tool_with_blocking(
    router: &ToolRouter,
    name: &str,
    arguments: Value,
) -> Result<ToolCallResult, ToolError> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| router.handle_tool_call(name, arguments))
        }
        _ => router.handle_tool_call(name, arguments),
    }
}

/// Successful response tuple.
const fn success(id: Value, result: Value) -> (StatusCode, JsonRpcResponse) {
    (StatusCode::OK, JsonRpcResponse::success(id, result))
}

/// Response for bodies over the size limit.
fn payload_too_large() -> (StatusCode, JsonRpcResponse) {
    (
        StatusCode::PAYLOAD_TOO_LARGE,
        JsonRpcResponse::failure(Value::Null, -32070, "request body too large".to_string()),
    )
}

/// Builds a JSON-RPC error response for a tool failure.
fn jsonrpc_error(id: Value, error: ToolError) -> (StatusCode, JsonRpcResponse) {
    let (status, code, message) = match error {
        ToolError::UnknownTool(name) => {
            (StatusCode::BAD_REQUEST, -32601, format!("unknown tool: {name}"))
        }
        ToolError::InvalidParams(message) => (StatusCode::BAD_REQUEST, -32602, message),
        ToolError::Upstream(message) | ToolError::Document(message) => {
            (StatusCode::OK, -32603, message)
        }
        ToolError::Serialization => (StatusCode::OK, -32060, "serialization failed".to_string()),
    };
    (status, JsonRpcResponse::failure(id, code, message))
}

/// Serializes a response, falling back to a fixed serialization error.
fn serialize_response(response: &JsonRpcResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|_| SERIALIZATION_FALLBACK.to_string())
}

// ============================================================================
// SECTION: Framing Helpers
// ============================================================================

/// Reads one stdio message, detecting its framing.
///
/// Returns `Ok(None)` at end of input.
fn read_message(
    reader: &mut impl BufRead,
    max_body_bytes: usize,
) -> Result<Option<Frame>, McpServerError> {
    let mut line = String::new();
    loop {
        line.clear();
        let bytes = reader
            .read_line(&mut line)
            .map_err(|_| McpServerError::Transport("stdio read failed".to_string()))?;
        if bytes == 0 {
            return Ok(None);
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            let body = if trimmed.len() > max_body_bytes {
                FrameBody::TooLarge
            } else {
                FrameBody::Payload(trimmed.as_bytes().to_vec())
            };
            return Ok(Some(Frame {
                framing: Framing::Line,
                body,
            }));
        }
        let first_header = trimmed.to_string();
        return read_framed_body(reader, &first_header, max_body_bytes).map(|body| {
            Some(Frame {
                framing: Framing::ContentLength,
                body,
            })
        });
    }
}

/// Reads the remaining headers and the body of a Content-Length message.
fn read_framed_body(
    reader: &mut impl BufRead,
    first_header: &str,
    max_body_bytes: usize,
) -> Result<FrameBody, McpServerError> {
    let mut content_length = content_length_header(first_header)?;
    let mut line = String::new();
    loop {
        line.clear();
        let bytes = reader
            .read_line(&mut line)
            .map_err(|_| McpServerError::Transport("stdio read failed".to_string()))?;
        if bytes == 0 {
            return Err(McpServerError::Transport("stdio closed".to_string()));
        }
        if line.trim().is_empty() {
            break;
        }
        if let Some(parsed) = content_length_header(line.trim())? {
            content_length = Some(parsed);
        }
    }
    let len = content_length
        .ok_or_else(|| McpServerError::Transport("missing content length".to_string()))?;
    if len > max_body_bytes {
        let len = u64::try_from(len)
            .map_err(|_| McpServerError::Transport("invalid content length".to_string()))?;
        io::copy(&mut reader.by_ref().take(len), &mut io::sink())
            .map_err(|_| McpServerError::Transport("stdio read failed".to_string()))?;
        return Ok(FrameBody::TooLarge);
    }
    let mut buf = vec![0u8; len];
    reader
        .read_exact(&mut buf)
        .map_err(|_| McpServerError::Transport("stdio read failed".to_string()))?;
    Ok(FrameBody::Payload(buf))
}

/// Parses a `Content-Length` header line; other headers yield `None`.
fn content_length_header(line: &str) -> Result<Option<usize>, McpServerError> {
    let Some((name, value)) = line.split_once(':') else {
        return Err(McpServerError::Transport("invalid stdio header".to_string()));
    };
    if !name.trim().eq_ignore_ascii_case("content-length") {
        return Ok(None);
    }
    value
        .trim()
        .parse::<usize>()
        .map(Some)
        .map_err(|_| McpServerError::Transport("invalid content length".to_string()))
}

/// Writes a framed stdio payload using MCP Content-Length headers.
fn write_framed(writer: &mut impl Write, payload: &[u8]) -> Result<(), McpServerError> {
    let header = format!("Content-Length: {}\r\n\r\n", payload.len());
    writer
        .write_all(header.as_bytes())
        .map_err(|_| McpServerError::Transport("stdio write failed".to_string()))?;
    writer
        .write_all(payload)
        .map_err(|_| McpServerError::Transport("stdio write failed".to_string()))?;
    writer.flush().map_err(|_| McpServerError::Transport("stdio write failed".to_string()))
}

/// Writes a newline-delimited stdio payload.
fn write_line(writer: &mut impl Write, payload: &[u8]) -> Result<(), McpServerError> {
    writer
        .write_all(payload)
        .and_then(|()| writer.write_all(b"\n"))
        .and_then(|()| writer.flush())
        .map_err(|_| McpServerError::Transport("stdio write failed".to_string()))
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// MCP server errors.
#[derive(Debug, thiserror::Error)]
pub enum McpServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
