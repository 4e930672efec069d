// yapi-mcp/src/yapi.rs
// ============================================================================
// Module: YApi HTTP Clients
// Description: Blocking clients for the YApi open API and the debug host.
// Purpose: Fetch interface definitions and replay synthesized debug requests.
// Dependencies: reqwest, serde_json, url, yapi-mcp-config, yapi-schema
// ============================================================================

//! ## Overview
//! Two clients share one transport core: [`YapiClient`] reads interface
//! records from `/interface/get`, and [`DebugClient`] sends a request to the
//! host under test. Both enforce timeouts, a response size ceiling, and a
//! linear retry policy on transport failures and 5xx statuses. Every attempt
//! emits a `yapi_call` log event with secrets redacted from the URL.
//!
//! The traits [`InterfaceSource`] and [`DebugExecutor`] are the seams the tool
//! router depends on; tests substitute in-memory implementations.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use reqwest::Method;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::blocking::RequestBuilder;
use reqwest::blocking::Response;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use yapi_mcp_config::DebugConfig;
use yapi_mcp_config::RetryConfig;
use yapi_mcp_config::YapiConfig;
use yapi_schema::QueryParams;

use crate::interface::InterfaceDetail;
use crate::log::LogOutcome;
use crate::log::SharedLogSink;
use crate::log::Upstream;
use crate::log::UpstreamCallEvent;
use crate::log::UpstreamCallEventParams;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// User agent sent to both upstreams.
const USER_AGENT: &str = concat!("yapi-mcp/", env!("CARGO_PKG_VERSION"));

/// Endpoint serving interface records, relative to the YApi base URL.
const INTERFACE_ENDPOINT: &str = "/interface/get";

/// Header carrying the debug application client id.
pub const APP_CLIENT_ID_HEADER: &str = "X-App-Client-Id";

/// Header carrying the debug application client secret.
pub const APP_CLIENT_SECRET_HEADER: &str = "X-App-Client-Secret";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Upstream client failures.
#[derive(Debug, Error)]
pub enum YapiError {
    /// Caller input was rejected before any request was made.
    #[error("{0}")]
    InvalidInput(String),
    /// A required configuration value is missing.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    /// Client construction or request building failed.
    #[error("Failed to make request to {0}: {1}")]
    Client(Upstream, String),
    /// The request could not be delivered or the body could not be read.
    #[error("Failed to make request to {0}: {1}")]
    Transport(Upstream, String),
    /// The upstream answered with a non-success status.
    #[error("Failed to make request to {0}: HTTP status {1}")]
    Status(Upstream, u16),
    /// YApi answered with a non-zero `errcode`.
    #[error("Failed to make request to {0}: {1}")]
    Api(Upstream, String),
    /// The response body was not the expected shape.
    #[error("Failed to make request to {0}: {1}")]
    Decode(Upstream, String),
}

// ============================================================================
// SECTION: Seams
// ============================================================================

/// Source of interface definitions.
pub trait InterfaceSource: Send + Sync {
    /// Fetches one interface record.
    ///
    /// # Errors
    ///
    /// Returns [`YapiError`] when the record cannot be fetched or decoded.
    fn interface_detail(
        &self,
        interface_id: &str,
        project_id: &str,
    ) -> Result<InterfaceDetail, YapiError>;
}

/// Executor for debug requests.
pub trait DebugExecutor: Send + Sync {
    /// Sends `request` and returns the decoded response body.
    ///
    /// # Errors
    ///
    /// Returns [`YapiError`] when the request fails.
    fn execute(&self, request: &DebugRequest<'_>) -> Result<Value, YapiError>;
}

/// Authentication applied to every debug request.
///
/// Hosts differ in how they authenticate callers; implement this trait to
/// attach whatever a given host expects.
pub trait DebugAuth: Send + Sync {
    /// Decorates an outgoing request.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder;
}

// ============================================================================
// SECTION: Transport Core
// ============================================================================

/// Shared blocking transport with retry and size limits.
struct UpstreamHttp {
    /// Upstream label for errors and logs.
    upstream: Upstream,
    /// Underlying reqwest client.
    client: Client,
    /// Retry policy.
    retry: RetryConfig,
    /// Response size ceiling.
    max_response_bytes: usize,
    /// Sink for `yapi_call` events.
    log: SharedLogSink,
}

impl UpstreamHttp {
    /// Builds the transport.
    fn new(
        upstream: Upstream,
        timeout_ms: u64,
        max_response_bytes: usize,
        retry: RetryConfig,
        log: SharedLogSink,
    ) -> Result<Self, YapiError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .build()
            .map_err(|_| YapiError::Client(upstream, "http client build failed".to_string()))?;
        Ok(Self {
            upstream,
            client,
            retry,
            max_response_bytes,
            log,
        })
    }

    /// Sends the request built by `build`, retrying per policy.
    fn send<F>(&self, method: &Method, url: &Url, build: F) -> Result<Vec<u8>, YapiError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let started = Instant::now();
            let outcome = build(&self.client).send();
            let elapsed = started.elapsed().as_millis();
            let mut response = match outcome {
                Ok(response) => response,
                Err(err) => {
                    let message = err.without_url().to_string();
                    self.record(method, url, attempt, None, elapsed, Some(message.clone()));
                    if attempt < max_attempts {
                        self.backoff(attempt);
                        continue;
                    }
                    return Err(YapiError::Transport(self.upstream, message));
                }
            };
            let status = response.status();
            if status.is_server_error() && attempt < max_attempts {
                self.record(
                    method,
                    url,
                    attempt,
                    Some(status.as_u16()),
                    elapsed,
                    Some(format!("HTTP status {}", status.as_u16())),
                );
                self.backoff(attempt);
                continue;
            }
            if !status.is_success() {
                self.record(
                    method,
                    url,
                    attempt,
                    Some(status.as_u16()),
                    elapsed,
                    Some(format!("HTTP status {}", status.as_u16())),
                );
                return Err(YapiError::Status(self.upstream, status.as_u16()));
            }
            let body = read_response_limited(&mut response, self.max_response_bytes, self.upstream);
            let error = body.as_ref().err().map(ToString::to_string);
            self.record(method, url, attempt, Some(status.as_u16()), elapsed, error);
            return body;
        }
    }

    /// Sleeps `attempt * backoff_ms`.
    fn backoff(&self, attempt: u32) {
        let delay = self.retry.backoff_ms.saturating_mul(u64::from(attempt));
        if delay > 0 {
            thread::sleep(Duration::from_millis(delay));
        }
    }

    /// Emits one `yapi_call` event.
    fn record(
        &self,
        method: &Method,
        url: &Url,
        attempt: u32,
        status: Option<u16>,
        duration_ms: u128,
        error: Option<String>,
    ) {
        let outcome = if error.is_some() { LogOutcome::Error } else { LogOutcome::Ok };
        self.log.record_upstream(&UpstreamCallEvent::new(UpstreamCallEventParams {
            upstream: self.upstream,
            method: method.as_str(),
            url,
            attempt,
            status,
            duration_ms,
            outcome,
            error,
        }));
    }
}

// ============================================================================
// SECTION: YApi Client
// ============================================================================

/// Response envelope of the YApi open API.
#[derive(Debug, Deserialize)]
struct YapiEnvelope {
    /// Zero on success.
    #[serde(default)]
    errcode: i64,
    /// Error message when `errcode` is non-zero.
    #[serde(default)]
    errmsg: String,
    /// Payload.
    #[serde(default)]
    data: Value,
}

/// Client for the YApi open API.
pub struct YapiClient {
    /// Base URL without a trailing slash, e.g. `https://yapi.example.com/api`.
    base_url: String,
    /// Project token appended as the `token` query parameter.
    token: Option<String>,
    /// Transport core.
    http: UpstreamHttp,
}

impl YapiClient {
    /// Builds a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`YapiError::NotConfigured`] when no base URL is set, or
    /// [`YapiError::Client`] when the base URL or client is invalid.
    pub fn new(config: &YapiConfig, log: SharedLogSink) -> Result<Self, YapiError> {
        let base_url = normalized_base(config.base_url.as_deref(), "yapi.base_url", Upstream::Yapi)?;
        let http = UpstreamHttp::new(
            Upstream::Yapi,
            config.timeout_ms,
            config.max_response_bytes,
            config.retry,
            log,
        )?;
        Ok(Self {
            base_url,
            token: non_empty(config.token.as_deref()),
            http,
        })
    }

    /// Fetches one interface record.
    ///
    /// # Errors
    ///
    /// Returns [`YapiError::InvalidInput`] when either id is empty, and
    /// upstream errors prefixed `Failed to make request to YApi API:`.
    pub fn get_interface_detail(
        &self,
        interface_id: &str,
        project_id: &str,
    ) -> Result<InterfaceDetail, YapiError> {
        let interface_id = interface_id.trim();
        let project_id = project_id.trim();
        if interface_id.is_empty() || project_id.is_empty() {
            return Err(YapiError::InvalidInput(
                "interfaceId and projectId are required".to_string(),
            ));
        }
        let mut url = Url::parse(&format!("{}{INTERFACE_ENDPOINT}", self.base_url))
            .map_err(|err| YapiError::Client(Upstream::Yapi, err.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("id", interface_id).append_pair("project_id", project_id);
            if let Some(token) = &self.token {
                pairs.append_pair("token", token);
            }
        }
        let body = self.http.send(&Method::GET, &url, |client| client.get(url.clone()))?;
        let envelope: YapiEnvelope = serde_json::from_slice(&body)
            .map_err(|err| YapiError::Decode(Upstream::Yapi, err.to_string()))?;
        if envelope.errcode != 0 {
            return Err(YapiError::Api(Upstream::Yapi, envelope.errmsg));
        }
        if !envelope.data.is_object() {
            return Err(YapiError::Decode(
                Upstream::Yapi,
                "response data is not an interface record".to_string(),
            ));
        }
        InterfaceDetail::from_value(envelope.data)
            .map_err(|err| YapiError::Decode(Upstream::Yapi, err.to_string()))
    }
}

impl InterfaceSource for YapiClient {
    fn interface_detail(
        &self,
        interface_id: &str,
        project_id: &str,
    ) -> Result<InterfaceDetail, YapiError> {
        self.get_interface_detail(interface_id, project_id)
    }
}

// ============================================================================
// SECTION: Debug Client
// ============================================================================

/// One debug request against the host under test.
#[derive(Debug, Clone, Copy)]
pub struct DebugRequest<'a> {
    /// HTTP method as declared by the interface (any case).
    pub method: &'a str,
    /// Interface path joined onto the debug base URL.
    pub path: &'a str,
    /// Query parameters; appended to the URL for GET requests.
    pub query: &'a QueryParams,
    /// JSON body; omitted when empty.
    pub body: &'a Value,
}

/// Bearer token plus application client headers.
#[derive(Debug, Clone, Default)]
pub struct HeaderDebugAuth {
    /// Bearer token.
    token: Option<String>,
    /// Application client id.
    client_id: Option<String>,
    /// Application client secret.
    client_secret: Option<String>,
}

impl HeaderDebugAuth {
    /// Reads credentials from the debug section; blank values are skipped.
    #[must_use]
    pub fn from_config(config: &DebugConfig) -> Self {
        Self {
            token: non_empty(config.token.as_deref()),
            client_id: non_empty(config.app_client_id.as_deref()),
            client_secret: non_empty(config.app_client_secret.as_deref()),
        }
    }
}

impl DebugAuth for HeaderDebugAuth {
    fn authorize(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(client_id) = &self.client_id {
            request = request.header(APP_CLIENT_ID_HEADER, client_id);
        }
        if let Some(client_secret) = &self.client_secret {
            request = request.header(APP_CLIENT_SECRET_HEADER, client_secret);
        }
        request
    }
}

/// Client replaying requests against the debug host.
pub struct DebugClient {
    /// Base URL without a trailing slash.
    base_url: String,
    /// Transport core.
    http: UpstreamHttp,
    /// Authentication hook.
    auth: Arc<dyn DebugAuth>,
}

impl DebugClient {
    /// Builds a client with [`HeaderDebugAuth`] from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`YapiError::NotConfigured`] when no base URL is set, or
    /// [`YapiError::Client`] when the base URL or client is invalid.
    pub fn new(config: &DebugConfig, log: SharedLogSink) -> Result<Self, YapiError> {
        let base_url =
            normalized_base(config.base_url.as_deref(), "debug.base_url", Upstream::Debug)?;
        let http = UpstreamHttp::new(
            Upstream::Debug,
            config.timeout_ms,
            config.max_response_bytes,
            config.retry,
            log,
        )?;
        Ok(Self {
            base_url,
            http,
            auth: Arc::new(HeaderDebugAuth::from_config(config)),
        })
    }

    /// Replaces the authentication hook.
    #[must_use]
    pub fn with_auth(mut self, auth: Arc<dyn DebugAuth>) -> Self {
        self.auth = auth;
        self
    }

    /// Resolves the request URL, appending query parameters for GET.
    ///
    /// # Errors
    ///
    /// Returns [`YapiError::Client`] when the joined URL is invalid.
    pub fn request_url(&self, request: &DebugRequest<'_>) -> Result<Url, YapiError> {
        let path = request.path.trim().trim_start_matches('/');
        let mut url = Url::parse(&format!("{}/{path}", self.base_url))
            .map_err(|err| YapiError::Client(Upstream::Debug, err.to_string()))?;
        if debug_method(request.method)? == Method::GET && !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }

    /// Sends `request` and decodes the response.
    ///
    /// JSON bodies decode as JSON; anything else becomes a JSON string of the
    /// raw text, and an empty body becomes `null`.
    ///
    /// # Errors
    ///
    /// Returns errors prefixed `Failed to make request to debug API:`.
    pub fn execute(&self, request: &DebugRequest<'_>) -> Result<Value, YapiError> {
        let method = debug_method(request.method)?;
        let url = self.request_url(request)?;
        let send_body = !is_empty_payload(request.body);
        let body = self.http.send(&method, &url, |client| {
            let mut builder = client
                .request(method.clone(), url.clone())
                .header(CONTENT_TYPE, "application/json");
            if send_body {
                builder = builder.json(request.body);
            }
            self.auth.authorize(builder)
        })?;
        Ok(decode_debug_body(&body))
    }
}

impl DebugExecutor for DebugClient {
    fn execute(&self, request: &DebugRequest<'_>) -> Result<Value, YapiError> {
        Self::execute(self, request)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true when `value` has no enumerable content.
///
/// Mirrors key enumeration: empty objects, arrays, and strings are empty, as
/// are `null`, numbers, and booleans.
#[must_use]
pub fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(text) => text.is_empty(),
        Value::Null | Value::Bool(_) | Value::Number(_) => true,
    }
}

/// Parses a declared method; blank methods default to GET.
fn debug_method(method: &str) -> Result<Method, YapiError> {
    let method = method.trim();
    if method.is_empty() {
        return Ok(Method::GET);
    }
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| YapiError::Client(Upstream::Debug, format!("invalid http method: {method}")))
}

/// Decodes a debug response body.
fn decode_debug_body(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

/// Validates a base URL and strips its trailing slash.
fn normalized_base(
    base_url: Option<&str>,
    field: &'static str,
    upstream: Upstream,
) -> Result<String, YapiError> {
    let base_url = non_empty(base_url).ok_or(YapiError::NotConfigured(field))?;
    Url::parse(&base_url).map_err(|err| YapiError::Client(upstream, err.to_string()))?;
    Ok(base_url.trim_end_matches('/').to_string())
}

/// Trims `value` and drops it when blank.
fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}

/// Reads a response body while enforcing a maximum size.
fn read_response_limited(
    response: &mut Response,
    max_bytes: usize,
    upstream: Upstream,
) -> Result<Vec<u8>, YapiError> {
    let expected_len = response.content_length();
    let max_bytes_u64 = u64::try_from(max_bytes)
        .map_err(|_| YapiError::Client(upstream, "response size limit exceeds u64".to_string()))?;
    if let Some(expected) = expected_len
        && expected > max_bytes_u64
    {
        return Err(YapiError::Transport(upstream, "http response exceeds size limit".to_string()));
    }
    let mut buf = Vec::new();
    let limit = max_bytes_u64.saturating_add(1);
    let mut handle = response.take(limit);
    handle
        .read_to_end(&mut buf)
        .map_err(|_| YapiError::Transport(upstream, "failed to read response".to_string()))?;
    if buf.len() > max_bytes {
        return Err(YapiError::Transport(upstream, "http response exceeds size limit".to_string()));
    }
    if let Some(expected) = expected_len {
        let expected = usize::try_from(expected)
            .map_err(|_| YapiError::Transport(upstream, "invalid response length".to_string()))?;
        if buf.len() < expected {
            return Err(YapiError::Transport(upstream, "http response truncated".to_string()));
        }
    }
    Ok(buf)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
