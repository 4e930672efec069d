// yapi-mcp-config/src/config.rs
// ============================================================================
// Module: YApi MCP Configuration
// Description: Configuration loading and validation for the YApi MCP server.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits,
//! then overlaid with environment variables. A missing file at the default
//! location is not an error; every other failure is.
//!
//! | Variable | Field |
//! |---|---|
//! | `YAPI_BASE_URL` | `yapi.base_url` |
//! | `YAPI_TOKEN_KEY` | `yapi.token` |
//! | `DEBUG_API_BASE_URL` | `debug.base_url` |
//! | `DEBUG_TOKEN_KEY` | `debug.token` |
//! | `DEBUG_APP_CLIENT_ID` | `debug.app_client_id` |
//! | `DEBUG_APP_CLIENT_SECRET` | `debug.app_client_secret` |
//! | `PORT` | port of `server.bind` |

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt::Write as _;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "yapi-mcp.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "YAPI_MCP_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default bind host for HTTP transports.
const DEFAULT_BIND_HOST: &str = "127.0.0.1";
/// Default port for HTTP transports.
pub const DEFAULT_PORT: u16 = 2222;
/// Maximum request body size accepted by the server.
pub(crate) const MAX_BODY_BYTES_LIMIT: usize = 16 * 1024 * 1024;
/// Minimum upstream timeout in milliseconds.
pub(crate) const MIN_TIMEOUT_MS: u64 = 100;
/// Maximum upstream timeout in milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 120_000;
/// Maximum upstream response size in bytes.
pub(crate) const MAX_RESPONSE_BYTES_LIMIT: usize = 64 * 1024 * 1024;
/// Maximum retry attempts per upstream call.
pub(crate) const MAX_RETRY_ATTEMPTS: u32 = 10;
/// Maximum linear backoff step in milliseconds.
pub(crate) const MAX_BACKOFF_MS: u64 = 60_000;
/// Maximum schema traversal depth.
pub(crate) const MAX_SCHEMA_DEPTH_LIMIT: usize = 256;
/// Placeholder shown for secrets in summaries.
const REDACTED: &str = "<redacted>";
/// Placeholder shown for unset values in summaries.
const UNSET: &str = "<unset>";

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// YApi MCP server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YapiMcpConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// YApi upstream configuration.
    #[serde(default)]
    pub yapi: YapiConfig,
    /// Debug host configuration.
    #[serde(default)]
    pub debug: DebugConfig,
    /// Structured log configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Schema traversal limits.
    #[serde(default)]
    pub schema: SchemaConfig,
    /// Path the configuration was read from, if any (not serialized).
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl YapiMcpConfig {
    /// Loads configuration from disk and the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| env::var(key).ok())
    }

    /// Loads configuration using `lookup` to read environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (resolved, explicit) = resolve_path(path, &lookup)?;
        validate_path(&resolved)?;
        let mut config = if !explicit && !resolved.exists() {
            Self::default()
        } else {
            let mut config = Self::from_file(&resolved)?;
            config.source = Some(resolved);
            config
        };
        config.apply_env(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration text without environment overrides or validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Reads and parses a configuration file.
    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Overlays environment variables onto the file configuration.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `PORT` is not a valid port.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(value) = read("YAPI_BASE_URL") {
            self.yapi.base_url = Some(value);
        }
        if let Some(value) = read("YAPI_TOKEN_KEY") {
            self.yapi.token = Some(value);
        }
        if let Some(value) = read("DEBUG_API_BASE_URL") {
            self.debug.base_url = Some(value);
        }
        if let Some(value) = read("DEBUG_TOKEN_KEY") {
            self.debug.token = Some(value);
        }
        if let Some(value) = read("DEBUG_APP_CLIENT_ID") {
            self.debug.app_client_id = Some(value);
        }
        if let Some(value) = read("DEBUG_APP_CLIENT_SECRET") {
            self.debug.app_client_secret = Some(value);
        }
        if let Some(value) = read("PORT") {
            let port: u16 = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT must be a valid port number".to_string()))?;
            self.server.set_port(port);
        }
        Ok(())
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.yapi.validate()?;
        self.debug.validate()?;
        self.logging.validate()?;
        self.schema.validate()?;
        Ok(())
    }

    /// Renders a human-readable summary with secrets redacted.
    #[must_use]
    pub fn redacted_summary(&self) -> String {
        let mut out = String::new();
        let source = self
            .source
            .as_ref()
            .map_or_else(|| UNSET.to_string(), |path| path.display().to_string());
        let _ = writeln!(out, "config.source = {source}");
        let _ = writeln!(out, "server.transport = {}", self.server.transport.as_str());
        let _ = writeln!(out, "server.bind = {}", self.server.bind_addr());
        let _ = writeln!(out, "server.max_body_bytes = {}", self.server.max_body_bytes);
        let _ = writeln!(out, "yapi.base_url = {}", plain(self.yapi.base_url.as_deref()));
        let _ = writeln!(out, "yapi.token = {}", secret(self.yapi.token.as_deref()));
        let _ = writeln!(out, "debug.base_url = {}", plain(self.debug.base_url.as_deref()));
        let _ = writeln!(out, "debug.token = {}", secret(self.debug.token.as_deref()));
        let _ = writeln!(out, "debug.app_client_id = {}", plain(self.debug.app_client_id.as_deref()));
        let _ = writeln!(
            out,
            "debug.app_client_secret = {}",
            secret(self.debug.app_client_secret.as_deref())
        );
        let _ = writeln!(out, "logging.sink = {}", self.logging.sink.as_str());
        let _ = writeln!(out, "schema.max_depth = {}", self.schema.max_depth);
        out
    }
}

/// Server transport configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Transport type for MCP.
    #[serde(default)]
    pub transport: ServerTransport,
    /// Bind address for HTTP or SSE transports.
    #[serde(default)]
    pub bind: Option<String>,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: ServerTransport::default(),
            bind: None,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Returns the effective bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        self.bind
            .as_deref()
            .map(str::trim)
            .filter(|bind| !bind.is_empty())
            .map_or_else(|| format!("{DEFAULT_BIND_HOST}:{DEFAULT_PORT}"), str::to_string)
    }

    /// Replaces the port of the bind address, keeping its host.
    pub fn set_port(&mut self, port: u16) {
        let current = self.bind_addr();
        let host = current.rsplit_once(':').map_or(DEFAULT_BIND_HOST, |(host, _)| host);
        let host = if host.is_empty() { DEFAULT_BIND_HOST } else { host };
        self.bind = Some(format!("{host}:{port}"));
    }

    /// Validates server transport configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_body_bytes > MAX_BODY_BYTES_LIMIT {
            return Err(ConfigError::Invalid("max_body_bytes exceeds limit".to_string()));
        }
        match self.transport {
            ServerTransport::Http | ServerTransport::Sse => {
                let _: SocketAddr = self
                    .bind_addr()
                    .parse()
                    .map_err(|_| ConfigError::Invalid("invalid bind address".to_string()))?;
            }
            ServerTransport::Stdio => {}
        }
        Ok(())
    }
}

/// MCP transport selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerTransport {
    /// Use stdin/stdout transport.
    Stdio,
    /// Use HTTP JSON-RPC transport.
    #[default]
    Http,
    /// Use SSE transport for responses.
    Sse,
}

impl ServerTransport {
    /// Returns the config literal for this transport.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
            Self::Sse => "sse",
        }
    }
}

/// Retry policy for upstream calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Linear backoff step in milliseconds; attempt `n` waits `n * backoff_ms`.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl RetryConfig {
    /// Validates retry bounds.
    fn validate(&self, section: &str) -> Result<(), ConfigError> {
        if self.max_attempts == 0 || self.max_attempts > MAX_RETRY_ATTEMPTS {
            return Err(ConfigError::Invalid(format!(
                "{section}.retry.max_attempts must be between 1 and {MAX_RETRY_ATTEMPTS}"
            )));
        }
        if self.backoff_ms > MAX_BACKOFF_MS {
            return Err(ConfigError::Invalid(format!("{section}.retry.backoff_ms exceeds limit")));
        }
        Ok(())
    }
}

/// YApi upstream configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct YapiConfig {
    /// YApi API base URL, e.g. `https://yapi.example.com/api`.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Project token sent as the `token` query parameter.
    #[serde(default)]
    pub token: Option<String>,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum response size in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
    /// Retry policy.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for YapiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            timeout_ms: default_timeout_ms(),
            max_response_bytes: default_max_response_bytes(),
            retry: RetryConfig::default(),
        }
    }
}

impl YapiConfig {
    /// Validates YApi upstream configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_upstream("yapi", self.base_url.as_deref(), self.timeout_ms, self.max_response_bytes)?;
        self.retry.validate("yapi")
    }
}

/// Debug host configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DebugConfig {
    /// Base URL interface paths are joined onto.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Optional bearer token.
    #[serde(default)]
    pub token: Option<String>,
    /// Optional application client id header value.
    #[serde(default)]
    pub app_client_id: Option<String>,
    /// Optional application client secret header value.
    #[serde(default)]
    pub app_client_secret: Option<String>,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum response size in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
    /// Retry policy.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            app_client_id: None,
            app_client_secret: None,
            timeout_ms: default_timeout_ms(),
            max_response_bytes: default_max_response_bytes(),
            retry: RetryConfig::default(),
        }
    }
}

impl DebugConfig {
    /// Validates debug host configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_upstream("debug", self.base_url.as_deref(), self.timeout_ms, self.max_response_bytes)?;
        self.retry.validate("debug")
    }
}

/// Log sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Discard events.
    None,
}

impl LogSinkKind {
    /// Returns the config literal for this sink.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stderr => "stderr",
            Self::File => "file",
            Self::None => "none",
        }
    }
}

/// Structured log configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Sink selection.
    #[serde(default)]
    pub sink: LogSinkKind,
    /// Log file path (required for the file sink).
    #[serde(default)]
    pub path: Option<String>,
}

impl LoggingConfig {
    /// Validates log configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, self.path.as_deref()) {
            (LogSinkKind::File, None) => {
                Err(ConfigError::Invalid("logging.path is required for the file sink".to_string()))
            }
            (_, Some(path)) => validate_path_string("logging.path", path),
            (_, None) => Ok(()),
        }
    }
}

/// Schema traversal limits.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SchemaConfig {
    /// Maximum nesting depth expanded by synthesis and rendering.
    #[serde(default = "default_schema_max_depth")]
    pub max_depth: usize,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            max_depth: default_schema_max_depth(),
        }
    }
}

impl SchemaConfig {
    /// Validates schema limits.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 || self.max_depth > MAX_SCHEMA_DEPTH_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "schema.max_depth must be between 1 and {MAX_SCHEMA_DEPTH_LIMIT}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
///
/// The flag is true when the path was requested explicitly.
fn resolve_path<F>(path: Option<&Path>, lookup: &F) -> Result<(PathBuf, bool), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Some(env_path) = lookup(CONFIG_ENV_VAR).filter(|value| !value.is_empty()) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates shared upstream settings.
fn validate_upstream(
    section: &str,
    base_url: Option<&str>,
    timeout_ms: u64,
    max_response_bytes: usize,
) -> Result<(), ConfigError> {
    if let Some(base_url) = base_url {
        let parsed = Url::parse(base_url.trim())
            .map_err(|_| ConfigError::Invalid(format!("{section}.base_url is not a valid url")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "{section}.base_url must use http:// or https://"
            )));
        }
    }
    if !(MIN_TIMEOUT_MS ..= MAX_TIMEOUT_MS).contains(&timeout_ms) {
        return Err(ConfigError::Invalid(format!(
            "{section}.timeout_ms must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}"
        )));
    }
    if max_response_bytes == 0 || max_response_bytes > MAX_RESPONSE_BYTES_LIMIT {
        return Err(ConfigError::Invalid(format!(
            "{section}.max_response_bytes must be between 1 and {MAX_RESPONSE_BYTES_LIMIT}"
        )));
    }
    Ok(())
}

/// Formats an optional plain value for summaries.
fn plain(value: Option<&str>) -> &str {
    value.unwrap_or(UNSET)
}

/// Formats an optional secret for summaries.
const fn secret(value: Option<&str>) -> &'static str {
    if value.is_some() { REDACTED } else { UNSET }
}

/// Default maximum request body size.
pub(crate) const fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Default upstream timeout.
pub(crate) const fn default_timeout_ms() -> u64 {
    10_000
}

/// Default upstream response size limit.
pub(crate) const fn default_max_response_bytes() -> usize {
    4 * 1024 * 1024
}

/// Default retry attempts.
pub(crate) const fn default_max_attempts() -> u32 {
    3
}

/// Default linear backoff step.
pub(crate) const fn default_backoff_ms() -> u64 {
    200
}

/// Default schema traversal depth.
pub(crate) const fn default_schema_max_depth() -> usize {
    64
}

// ============================================================================
// SECTION: Tests
// ============================================================================
