//! Config defaults and validation tests for yapi-mcp-config.
// yapi-mcp-config/tests/config_validation.rs
// =============================================================================
// Module: Config Defaults and Validation Tests
// Description: Validate default behavior and fail-closed limits.
// Purpose: Ensure minimal config is valid and invalid settings are rejected.
// =============================================================================

use yapi_mcp_config::LogSinkKind;
use yapi_mcp_config::ServerTransport;

mod common;
use common::assert_invalid;
use common::config_from_toml;
use common::minimal_config;

type TestResult = Result<(), String>;

#[test]
fn default_config_validates() -> TestResult {
    let config = minimal_config().map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    if config.server.transport != ServerTransport::Http {
        return Err("default transport should be http".to_string());
    }
    if config.server.bind_addr() != "127.0.0.1:2222" {
        return Err(format!("unexpected default bind {}", config.server.bind_addr()));
    }
    if config.schema.max_depth != 64 {
        return Err("schema.max_depth should default to 64".to_string());
    }
    Ok(())
}

#[test]
fn sections_parse_from_toml() -> TestResult {
    let config = config_from_toml(
        r#"
[server]
transport = "sse"
bind = "127.0.0.1:9100"

[yapi]
base_url = "https://yapi.example.com/api"
token = "abc"
timeout_ms = 5000

[yapi.retry]
max_attempts = 5
backoff_ms = 50

[debug]
base_url = "http://localhost:8080"
app_client_id = "client"

[logging]
sink = "none"
"#,
    )
    .map_err(|err| err.to_string())?;
    config.validate().map_err(|err| err.to_string())?;
    if config.server.transport != ServerTransport::Sse {
        return Err("transport should be sse".to_string());
    }
    if config.yapi.retry.max_attempts != 5 || config.yapi.retry.backoff_ms != 50 {
        return Err("yapi.retry should be parsed".to_string());
    }
    if config.debug.retry.max_attempts != 3 {
        return Err("debug.retry should keep defaults".to_string());
    }
    if config.logging.sink != LogSinkKind::None {
        return Err("logging.sink should be none".to_string());
    }
    Ok(())
}

#[test]
fn unknown_transport_fails_to_parse() -> TestResult {
    assert_invalid(config_from_toml("[server]\ntransport = \"grpc\"\n"), "parse error")
}

#[test]
fn http_transport_rejects_invalid_bind() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.server.bind = Some("not-an-address".to_string());
    assert_invalid(config.validate(), "invalid bind address")
}

#[test]
fn stdio_transport_ignores_bind() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.server.transport = ServerTransport::Stdio;
    config.server.bind = Some("not-an-address".to_string());
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn zero_body_limit_is_rejected() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.server.max_body_bytes = 0;
    assert_invalid(config.validate(), "max_body_bytes must be greater than zero")
}

#[test]
fn base_url_requires_http_scheme() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.yapi.base_url = Some("ftp://yapi.example.com".to_string());
    assert_invalid(config.validate(), "yapi.base_url must use http:// or https://")?;
    config.yapi.base_url = Some("yapi.example.com".to_string());
    assert_invalid(config.validate(), "yapi.base_url is not a valid url")
}

#[test]
fn timeout_bounds_are_enforced() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.debug.timeout_ms = 10;
    assert_invalid(config.validate(), "debug.timeout_ms must be between")
}

#[test]
fn retry_attempts_must_be_positive() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.yapi.retry.max_attempts = 0;
    assert_invalid(config.validate(), "yapi.retry.max_attempts")
}

#[test]
fn file_sink_requires_path() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.logging.sink = LogSinkKind::File;
    assert_invalid(config.validate(), "logging.path is required")
}

#[test]
fn schema_depth_bounds_are_enforced() -> TestResult {
    let mut config = minimal_config().map_err(|err| err.to_string())?;
    config.schema.max_depth = 0;
    assert_invalid(config.validate(), "schema.max_depth")?;
    config.schema.max_depth = 1000;
    assert_invalid(config.validate(), "schema.max_depth")
}
