// yapi-mcp-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument handling in the CLI entry point.
// Purpose: Cover serve overrides, JSON flag parsing, locales, and bounded reads.
// Dependencies: yapi-mcp-cli main helpers, tempfile
// ============================================================================

//! ## Overview
//! Exercises the pure helpers behind the subcommands without starting a
//! server or touching the network.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;

use clap::Parser;
use serde_json::json;
use tempfile::tempdir;
use yapi_mcp_cli::i18n::Locale;
use yapi_mcp_config::ServerTransport;
use yapi_mcp_config::YapiMcpConfig;

use super::Cli;
use super::Commands;
use super::InterfaceCommand;
use super::LangArg;
use super::ReadLimitError;
use super::ServeCommand;
use super::TransportArg;
use super::apply_serve_overrides;
use super::parse_json_object;
use super::read_bytes_with_limit;
use super::read_schema;
use super::resolve_locale;

// ============================================================================
// SECTION: Serve Overrides
// ============================================================================

#[test]
fn stdio_flag_wins_over_config_transport() {
    let mut config = YapiMcpConfig::default();
    apply_serve_overrides(
        &mut config,
        &ServeCommand {
            stdio: true,
            ..ServeCommand::default()
        },
    );
    assert_eq!(config.server.transport, ServerTransport::Stdio);
}

#[test]
fn transport_and_bind_overrides_apply() {
    let mut config = YapiMcpConfig::default();
    apply_serve_overrides(
        &mut config,
        &ServeCommand {
            transport: Some(TransportArg::Sse),
            bind: Some("0.0.0.0:9000".to_string()),
            ..ServeCommand::default()
        },
    );
    assert_eq!(config.server.transport, ServerTransport::Sse);
    assert_eq!(config.server.bind_addr(), "0.0.0.0:9000");
}

#[test]
fn no_overrides_keep_http_default() {
    let mut config = YapiMcpConfig::default();
    apply_serve_overrides(&mut config, &ServeCommand::default());
    assert_eq!(config.server.transport, ServerTransport::Http);
    assert_eq!(config.server.bind_addr(), "127.0.0.1:2222");
}

#[test]
fn stdio_conflicts_with_transport() {
    let parsed = Cli::try_parse_from(["yapi-mcp", "serve", "--stdio", "--transport", "http"]);
    assert!(parsed.is_err());
}

#[test]
fn interface_debug_parses_overrides() {
    let cli = Cli::try_parse_from([
        "yapi-mcp",
        "interface",
        "debug",
        "--project-id",
        "7",
        "--interface-id",
        "11",
        "--query",
        r#"{"page":1}"#,
    ])
    .unwrap();
    let Some(Commands::Interface {
        command: InterfaceCommand::Debug(command),
    }) = cli.command
    else {
        panic!("expected interface debug");
    };
    assert_eq!(command.target.project_id, "7");
    assert_eq!(command.query.as_deref(), Some(r#"{"page":1}"#));
    assert!(command.body.is_none());
}

// ============================================================================
// SECTION: JSON Flags
// ============================================================================

#[test]
fn json_flags_must_be_objects() {
    let map = parse_json_object("--body", r#"{"a":[1]}"#).unwrap();
    assert_eq!(map.get("a"), Some(&json!([1])));
    let err = parse_json_object("--body", "[1]").unwrap_err();
    assert_eq!(err.to_string(), "--body must be a JSON object: found array");
    assert!(parse_json_object("--query", "{").is_err());
}

// ============================================================================
// SECTION: Locale
// ============================================================================

#[test]
fn flag_locale_wins_over_env() {
    assert_eq!(resolve_locale(Some(LangArg::Zh), Some("en")).unwrap(), Locale::Zh);
    assert_eq!(resolve_locale(None, Some("zh-CN")).unwrap(), Locale::Zh);
    assert_eq!(resolve_locale(None, None).unwrap(), Locale::En);
    assert_eq!(resolve_locale(None, Some("  ")).unwrap(), Locale::En);
    assert!(resolve_locale(None, Some("fr")).is_err());
}

// ============================================================================
// SECTION: Files
// ============================================================================

#[test]
fn bounded_read_rejects_oversized_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("big.json");
    fs::write(&path, vec![b'x'; 32]).unwrap();
    match read_bytes_with_limit(&path, 16) {
        Err(ReadLimitError::TooLarge {
            size,
            limit,
        }) => {
            assert_eq!(size, 32);
            assert_eq!(limit, 16);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(read_bytes_with_limit(&path, 32).unwrap().len(), 32);
}

#[test]
fn read_schema_reports_parse_failures() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("schema.json");
    fs::write(&path, "{not json").unwrap();
    let err = read_schema(&path).unwrap_err();
    assert!(err.to_string().starts_with("Failed to parse schema in "));
    fs::write(&path, r#"{"type":"object","properties":{"id":{"type":"integer"}}}"#).unwrap();
    assert!(read_schema(&path).unwrap().as_object().is_some());
}
