// yapi-mcp-cli/tests/i18n.rs
// ============================================================================
// Module: CLI i18n Tests
// Description: Exercises the translation catalog and placeholder substitution.
// Purpose: Ensure CLI strings route through stable i18n helpers.
// Dependencies: yapi-mcp-cli i18n module and the `t!` macro.
// ============================================================================

//! ## Overview
//! - Message arguments capture key/value substitutions.
//! - Translation falls back to keys on misses.
//! - The [`t!`](yapi_mcp_cli::t) macro formats placeholders.

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

use yapi_mcp_cli::i18n::MessageArg;
use yapi_mcp_cli::i18n::translate;
use yapi_mcp_cli::t;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn translate_substitutes_placeholders() {
    let args = vec![MessageArg::new("path", "/tmp/s.json"), MessageArg::new("error", "eof")];
    assert_eq!(translate("input.read_failed", args), "Failed to read /tmp/s.json: eof");
}

#[test]
fn translate_falls_back_to_key() {
    assert_eq!(translate("missing.key", Vec::new()), "missing.key");
}

#[test]
fn t_macro_formats_message() {
    assert_eq!(t!("main.version", version = "0.1.0"), "yapi-mcp 0.1.0");
}
