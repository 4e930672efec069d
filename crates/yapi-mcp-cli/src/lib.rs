// yapi-mcp-cli/src/lib.rs
// ============================================================================
// Module: YApi MCP CLI Library
// Description: Shared helpers for the `yapi-mcp` binary.
// Purpose: Expose the message catalog to the binary and its tests.
// Dependencies: Standard library
// ============================================================================

//! ## Overview
//! The binary lives in `main.rs`; this library only carries the i18n catalog
//! and the [`t!`] macro so integration tests can exercise them directly.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod i18n;
