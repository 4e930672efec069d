// yapi-mcp-config/src/lib.rs
// ============================================================================
// Module: YApi MCP Config Library
// Description: Canonical config model and validation for the YApi MCP server.
// Purpose: Single source of truth for yapi-mcp.toml and environment semantics.
// Dependencies: serde, toml, url
// ============================================================================

//! ## Overview
//! `yapi-mcp-config` loads `yapi-mcp.toml`, applies environment overrides,
//! and validates the result fail-closed. Secrets never appear in the
//! rendered summary.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
