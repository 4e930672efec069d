// yapi-mcp/src/lib.rs
// ============================================================================
// Module: YApi MCP
// Description: MCP server exposing YApi interface documents and debugging.
// Purpose: Bridge agents to YApi through the `get_interface` and `debug_api` tools.
// Dependencies: yapi-schema, yapi-mcp-config, axum, reqwest, tokio
// ============================================================================

//! ## Overview
//! YApi MCP fetches interface definitions from a YApi instance, renders them
//! as markdown, and can replay a synthesized request against a debug host.
//! The schema work itself lives in [`yapi_schema`]; this crate adds the HTTP
//! clients, document composer, tool router, and JSON-RPC transports.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod document;
pub mod interface;
pub mod log;
pub mod server;
pub mod tools;
pub mod yapi;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use document::DocumentComposer;
pub use document::DocumentError;
pub use document::format_timestamp;
pub use document::local_timestamp;
pub use interface::InterfaceDetail;
pub use log::McpFileLogSink;
pub use log::McpLogSink;
pub use log::McpNoopLogSink;
pub use log::McpRequestEvent;
pub use log::McpStderrLogSink;
pub use log::ServerLogEvent;
pub use log::SharedLogSink;
pub use log::Upstream;
pub use log::UpstreamCallEvent;
pub use log::build_log_sink;
pub use server::McpServer;
pub use server::McpServerError;
pub use tools::ToolCallResult;
pub use tools::ToolDefinition;
pub use tools::ToolError;
pub use tools::ToolName;
pub use tools::ToolRouter;
pub use yapi::DebugAuth;
pub use yapi::DebugClient;
pub use yapi::DebugExecutor;
pub use yapi::DebugRequest;
pub use yapi::HeaderDebugAuth;
pub use yapi::InterfaceSource;
pub use yapi::YapiClient;
pub use yapi::YapiError;
