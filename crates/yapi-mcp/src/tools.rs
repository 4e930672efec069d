// yapi-mcp/src/tools.rs
// ============================================================================
// Module: MCP Tool Router
// Description: Tool definitions and dispatch for `get_interface` and `debug_api`.
// Purpose: Turn tool arguments into markdown documents via YApi and the debug host.
// Dependencies: serde, serde_json, yapi-schema, yapi-mcp-config
// ============================================================================

//! ## Overview
//! The router validates tool arguments, fetches the interface record, and
//! composes the markdown answer. Protocol problems (unknown tool, malformed
//! arguments) are returned as [`ToolError`] so the server can answer with a
//! JSON-RPC error. Failures while doing the work (upstream errors, schema
//! text that does not parse) become tool results flagged `isError` with the
//! text `接口请求失败：<message>`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::de::Error as _;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use yapi_mcp_config::YapiMcpConfig;
use yapi_schema::PayloadSynthesizer;
use yapi_schema::QueryParams;

use crate::document::DocumentComposer;
use crate::document::DocumentError;
use crate::document::local_timestamp;
use crate::interface::InterfaceDetail;
use crate::log::LogLevel;
use crate::log::ServerLogEvent;
use crate::log::SharedLogSink;
use crate::yapi::DebugClient;
use crate::yapi::DebugExecutor;
use crate::yapi::DebugRequest;
use crate::yapi::InterfaceSource;
use crate::yapi::YapiClient;
use crate::yapi::YapiError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Prefix of every failed tool result.
pub const TOOL_FAILURE_PREFIX: &str = "接口请求失败：";

/// Shared description of the `projectId` argument.
const PROJECT_ID_DESCRIPTION: &str = "项目ID, 一般出现url中, 例如: https://yapi.runcobo.com/project/<projectId>/interface/api/<interfaceId>";

/// Shared description of the `interfaceId` argument.
const INTERFACE_ID_DESCRIPTION: &str = "接口ID, 一般出现url中, 例如: https://yapi.runcobo.com/project/<projectId>/interface/api/<interfaceId>";

// ============================================================================
// SECTION: Tool Names
// ============================================================================

/// Tools exposed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    /// Interface document.
    GetInterface,
    /// Debug request and response document.
    DebugApi,
}

impl ToolName {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetInterface => "get_interface",
            Self::DebugApi => "debug_api",
        }
    }

    /// Returns all tools in listing order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::GetInterface, Self::DebugApi]
    }

    /// Parses a wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|tool| tool.as_str() == name)
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Tool definition returned by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    /// MCP tool name.
    pub name: ToolName,
    /// Human-readable title.
    pub title: String,
    /// Tool description for clients.
    pub description: String,
    /// JSON schema for tool input.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// One content block of a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolContent {
    /// Content kind; always `text`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Markdown text.
    pub text: String,
}

/// Result of `tools/call`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCallResult {
    /// Content blocks.
    pub content: Vec<ToolContent>,
    /// Set when the tool failed while doing its work.
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl ToolCallResult {
    /// Successful text result.
    #[must_use]
    pub fn text(text: String) -> Self {
        Self {
            content: vec![ToolContent {
                kind: "text",
                text,
            }],
            is_error: None,
        }
    }

    /// Failed result carrying `接口请求失败：<message>`.
    #[must_use]
    pub fn failure(message: &str) -> Self {
        Self {
            content: vec![ToolContent {
                kind: "text",
                text: format!("{TOOL_FAILURE_PREFIX}{message}"),
            }],
            is_error: Some(true),
        }
    }

    /// Text of the first content block.
    #[must_use]
    pub fn first_text(&self) -> &str {
        self.content.first().map_or("", |content| content.text.as_str())
    }
}

/// Arguments of `get_interface`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetInterfaceParams {
    /// Project id.
    #[serde(deserialize_with = "id_text")]
    project_id: String,
    /// Interface id.
    #[serde(deserialize_with = "id_text")]
    interface_id: String,
}

/// Arguments of `debug_api`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugApiParams {
    /// Project id.
    #[serde(deserialize_with = "id_text")]
    project_id: String,
    /// Interface id.
    #[serde(deserialize_with = "id_text")]
    interface_id: String,
    /// Replaces the synthesized query parameters.
    #[serde(default)]
    debug_query_params: Option<Map<String, Value>>,
    /// Replaces the synthesized body.
    #[serde(default)]
    debug_body_params: Option<Map<String, Value>>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Tool routing errors.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool name not recognized.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    /// Arguments did not match the tool schema.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    /// YApi or the debug host failed.
    #[error("{0}")]
    Upstream(String),
    /// The document could not be composed.
    #[error("{0}")]
    Document(String),
    /// The result could not be serialized.
    #[error("serialization failure")]
    Serialization,
}

impl From<YapiError> for ToolError {
    fn from(error: YapiError) -> Self {
        Self::Upstream(error.to_string())
    }
}

impl From<DocumentError> for ToolError {
    fn from(error: DocumentError) -> Self {
        Self::Document(error.to_string())
    }
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Dispatches tool calls.
#[derive(Clone)]
pub struct ToolRouter {
    /// Interface record source.
    source: Arc<dyn InterfaceSource>,
    /// Debug executor; `None` when no debug host is configured.
    debug: Option<Arc<dyn DebugExecutor>>,
    /// Markdown composer.
    composer: DocumentComposer,
    /// Body synthesizer.
    synthesizer: PayloadSynthesizer,
    /// Timestamp source for document footers.
    clock: fn() -> String,
    /// Log sink.
    log: SharedLogSink,
}

impl ToolRouter {
    /// Creates a router over explicit collaborators.
    #[must_use]
    pub fn new(
        source: Arc<dyn InterfaceSource>,
        debug: Option<Arc<dyn DebugExecutor>>,
        log: SharedLogSink,
    ) -> Self {
        Self {
            source,
            debug,
            composer: DocumentComposer::default(),
            synthesizer: PayloadSynthesizer::default(),
            clock: local_timestamp,
            log,
        }
    }

    /// Builds HTTP-backed clients from configuration.
    ///
    /// The debug client is only built when `debug.base_url` is set.
    ///
    /// # Errors
    ///
    /// Returns [`YapiError`] when a client cannot be built.
    pub fn from_config(config: &YapiMcpConfig, log: SharedLogSink) -> Result<Self, YapiError> {
        let source: Arc<dyn InterfaceSource> =
            Arc::new(YapiClient::new(&config.yapi, Arc::clone(&log))?);
        let debug: Option<Arc<dyn DebugExecutor>> = match config.debug.base_url.as_deref() {
            Some(base) if !base.trim().is_empty() => {
                Some(Arc::new(DebugClient::new(&config.debug, Arc::clone(&log))?))
            }
            _ => None,
        };
        Ok(Self::new(source, debug, log).with_max_depth(config.schema.max_depth))
    }

    /// Sets the nesting depth for synthesis and rendering.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.composer = DocumentComposer::new(max_depth);
        self.synthesizer = PayloadSynthesizer::new(max_depth);
        self
    }

    /// Replaces the footer timestamp source.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> String) -> Self {
        self.clock = clock;
        self
    }

    /// Lists tool definitions.
    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        ToolName::all().iter().copied().map(tool_definition).collect()
    }

    /// Dispatches a tool call.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] or [`ToolError::InvalidParams`];
    /// failures while running the tool are reported inside the result.
    pub fn handle_tool_call(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolCallResult, ToolError> {
        let tool = ToolName::parse(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let outcome = match tool {
            ToolName::GetInterface => self.get_interface(decode(arguments)?),
            ToolName::DebugApi => self.debug_api(decode(arguments)?),
        };
        match outcome {
            Ok(text) => Ok(ToolCallResult::text(text)),
            Err(ToolError::Upstream(message) | ToolError::Document(message)) => {
                self.log.record_server(&ServerLogEvent::new(
                    LogLevel::Error,
                    format!("{tool}: {TOOL_FAILURE_PREFIX}{message}"),
                ));
                Ok(ToolCallResult::failure(&message))
            }
            Err(err) => Err(err),
        }
    }

    /// Fetches and renders one interface.
    fn get_interface(&self, params: GetInterfaceParams) -> Result<String, ToolError> {
        let detail = self.source.interface_detail(&params.interface_id, &params.project_id)?;
        self.log.record_server(&ServerLogEvent::new(
            LogLevel::Info,
            format!("interface {} fetched", params.interface_id),
        ));
        Ok(self.composer.interface_document(&detail, &(self.clock)())?)
    }

    /// Synthesizes, sends, and reports a debug request.
    fn debug_api(&self, params: DebugApiParams) -> Result<String, ToolError> {
        let detail = self.source.interface_detail(&params.interface_id, &params.project_id)?;
        let (query, query_shown) = match params.debug_query_params {
            Some(overrides) => (QueryParams::from_json_object(&overrides), overrides),
            None => {
                let query = detail.synthesized_query();
                let shown = query.to_json_object();
                (query, shown)
            }
        };
        let body = match params.debug_body_params {
            Some(body) => Value::Object(body),
            None => self.synthesized_body(&detail)?,
        };
        let debug = self.debug.as_ref().ok_or(YapiError::NotConfigured("debug.base_url"))?;
        let response = debug.execute(&DebugRequest {
            method: detail.method(),
            path: detail.path(),
            query: &query,
            body: &body,
        })?;
        Ok(self.composer.debug_document(&detail, &query_shown, &body, &response, &(self.clock)())?)
    }

    /// Request body synthesized from the interface's body schema.
    fn synthesized_body(&self, detail: &InterfaceDetail) -> Result<Value, ToolError> {
        let schema = detail.request_schema().map_err(DocumentError::from)?;
        Ok(schema.map_or_else(
            || Value::Object(Map::new()),
            |schema| self.synthesizer.synthesize(&schema).into_json(),
        ))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Definition for one tool.
fn tool_definition(tool: ToolName) -> ToolDefinition {
    match tool {
        ToolName::GetInterface => ToolDefinition {
            name: tool,
            title: "获取接口数据详情".to_string(),
            description: "获取接口数据（有详细接口数据定义文档），输出格式为markdown，包含表格、代码块、emoji图标等美化元素".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "projectId": {"type": "string", "description": PROJECT_ID_DESCRIPTION},
                    "interfaceId": {"type": "string", "description": INTERFACE_ID_DESCRIPTION}
                },
                "required": ["projectId", "interfaceId"],
                "additionalProperties": false
            }),
        },
        ToolName::DebugApi => ToolDefinition {
            name: tool,
            title: "调试接口".to_string(),
            description: "根据输入yapi接口链接调试接口，输出格式为markdown，包含接口详情、调试参数、响应结果等美化展示".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "projectId": {"type": "string", "description": PROJECT_ID_DESCRIPTION},
                    "interfaceId": {"type": "string", "description": INTERFACE_ID_DESCRIPTION},
                    "debugQueryParams": {
                        "type": "object",
                        "additionalProperties": {},
                        "description": "可选, 调试接口的query参数, 即拼接在 url 后面的参数, 一般用于 GET 请求"
                    },
                    "debugBodyParams": {
                        "type": "object",
                        "additionalProperties": {},
                        "description": "可选, 调试接口的body参数, 一般用于 POST 请求"
                    }
                },
                "required": ["projectId", "interfaceId"],
                "additionalProperties": false
            }),
        },
    }
}

/// Decodes tool arguments.
fn decode<T: for<'de> Deserialize<'de>>(arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|err| ToolError::InvalidParams(err.to_string()))
}

/// Accepts ids sent as strings or numbers.
fn id_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(D::Error::custom(format!("expected a string id, found {other}"))),
    }
}
