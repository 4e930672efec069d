// yapi-mcp/src/document.rs
// ============================================================================
// Module: Markdown Document Composer
// Description: Builds the interface and debug documents returned by tools.
// Purpose: Concatenate literal section markers with rendered schema tables.
// Dependencies: serde_json, time, yapi-schema
// ============================================================================

//! ## Overview
//! Documents are plain concatenations of sections. Each section is wrapped in
//! `---` / `## <title>` / `---` markers and omitted when it has nothing to
//! show. The caller injects the timestamp so output is reproducible.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;
use yapi_schema::MAX_SCHEMA_DEPTH;
use yapi_schema::SchemaError;
use yapi_schema::SchemaNode;
use yapi_schema::SchemaTable;

use crate::interface::InterfaceDetail;
use crate::yapi::is_empty_payload;

// ============================================================================
// SECTION: Literals
// ============================================================================

/// Heading of the interface document.
const INTERFACE_HEADING: &str = "# 🚀 YApi 接口文档\n\n";
/// Heading of the debug document.
const DEBUG_HEADING: &str = "# 🧪 接口调试结果\n\n";
/// Header rows of the query parameter table.
const QUERY_TABLE_HEADER: &str =
    "| 参数名 | 必填 | 示例值 | 描述 |\n|:-------|:----:|:-------|:-----|\n";
/// Header rows of the schema field tables.
const FIELD_TABLE_HEADER: &str =
    "| 字段名 | 类型 | 必填 | 默认值 | 描述 |\n|:-------|:----:|:----:|:-------|:-----|\n";
/// Success banner above the debug response.
const DEBUG_SUCCESS_BANNER: &str = "<div style='background: #f8f9fa; padding: 16px; border-radius: 8px; border-left: 4px solid #28a745;'>\n\n**✅ 调试成功!** 接口调用完成，响应数据如下：\n\n</div>\n\n";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Document composition failures.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// A schema text field did not parse.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// A JSON block could not be serialized.
    #[error("document serialization failed: {0}")]
    Serialization(String),
}

// ============================================================================
// SECTION: Composer
// ============================================================================

/// Composes markdown documents from interface records.
#[derive(Debug, Clone, Copy)]
pub struct DocumentComposer {
    /// Nesting depth rendered in field tables.
    max_depth: usize,
}

impl Default for DocumentComposer {
    fn default() -> Self {
        Self::new(MAX_SCHEMA_DEPTH)
    }
}

impl DocumentComposer {
    /// Creates a composer rendering tables up to `max_depth` levels.
    #[must_use]
    pub const fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
        }
    }

    /// Full interface document, raw data dump included.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when a schema field fails to parse.
    pub fn interface_document(
        &self,
        detail: &InterfaceDetail,
        timestamp: &str,
    ) -> Result<String, DocumentError> {
        let mut doc = String::from(INTERFACE_HEADING);
        doc.push_str(&self.detail_sections(detail)?);
        doc.push_str(&raw_section(&detail.raw)?);
        doc.push_str(&format!("---\n*📅 生成时间: {timestamp}*\n"));
        Ok(doc)
    }

    /// Debug document: interface sections, the parameters sent, and the
    /// response received. `query` is shown as given, before stringification.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when a schema field fails to parse.
    pub fn debug_document(
        &self,
        detail: &InterfaceDetail,
        query: &Map<String, Value>,
        body: &Value,
        response: &Value,
        timestamp: &str,
    ) -> Result<String, DocumentError> {
        let mut doc = String::from(DEBUG_HEADING);
        doc.push_str(&self.detail_sections(detail)?);
        doc.push_str(&debug_params_section(query, body)?);
        doc.push_str(&debug_response_section(response, timestamp)?);
        Ok(doc)
    }

    /// Description, query, request body, and response sections.
    fn detail_sections(&self, detail: &InterfaceDetail) -> Result<String, DocumentError> {
        let mut out = description_section(detail);
        out.push_str(&query_section(detail));
        if let Some(schema) = detail.request_schema()? {
            out.push_str(&self.field_section("📦 请求体 (Request Body)", &schema));
        }
        if let Some(schema) = detail.response_schema()? {
            out.push_str(&self.field_section("📤 响应数据 (Response)", &schema));
        }
        Ok(out)
    }

    /// Field table for one schema: header, rows, and the truncation note
    /// when rows were cut at the depth limit.
    #[must_use]
    pub fn field_table(&self, schema: &SchemaNode) -> String {
        let table = SchemaTable::render_with_limit(schema, self.max_depth);
        let mut out = String::from(FIELD_TABLE_HEADER);
        out.push_str(&table.to_markdown());
        out.push('\n');
        if table.truncated() {
            out.push_str(&format!("> ⚠️ 字段嵌套超过 {} 层，更深层字段已省略\n\n", self.max_depth));
        }
        out
    }

    /// Field table section for one schema.
    fn field_section(&self, title: &str, schema: &SchemaNode) -> String {
        let mut out = section_marker(title);
        out.push_str(&self.field_table(schema));
        out
    }
}

// ============================================================================
// SECTION: Sections
// ============================================================================

/// `---` / `## title` / `---` marker opening every section.
fn section_marker(title: &str) -> String {
    format!("---\n## {title}\n---\n\n")
}

/// Description card; each line appears only when its field is non-empty.
#[must_use]
pub fn description_section(detail: &InterfaceDetail) -> String {
    let mut out = section_marker("📋 接口详情");
    if !detail.title().is_empty() {
        out.push_str(&format!("**🎯 接口名称:** `{}`\n\n", detail.title()));
    }
    if !detail.path().is_empty() {
        out.push_str(&format!("**🔗 接口路径:** `{}`\n\n", detail.path()));
    }
    if !detail.method().is_empty() {
        out.push_str(&format!("**🚀 请求方法:** `{}`\n\n", detail.method()));
    }
    if !detail.desc().is_empty() {
        out.push_str(&format!("**📝 接口描述:** {}\n\n", detail.desc()));
    }
    out
}

/// Query parameter table, or nothing when none are declared.
#[must_use]
pub fn query_section(detail: &InterfaceDetail) -> String {
    if detail.req_query.is_empty() {
        return String::new();
    }
    let mut out = section_marker("🔍 请求参数 (Query Parameters)");
    out.push_str(QUERY_TABLE_HEADER);
    for param in &detail.req_query {
        let name = or_placeholder(&param.name);
        let required = if param.is_required() { "`✅ 是`" } else { "`❌ 否`" };
        let example = if param.example.is_empty() {
            "-".to_string()
        } else {
            format!("`{}`", param.example)
        };
        let desc = or_placeholder(&param.desc);
        out.push_str(&format!("| **{name}** | {required} | {example} | {desc} |\n"));
    }
    out.push('\n');
    out
}

/// Pretty-printed dump of the record as received.
fn raw_section(raw: &Value) -> Result<String, DocumentError> {
    let mut out = section_marker("🔧 原始数据 (Raw Data)");
    out.push_str(&json_block(raw)?);
    Ok(out)
}

/// Parameters actually sent; each block appears only when non-empty.
fn debug_params_section(query: &Map<String, Value>, body: &Value) -> Result<String, DocumentError> {
    let mut out = section_marker("🔧 调试参数");
    if !query.is_empty() {
        out.push_str("### 📤 请求 Query 参数\n");
        out.push_str(&json_block(query)?);
    }
    if !is_empty_payload(body) {
        out.push_str("### 📦 请求 Body 参数\n");
        out.push_str(&json_block(body)?);
    }
    Ok(out)
}

/// Debug response block closed by the timestamp line.
fn debug_response_section(response: &Value, timestamp: &str) -> Result<String, DocumentError> {
    let mut out = section_marker("📥 调试响应结果");
    out.push_str(DEBUG_SUCCESS_BANNER);
    out.push_str(&json_block(response)?);
    out.push_str(&format!("---\n*📅 调试时间: {timestamp}*\n"));
    Ok(out)
}

/// Fenced, two-space indented JSON block followed by a blank line.
fn json_block<T: Serialize + ?Sized>(value: &T) -> Result<String, DocumentError> {
    let pretty = serde_json::to_string_pretty(value)
        .map_err(|err| DocumentError::Serialization(err.to_string()))?;
    Ok(format!("```json\n{pretty}\n```\n\n"))
}

/// Returns `-` for empty cells.
fn or_placeholder(text: &str) -> &str {
    if text.is_empty() { "-" } else { text }
}

// ============================================================================
// SECTION: Timestamps
// ============================================================================

/// Formats `at` as `YYYY/M/D HH:MM:SS`.
#[must_use]
pub fn format_timestamp(at: OffsetDateTime) -> String {
    format!(
        "{}/{}/{} {:02}:{:02}:{:02}",
        at.year(),
        u8::from(at.month()),
        at.day(),
        at.hour(),
        at.minute(),
        at.second()
    )
}

/// Current time in the local offset, falling back to UTC when the offset
/// cannot be determined.
#[must_use]
pub fn local_timestamp() -> String {
    format_timestamp(OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
