// yapi-mcp/src/interface.rs
// ============================================================================
// Module: YApi Interface Detail
// Description: Typed view over the `data` payload of `/interface/get`.
// Purpose: Expose the fields the composer and debug flow read, keep the rest.
// Dependencies: serde, serde_json, yapi-schema
// ============================================================================

//! ## Overview
//! YApi returns a loosely typed interface record. Only the fields the tools
//! read are typed here; the untouched payload is kept alongside so the raw
//! data dump reproduces exactly what the server sent, key order included.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;
use yapi_schema::QueryParamDef;
use yapi_schema::QueryParams;
use yapi_schema::SchemaError;
use yapi_schema::SchemaNode;
use yapi_schema::map_query_params;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Interface definition fetched from YApi.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterfaceDetail {
    /// Interface title.
    #[serde(default)]
    pub title: Option<String>,
    /// Interface path relative to the debug host, e.g. `/user/list`.
    #[serde(default)]
    pub path: Option<String>,
    /// HTTP method.
    #[serde(default)]
    pub method: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub desc: Option<String>,
    /// Declared query parameters.
    #[serde(default, deserialize_with = "nullable_query")]
    pub req_query: Vec<QueryParamDef>,
    /// Raw JSON schema text of the request body.
    #[serde(default)]
    pub req_body_other: Option<String>,
    /// Raw JSON schema text of the response body.
    #[serde(default)]
    pub res_body: Option<String>,
    /// Payload exactly as received.
    #[serde(skip)]
    pub raw: Value,
}

impl InterfaceDetail {
    /// Builds the typed view and keeps `value` as the raw payload.
    ///
    /// # Errors
    ///
    /// Returns a decode error when `value` is not an interface record.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let mut detail = Self::deserialize(&value)?;
        detail.raw = value;
        Ok(detail)
    }

    /// Title, or an empty string.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    /// Path, or an empty string.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or_default()
    }

    /// Method, or an empty string.
    #[must_use]
    pub fn method(&self) -> &str {
        self.method.as_deref().unwrap_or_default()
    }

    /// Description, or an empty string.
    #[must_use]
    pub fn desc(&self) -> &str {
        self.desc.as_deref().unwrap_or_default()
    }

    /// Request body schema text when non-empty.
    #[must_use]
    pub fn request_schema_text(&self) -> Option<&str> {
        self.req_body_other.as_deref().filter(|text| !text.is_empty())
    }

    /// Response schema text when non-empty.
    #[must_use]
    pub fn response_schema_text(&self) -> Option<&str> {
        self.res_body.as_deref().filter(|text| !text.is_empty())
    }

    /// Parses the request body schema; `None` when the interface has none.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Parse`] when the text is not JSON.
    pub fn request_schema(&self) -> Result<Option<SchemaNode>, SchemaError> {
        self.request_schema_text().map(SchemaNode::parse).transpose()
    }

    /// Parses the response schema; `None` when the interface has none.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Parse`] when the text is not JSON.
    pub fn response_schema(&self) -> Result<Option<SchemaNode>, SchemaError> {
        self.response_schema_text().map(SchemaNode::parse).transpose()
    }

    /// Query parameters synthesized from the declared examples.
    #[must_use]
    pub fn synthesized_query(&self) -> QueryParams {
        map_query_params(&self.req_query)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Treats a `null` query list as empty.
fn nullable_query<'de, D>(deserializer: D) -> Result<Vec<QueryParamDef>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<QueryParamDef>>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
