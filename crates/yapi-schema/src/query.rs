// yapi-schema/src/query.rs
// ============================================================================
// Module: Query Mapper
// Description: Projects query-parameter definitions onto example values.
// Purpose: Build the flat query mapping sent with debug requests.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! YApi lists query parameters as flat records. [`map_query_params`] projects
//! them onto an ordered `name -> example` mapping without coercion. A repeated
//! name keeps its first position and takes the last example.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::ser::SerializeMap;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One query parameter definition as stored by YApi.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParamDef {
    /// Parameter name.
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    /// Human description.
    #[serde(default, deserialize_with = "lenient_string")]
    pub desc: String,
    /// Required flag; `"1"` means required.
    #[serde(default, deserialize_with = "lenient_string")]
    pub required: String,
    /// Example value.
    #[serde(default, deserialize_with = "lenient_string")]
    pub example: String,
}

impl QueryParamDef {
    /// Returns true when the definition is marked required.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required == "1"
    }
}

/// Insertion-ordered string mapping of query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Creates an empty mapping.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Sets `name` to `value`, keeping the first position of a repeated name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.0.iter_mut().find(|(existing, _)| *existing == name) {
            slot.1 = value;
        } else {
            self.0.push((name, value));
        }
    }

    /// Returns the value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(existing, _)| existing == name).map(|(_, value)| value.as_str())
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Returns the number of entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when there are no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Builds a mapping from a JSON object; non-string values are stringified as JSON.
    #[must_use]
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        let mut params = Self::new();
        for (name, value) in object {
            let text = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            params.insert(name.clone(), text);
        }
        params
    }

    /// Returns the mapping as a JSON object of strings.
    #[must_use]
    pub fn to_json_object(&self) -> Map<String, Value> {
        self.iter().map(|(name, value)| (name.to_string(), Value::String(value.to_string()))).collect()
    }
}

impl Serialize for QueryParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// ============================================================================
// SECTION: Mapping
// ============================================================================

/// Projects definitions onto an ordered `name -> example` mapping.
#[must_use]
pub fn map_query_params(defs: &[QueryParamDef]) -> QueryParams {
    let mut params = QueryParams::new();
    for def in defs {
        params.insert(def.name.clone(), def.example.clone());
    }
    params
}

// ============================================================================
// SECTION: Serde Helpers
// ============================================================================

/// Accepts strings, numbers, booleans, or null where YApi is inconsistent.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
