// yapi-schema/src/schema.rs
// ============================================================================
// Module: Schema Model
// Description: Tagged schema nodes parsed from YApi JSON-Schema fragments.
// Purpose: Resolve node shape once so walkers dispatch on a known discriminant.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! YApi stores request and response bodies as JSON text shaped like a subset of
//! JSON Schema. [`SchemaNode::from_value`] classifies every node as an object,
//! an array, or a primitive. Parsing never fails on shape: unknown keys are
//! ignored and missing `properties`, `items`, or `mock` entries degrade to
//! empty defaults. Only [`SchemaNode::parse`] can fail, when the raw text is
//! not valid JSON.
//!
//! Classification rules:
//! - `type` decides when present (`object`, `array`, anything else is a
//!   primitive).
//! - Without `type`, an object-valued `properties` implies an object and a
//!   non-null `items` implies an array.
//! - Everything else is an untyped primitive.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum nesting depth walked by the synthesizer and renderer.
pub const MAX_SCHEMA_DEPTH: usize = 64;

/// Maximum nesting accepted while converting JSON into schema nodes.
const MAX_PARSE_DEPTH: usize = 256;

/// Maximum bracket nesting accepted in raw schema text. Each schema level
/// spends two JSON levels (the node and its `properties` map).
pub const MAX_SCHEMA_TEXT_DEPTH: usize = 2 * MAX_PARSE_DEPTH + 2;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Primitive type tags recognized by mock conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveType {
    /// `string`
    String,
    /// `integer`
    Integer,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// Any other declared type tag, kept verbatim for rendering.
    Other(String),
    /// No `type` key at all.
    Untyped,
}

impl PrimitiveType {
    /// Maps a declared type tag onto a primitive type.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "string" => Self::String,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the literal type tag, if the node declared one.
    #[must_use]
    pub fn as_tag(&self) -> Option<&str> {
        match self {
            Self::String => Some("string"),
            Self::Integer => Some("integer"),
            Self::Number => Some("number"),
            Self::Boolean => Some("boolean"),
            Self::Other(tag) => Some(tag.as_str()),
            Self::Untyped => None,
        }
    }
}

/// Object node: ordered properties plus the required field set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectSchema {
    /// Properties in declaration order.
    pub properties: Vec<(String, SchemaNode)>,
    /// Names listed in the node's `required` array.
    pub required: BTreeSet<String>,
}

impl ObjectSchema {
    /// Returns true when `name` appears in the required set.
    #[must_use]
    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(name)
    }
}

/// Array node: optional element shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArraySchema {
    /// Element schema when `items` was present.
    pub items: Option<Box<SchemaNode>>,
}

/// Shape discriminant for a schema node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaKind {
    /// `type: object`
    Object(ObjectSchema),
    /// `type: array`
    Array(ArraySchema),
    /// Leaf value.
    Primitive(PrimitiveType),
}

/// A single schema node with its documentation metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNode {
    /// Node shape.
    pub kind: SchemaKind,
    /// Mock literal from `mock.mock`, absent when empty.
    pub mock: Option<String>,
    /// Human description, absent when empty.
    pub description: Option<String>,
}

impl Default for SchemaNode {
    fn default() -> Self {
        Self::object(ObjectSchema::default())
    }
}

impl SchemaNode {
    /// Builds a bare object node.
    #[must_use]
    pub const fn object(schema: ObjectSchema) -> Self {
        Self {
            kind: SchemaKind::Object(schema),
            mock: None,
            description: None,
        }
    }

    /// Builds a bare primitive node.
    #[must_use]
    pub const fn primitive(primitive: PrimitiveType) -> Self {
        Self {
            kind: SchemaKind::Primitive(primitive),
            mock: None,
            description: None,
        }
    }

    /// Parses raw schema text into a node.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Parse`] when the text is not valid JSON or nests
    /// deeper than [`MAX_SCHEMA_TEXT_DEPTH`].
    pub fn parse(text: &str) -> Result<Self, SchemaError> {
        check_text_depth(text, MAX_SCHEMA_TEXT_DEPTH)?;
        let mut deserializer = serde_json::Deserializer::from_str(text);
        deserializer.disable_recursion_limit();
        let value = Value::deserialize(&mut deserializer)
            .map_err(|err| SchemaError::Parse(err.to_string()))?;
        deserializer.end().map_err(|err| SchemaError::Parse(err.to_string()))?;
        Ok(Self::from_value(&value))
    }

    /// Parses optional raw schema text; blank or missing text yields an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Parse`] when non-blank text is not valid JSON.
    pub fn parse_optional(text: Option<&str>) -> Result<Self, SchemaError> {
        match text {
            Some(text) if !text.trim().is_empty() => Self::parse(text),
            _ => Ok(Self::default()),
        }
    }

    /// Classifies a JSON value as a schema node.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        node_from_value(value, 0)
    }

    /// Returns the literal type tag rendered for this node.
    #[must_use]
    pub fn type_tag(&self) -> Option<&str> {
        match &self.kind {
            SchemaKind::Object(_) => Some("object"),
            SchemaKind::Array(_) => Some("array"),
            SchemaKind::Primitive(primitive) => primitive.as_tag(),
        }
    }

    /// Returns the object schema when this node is an object.
    #[must_use]
    pub const fn as_object(&self) -> Option<&ObjectSchema> {
        match &self.kind {
            SchemaKind::Object(object) => Some(object),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Schema parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Raw schema text is not valid JSON.
    #[error("schema parse error: {0}")]
    Parse(String),
}

// ============================================================================
// SECTION: Parsing Helpers
// ============================================================================

/// Rejects text whose bracket nesting exceeds `limit` before it reaches the
/// unbounded deserializer. Brackets inside strings do not count; malformed
/// text is left for the deserializer to report.
fn check_text_depth(text: &str, limit: usize) -> Result<(), SchemaError> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for byte in text.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                if depth > limit {
                    return Err(SchemaError::Parse(format!("nesting exceeds {limit} levels")));
                }
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

/// Converts a JSON value into a node, truncating structure past the parse limit.
fn node_from_value(value: &Value, depth: usize) -> SchemaNode {
    let Value::Object(map) = value else {
        return SchemaNode::primitive(PrimitiveType::Untyped);
    };
    let mock = mock_literal(map);
    let description = non_empty_string(map.get("description"));
    let type_tag = map.get("type").and_then(Value::as_str);
    let properties = map.get("properties").and_then(Value::as_object);
    let items = map.get("items").filter(|items| !items.is_null());

    let kind = match (type_tag, properties, items) {
        (Some("object"), _, _) | (None, Some(_), _) => {
            SchemaKind::Object(object_from_map(map, properties, depth))
        }
        (Some("array"), _, _) | (None, None, Some(_)) => {
            let items = if depth < MAX_PARSE_DEPTH {
                items.map(|items| Box::new(node_from_value(items, depth + 1)))
            } else {
                None
            };
            SchemaKind::Array(ArraySchema {
                items,
            })
        }
        (Some(tag), _, _) => SchemaKind::Primitive(PrimitiveType::from_tag(tag)),
        (None, None, None) => SchemaKind::Primitive(PrimitiveType::Untyped),
    };

    SchemaNode {
        kind,
        mock,
        description,
    }
}

/// Builds an object schema from its `properties` and `required` entries.
fn object_from_map(
    map: &Map<String, Value>,
    properties: Option<&Map<String, Value>>,
    depth: usize,
) -> ObjectSchema {
    let required = map
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();
    let properties = match properties {
        Some(properties) if depth < MAX_PARSE_DEPTH => properties
            .iter()
            .map(|(name, node)| (name.clone(), node_from_value(node, depth + 1)))
            .collect(),
        _ => Vec::new(),
    };
    ObjectSchema {
        properties,
        required,
    }
}

/// Extracts `mock.mock`, treating falsy literals as absent.
fn mock_literal(map: &Map<String, Value>) -> Option<String> {
    let raw = map.get("mock")?.as_object()?.get("mock")?;
    match raw {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) if number.as_f64().is_some_and(|value| value.abs() > 0.0) => {
            Some(number.to_string())
        }
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// Returns a non-empty string value.
fn non_empty_string(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).filter(|text| !text.is_empty()).map(str::to_string)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        reason = "Test-only parsing assertions."
    )]

    use serde_json::json;

    use super::MAX_SCHEMA_TEXT_DEPTH;
    use super::PrimitiveType;
    use super::SchemaKind;
    use super::SchemaNode;

    #[test]
    fn properties_keep_declaration_order() {
        let node = SchemaNode::parse(
            r#"{"type":"object","properties":{"zeta":{"type":"string"},"alpha":{"type":"integer"},"mid":{"type":"boolean"}}}"#,
        )
        .unwrap();
        let object = node.as_object().unwrap();
        let names: Vec<&str> = object.properties.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn untyped_node_with_properties_is_object() {
        let node = SchemaNode::from_value(&json!({"properties": {"a": {"type": "string"}}}));
        assert!(matches!(node.kind, SchemaKind::Object(_)));
    }

    #[test]
    fn declared_type_wins_over_properties() {
        let node = SchemaNode::from_value(&json!({"type": "string", "properties": {}}));
        assert_eq!(node.kind, SchemaKind::Primitive(PrimitiveType::String));
    }

    #[test]
    fn untyped_node_with_items_is_array() {
        let node = SchemaNode::from_value(&json!({"items": {"type": "string"}}));
        assert!(matches!(node.kind, SchemaKind::Array(_)));
    }

    #[test]
    fn null_items_are_absent() {
        let node = SchemaNode::from_value(&json!({"type": "array", "items": null}));
        let SchemaKind::Array(array) = node.kind else {
            panic!("expected array");
        };
        assert!(array.items.is_none());
    }

    #[test]
    fn empty_mock_and_description_are_absent() {
        let node = SchemaNode::from_value(
            &json!({"type": "string", "mock": {"mock": ""}, "description": ""}),
        );
        assert_eq!(node.mock, None);
        assert_eq!(node.description, None);
    }

    #[test]
    fn numeric_mock_is_stringified() {
        let node = SchemaNode::from_value(&json!({"type": "integer", "mock": {"mock": 42}}));
        assert_eq!(node.mock.as_deref(), Some("42"));
    }

    #[test]
    fn unknown_type_tag_is_kept() {
        let node = SchemaNode::from_value(&json!({"type": "null"}));
        assert_eq!(node.type_tag(), Some("null"));
    }

    #[test]
    fn invalid_json_fails_to_parse() {
        assert!(SchemaNode::parse("{not json").is_err());
    }

    #[test]
    fn blank_optional_text_is_empty_object() {
        let node = SchemaNode::parse_optional(Some("  ")).unwrap();
        assert!(node.as_object().unwrap().properties.is_empty());
        let node = SchemaNode::parse_optional(None).unwrap();
        assert!(node.as_object().unwrap().properties.is_empty());
    }

    #[test]
    fn text_deeper_than_default_recursion_limit_parses() {
        let mut text = String::from(r#"{"type":"string"}"#);
        for _ in 0 .. 100 {
            text = format!(r#"{{"type":"object","properties":{{"f":{text}}}}}"#);
        }
        let node = SchemaNode::parse(&text).unwrap();
        assert!(node.as_object().is_some());
    }

    #[test]
    fn brackets_inside_strings_do_not_count_toward_depth() {
        let text = format!(r#"{{"description":"{}\"[","type":"object"}}"#, "[".repeat(1000));
        assert!(SchemaNode::parse(&text).is_ok());
    }

    #[test]
    fn text_past_depth_limit_is_rejected() {
        let levels = MAX_SCHEMA_TEXT_DEPTH + 1;
        let text = format!("{}{}", "[".repeat(levels), "]".repeat(levels));
        let err = SchemaNode::parse(&text).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("schema parse error: nesting exceeds {MAX_SCHEMA_TEXT_DEPTH} levels")
        );
    }

    #[test]
    fn trailing_text_is_a_parse_error() {
        assert!(SchemaNode::parse(r#"{"type":"object"} x"#).is_err());
    }
}
