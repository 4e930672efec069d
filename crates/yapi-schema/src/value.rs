// yapi-schema/src/value.rs
// ============================================================================
// Module: Synthesized Values
// Description: Concrete value tree produced by payload synthesis.
// Purpose: Carry JSON-compatible values, including the not-a-number sentinel.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! [`SynthesizedValue`] mirrors JSON but keeps floating-point values as raw
//! `f64`, so a mock that fails numeric parsing survives as NaN instead of
//! being rejected. Non-finite floats serialize as JSON `null`, which is the
//! only representation JSON offers for them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde::Serializer;
use serde::ser::SerializeMap;
use serde::ser::SerializeSeq;
use serde_json::Map;
use serde_json::Number;
use serde_json::Value;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Value tree produced by the payload synthesizer.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesizedValue {
    /// JSON `null`.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Whole number.
    Integer(i64),
    /// Floating-point number, possibly NaN or infinite.
    Float(f64),
    /// String scalar.
    String(String),
    /// Ordered sequence.
    Array(Vec<Self>),
    /// Ordered mapping in declaration order.
    Object(Vec<(String, Self)>),
}

impl SynthesizedValue {
    /// Returns an empty mapping.
    #[must_use]
    pub const fn empty_object() -> Self {
        Self::Object(Vec::new())
    }

    /// Returns true when the value is the not-a-number sentinel.
    #[must_use]
    pub fn is_nan(&self) -> bool {
        matches!(self, Self::Float(value) if value.is_nan())
    }

    /// Looks up a field of a mapping by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Self> {
        match self {
            Self::Object(fields) => {
                fields.iter().find(|(field, _)| field == name).map(|(_, value)| value)
            }
            _ => None,
        }
    }

    /// Converts the tree into a [`serde_json::Value`], mapping non-finite floats to `null`.
    #[must_use]
    pub fn into_json(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(value) => Value::Bool(value),
            Self::Integer(value) => Value::Number(Number::from(value)),
            Self::Float(value) => Number::from_f64(value).map_or(Value::Null, Value::Number),
            Self::String(value) => Value::String(value),
            Self::Array(items) => Value::Array(items.into_iter().map(Self::into_json).collect()),
            Self::Object(fields) => {
                let mut map = Map::new();
                for (name, value) in fields {
                    map.insert(name, value.into_json());
                }
                Value::Object(map)
            }
        }
    }
}

impl From<SynthesizedValue> for Value {
    fn from(value: SynthesizedValue) -> Self {
        value.into_json()
    }
}

impl Serialize for SynthesizedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Integer(value) => serializer.serialize_i64(*value),
            Self::Float(value) if value.is_finite() => serializer.serialize_f64(*value),
            Self::Float(_) => serializer.serialize_unit(),
            Self::String(value) => serializer.serialize_str(value),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (name, value) in fields {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only serialization assertions.")]

    use serde_json::json;

    use super::SynthesizedValue;

    #[test]
    fn nan_serializes_as_null() {
        let value = SynthesizedValue::Object(vec![(
            "count".to_string(),
            SynthesizedValue::Float(f64::NAN),
        )]);
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"count":null}"#);
        assert_eq!(value.into_json(), json!({"count": null}));
    }

    #[test]
    fn object_serialization_keeps_field_order() {
        let value = SynthesizedValue::Object(vec![
            ("b".to_string(), SynthesizedValue::Integer(1)),
            ("a".to_string(), SynthesizedValue::Bool(true)),
        ]);
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"b":1,"a":true}"#);
    }
}
