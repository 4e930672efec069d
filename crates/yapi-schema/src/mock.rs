// yapi-schema/src/mock.rs
// ============================================================================
// Module: Mock Conversion
// Description: Coerces mock literals into typed scalar values.
// Purpose: Apply the fixed per-type coercion policy used by payload synthesis.
// Dependencies: crate::{schema, value}
// ============================================================================

//! ## Overview
//! Mock literals are strings attached to schema fields. [`convert_mock_value`]
//! turns them into scalars according to the declared primitive type:
//!
//! | type    | empty literal | non-empty literal |
//! |---------|---------------|-------------------|
//! | string  | `""`          | literal           |
//! | integer | `0`           | leading-prefix base-10 integer, NaN if none |
//! | number  | `0`           | leading-prefix float, NaN if none |
//! | boolean | `false`       | `true` iff literal is `true` ignoring case |
//! | other   | `null`        | literal           |
//!
//! Numeric parsing reads the longest numeric prefix, so `"12abc"` becomes 12.
//! Conversion never fails; unparseable numbers become the NaN sentinel.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::schema::PrimitiveType;
use crate::value::SynthesizedValue;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Largest magnitude at which every whole `f64` is exactly representable.
const MAX_SAFE_WHOLE: f64 = 9_007_199_254_740_992.0;

// ============================================================================
// SECTION: Conversion
// ============================================================================

/// Converts a mock literal according to the declared primitive type.
#[must_use]
pub fn convert_mock_value(raw: &str, primitive: &PrimitiveType) -> SynthesizedValue {
    if raw.is_empty() {
        return match primitive {
            PrimitiveType::String => SynthesizedValue::String(String::new()),
            PrimitiveType::Integer | PrimitiveType::Number => SynthesizedValue::Integer(0),
            PrimitiveType::Boolean => SynthesizedValue::Bool(false),
            PrimitiveType::Other(_) | PrimitiveType::Untyped => SynthesizedValue::Null,
        };
    }
    match primitive {
        PrimitiveType::Integer => parse_integer_prefix(raw),
        PrimitiveType::Number => parse_number_prefix(raw),
        PrimitiveType::Boolean => SynthesizedValue::Bool(raw.to_lowercase() == "true"),
        PrimitiveType::String | PrimitiveType::Other(_) | PrimitiveType::Untyped => {
            SynthesizedValue::String(raw.to_string())
        }
    }
}

// ============================================================================
// SECTION: Prefix Parsing
// ============================================================================

/// Parses the leading base-10 integer of `raw`.
fn parse_integer_prefix(raw: &str) -> SynthesizedValue {
    let (negative, rest) = split_sign(raw.trim_start());
    let digits = leading_digits(rest);
    if digits == 0 {
        return SynthesizedValue::Float(f64::NAN);
    }
    let signed = if negative { format!("-{}", &rest[.. digits]) } else { rest[.. digits].to_string() };
    signed.parse::<i64>().map_or_else(
        |_| signed.parse::<f64>().map_or(SynthesizedValue::Float(f64::NAN), SynthesizedValue::Float),
        SynthesizedValue::Integer,
    )
}

/// Parses the leading decimal floating-point literal of `raw`.
fn parse_number_prefix(raw: &str) -> SynthesizedValue {
    let (negative, rest) = split_sign(raw.trim_start());
    if rest.starts_with("Infinity") {
        let value = if negative { f64::NEG_INFINITY } else { f64::INFINITY };
        return SynthesizedValue::Float(value);
    }
    let bytes = rest.as_bytes();
    let int_digits = leading_digits(rest);
    let mut end = int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = leading_digits(&rest[end + 1 ..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return SynthesizedValue::Float(f64::NAN);
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent_start = end + 1;
        if matches!(bytes.get(exponent_start), Some(b'+' | b'-')) {
            exponent_start += 1;
        }
        let exponent_digits = leading_digits(&rest[exponent_start ..]);
        if exponent_digits > 0 {
            end = exponent_start + exponent_digits;
        }
    }
    let Ok(magnitude) = rest[.. end].parse::<f64>() else {
        return SynthesizedValue::Float(f64::NAN);
    };
    normalize_number(if negative { -magnitude } else { magnitude })
}

/// Represents whole, safely representable floats as integers.
#[allow(
    clippy::float_cmp,
    clippy::cast_possible_truncation,
    reason = "Whole values below 2^53 convert to i64 exactly."
)]
fn normalize_number(value: f64) -> SynthesizedValue {
    if value.is_finite() && value.trunc() == value && value.abs() < MAX_SAFE_WHOLE {
        SynthesizedValue::Integer(value as i64)
    } else {
        SynthesizedValue::Float(value)
    }
}

/// Splits an optional leading sign from `text`.
fn split_sign(text: &str) -> (bool, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = text.strip_prefix('+') {
        (false, rest)
    } else {
        (false, text)
    }
}

/// Counts leading ASCII digits.
fn leading_digits(text: &str) -> usize {
    text.bytes().take_while(u8::is_ascii_digit).count()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
