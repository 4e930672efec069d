// yapi-schema/src/synthesize.rs
// ============================================================================
// Module: Payload Synthesizer
// Description: Builds example request payloads from object schemas.
// Purpose: Produce a concrete value tree that mirrors schema shape and order.
// Dependencies: crate::{mock, schema, value}
// ============================================================================

//! ## Overview
//! [`PayloadSynthesizer`] walks an object schema and produces a
//! [`SynthesizedValue`] with the same nesting and field order:
//! - object fields become nested mappings (empty when no properties),
//! - array fields become one-element sequences when `items` is declared and
//!   empty sequences otherwise,
//! - primitive fields become the converted mock literal.
//!
//! Traversal uses an explicit frame stack. Objects nested deeper than the
//! configured limit synthesize as empty mappings, so self-similar or hostile
//! schemas cannot exhaust the call stack.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::slice::Iter;

use crate::mock::convert_mock_value;
use crate::schema::MAX_SCHEMA_DEPTH;
use crate::schema::ObjectSchema;
use crate::schema::PrimitiveType;
use crate::schema::SchemaKind;
use crate::schema::SchemaNode;
use crate::value::SynthesizedValue;

// ============================================================================
// SECTION: Synthesizer
// ============================================================================

/// Depth-bounded payload synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadSynthesizer {
    /// Deepest object nesting level that is expanded.
    max_depth: usize,
}

impl Default for PayloadSynthesizer {
    fn default() -> Self {
        Self::new(MAX_SCHEMA_DEPTH)
    }
}

impl PayloadSynthesizer {
    /// Creates a synthesizer expanding objects up to `max_depth` levels.
    #[must_use]
    pub const fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
        }
    }

    /// Synthesizes a payload for `root`; non-object roots yield an empty mapping.
    #[must_use]
    pub fn synthesize(&self, root: &SchemaNode) -> SynthesizedValue {
        let Some(object) = root.as_object() else {
            return SynthesizedValue::empty_object();
        };
        let mut stack = vec![Frame::open(object, 0, Slot::Root)];
        while let Some(frame) = stack.last_mut() {
            let Some((name, node)) = frame.fields.next() else {
                let Some(finished) = stack.pop() else {
                    break;
                };
                let value = SynthesizedValue::Object(finished.built);
                match finished.slot {
                    Slot::Root => return value,
                    Slot::Field {
                        name,
                        wrap,
                    } => {
                        if let Some(parent) = stack.last_mut() {
                            parent.built.push((name, wrap_element(value, wrap)));
                        }
                    }
                }
                continue;
            };
            let depth = frame.depth + 1;
            match classify(node) {
                Child::Leaf(value) => frame.built.push((name.clone(), value)),
                Child::Object(child, wrap) if depth <= self.max_depth => {
                    let slot = Slot::Field {
                        name: name.clone(),
                        wrap,
                    };
                    stack.push(Frame::open(child, depth, slot));
                }
                Child::Object(_, wrap) => {
                    frame.built.push((name.clone(), wrap_element(SynthesizedValue::empty_object(), wrap)));
                }
            }
        }
        SynthesizedValue::empty_object()
    }
}

/// Synthesizes a payload with the default depth limit.
#[must_use]
pub fn synthesize_payload(root: &SchemaNode) -> SynthesizedValue {
    PayloadSynthesizer::default().synthesize(root)
}

// ============================================================================
// SECTION: Traversal State
// ============================================================================

/// Where a finished object frame is attached.
enum Slot {
    /// The frame is the root mapping.
    Root,
    /// The frame becomes field `name` of its parent, optionally array-wrapped.
    Field {
        /// Field name in the parent mapping.
        name: String,
        /// Wrap the mapping in a one-element sequence.
        wrap: bool,
    },
}

/// Partially built object mapping.
struct Frame<'a> {
    /// Remaining properties in declaration order.
    fields: Iter<'a, (String, SchemaNode)>,
    /// Fields synthesized so far.
    built: Vec<(String, SynthesizedValue)>,
    /// Nesting level of this object (root is 0).
    depth: usize,
    /// Attachment point once all fields are built.
    slot: Slot,
}

impl<'a> Frame<'a> {
    /// Opens a frame over `object`.
    fn open(object: &'a ObjectSchema, depth: usize, slot: Slot) -> Self {
        Self {
            fields: object.properties.iter(),
            built: Vec::with_capacity(object.properties.len()),
            depth,
            slot,
        }
    }
}

/// Classification of a property for synthesis.
enum Child<'a> {
    /// Fully resolved value.
    Leaf(SynthesizedValue),
    /// Object requiring a new frame; `true` wraps it as a single array element.
    Object(&'a ObjectSchema, bool),
}

/// Resolves a property to a leaf value or a nested object frame.
fn classify(node: &SchemaNode) -> Child<'_> {
    match &node.kind {
        SchemaKind::Object(object) => Child::Object(object, false),
        SchemaKind::Array(array) => {
            let Some(items) = array.items.as_deref() else {
                return Child::Leaf(SynthesizedValue::Array(Vec::new()));
            };
            let element = match &items.kind {
                SchemaKind::Object(object) => return Child::Object(object, true),
                SchemaKind::Array(_) => convert_mock_value(
                    items.mock.as_deref().unwrap_or_default(),
                    &PrimitiveType::Other("array".to_string()),
                ),
                SchemaKind::Primitive(primitive) => {
                    convert_mock_value(items.mock.as_deref().unwrap_or_default(), primitive)
                }
            };
            Child::Leaf(SynthesizedValue::Array(vec![element]))
        }
        SchemaKind::Primitive(primitive) => {
            Child::Leaf(convert_mock_value(node.mock.as_deref().unwrap_or_default(), primitive))
        }
    }
}

/// Wraps `value` in a one-element sequence when requested.
fn wrap_element(value: SynthesizedValue, wrap: bool) -> SynthesizedValue {
    if wrap { SynthesizedValue::Array(vec![value]) } else { value }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
