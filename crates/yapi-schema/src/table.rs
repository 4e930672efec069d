// yapi-schema/src/table.rs
// ============================================================================
// Module: Schema Table Renderer
// Description: Flattens object schemas into documentation table rows.
// Purpose: Produce pre-order markdown rows with depth indentation and badges.
// Dependencies: crate::schema
// ============================================================================

//! ## Overview
//! [`SchemaTable::render`] walks an object schema in declaration order and
//! emits one [`TableRow`] per property at any depth. Object properties are
//! followed by their children; array properties whose items are objects are
//! followed by the item fields, marked as array elements. Primitive
//! properties are leaves.
//!
//! Traversal is iterative and depth-bounded. Children deeper than the limit
//! are skipped and [`SchemaTable::truncated`] reports the cut.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::slice::Iter;

use crate::schema::MAX_SCHEMA_DEPTH;
use crate::schema::ObjectSchema;
use crate::schema::SchemaKind;
use crate::schema::SchemaNode;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Spacer repeated once per nesting level.
const INDENT_UNIT: &str = "&nbsp;&nbsp;&nbsp;&nbsp;";
/// Glyph for top-level fields.
const GLYPH_TOP_LEVEL: &str = "🔹 ";
/// Glyph for fields of nested objects.
const GLYPH_NESTED: &str = "📄 ";
/// Glyph for fields of array elements.
const GLYPH_ARRAY_ITEM: &str = "📋 ";
/// Placeholder for absent values.
const PLACEHOLDER: &str = "-";
/// Badge for required fields.
const BADGE_REQUIRED: &str = "`必填`";
/// Badge for optional fields.
const BADGE_OPTIONAL: &str = "`可选`";

// ============================================================================
// SECTION: Rows
// ============================================================================

/// One documentation row for a schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// Nesting level; top-level fields are 0.
    pub depth: usize,
    /// Field name.
    pub name: String,
    /// Field belongs to an array-of-objects element.
    pub array_item: bool,
    /// Declared type tag, absent for untyped primitives.
    pub type_tag: Option<String>,
    /// Field is listed in its parent's required set.
    pub required: bool,
    /// Mock literal.
    pub mock: Option<String>,
    /// Human description.
    pub description: Option<String>,
}

impl TableRow {
    /// Renders the row as a markdown table line without a trailing newline.
    #[must_use]
    pub fn to_markdown_line(&self) -> String {
        let glyph = if self.depth == 0 {
            GLYPH_TOP_LEVEL
        } else if self.array_item {
            GLYPH_ARRAY_ITEM
        } else {
            GLYPH_NESTED
        };
        let suffix = if self.array_item { "[]" } else { "" };
        let badge = if self.required { BADGE_REQUIRED } else { BADGE_OPTIONAL };
        format!(
            "| {indent}{glyph}**{name}{suffix}** | `{type_tag}` | {badge} | `{mock}` | {description} |",
            indent = INDENT_UNIT.repeat(self.depth),
            name = self.name,
            type_tag = self.type_tag.as_deref().unwrap_or(PLACEHOLDER),
            mock = self.mock.as_deref().unwrap_or(PLACEHOLDER),
            description = self.description.as_deref().unwrap_or(PLACEHOLDER),
        )
    }
}

// ============================================================================
// SECTION: Table
// ============================================================================

/// Ordered rows rendered from one schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaTable {
    /// Rows in pre-order.
    rows: Vec<TableRow>,
    /// Children were skipped because of the depth limit.
    truncated: bool,
}

impl SchemaTable {
    /// Renders `root` with the default depth limit.
    #[must_use]
    pub fn render(root: &SchemaNode) -> Self {
        Self::render_with_limit(root, MAX_SCHEMA_DEPTH)
    }

    /// Renders `root`, emitting rows no deeper than `max_depth`.
    ///
    /// Non-object roots render no rows.
    #[must_use]
    pub fn render_with_limit(root: &SchemaNode, max_depth: usize) -> Self {
        let mut table = Self::default();
        let Some(object) = root.as_object() else {
            return table;
        };
        let mut stack = vec![Level::open(object, 0, false)];
        while let Some(level) = stack.last_mut() {
            let Some((name, node)) = level.fields.next() else {
                stack.pop();
                continue;
            };
            let (parent, depth, array_item) = (level.object, level.depth, level.array_item);
            table.rows.push(TableRow {
                depth,
                name: name.clone(),
                array_item,
                type_tag: node.type_tag().map(str::to_string),
                required: parent.is_required(name),
                mock: node.mock.clone(),
                description: node.description.clone(),
            });
            let Some((child, child_is_item)) = nested_object(node) else {
                continue;
            };
            if child.properties.is_empty() {
                continue;
            }
            if depth + 1 > max_depth {
                table.truncated = true;
                continue;
            }
            stack.push(Level::open(child, depth + 1, child_is_item));
        }
        table
    }

    /// Rows in pre-order.
    #[must_use]
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Returns true when the depth limit cut off nested fields.
    #[must_use]
    pub const fn truncated(&self) -> bool {
        self.truncated
    }

    /// Returns true when there are no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders all rows as newline-terminated markdown lines.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            let _ = writeln!(out, "{}", row.to_markdown_line());
        }
        out
    }
}

// ============================================================================
// SECTION: Traversal State
// ============================================================================

/// Object whose properties are being emitted.
struct Level<'a> {
    /// Object owning the properties (for the required set).
    object: &'a ObjectSchema,
    /// Remaining properties.
    fields: Iter<'a, (String, SchemaNode)>,
    /// Row depth for these properties.
    depth: usize,
    /// Properties belong to an array element.
    array_item: bool,
}

impl<'a> Level<'a> {
    /// Opens a level over `object`.
    fn open(object: &'a ObjectSchema, depth: usize, array_item: bool) -> Self {
        Self {
            object,
            fields: object.properties.iter(),
            depth,
            array_item,
        }
    }
}

/// Returns the object rendered beneath `node`, flagged when reached through array items.
fn nested_object(node: &SchemaNode) -> Option<(&ObjectSchema, bool)> {
    match &node.kind {
        SchemaKind::Object(object) => Some((object, false)),
        SchemaKind::Array(array) => array.items.as_deref()?.as_object().map(|object| (object, true)),
        SchemaKind::Primitive(_) => None,
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
