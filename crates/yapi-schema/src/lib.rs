// yapi-schema/src/lib.rs
// ============================================================================
// Module: YApi Schema Root
// Description: Public API surface for the schema transformation core.
// Purpose: Wire together the schema model, payload synthesis, and table rendering.
// Dependencies: crate::{mock, query, schema, synthesize, table, value}
// ============================================================================

//! ## Overview
//! `yapi-schema` turns the JSON-Schema-like body descriptions published by a
//! YApi interface into two artifacts: a synthetic request payload and a
//! flattened markdown table. Every entry point is pure and synchronous; the
//! crate performs no I/O.
//!
//! ## Invariants
//! - Schema nodes are classified once at parse time into [`SchemaKind`].
//! - Synthesized field order mirrors declared property order.
//! - Traversals use explicit work stacks bounded by a maximum depth.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod mock;
pub mod query;
pub mod schema;
pub mod synthesize;
pub mod table;
pub mod value;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use mock::convert_mock_value;
pub use query::QueryParamDef;
pub use query::QueryParams;
pub use query::map_query_params;
pub use schema::ArraySchema;
pub use schema::MAX_SCHEMA_DEPTH;
pub use schema::MAX_SCHEMA_TEXT_DEPTH;
pub use schema::ObjectSchema;
pub use schema::PrimitiveType;
pub use schema::SchemaError;
pub use schema::SchemaKind;
pub use schema::SchemaNode;
pub use synthesize::PayloadSynthesizer;
pub use synthesize::synthesize_payload;
pub use table::SchemaTable;
pub use table::TableRow;
pub use value::SynthesizedValue;
