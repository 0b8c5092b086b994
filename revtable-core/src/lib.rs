//! # revtable-core
//!
//! Core data model for the revtable draft/published reconciliation engine:
//!
//! - [`id`] — revision identifier normalization (`drafts.` prefix handling)
//! - [`document`] — raw revisions and reconciled [`LogicalDocument`] rows
//! - [`sort`] — sort specs and field types
//! - [`fields`] — output column selection
//! - [`filter`] — sanitized free-text search filters
//! - [`schema`] — schema field flattening for column pickers
//! - [`sanitize`] — the input sanitization boundary
//!
//! This crate is synchronous and I/O-free. The store contract lives in
//! `revtable-store`; the query orchestration lives in `revtable-engine`.

pub mod document;
pub mod fields;
pub mod filter;
pub mod id;
pub mod sanitize;
pub mod schema;
pub mod sort;

pub use document::{DocStatus, Document, LogicalDocument};
pub use fields::{FieldSelection, FIELD_CREATED_AT, FIELD_LAST_PUBLISHED_AT, FIELD_UPDATED_AT};
pub use filter::SearchFilter;
pub use id::{draft_id, is_draft_id, normalize_id, raw_forms, DRAFT_PREFIX};
pub use schema::{selectable_fields, SchemaField, SelectableField};
pub use sort::{FieldType, SortDirection, SortSpec};
