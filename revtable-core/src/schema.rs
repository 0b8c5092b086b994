//! Schema field flattening for column pickers.
//!
//! Given the field tree of a document schema, produce the flat list of
//! selectable table columns. Array fields are excluded entirely. Object
//! fields with children are emitted non-sortable, followed by their
//! flattened children under dotted paths. `slug`, `reference`, and `image`
//! fields are emitted as leaves even when the schema models them as objects
//! (their internals are not useful columns).

use crate::sanitize::is_valid_field_name;
use crate::sort::FieldType;
use serde::{Deserialize, Serialize};

/// One field in a document schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub title: Option<String>,
    pub field_type: FieldType,
    /// Child fields for object-like types.
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            title: None,
            field_type,
            fields: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_fields(mut self, fields: Vec<SchemaField>) -> Self {
        self.fields = fields;
        self
    }
}

/// A selectable table column derived from a schema field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectableField {
    /// Dotted field path (e.g. `seo.title`).
    pub path: String,
    pub title: Option<String>,
    /// Nesting depth, 0 for top-level fields.
    pub level: usize,
    pub field_type: FieldType,
    /// Whether this column can drive sorting.
    pub sortable: bool,
}

/// Flatten a schema field tree into selectable columns.
///
/// Fields whose names fail the identifier pattern are excluded silently,
/// along with their children.
pub fn selectable_fields(fields: &[SchemaField]) -> Vec<SelectableField> {
    let mut out = Vec::new();
    for field in fields {
        flatten_into(field, None, 0, &mut out);
    }
    out
}

fn flatten_into(
    field: &SchemaField,
    parent_path: Option<&str>,
    level: usize,
    out: &mut Vec<SelectableField>,
) {
    if field.field_type == FieldType::Array {
        return;
    }
    if !is_valid_field_name(&field.name) {
        return;
    }

    let path = match parent_path {
        Some(parent) => format!("{}.{}", parent, field.name),
        None => field.name.clone(),
    };

    // Leaf-only types: never descend, sortability comes from the type.
    let leaf_only = matches!(
        field.field_type,
        FieldType::Slug | FieldType::Reference | FieldType::Image
    );

    if !leaf_only && !field.fields.is_empty() {
        out.push(SelectableField {
            path: path.clone(),
            title: field.title.clone(),
            level,
            field_type: field.field_type.clone(),
            sortable: false,
        });
        for child in &field.fields {
            flatten_into(child, Some(&path), level + 1, out);
        }
        return;
    }

    out.push(SelectableField {
        path,
        title: field.title.clone(),
        level,
        field_type: field.field_type.clone(),
        sortable: field.field_type.sortable(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(fields: &[SelectableField]) -> Vec<&str> {
        fields.iter().map(|f| f.path.as_str()).collect()
    }

    #[test]
    fn flattens_nested_objects_with_dotted_paths() {
        let schema = vec![
            SchemaField::new("title", FieldType::String),
            SchemaField::new("seo", FieldType::Object).with_fields(vec![
                SchemaField::new("title", FieldType::String),
                SchemaField::new("description", FieldType::Text),
            ]),
        ];
        let flat = selectable_fields(&schema);
        assert_eq!(paths(&flat), ["title", "seo", "seo.title", "seo.description"]);

        let seo = &flat[1];
        assert_eq!(seo.level, 0);
        assert!(!seo.sortable, "object parents are not sortable");
        assert_eq!(flat[2].level, 1);
        assert!(flat[2].sortable);
    }

    #[test]
    fn arrays_are_excluded() {
        let schema = vec![
            SchemaField::new("tags", FieldType::Array),
            SchemaField::new("title", FieldType::String),
        ];
        assert_eq!(paths(&selectable_fields(&schema)), ["title"]);
    }

    #[test]
    fn slug_and_reference_stay_leaves() {
        let schema = vec![
            SchemaField::new("slug", FieldType::Slug)
                .with_fields(vec![SchemaField::new("current", FieldType::String)]),
            SchemaField::new("author", FieldType::Reference),
            SchemaField::new("hero", FieldType::Image),
        ];
        let flat = selectable_fields(&schema);
        assert_eq!(paths(&flat), ["slug", "author", "hero"]);
        assert!(flat[0].sortable, "slug sorts via its .current sub-path");
        assert!(!flat[1].sortable);
        assert!(!flat[2].sortable);
    }

    #[test]
    fn invalid_names_are_excluded_silently() {
        let schema = vec![
            SchemaField::new("bad name", FieldType::String),
            SchemaField::new("good", FieldType::String),
        ];
        assert_eq!(paths(&selectable_fields(&schema)), ["good"]);
    }
}
