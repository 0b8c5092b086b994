//! Sort specifications for page windows.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema field type, as far as table behavior cares about it.
///
/// `Slug` fields order by their `.current` sub-path; `Image`, `File`, and
/// `Reference` fields are not sortable at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Text,
    Slug,
    Number,
    Boolean,
    Datetime,
    Date,
    Url,
    Image,
    File,
    Reference,
    Object,
    Array,
    #[serde(untagged)]
    Other(String),
}

impl FieldType {
    /// Whether columns of this type can drive an order clause.
    pub fn sortable(&self) -> bool {
        !matches!(self, FieldType::Image | FieldType::File | FieldType::Reference)
    }
}

/// An explicit sort over one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Selected field path.
    pub key: String,
    pub direction: SortDirection,
    /// Type of the sorted field; drives slug sub-path handling.
    pub field_type: FieldType,
}

impl SortSpec {
    pub fn new(key: impl Into<String>, direction: SortDirection, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            direction,
            field_type,
        }
    }

    /// Descending sort (the common "newest first" default in callers).
    pub fn desc(key: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(key, SortDirection::Desc, field_type)
    }

    /// Ascending sort.
    pub fn asc(key: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(key, SortDirection::Asc, field_type)
    }

    /// Effective path to order by. Slug fields order by their `current`
    /// sub-field rather than the slug object itself.
    pub fn order_path(&self) -> String {
        if self.field_type == FieldType::Slug {
            format!("{}.current", self.key)
        } else {
            self.key.clone()
        }
    }

    /// Render the order clause used by string-predicate store backends,
    /// e.g. `| order(title asc)`.
    pub fn order_clause(&self) -> String {
        format!("| order({} {})", self.order_path(), self.direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_path_uses_slug_current() {
        let spec = SortSpec::asc("slug", FieldType::Slug);
        assert_eq!(spec.order_path(), "slug.current");
        assert_eq!(spec.order_clause(), "| order(slug.current asc)");
    }

    #[test]
    fn order_clause_plain_field() {
        let spec = SortSpec::desc("_updatedAt", FieldType::Datetime);
        assert_eq!(spec.order_clause(), "| order(_updatedAt desc)");
    }

    #[test]
    fn sortability_by_type() {
        assert!(FieldType::Slug.sortable());
        assert!(FieldType::Datetime.sortable());
        assert!(!FieldType::Image.sortable());
        assert!(!FieldType::Reference.sortable());
        assert!(!FieldType::File.sortable());
    }
}
