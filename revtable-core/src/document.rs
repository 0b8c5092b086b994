//! Document types: raw store revisions and reconciled logical documents.

use crate::id::{is_draft_id, normalize_id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A raw revision as returned by a document store.
///
/// The `id` may be bare (published revision) or `drafts.`-prefixed (draft
/// revision). Schema-defined field values live in the `fields` bag keyed by
/// the caller's selected paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Raw revision identifier.
    pub id: String,
    /// Schema type of the document.
    pub type_name: String,
    /// Store-maintained last-update timestamp of this revision.
    pub updated_at: Option<DateTime<Utc>>,
    /// Selected schema-defined field values.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Create a revision with no fields.
    pub fn new(id: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            updated_at: None,
            fields: Map::new(),
        }
    }

    /// Attach a field value (builder style, used heavily in tests).
    pub fn with_field(mut self, path: impl Into<String>, value: Value) -> Self {
        self.fields.insert(path.into(), value);
        self
    }

    /// Attach the update timestamp (builder style).
    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    /// Whether this revision is a draft.
    pub fn is_draft(&self) -> bool {
        is_draft_id(&self.id)
    }

    /// The normalized (logical) identifier of this revision.
    pub fn normalized_id(&self) -> &str {
        normalize_id(&self.id)
    }
}

/// Revision status of a logical document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocStatus {
    /// Only a published revision exists.
    Published,
    /// Only a draft revision exists.
    Draft,
    /// Both revisions exist; field values come from the draft.
    PublishedWithPendingChanges,
}

impl DocStatus {
    /// Stable string form, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocStatus::Published => "published",
            DocStatus::Draft => "draft",
            DocStatus::PublishedWithPendingChanges => "published_with_pending_changes",
        }
    }
}

/// One deduplicated row exposed to consumers.
///
/// Invariant: a result set contains exactly one `LogicalDocument` per
/// normalized identifier. When draft and published revisions coexist the
/// draft's field values win and `status` records the coexistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalDocument {
    /// Identifier with any draft prefix stripped; unique per logical document.
    pub normalized_id: String,
    /// Raw identifier of whichever revision is materialized here.
    pub raw_id: String,
    /// Schema type of the materialized revision.
    pub type_name: String,
    /// Draft/published reconciliation status.
    pub status: DocStatus,
    /// Update timestamp of the last published revision, if one exists.
    ///
    /// A draft revision's own timestamp is never used here.
    pub last_published_at: Option<DateTime<Utc>>,
    /// Selected schema-defined field values.
    pub fields: Map<String, Value>,
}

impl LogicalDocument {
    /// Build a logical document from a single raw revision.
    ///
    /// Status and `last_published_at` reflect that revision alone; the
    /// materializer upgrades both when the sibling revision is seen.
    pub fn from_revision(doc: Document) -> Self {
        let is_draft = doc.is_draft();
        Self {
            normalized_id: doc.normalized_id().to_string(),
            status: if is_draft {
                DocStatus::Draft
            } else {
                DocStatus::Published
            },
            last_published_at: if is_draft { None } else { doc.updated_at },
            raw_id: doc.id,
            type_name: doc.type_name,
            fields: doc.fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_serializes_snake_case() {
        let v = serde_json::to_value(DocStatus::PublishedWithPendingChanges).unwrap();
        assert_eq!(v, json!("published_with_pending_changes"));
        assert_eq!(serde_json::to_value(DocStatus::Draft).unwrap(), json!("draft"));
    }

    #[test]
    fn from_published_revision() {
        let at = Utc::now();
        let doc = Document::new("a", "post").with_updated_at(at);
        let logical = LogicalDocument::from_revision(doc);
        assert_eq!(logical.status, DocStatus::Published);
        assert_eq!(logical.normalized_id, "a");
        assert_eq!(logical.last_published_at, Some(at));
    }

    #[test]
    fn from_draft_revision_has_no_published_timestamp() {
        let doc = Document::new("drafts.a", "post").with_updated_at(Utc::now());
        let logical = LogicalDocument::from_revision(doc);
        assert_eq!(logical.status, DocStatus::Draft);
        assert_eq!(logical.normalized_id, "a");
        assert_eq!(logical.raw_id, "drafts.a");
        assert_eq!(logical.last_published_at, None);
    }
}
