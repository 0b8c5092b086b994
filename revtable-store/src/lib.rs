//! Document store and change feed contracts for revtable
//!
//! This crate defines the abstract query capabilities the reconciliation
//! engine issues against a versioned document store. It deliberately does
//! not prescribe a wire protocol; backends map these calls onto whatever
//! query language they speak. Two traits carry the contract:
//!
//! - [`DocumentStore`]: fetching identifiers, count parts, raw windows, and
//!   revision documents
//! - [`ChangeFeed`]: live mutation events scoped to a document type
//!
//! # Implementations
//!
//! - [`MemoryDocumentStore`]: in-memory, thread-safe implementation for
//!   tests and embedders

mod error;
pub mod memory;

pub use error::{Result, StoreError};
pub use memory::MemoryDocumentStore;

use async_trait::async_trait;
use revtable_core::{Document, FieldSelection, SearchFilter, SortSpec};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::ops::Range;
use tokio::sync::broadcast;

/// Filter shared by every store query: a document type plus an optional
/// sanitized search filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFilter {
    /// Schema type the query is scoped to.
    pub type_name: String,
    /// Free-text search constraint; `SearchFilter::match_all()` for none.
    pub search: SearchFilter,
}

impl DocumentFilter {
    pub fn new(type_name: impl Into<String>, search: SearchFilter) -> Self {
        Self {
            type_name: type_name.into(),
            search,
        }
    }

    /// Filter over a type with no search constraint.
    pub fn for_type(type_name: impl Into<String>) -> Self {
        Self::new(type_name, SearchFilter::match_all())
    }
}

/// Which revision identifiers an id fetch returns.
///
/// `Copy` — small enum, pass by value at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdScope {
    /// Every raw revision identifier (drafts and published interleaved).
    All,
    /// Only `drafts.`-prefixed identifiers.
    DraftsOnly,
}

/// Count parts used by the logical-count identity.
///
/// Given the published forms of all matching draft identifiers, the logical
/// count is `draft_count - drafts_with_published + not_draft`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountParts {
    /// How many of the supplied published identifiers exist as matching
    /// published documents (i.e. drafts that shadow a published revision).
    pub drafts_with_published: usize,
    /// How many matching documents are not drafts at all.
    pub not_draft: usize,
}

/// A raw identifier paired with its absolute offset in the store's
/// (non-deduplicated) ordering. Page windowing needs the offset to resume
/// scanning after duplicate removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetId {
    pub id: String,
    pub offset: usize,
}

/// A mutation event on a document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Raw identifier of the mutated revision (may carry the draft prefix).
    pub document_id: String,
}

/// Subscription handle for receiving change events
#[derive(Debug)]
pub struct ChangeSubscription {
    /// The document type this subscription is scoped to
    pub type_name: String,
    /// Receiver for change events (in-process).
    pub receiver: broadcast::Receiver<ChangeEvent>,
}

/// Abstract query capability over a versioned document store.
///
/// All offsets and windows are computed over **raw** revisions; draft
/// deduplication is the engine's concern, not the store's.
#[async_trait]
pub trait DocumentStore: Debug + Send + Sync {
    /// Fetch raw revision identifiers matching the filter.
    async fn fetch_ids(&self, filter: &DocumentFilter, scope: IdScope) -> Result<Vec<String>>;

    /// Fetch the count parts for the logical-count identity.
    ///
    /// `published_ids` holds the normalized forms of the matching draft
    /// identifiers; the store reports how many exist as published documents
    /// matching the filter, alongside the total non-draft count.
    async fn fetch_count_parts(
        &self,
        filter: &DocumentFilter,
        published_ids: &[String],
    ) -> Result<CountParts>;

    /// Fetch one window of raw identifiers in the given offset range,
    /// ordered by the sort spec (store-native order when `None`).
    async fn fetch_window(
        &self,
        filter: &DocumentFilter,
        sort: Option<&SortSpec>,
        offsets: Range<usize>,
    ) -> Result<Vec<OffsetId>>;

    /// Fetch existing revisions for the given raw identifiers with the
    /// requested field selection. Identifiers with no revision are skipped,
    /// not errors.
    async fn fetch_documents(
        &self,
        raw_ids: &[String],
        selection: &FieldSelection,
    ) -> Result<Vec<Document>>;
}

/// Live mutation feed scoped to a document type.
///
/// This trait is only implemented where the backend supports pubsub.
#[async_trait]
pub trait ChangeFeed: Debug + Send + Sync {
    /// Subscribe to mutation events for a document type.
    ///
    /// Dropping the returned receiver also ends delivery; `unsubscribe`
    /// exists for backends that hold per-subscriber server state.
    async fn subscribe(&self, type_name: &str) -> Result<ChangeSubscription>;

    /// Unsubscribe from updates (no-op for stateless implementations)
    async fn unsubscribe(&self, type_name: &str) -> Result<()>;
}
