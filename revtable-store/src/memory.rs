//! In-memory document store implementation for testing
//!
//! Stores revisions in a `HashMap` behind `Arc<RwLock>` for interior
//! mutability, making it thread-safe and suitable for multi-threaded async
//! runtimes. Mutations emit [`ChangeEvent`]s on a per-type broadcast
//! channel so the engine's change listener can be exercised end to end.

use crate::{
    ChangeEvent, ChangeFeed, ChangeSubscription, CountParts, DocumentFilter, DocumentStore,
    IdScope, OffsetId, Result, StoreError,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use revtable_core::{Document, FieldSelection, SortDirection, SortSpec};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Debug;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// In-memory document store for testing
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    /// Revisions keyed by raw identifier (bare or `drafts.`-prefixed).
    docs: Arc<RwLock<HashMap<String, Document>>>,
    /// Per-type event senders, created lazily on first subscribe or emit.
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<ChangeEvent>>>>,
    /// When set, every fetch fails. Lets tests exercise the engine's
    /// stale-on-error policy.
    failing: Arc<AtomicBool>,
}

impl Debug for MemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDocumentStore")
            .field("doc_count", &self.docs.read().len())
            .field("subscribed_types", &self.channels.read().len())
            .finish()
    }
}

impl MemoryDocumentStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a revision, emitting a change event for its type.
    pub fn put(&self, doc: Document) {
        let type_name = doc.type_name.clone();
        let id = doc.id.clone();
        self.docs.write().insert(id.clone(), doc);
        self.emit(&type_name, id);
    }

    /// Remove a revision by raw identifier, emitting a change event.
    pub fn remove(&self, raw_id: &str) -> Option<Document> {
        let removed = self.docs.write().remove(raw_id);
        if let Some(doc) = &removed {
            self.emit(&doc.type_name, raw_id.to_string());
        }
        removed
    }

    /// Get a revision by raw identifier.
    pub fn get(&self, raw_id: &str) -> Option<Document> {
        self.docs.read().get(raw_id).cloned()
    }

    /// Number of stored revisions (drafts and published counted separately).
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    /// Make every subsequent fetch and subscription fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, AtomicOrdering::SeqCst);
    }

    fn check_failing(&self) -> Result<()> {
        if self.failing.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::query("injected fetch failure"));
        }
        Ok(())
    }

    fn emit(&self, type_name: &str, document_id: String) {
        let channels = self.channels.read();
        if let Some(tx) = channels.get(type_name) {
            // Send only fails when no receiver is alive; that is fine.
            let _ = tx.send(ChangeEvent { document_id });
        }
    }

    /// Matching revisions in stable (id-ordered) raw order.
    fn matching(&self, filter: &DocumentFilter) -> Vec<Document> {
        let docs = self.docs.read();
        let mut matched: Vec<Document> = docs
            .values()
            .filter(|d| d.type_name == filter.type_name && search_matches(&filter.search, d))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.id.cmp(&b.id));
        matched
    }
}

/// Case-insensitive substring match of the search term over the filter's
/// field paths. Only string values participate, mirroring text-match
/// semantics of the query languages this store stands in for.
fn search_matches(search: &revtable_core::SearchFilter, doc: &Document) -> bool {
    if search.is_match_all() {
        return true;
    }
    let needle = search.term().to_lowercase();
    search.fields().iter().any(|path| {
        lookup_path(doc, path)
            .and_then(Value::as_str)
            .map(|s| s.to_lowercase().contains(&needle))
            .unwrap_or(false)
    })
}

/// Resolve a dotted field path against a revision's field bag.
///
/// A path stored flat under its dotted name (pre-shaped fields) takes
/// precedence over nested traversal.
fn lookup_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    if let Some(v) = doc.fields.get(path) {
        return Some(v);
    }
    let mut segments = path.split('.');
    let mut current = doc.fields.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Total order over optional JSON values for window sorting.
///
/// Missing values sort first; present values order by type rank
/// (null < bool < number < string < array < object) and then by value.
fn cmp_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => {
            let (ra, rb) = (type_rank(a), type_rank(b));
            if ra != rb {
                return ra.cmp(&rb);
            }
            match (a, b) {
                (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
                (Value::Number(x), Value::Number(y)) => x
                    .as_f64()
                    .partial_cmp(&y.as_f64())
                    .unwrap_or(Ordering::Equal),
                (Value::String(x), Value::String(y)) => x.cmp(y),
                _ => Ordering::Equal,
            }
        }
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Sort key lookup for a revision, honoring the `_updatedAt` meta path.
fn sort_value<'a>(doc: &'a Document, path: &str) -> Option<Value> {
    if path == revtable_core::FIELD_UPDATED_AT {
        return doc.updated_at.map(|at| Value::String(at.to_rfc3339()));
    }
    lookup_path(doc, path).cloned()
}

/// Project a revision down to the selected field paths, shaping dotted
/// paths flat under their dotted name.
fn project(doc: &Document, selection: &FieldSelection) -> Document {
    let mut projected = Document::new(doc.id.clone(), doc.type_name.clone());
    projected.updated_at = doc.updated_at;
    for path in selection.iter() {
        if let Some(value) = lookup_path(doc, path) {
            projected.fields.insert(path.to_string(), value.clone());
        }
    }
    projected
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn fetch_ids(&self, filter: &DocumentFilter, scope: IdScope) -> Result<Vec<String>> {
        self.check_failing()?;
        let ids = self
            .matching(filter)
            .into_iter()
            .filter(|d| match scope {
                IdScope::All => true,
                IdScope::DraftsOnly => d.is_draft(),
            })
            .map(|d| d.id)
            .collect();
        Ok(ids)
    }

    async fn fetch_count_parts(
        &self,
        filter: &DocumentFilter,
        published_ids: &[String],
    ) -> Result<CountParts> {
        self.check_failing()?;
        let matched = self.matching(filter);
        let drafts_with_published = published_ids
            .iter()
            .filter(|id| matched.iter().any(|d| &d.id == *id))
            .count();
        let not_draft = matched.iter().filter(|d| !d.is_draft()).count();
        Ok(CountParts {
            drafts_with_published,
            not_draft,
        })
    }

    async fn fetch_window(
        &self,
        filter: &DocumentFilter,
        sort: Option<&SortSpec>,
        offsets: Range<usize>,
    ) -> Result<Vec<OffsetId>> {
        self.check_failing()?;
        let mut matched = self.matching(filter);
        if let Some(spec) = sort {
            let path = spec.order_path();
            matched.sort_by(|a, b| {
                let ord = cmp_values(sort_value(a, &path).as_ref(), sort_value(b, &path).as_ref())
                    .then_with(|| a.id.cmp(&b.id));
                match spec.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }

        debug!(
            type_name = %filter.type_name,
            start = offsets.start,
            end = offsets.end,
            matched = matched.len(),
            "memory store window fetch"
        );

        Ok(matched
            .into_iter()
            .enumerate()
            .skip(offsets.start)
            .take(offsets.end.saturating_sub(offsets.start))
            .map(|(offset, doc)| OffsetId { id: doc.id, offset })
            .collect())
    }

    async fn fetch_documents(
        &self,
        raw_ids: &[String],
        selection: &FieldSelection,
    ) -> Result<Vec<Document>> {
        self.check_failing()?;
        let docs = self.docs.read();
        Ok(raw_ids
            .iter()
            .filter_map(|id| docs.get(id))
            .map(|doc| project(doc, selection))
            .collect())
    }
}

#[async_trait]
impl ChangeFeed for MemoryDocumentStore {
    async fn subscribe(&self, type_name: &str) -> Result<ChangeSubscription> {
        if self.failing.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::subscription("injected subscription failure"));
        }
        let mut channels = self.channels.write();
        let tx = channels.entry(type_name.to_string()).or_insert_with(|| {
            // Small buffer; consumers should treat this as best-effort.
            let (tx, _rx) = broadcast::channel(128);
            tx
        });
        Ok(ChangeSubscription {
            type_name: type_name.to_string(),
            receiver: tx.subscribe(),
        })
    }

    async fn unsubscribe(&self, _type_name: &str) -> Result<()> {
        // Receivers unsubscribe by dropping; nothing server-side to tear down.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revtable_core::{FieldType, SearchFilter};
    use serde_json::json;

    fn store_with(docs: Vec<Document>) -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new();
        for doc in docs {
            store.put(doc);
        }
        store
    }

    fn post(id: &str, title: &str) -> Document {
        Document::new(id, "post").with_field("title", json!(title))
    }

    #[tokio::test]
    async fn fetch_ids_scopes_drafts() {
        let store = store_with(vec![post("a", "A"), post("drafts.a", "A2"), post("b", "B")]);
        let filter = DocumentFilter::for_type("post");

        let all = store.fetch_ids(&filter, IdScope::All).await.unwrap();
        assert_eq!(all, ["a", "b", "drafts.a"]);

        let drafts = store.fetch_ids(&filter, IdScope::DraftsOnly).await.unwrap();
        assert_eq!(drafts, ["drafts.a"]);
    }

    #[tokio::test]
    async fn fetch_ids_respects_type() {
        let store = store_with(vec![post("a", "A"), Document::new("x", "page")]);
        let filter = DocumentFilter::for_type("page");
        let ids = store.fetch_ids(&filter, IdScope::All).await.unwrap();
        assert_eq!(ids, ["x"]);
    }

    #[tokio::test]
    async fn search_matches_case_insensitive_substring() {
        let store = store_with(vec![post("a", "Hello World"), post("b", "Other")]);
        let filter = DocumentFilter::new("post", SearchFilter::new("hello", ["title"]));
        let ids = store.fetch_ids(&filter, IdScope::All).await.unwrap();
        assert_eq!(ids, ["a"]);
    }

    #[tokio::test]
    async fn search_resolves_dotted_paths() {
        let store = store_with(vec![
            post("a", "A").with_field("seo", json!({"title": "findme"})),
            post("b", "B"),
        ]);
        let filter = DocumentFilter::new("post", SearchFilter::new("findme", ["seo.title"]));
        let ids = store.fetch_ids(&filter, IdScope::All).await.unwrap();
        assert_eq!(ids, ["a"]);
    }

    #[tokio::test]
    async fn count_parts_identity_inputs() {
        // a: both, b: draft only, c: published only
        let store = store_with(vec![
            post("a", "A"),
            post("drafts.a", "A2"),
            post("drafts.b", "B"),
            post("c", "C"),
        ]);
        let filter = DocumentFilter::for_type("post");
        let parts = store
            .fetch_count_parts(&filter, &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(parts.drafts_with_published, 1);
        assert_eq!(parts.not_draft, 2);
    }

    #[tokio::test]
    async fn window_orders_and_offsets() {
        let store = store_with(vec![post("a", "cherry"), post("b", "apple"), post("c", "banana")]);
        let filter = DocumentFilter::for_type("post");
        let sort = SortSpec::asc("title", FieldType::String);

        let window = store
            .fetch_window(&filter, Some(&sort), 0..2)
            .await
            .unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0], OffsetId { id: "b".into(), offset: 0 });
        assert_eq!(window[1], OffsetId { id: "c".into(), offset: 1 });

        let rest = store
            .fetch_window(&filter, Some(&sort), 2..10)
            .await
            .unwrap();
        assert_eq!(rest, [OffsetId { id: "a".into(), offset: 2 }]);
    }

    #[tokio::test]
    async fn window_descends_and_ties_break_by_id() {
        let store = store_with(vec![post("a", "same"), post("b", "same")]);
        let filter = DocumentFilter::for_type("post");
        let sort = SortSpec::desc("title", FieldType::String);
        let window = store.fetch_window(&filter, Some(&sort), 0..10).await.unwrap();
        let ids: Vec<&str> = window.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[tokio::test]
    async fn fetch_documents_projects_selection() {
        let store = store_with(vec![post("a", "A")
            .with_field("body", json!("long"))
            .with_field("seo", json!({"title": "s"}))]);
        let selection = FieldSelection::new(["title", "seo.title"]);
        let docs = store
            .fetch_documents(&["a".to_string(), "drafts.a".to_string()], &selection)
            .await
            .unwrap();
        assert_eq!(docs.len(), 1, "missing revisions are skipped");
        assert_eq!(docs[0].fields.get("title"), Some(&json!("A")));
        assert_eq!(docs[0].fields.get("seo.title"), Some(&json!("s")));
        assert!(docs[0].fields.get("body").is_none());
    }

    #[tokio::test]
    async fn put_emits_change_event_to_subscribers() {
        let store = MemoryDocumentStore::new();
        let mut sub = store.subscribe("post").await.unwrap();
        store.put(post("a", "A"));
        let event = sub.receiver.recv().await.unwrap();
        assert_eq!(event.document_id, "a");
    }

    #[tokio::test]
    async fn events_are_scoped_by_type() {
        let store = MemoryDocumentStore::new();
        let mut sub = store.subscribe("post").await.unwrap();
        store.put(Document::new("x", "page"));
        store.put(post("a", "A"));
        let event = sub.receiver.recv().await.unwrap();
        assert_eq!(event.document_id, "a");
    }

    #[tokio::test]
    async fn injected_failures_surface_as_query_errors() {
        let store = store_with(vec![post("a", "A")]);
        store.set_failing(true);
        let filter = DocumentFilter::for_type("post");
        let err = store.fetch_ids(&filter, IdScope::All).await.unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
        store.set_failing(false);
        assert!(store.fetch_ids(&filter, IdScope::All).await.is_ok());
    }

    #[tokio::test]
    async fn injected_failures_cover_subscriptions() {
        let store = MemoryDocumentStore::new();
        store.set_failing(true);
        let err = store.subscribe("post").await.unwrap_err();
        assert!(matches!(err, StoreError::Subscription(_)));
        store.set_failing(false);
        assert!(store.subscribe("post").await.is_ok());
    }
}
