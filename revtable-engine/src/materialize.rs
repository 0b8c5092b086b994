//! Result materializer: merge draft/published pairs into logical rows.

use crate::Result;
use revtable_core::{
    draft_id, normalize_id, DocStatus, Document, FieldSelection, LogicalDocument,
};
use revtable_store::DocumentStore;
use std::collections::HashMap;
use tracing::debug;

/// Materialize the logical documents for a page window.
///
/// Expands each normalized identifier into both raw forms, fetches whatever
/// revisions exist, reduces each draft/published pair into a single row
/// (draft field values win; status records coexistence), and restores the
/// window's original order regardless of store response order.
///
/// `last_published_at` is always the update timestamp of the published
/// revision when one exists; a draft's own timestamp is never used.
pub async fn materialize<S>(
    store: &S,
    page_ids: &[String],
    selection: &FieldSelection,
) -> Result<Vec<LogicalDocument>>
where
    S: DocumentStore + ?Sized,
{
    if page_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut raw_ids = Vec::with_capacity(page_ids.len() * 2);
    for id in page_ids {
        raw_ids.push(id.clone());
        raw_ids.push(draft_id(id));
    }

    // _updatedAt rides along when the last-published column is selected.
    let effective = selection.effective();
    let revisions = store.fetch_documents(&raw_ids, &effective).await?;

    let rows = reduce(revisions);
    debug!(
        requested = page_ids.len(),
        materialized = rows.len(),
        "materialized page results"
    );
    Ok(restore_order(rows, page_ids))
}

/// Reduce raw revisions into one entry per normalized identifier.
fn reduce(revisions: Vec<Document>) -> Vec<LogicalDocument> {
    let mut slots: HashMap<String, LogicalDocument> = HashMap::new();

    for doc in revisions {
        let normalized = normalize_id(&doc.id).to_string();
        match slots.get_mut(&normalized) {
            None => {
                slots.insert(normalized, LogicalDocument::from_revision(doc));
            }
            Some(slot) => {
                // Second revision of the same logical document: both forms
                // exist, the draft's field values win either way.
                slot.status = DocStatus::PublishedWithPendingChanges;
                if doc.is_draft() {
                    slot.raw_id = doc.id;
                    slot.type_name = doc.type_name;
                    slot.fields = doc.fields;
                } else {
                    slot.last_published_at = doc.updated_at;
                }
            }
        }
    }

    slots.into_values().collect()
}

/// Sort rows back into the order of the input identifier window.
fn restore_order(mut rows: Vec<LogicalDocument>, page_ids: &[String]) -> Vec<LogicalDocument> {
    let index: HashMap<&str, usize> = page_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    rows.retain(|row| index.contains_key(row.normalized_id.as_str()));
    rows.sort_by_key(|row| index[row.normalized_id.as_str()]);
    rows
}
