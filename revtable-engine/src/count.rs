//! Count resolver: logical (deduplicated) document counts.

use crate::Result;
use revtable_core::normalize_id;
use revtable_store::{DocumentFilter, DocumentStore, IdScope};
use tracing::debug;

/// Count the logical documents matching a filter.
///
/// Fetches all draft identifiers, then asks the store how many of their
/// published forms also match (draft/published pairs) and how many matching
/// documents are not drafts at all. The logical count is then
///
/// ```text
/// draft_count - drafts_with_published + not_draft
/// ```
///
/// which counts each draft/published pair exactly once.
pub async fn logical_count<S>(store: &S, filter: &DocumentFilter) -> Result<usize>
where
    S: DocumentStore + ?Sized,
{
    let draft_ids = store.fetch_ids(filter, IdScope::DraftsOnly).await?;
    let published_ids: Vec<String> = draft_ids
        .iter()
        .map(|id| normalize_id(id).to_string())
        .collect();

    let parts = store.fetch_count_parts(filter, &published_ids).await?;

    let total = draft_ids
        .len()
        .saturating_sub(parts.drafts_with_published)
        + parts.not_draft;

    debug!(
        type_name = %filter.type_name,
        draft_count = draft_ids.len(),
        drafts_with_published = parts.drafts_with_published,
        not_draft = parts.not_draft,
        total,
        "resolved logical count"
    );

    Ok(total)
}
