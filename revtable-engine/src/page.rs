//! Page resolver: stable page windows over deduplicated documents.
//!
//! Store offsets are computed over raw (non-deduplicated) revisions, but
//! page boundaries are defined over logical documents. The resolver fetches
//! oversized raw windows, drops published identifiers shadowed by a draft,
//! and advances window by window until the target page is reached.
//!
//! The oversize factor assumes duplicate (draft+published pair) density per
//! window stays under `1 - 1/multiplier` (50% at the default multiplier of
//! 2). Corpora with a higher duplicate ratio need a larger
//! [`window multiplier`](crate::TableConfig::window_multiplier).

use crate::Result;
use revtable_core::{is_draft_id, normalize_id, SortSpec};
use revtable_store::{DocumentFilter, DocumentStore, IdScope, OffsetId};
use std::collections::HashSet;
use tracing::debug;

/// Default raw-window oversize factor.
pub const DEFAULT_WINDOW_MULTIPLIER: usize = 2;

/// Accumulator for one window hop.
#[derive(Debug, Clone, Default)]
pub struct WindowScan {
    /// Identifiers surviving duplicate removal, truncated to the page size.
    pub matched: Vec<OffsetId>,
    /// Raw offset at which the next window starts.
    pub next_offset: usize,
}

/// Resolve the ordered normalized identifiers on `target_page`.
///
/// Returns an empty window when the raw results are exhausted before the
/// target page. The loop is bounded: it advances exactly one page per
/// iteration, so it runs at most `target_page + 1` window fetches.
pub async fn resolve_page<S>(
    store: &S,
    filter: &DocumentFilter,
    sort: Option<&SortSpec>,
    target_page: usize,
    page_size: usize,
    window_multiplier: usize,
) -> Result<Vec<String>>
where
    S: DocumentStore + ?Sized,
{
    if page_size == 0 {
        return Ok(Vec::new());
    }

    // Normalized ids of every matching draft. A published identifier whose
    // normalized form appears here is shadowed: the draft revision wins and
    // occupies the logical slot.
    let draft_ids = store.fetch_ids(filter, IdScope::DraftsOnly).await?;
    let draft_set: HashSet<String> = draft_ids
        .iter()
        .map(|id| normalize_id(id).to_string())
        .collect();

    let window = page_size * window_multiplier.max(1);
    let mut scan = WindowScan::default();

    for page_no in 0..=target_page {
        let raw = store
            .fetch_window(filter, sort, scan.next_offset..scan.next_offset + window)
            .await?;

        scan.matched = raw
            .into_iter()
            .filter(|entry| {
                is_draft_id(&entry.id) || !draft_set.contains(normalize_id(&entry.id))
            })
            .take(page_size)
            .collect();

        if page_no == target_page {
            debug!(
                type_name = %filter.type_name,
                page = page_no,
                window_len = scan.matched.len(),
                "resolved page window"
            );
            return Ok(scan
                .matched
                .iter()
                .map(|entry| normalize_id(&entry.id).to_string())
                .collect());
        }

        // Raw results exhausted before reaching the target page.
        let Some(last) = scan.matched.last() else {
            return Ok(Vec::new());
        };
        scan.next_offset = last.offset + 1;
    }

    Ok(Vec::new())
}
