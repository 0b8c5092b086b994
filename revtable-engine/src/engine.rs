//! The table engine: a stateful query-orchestration worker plus a cheap
//! cloneable handle.
//!
//! # Architecture
//!
//! The engine owns the query state and runs three asynchronous pipelines
//! over a [`DocumentStore`]: the count resolver, the page resolver, and the
//! result materializer. A change listener folds the store's live mutation
//! feed into the page window with a trailing debounce. Consumers interact
//! through a [`TableHandle`]: reads are lock-guarded snapshots, writes are
//! commands on an unbounded channel serviced by the engine's `run()` loop.
//!
//! Every input change bumps a monotonic generation counter; a pipeline
//! publishes its result only when the generation it started under is still
//! current, so a slow stale fetch can never overwrite fresher state.
//!
//! # Example
//!
//! ```ignore
//! use revtable_engine::{TableConfig, TableEngine};
//!
//! let store = Arc::new(MemoryDocumentStore::new());
//! let engine = TableEngine::new(store, TableConfig::new("post"));
//! let handle = engine.handle();
//! tokio::spawn(engine.run());
//!
//! handle.set_user_query("hello");
//! handle.set_page(2);
//! let rows = handle.results();
//! ```

use crate::loading::{LoadingFlags, Pipeline};
use crate::{count, materialize, page, Result};
use parking_lot::RwLock;
use revtable_core::{
    normalize_id, FieldSelection, LogicalDocument, SearchFilter, SortSpec,
};
use revtable_store::{ChangeEvent, ChangeFeed, ChangeSubscription, DocumentFilter, DocumentStore};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Duration, Instant};
use tracing::{debug, info, warn};

/// Configuration for a table engine.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Document type the table is scoped to.
    pub type_name: String,
    /// Logical documents per page.
    pub page_size: usize,
    /// Output columns.
    pub selected_columns: FieldSelection,
    /// Field paths searched by the free-text filter.
    pub searchable_fields: Vec<String>,
    /// Explicit sort, or `None` for store-native order.
    pub sort: Option<SortSpec>,
    /// Trailing debounce applied to change-feed events.
    pub debounce_ms: u64,
    /// Raw-window oversize factor for the page resolver.
    pub window_multiplier: usize,
}

impl TableConfig {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            page_size: 25,
            selected_columns: FieldSelection::default(),
            searchable_fields: Vec::new(),
            sort: None,
            debounce_ms: 1000,
            window_multiplier: page::DEFAULT_WINDOW_MULTIPLIER,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_columns(mut self, columns: FieldSelection) -> Self {
        self.selected_columns = columns;
        self
    }

    pub fn with_searchable_fields<I, P>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.searchable_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    pub fn with_window_multiplier(mut self, multiplier: usize) -> Self {
        self.window_multiplier = multiplier;
        self
    }
}

/// The engine's full query state. Any change invalidates dependent derived
/// state via the generation counter.
#[derive(Debug, Clone)]
pub struct QueryState {
    pub type_name: String,
    pub user_query: String,
    pub searchable_fields: Vec<String>,
    pub sort: Option<SortSpec>,
    pub selected_columns: FieldSelection,
}

impl QueryState {
    /// The sanitized search filter derived from the current user query.
    pub fn search_filter(&self) -> SearchFilter {
        SearchFilter::new(&self.user_query, self.searchable_fields.iter().cloned())
    }

    /// The store filter for the current type + search.
    pub fn document_filter(&self) -> DocumentFilter {
        DocumentFilter::new(self.type_name.clone(), self.search_filter())
    }
}

/// Shared view state read by handles.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    /// Current page of logical documents, in window order.
    pub results: Vec<LogicalDocument>,
    /// Normalized identifiers on the current page.
    pub page_ids: Vec<String>,
    /// Logical (deduplicated) document count.
    pub total: usize,
    /// Current page index.
    pub page: usize,
    /// Current page size.
    pub page_size: usize,
    /// Per-pipeline loading flags.
    pub loading: LoadingFlags,
    /// Monotonic input generation; pipelines publish only when current.
    generation: u64,
}

impl ViewState {
    /// Total pages at the current count and page size.
    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(self.page_size)
    }
}

/// Input commands serviced by the engine loop.
#[derive(Debug)]
enum Command {
    SetPage(usize),
    SetPageSize(usize),
    SetUserQuery(String),
    SetSort(Option<SortSpec>),
    SetColumns(FieldSelection),
    Refresh,
    Shutdown,
}

/// Cheap cloneable handle onto a running [`TableEngine`].
#[derive(Debug, Clone)]
pub struct TableHandle {
    state: Arc<RwLock<ViewState>>,
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl TableHandle {
    /// Current page of logical documents, in window order.
    pub fn results(&self) -> Vec<LogicalDocument> {
        self.state.read().results.clone()
    }

    /// Normalized identifiers on the current page.
    pub fn page_ids(&self) -> Vec<String> {
        self.state.read().page_ids.clone()
    }

    /// Current page index.
    pub fn page(&self) -> usize {
        self.state.read().page
    }

    /// Total pages at the current logical count and page size.
    pub fn total_pages(&self) -> usize {
        self.state.read().total_pages()
    }

    /// Logical (deduplicated) document count.
    pub fn total(&self) -> usize {
        self.state.read().total
    }

    /// True iff any pipeline is mid-fetch.
    pub fn loading(&self) -> bool {
        self.state.read().loading.is_loading()
    }

    /// A consistent snapshot of the whole view state.
    pub fn snapshot(&self) -> ViewState {
        self.state.read().clone()
    }

    /// Navigate to a page.
    pub fn set_page(&self, page: usize) {
        self.send(Command::SetPage(page));
    }

    /// Change the page size. May trigger a page reset to 0.
    pub fn set_page_size(&self, page_size: usize) {
        self.send(Command::SetPageSize(page_size));
    }

    /// Update the free-text search query (sanitized inside the engine).
    pub fn set_user_query(&self, query: impl Into<String>) {
        self.send(Command::SetUserQuery(query.into()));
    }

    /// Change the sort spec.
    pub fn set_sort(&self, sort: Option<SortSpec>) {
        self.send(Command::SetSort(sort));
    }

    /// Change the selected output columns.
    pub fn set_columns(&self, columns: FieldSelection) {
        self.send(Command::SetColumns(columns));
    }

    /// Force full re-resolution without changing any filter value.
    pub fn refresh(&self) {
        self.send(Command::Refresh);
    }

    /// Stop the engine loop.
    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    fn send(&self, cmd: Command) {
        // Send only fails after the engine stopped; commands are then moot.
        let _ = self.cmd_tx.send(cmd);
    }
}

/// Draft/published reconciliation and pagination engine.
pub struct TableEngine<S> {
    store: Arc<S>,
    query: QueryState,
    debounce: Duration,
    window_multiplier: usize,
    state: Arc<RwLock<ViewState>>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
}

impl<S> TableEngine<S>
where
    S: DocumentStore + ChangeFeed,
{
    /// Create an engine over a store with the given configuration.
    pub fn new(store: Arc<S>, config: TableConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let state = Arc::new(RwLock::new(ViewState {
            page_size: config.page_size,
            ..ViewState::default()
        }));
        Self {
            store,
            query: QueryState {
                type_name: config.type_name,
                user_query: String::new(),
                searchable_fields: config.searchable_fields,
                sort: config.sort,
                selected_columns: config.selected_columns,
            },
            debounce: Duration::from_millis(config.debounce_ms),
            window_multiplier: config.window_multiplier,
            state,
            cmd_tx,
            cmd_rx,
        }
    }

    /// Get a handle to interact with the engine.
    pub fn handle(&self) -> TableHandle {
        TableHandle {
            state: self.state.clone(),
            cmd_tx: self.cmd_tx.clone(),
        }
    }

    /// Run the engine loop.
    ///
    /// Resolves the initial view, then services input commands and
    /// change-feed events until [`TableHandle::shutdown`] is called. Change
    /// events are coalesced with a trailing debounce into a single
    /// re-materialization. Change-feed failures after startup are logged
    /// and never stop the loop; the subscription is reopened on the next
    /// command or timer tick.
    pub async fn run(mut self) -> Result<()> {
        info!(type_name = %self.query.type_name, "starting table engine");

        let mut subscription = Some(self.store.subscribe(&self.query.type_name).await?);
        self.resolve_all().await;

        // Trailing debounce deadline; reset on every incoming event.
        let mut flush_at: Option<Instant> = None;

        loop {
            let sleep_until = flush_at.unwrap_or_else(|| Instant::now() + Duration::from_secs(60));
            let sleep_fut = time::sleep_until(sleep_until);
            tokio::pin!(sleep_fut);

            tokio::select! {
                biased;

                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        None | Some(Command::Shutdown) => break,
                        Some(cmd) => {
                            if subscription.is_none() {
                                subscription = self.try_resubscribe().await;
                            }
                            self.apply(cmd).await;
                        }
                    }
                }

                event = recv_event(&mut subscription) => {
                    match event {
                        Ok(event) => {
                            self.note_change(&event.document_id);
                            flush_at = Some(Instant::now() + self.debounce);
                        }
                        Err(e) => {
                            // Lagged or closed; events were missed either way.
                            warn!(error = %e, "change feed error, resubscribing");
                            let _ = subscription.take();
                            subscription = self.try_resubscribe().await;
                            // One debounced rematerialization catches up on
                            // whatever the channel dropped.
                            flush_at = Some(Instant::now() + self.debounce);
                        }
                    }
                }

                _ = &mut sleep_fut => {
                    if subscription.is_none() {
                        subscription = self.try_resubscribe().await;
                    }
                    if flush_at.is_some() {
                        flush_at = None;
                        self.materialize_current().await;
                    }
                }
            }
        }

        if let Err(e) = self.store.unsubscribe(&self.query.type_name).await {
            warn!(error = %e, "change feed unsubscribe failed");
        }
        info!(type_name = %self.query.type_name, "table engine stopped");
        Ok(())
    }

    /// Tear down a dead subscription and try to open a fresh one.
    ///
    /// Returns `None` when the store refuses; the run loop keeps servicing
    /// commands without live events and retries on the next command or
    /// timer tick.
    async fn try_resubscribe(&self) -> Option<ChangeSubscription> {
        if let Err(e) = self.store.unsubscribe(&self.query.type_name).await {
            warn!(error = %e, "change feed unsubscribe failed");
        }
        match self.store.subscribe(&self.query.type_name).await {
            Ok(sub) => {
                debug!(type_name = %self.query.type_name, "change feed resubscribed");
                Some(sub)
            }
            Err(e) => {
                warn!(error = %e, "change feed resubscribe failed, continuing without live events");
                None
            }
        }
    }

    /// Apply one input command, invalidating downstream state.
    async fn apply(&mut self, cmd: Command) {
        debug!(?cmd, "applying table command");
        self.bump_generation();
        match cmd {
            Command::SetPage(page) => {
                self.state.write().page = page;
                self.resolve_page_and_results().await;
                if self.check_page_reset() {
                    self.resolve_page_and_results().await;
                }
            }
            Command::SetPageSize(page_size) => {
                self.state.write().page_size = page_size;
                // The page pipeline runs either way; the reset only moves
                // the index before it does.
                self.check_page_reset();
                self.resolve_page_and_results().await;
            }
            Command::SetUserQuery(query) => {
                self.query.user_query = query;
                self.resolve_all().await;
            }
            Command::SetSort(sort) => {
                self.query.sort = sort;
                self.resolve_page_and_results().await;
            }
            Command::SetColumns(columns) => {
                self.query.selected_columns = columns;
                self.materialize_current().await;
            }
            Command::Refresh => {
                self.resolve_all().await;
            }
            Command::Shutdown => unreachable!("handled by the run loop"),
        }
    }

    /// Run the count pipeline and the page/result pipeline; they share the
    /// input change but are otherwise independent.
    async fn resolve_all(&self) {
        futures::join!(self.resolve_count(), self.resolve_page_and_results());
        if self.check_page_reset() {
            self.resolve_page_and_results().await;
        }
    }

    /// Count pipeline: resolve the logical document count.
    async fn resolve_count(&self) {
        let generation = self.begin(Pipeline::Count);
        let filter = self.query.document_filter();

        let outcome = count::logical_count(self.store.as_ref(), &filter).await;

        let mut state = self.state.write();
        state.loading.set(Pipeline::Count, false);
        match outcome {
            Ok(total) if state.generation == generation => state.total = total,
            Ok(total) => debug!(total, "discarding stale count"),
            // Stale-on-error: keep the last good total.
            Err(e) => warn!(error = %e, "count fetch failed, keeping last total"),
        }
    }

    /// Page pipeline: resolve the page window, then materialize it.
    async fn resolve_page_and_results(&self) {
        let generation = self.begin(Pipeline::PageIds);
        let filter = self.query.document_filter();
        let (target_page, page_size) = {
            let state = self.state.read();
            (state.page, state.page_size)
        };

        let outcome = page::resolve_page(
            self.store.as_ref(),
            &filter,
            self.query.sort.as_ref(),
            target_page,
            page_size,
            self.window_multiplier,
        )
        .await;

        let fresh = {
            let mut state = self.state.write();
            state.loading.set(Pipeline::PageIds, false);
            match outcome {
                Ok(ids) if state.generation == generation => {
                    state.page_ids = ids;
                    true
                }
                Ok(_) => {
                    debug!("discarding stale page window");
                    false
                }
                // Stale-on-error: keep the last good window.
                Err(e) => {
                    warn!(error = %e, "page window fetch failed, keeping last window");
                    false
                }
            }
        };

        if fresh {
            self.materialize_current().await;
        }
    }

    /// Result pipeline: materialize the current page window.
    async fn materialize_current(&self) {
        let generation = self.begin(Pipeline::Results);
        let page_ids = self.state.read().page_ids.clone();

        let outcome = materialize::materialize(
            self.store.as_ref(),
            &page_ids,
            &self.query.selected_columns,
        )
        .await;

        let mut state = self.state.write();
        state.loading.set(Pipeline::Results, false);
        match outcome {
            Ok(results) if state.generation == generation => state.results = results,
            Ok(_) => debug!("discarding stale results"),
            // Stale-on-error: keep the last good result set.
            Err(e) => warn!(error = %e, "result fetch failed, keeping last results"),
        }
    }

    /// Fold one change-feed event into the page window. A new logical
    /// document matching the scope is optimistically appended so the next
    /// materialization shows it.
    fn note_change(&self, document_id: &str) {
        let normalized = normalize_id(document_id).to_string();
        let mut state = self.state.write();
        if !state.page_ids.contains(&normalized) {
            debug!(id = %normalized, "change event adds id to page window");
            state.page_ids.push(normalized);
        }
        // Results are about to be refetched once the debounce elapses.
        state.loading.set(Pipeline::Results, true);
    }

    /// Self-healing page reset: a shrunken result set (page size or filter
    /// change) can leave the page index past the end.
    fn check_page_reset(&self) -> bool {
        let mut state = self.state.write();
        let total_pages = state.total_pages();
        if state.page != 0 && state.page >= total_pages {
            debug!(page = state.page, total_pages, "resetting page to 0");
            state.page = 0;
            true
        } else {
            false
        }
    }

    fn begin(&self, pipeline: Pipeline) -> u64 {
        let mut state = self.state.write();
        state.loading.set(pipeline, true);
        state.generation
    }

    fn bump_generation(&self) {
        self.state.write().generation += 1;
    }
}

/// Receive the next change event, pending forever while no subscription is
/// live (commands and the flush timer still drive the loop).
async fn recv_event(
    subscription: &mut Option<ChangeSubscription>,
) -> std::result::Result<ChangeEvent, broadcast::error::RecvError> {
    match subscription {
        Some(sub) => sub.receiver.recv().await,
        None => std::future::pending().await,
    }
}
