//! Per-pipeline loading flags.
//!
//! Each asynchronous pipeline toggles its own flag; the composite busy
//! indicator exposed to callers is the logical OR. Flags are plain booleans
//! per pipeline (not a shared set of strings), so clearing is idempotent
//! and one pipeline can never clobber another's state.

/// Which pipeline a flag belongs to.
///
/// `Copy` — small enum, pass by value at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    /// The logical-count resolver.
    Count,
    /// The page-window resolver.
    PageIds,
    /// The result materializer.
    Results,
}

/// Loading state of the three pipelines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadingFlags {
    pub count: bool,
    pub page_ids: bool,
    pub results: bool,
}

impl LoadingFlags {
    /// True iff any pipeline is mid-fetch.
    pub fn is_loading(&self) -> bool {
        self.count || self.page_ids || self.results
    }

    /// Set one pipeline's flag.
    pub fn set(&mut self, pipeline: Pipeline, loading: bool) {
        match pipeline {
            Pipeline::Count => self.count = loading,
            Pipeline::PageIds => self.page_ids = loading,
            Pipeline::Results => self.results = loading,
        }
    }
}
