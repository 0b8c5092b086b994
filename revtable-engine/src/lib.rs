//! # revtable-engine
//!
//! Draft/published reconciliation and pagination engine over an abstract
//! document store. Four cooperating responsibilities:
//!
//! - [`count`] — the count resolver: logical (deduplicated) document counts
//! - [`page`] — the page resolver: stable page windows despite draft
//!   deduplication, via oversized raw windows and bounded advancement
//! - [`materialize`] — the result materializer: merges draft/published
//!   pairs into [`LogicalDocument`](revtable_core::LogicalDocument) rows in
//!   window order
//! - [`engine`] — the [`TableEngine`] run loop tying the pipelines to input
//!   commands and the store's change feed (with trailing debounce)
//!
//! Failures in any pipeline are logged and swallowed; consumers always see
//! the last good state. Every input change bumps a generation counter so
//! stale in-flight responses are discarded rather than published.

pub mod count;
pub mod engine;
mod error;
pub mod loading;
pub mod materialize;
pub mod page;

pub use engine::{QueryState, TableConfig, TableEngine, TableHandle, ViewState};
pub use error::{EngineError, Result};
pub use loading::{LoadingFlags, Pipeline};
pub use page::DEFAULT_WINDOW_MULTIPLIER;
