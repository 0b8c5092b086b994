//! Error types for the engine crate

use revtable_store::StoreError;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in engine operations
///
/// Transient fetch failures never cross the handle boundary (pipelines log
/// and keep last-good state); this type covers the engine's own lifecycle
/// failures, chiefly subscription setup.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
