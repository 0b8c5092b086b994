//! Error types for the store crate

use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in document store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Document not found
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Query execution failed
    #[error("Query error: {0}")]
    Query(String),

    /// Subscription setup or delivery failed
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Create a not found error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    /// Create a query error
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Create a subscription error
    pub fn subscription(msg: impl Into<String>) -> Self {
        Self::Subscription(msg.into())
    }
}
