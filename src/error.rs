//! Error types for cache operations
//!
//! This module defines the error taxonomy for the query-cache library. Store
//! and data source failures propagate unchanged to the caller; nothing here is
//! retried.

use thiserror::Error;

/// Main error type for cache operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// The underlying cache store could not serve a get/set/forget
    #[error("Cache store unavailable: {0}")]
    StoreUnavailable(String),

    /// The data source failed while computing a value on a cache miss
    #[error("Fetch operation failed: {0}")]
    FetchFailed(String),

    /// The data source could not resolve a verb against its operations
    #[error("Malformed verb '{operation}': {reason}")]
    MalformedVerb { operation: String, reason: String },

    /// A flush or filter pattern did not compile
    #[error("Invalid key pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// The global key index record has an unexpected shape
    #[error("Corrupt key index: {0}")]
    CorruptIndex(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

impl CacheError {
    /// Build a `MalformedVerb` error for an operation
    pub fn malformed_verb(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        CacheError::MalformedVerb {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::SerializationError(e.to_string())
    }
}

impl From<String> for CacheError {
    fn from(s: String) -> Self {
        CacheError::Other(s)
    }
}

impl From<&str> for CacheError {
    fn from(s: &str) -> Self {
        CacheError::Other(s.to_string())
    }
}
