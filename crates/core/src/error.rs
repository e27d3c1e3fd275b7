//! Error types for the query core
//!
//! External-service failures are transient and retried with backoff by the
//! component that owns the call. `DimensionMismatch` is fatal and surfaced.

use std::time::Duration;
use thiserror::Error;

/// Result alias used across the workspace
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Embedding dimension mismatch: index has {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Generation service unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("Classification service unavailable: {0}")]
    ClassificationUnavailable(String),

    #[error("Corrupted cache entry for key '{key}': {message}")]
    CacheCorruption { key: String, message: String },

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Whether a retry may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::EmbeddingUnavailable(_)
                | Error::GenerationUnavailable(_)
                | Error::ClassificationUnavailable(_)
                | Error::Timeout(_)
        )
    }

    /// Whether the error must be surfaced to the caller instead of degraded
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::DimensionMismatch { .. } | Error::Index(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(Error::EmbeddingUnavailable("down".into()).is_transient());
        assert!(Error::Timeout(Duration::from_secs(1)).is_transient());
        assert!(!Error::DimensionMismatch { expected: 3, actual: 2 }.is_transient());
        assert!(Error::DimensionMismatch { expected: 3, actual: 2 }.is_fatal());
        assert!(!Error::CacheCorruption {
            key: "k".into(),
            message: "bad".into()
        }
        .is_fatal());
    }

    #[test]
    fn test_display() {
        let err = Error::DimensionMismatch {
            expected: 1536,
            actual: 384,
        };
        assert_eq!(
            err.to_string(),
            "Embedding dimension mismatch: index has 1536, query has 384"
        );
    }
}
