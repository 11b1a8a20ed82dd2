//! Search Error Types
//!
//! Error handling for the hybrid search core.

use thiserror::Error;

use super::embeddings::EmbeddingError;
use super::vector_store::VectorStoreError;

/// Retrieval path that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalPath {
    Semantic,
    Keyword,
}

impl std::fmt::Display for RetrievalPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrievalPath::Semantic => f.write_str("semantic"),
            RetrievalPath::Keyword => f.write_str("keyword"),
        }
    }
}

/// Search operation errors
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Embedding service unavailable: {0}")]
    EmbeddingUnavailable(#[from] EmbeddingError),

    #[error("Vector store unavailable: {0}")]
    VectorStoreUnavailable(#[from] VectorStoreError),

    #[error("{path} retrieval timed out after {timeout_ms}ms")]
    Timeout { path: RetrievalPath, timeout_ms: u64 },

    #[error("All retrieval paths failed (semantic: {semantic}; keyword: {keyword})")]
    AllRetrievalFailed {
        semantic: Box<SearchError>,
        keyword: Box<SearchError>,
    },

    #[error("Invalid pattern in {table} table '{pattern}': {reason}")]
    InvalidPattern {
        table: &'static str,
        pattern: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SearchError {
    /// True when the error came from an unreachable or slow collaborator
    pub fn is_retrieval_unavailable(&self) -> bool {
        matches!(
            self,
            SearchError::EmbeddingUnavailable(_)
                | SearchError::VectorStoreUnavailable(_)
                | SearchError::Timeout { .. }
                | SearchError::AllRetrievalFailed { .. }
        )
    }
}

/// Result type alias for search operations
pub type Result<T> = std::result::Result<T, SearchError>;
