//! Error types for the `scholar-rag` crate.

use thiserror::Error;

/// Errors that can occur while ingesting, retrieving, or synthesizing.
///
/// Backend failures ([`EmbeddingError`](RagError::EmbeddingError),
/// [`VectorStoreError`](RagError::VectorStoreError),
/// [`LlmError`](RagError::LlmError)) are propagated unmodified along the query
/// path. A query that simply finds nothing confident is never an error.
#[derive(Debug, Error)]
pub enum RagError {
    /// The embedding gateway failed or returned a malformed vector.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector index failed or rejected the request.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The language model failed to produce a completion.
    #[error("Language model error ({provider}): {message}")]
    LlmError {
        /// The model provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The query text cannot be retrieved against (empty or whitespace only).
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A corpus record could not be parsed.
    #[error("Loader error ({path}:{line}): {message}")]
    LoaderError {
        /// The file being read.
        path: String,
        /// 1-based line number of the offending record.
        line: usize,
        /// A description of the failure.
        message: String,
    },

    /// Filesystem failure while reading a corpus or index snapshot.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure for index snapshots.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// An error in ingestion orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

impl RagError {
    /// Whether this error came from an external backend (embedding gateway,
    /// vector index, or language model) rather than from local validation.
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingError { .. } | Self::VectorStoreError { .. } | Self::LlmError { .. }
        )
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
