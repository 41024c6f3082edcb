//! Vector index traits: a narrow search capability used by retrieval, and a
//! wider store capability used by ingestion.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{Chunk, RetrievedCandidate};
use crate::error::{RagError, Result};

/// Backend-defined search strategy selector.
///
/// Backends reject modes they do not implement with
/// [`RagError::VectorStoreError`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// Dense vector similarity.
    #[default]
    Default,
    /// Sparse (lexical) retrieval.
    Sparse,
    /// Dense and sparse combined.
    Hybrid,
}

impl QueryMode {
    /// The lowercase wire name of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Sparse => "sparse",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryMode {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "sparse" => Ok(Self::Sparse),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(RagError::ConfigError(format!("unknown query mode '{other}'"))),
        }
    }
}

/// Read-only similarity search over a vector index.
///
/// This is all the retrieval core needs from a backend.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Return up to `top_k` chunks nearest to `embedding`.
    ///
    /// Results are expected in descending similarity order; higher scores
    /// mean more similar. A hit without a score carries `similarity: None`.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
        mode: QueryMode,
    ) -> Result<Vec<RetrievedCandidate>>;

    /// Number of chunks stored in `collection`. A missing collection counts as empty.
    async fn count(&self, collection: &str) -> Result<usize>;
}

/// A writable vector index: collection management and chunk upserts.
///
/// # Example
///
/// ```rust,ignore
/// use scholar_rag::{InMemoryVectorStore, VectorSearch, VectorStore, QueryMode};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("arxiv", 384).await?;
/// store.upsert("arxiv", &chunks).await?;
/// let hits = store.search("arxiv", &query_embedding, 20, QueryMode::Default).await?;
/// ```
#[async_trait]
pub trait VectorStore: VectorSearch {
    /// Create a named collection. No-op if it already exists.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a named collection and all its data.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Upsert chunks into a collection. Chunks must have embeddings set.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Delete chunks by their IDs from a collection.
    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()>;
}
