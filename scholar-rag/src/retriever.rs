//! Chunk retriever: over-fetch chunk hits, collapse them to one per document.
//!
//! The index is asked for `node_top_k` chunk-level matches. Because several
//! chunks can belong to the same paper, the hits are then walked in order and
//! only the first chunk seen for each source is kept, until `document_top_k`
//! distinct documents have been selected. Documents ranked outside the
//! over-fetch window are not visible to the call.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::config::{RetrievalConfig, validate_top_k};
use crate::document::RetrievedCandidate;
use crate::embedding::{EmbeddingProvider, check_dimensions};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorSearch;

/// Anything that can turn a query into an ordered, source-deduplicated
/// candidate list.
///
/// Implemented by [`ChunkRetriever`] and [`HydeRetriever`](crate::hyde::HydeRetriever).
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieve at most one candidate per source document.
    ///
    /// # Errors
    ///
    /// Backend failures propagate as [`RagError::EmbeddingError`],
    /// [`RagError::VectorStoreError`], or [`RagError::LlmError`]; they are never
    /// turned into an empty result.
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedCandidate>>;
}

/// Vector-similarity retriever with per-source deduplication.
///
/// # Example
///
/// ```rust,ignore
/// use scholar_rag::{ChunkRetriever, RetrievalConfig, Retriever};
///
/// let retriever = ChunkRetriever::new(embedder, index, "arxiv", RetrievalConfig::default())?;
/// let candidates = retriever.retrieve("Hubbard model quasiparticles").await?;
/// ```
pub struct ChunkRetriever {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorSearch>,
    collection: String,
    config: RetrievalConfig,
}

impl ChunkRetriever {
    /// Create a retriever over `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `config` does not validate.
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorSearch>,
        collection: impl Into<String>,
        config: RetrievalConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self { embedding_provider, index, collection: collection.into(), config })
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Retrieve with explicit limits instead of the configured ones.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidQuery`] for an empty or whitespace-only query.
    /// - [`RagError::ConfigError`] if `document_top_k == 0` or
    ///   `node_top_k < document_top_k`.
    /// - Backend errors from the embedding provider or index, unmodified.
    pub async fn retrieve_with(
        &self,
        query: &str,
        node_top_k: usize,
        document_top_k: usize,
    ) -> Result<Vec<RetrievedCandidate>> {
        if query.trim().is_empty() {
            return Err(RagError::InvalidQuery("query text must not be empty".to_string()));
        }
        validate_top_k(node_top_k, document_top_k)?;

        let embedding = self.embedding_provider.embed(query).await.inspect_err(|e| {
            error!(provider = self.embedding_provider.name(), error = %e, "query embedding failed");
        })?;
        check_dimensions(self.embedding_provider.as_ref(), &embedding)?;

        let mut hits = self
            .index
            .search(&self.collection, &embedding, node_top_k, self.config.query_mode)
            .await
            .inspect_err(|e| {
                error!(collection = %self.collection, error = %e, "vector index search failed");
            })?;
        let raw_count = hits.len();

        if self.config.enforce_descending_order {
            sort_by_similarity(&mut hits);
        }

        let selected =
            select_distinct_sources(hits.into_iter().take(node_top_k), document_top_k);
        for candidate in selected.iter().filter(|c| c.chunk.has_missing_metadata()) {
            debug!(chunk.id = %candidate.chunk.id, "chunk metadata incomplete, using defaults");
        }

        info!(
            collection = %self.collection,
            node_top_k,
            document_top_k,
            raw_count,
            selected = selected.len(),
            "retrieval completed"
        );

        Ok(selected)
    }
}

#[async_trait]
impl Retriever for ChunkRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedCandidate>> {
        self.retrieve_with(query, self.config.node_top_k, self.config.document_top_k).await
    }
}

/// Keep the first candidate seen for each source, in input order, stopping
/// once `limit` distinct sources are selected.
///
/// Chunks without a `source` entry share the `unknown_source` placeholder and
/// therefore collapse into a single result.
pub fn select_distinct_sources(
    candidates: impl IntoIterator<Item = RetrievedCandidate>,
    limit: usize,
) -> Vec<RetrievedCandidate> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut selected = Vec::with_capacity(limit);

    for candidate in candidates {
        if selected.len() >= limit {
            break;
        }
        if seen.insert(candidate.chunk.source_id().to_string()) {
            selected.push(candidate);
        }
    }

    selected
}

/// Stable sort by descending similarity; unscored candidates go last.
///
/// A `NaN` score ranks like a missing one.
pub fn sort_by_similarity(candidates: &mut [RetrievedCandidate]) {
    candidates.sort_by(|a, b| match (rank(a), rank(b)) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

fn rank(candidate: &RetrievedCandidate) -> Option<f32> {
    candidate.similarity.filter(|s| !s.is_nan())
}
