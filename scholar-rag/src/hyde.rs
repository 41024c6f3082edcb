//! Hypothetical-document retrieval (HyDE).
//!
//! Instead of embedding the short user query, the LLM writes several generic
//! abstracts on the topic and each is used as a query. All hits are pooled,
//! sorted by similarity, and collapsed to one per source document.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::config::{HydeConfig, RetrievalConfig};
use crate::document::RetrievedCandidate;
use crate::embedding::{EmbeddingProvider, check_dimensions};
use crate::error::{RagError, Result};
use crate::llm::{ChatMessage, Llm};
use crate::retriever::{Retriever, select_distinct_sources, sort_by_similarity};
use crate::vectorstore::VectorSearch;

const SYSTEM_PROMPT: &str = "Write an arXiv-style abstract for the research theme you are given. \
     Keep it general, without specific results or numbers. Return only the abstract text, without \
     a 'Title:' or 'Abstract:' label.";

/// Retriever that queries the index with LLM-generated pseudo-abstracts.
pub struct HydeRetriever {
    llm: Arc<dyn Llm>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorSearch>,
    collection: String,
    config: RetrievalConfig,
    hypotheses: usize,
    hits_per_hypothesis: usize,
}

impl HydeRetriever {
    /// Create a HyDE retriever with the [`HydeConfig`] defaults: 5 hypotheses,
    /// 3 hits each. `config.node_top_k` is not used here.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `config` does not validate.
    pub fn new(
        llm: Arc<dyn Llm>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorSearch>,
        collection: impl Into<String>,
        config: RetrievalConfig,
    ) -> Result<Self> {
        config.validate()?;
        let hyde = HydeConfig::default();
        Ok(Self {
            llm,
            embedding_provider,
            index,
            collection: collection.into(),
            config,
            hypotheses: hyde.hypotheses,
            hits_per_hypothesis: hyde.hits_per_hypothesis,
        })
    }

    /// Apply both counts from a [`HydeConfig`].
    pub fn with_config(self, hyde: &HydeConfig) -> Self {
        self.with_hypotheses(hyde.hypotheses).with_hits_per_hypothesis(hyde.hits_per_hypothesis)
    }

    /// Set how many pseudo-abstracts are generated per query (at least 1).
    pub fn with_hypotheses(mut self, hypotheses: usize) -> Self {
        self.hypotheses = hypotheses.max(1);
        self
    }

    /// Set how many hits are requested per pseudo-abstract (at least 1).
    pub fn with_hits_per_hypothesis(mut self, hits: usize) -> Self {
        self.hits_per_hypothesis = hits.max(1);
        self
    }

    async fn hypothesize(&self, query: &str) -> Result<String> {
        let messages = [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(query)];
        let reply = self.llm.chat(&messages).await.inspect_err(|e| {
            error!(model = self.llm.name(), error = %e, "hypothetical abstract generation failed");
        })?;
        Ok(reply.trim().to_string())
    }
}

#[async_trait]
impl Retriever for HydeRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedCandidate>> {
        if query.trim().is_empty() {
            return Err(RagError::InvalidQuery("query text must not be empty".to_string()));
        }

        let mut pooled = Vec::with_capacity(self.hypotheses * self.hits_per_hypothesis);
        for round in 0..self.hypotheses {
            let hypothesis = self.hypothesize(query).await?;
            if hypothesis.is_empty() {
                warn!(round, "model returned an empty hypothetical abstract, skipping");
                continue;
            }
            debug!(round, hypothesis_len = hypothesis.len(), "generated hypothetical abstract");

            let embedding = self.embedding_provider.embed(&hypothesis).await?;
            check_dimensions(self.embedding_provider.as_ref(), &embedding)?;
            let hits = self
                .index
                .search(
                    &self.collection,
                    &embedding,
                    self.hits_per_hypothesis,
                    self.config.query_mode,
                )
                .await
                .inspect_err(|e| {
                    error!(collection = %self.collection, error = %e, "vector index search failed");
                })?;
            pooled.extend(hits.into_iter().take(self.hits_per_hypothesis));
        }

        let pooled_count = pooled.len();
        sort_by_similarity(&mut pooled);
        let selected = select_distinct_sources(pooled, self.config.document_top_k);

        info!(
            hypotheses = self.hypotheses,
            pooled = pooled_count,
            selected = selected.len(),
            "hyde retrieval completed"
        );
        Ok(selected)
    }
}
