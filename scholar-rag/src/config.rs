//! Configuration value objects.
//!
//! Everything the retriever, gate, ingestor, and assistant need is passed in
//! explicitly through these types. [`AssistantConfig`] is the serde-loadable
//! aggregate; missing fields take the defaults below.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::synthesis::SynthesisStyle;
use crate::vectorstore::QueryMode;

/// Retrieval and confidence-gate parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Raw chunk-level hits requested from the index (the over-fetch window).
    pub node_top_k: usize,
    /// Maximum number of distinct documents returned.
    pub document_top_k: usize,
    /// Minimum rounded similarity for a document to count as confident.
    pub confidence_threshold: f32,
    /// Search strategy passed through to the index.
    pub query_mode: QueryMode,
    /// Stable-sort hits by descending similarity before deduplication instead
    /// of trusting the index order.
    pub enforce_descending_order: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            node_top_k: 20,
            document_top_k: 5,
            confidence_threshold: 0.8,
            query_mode: QueryMode::Default,
            enforce_descending_order: false,
        }
    }
}

impl RetrievalConfig {
    /// Create a new builder for constructing a [`RetrievalConfig`].
    pub fn builder() -> RetrievalConfigBuilder {
        RetrievalConfigBuilder::default()
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `document_top_k == 0`
    /// - `node_top_k < document_top_k`
    /// - `confidence_threshold` is outside `[0, 1]`
    pub fn validate(&self) -> Result<()> {
        validate_top_k(self.node_top_k, self.document_top_k)?;
        validate_threshold(self.confidence_threshold)
    }
}

/// Check a pair of retrieval limits.
pub(crate) fn validate_top_k(node_top_k: usize, document_top_k: usize) -> Result<()> {
    if document_top_k == 0 {
        return Err(RagError::ConfigError("document_top_k must be greater than zero".to_string()));
    }
    if node_top_k < document_top_k {
        return Err(RagError::ConfigError(format!(
            "node_top_k ({node_top_k}) must be at least document_top_k ({document_top_k})"
        )));
    }
    Ok(())
}

/// Check that a confidence threshold lies in `[0, 1]`.
pub(crate) fn validate_threshold(threshold: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(RagError::ConfigError(format!(
            "confidence_threshold ({threshold}) must be within [0, 1]"
        )));
    }
    Ok(())
}

/// Builder for constructing a validated [`RetrievalConfig`].
#[derive(Debug, Clone, Default)]
pub struct RetrievalConfigBuilder {
    config: RetrievalConfig,
}

impl RetrievalConfigBuilder {
    /// Set the number of raw chunk hits to request.
    pub fn node_top_k(mut self, k: usize) -> Self {
        self.config.node_top_k = k;
        self
    }

    /// Set the maximum number of distinct documents to return.
    pub fn document_top_k(mut self, k: usize) -> Self {
        self.config.document_top_k = k;
        self
    }

    /// Set the confidence threshold.
    pub fn confidence_threshold(mut self, threshold: f32) -> Self {
        self.config.confidence_threshold = threshold;
        self
    }

    /// Set the index query mode.
    pub fn query_mode(mut self, mode: QueryMode) -> Self {
        self.config.query_mode = mode;
        self
    }

    /// Sort hits by descending similarity before deduplication.
    pub fn enforce_descending_order(mut self, enforce: bool) -> Self {
        self.config.enforce_descending_order = enforce;
        self
    }

    /// Build the [`RetrievalConfig`], validating it.
    ///
    /// # Errors
    ///
    /// See [`RetrievalConfig::validate`].
    pub fn build(self) -> Result<RetrievalConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Document chunking parameters, in characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 1024, chunk_overlap: 200 }
    }
}

impl ChunkingConfig {
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `chunk_size == 0` or
    /// `chunk_overlap >= chunk_size`.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Corpus ingestion parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IngestConfig {
    /// Chunks embedded and upserted per round trip.
    pub batch_size: usize,
    /// Cap on documents read from the corpus snapshot. `None` reads everything.
    pub max_documents: Option<usize>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { batch_size: 100, max_documents: Some(500) }
    }
}

impl IngestConfig {
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `batch_size == 0`.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(RagError::ConfigError("batch_size must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Hypothetical-document retrieval parameters.
///
/// Only used by [`HydeRetriever`](crate::HydeRetriever), which replaces the
/// `node_top_k` over-fetch with `hypotheses * hits_per_hypothesis` pooled hits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HydeConfig {
    /// Pseudo-abstracts generated per query.
    pub hypotheses: usize,
    /// Hits requested from the index per pseudo-abstract.
    pub hits_per_hypothesis: usize,
}

impl Default for HydeConfig {
    fn default() -> Self {
        Self { hypotheses: 5, hits_per_hypothesis: 3 }
    }
}

impl HydeConfig {
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if either count is zero.
    pub fn validate(&self) -> Result<()> {
        if self.hypotheses == 0 || self.hits_per_hypothesis == 0 {
            return Err(RagError::ConfigError(
                "hyde.hypotheses and hyde.hits_per_hypothesis must be greater than zero"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Connection settings for an OpenAI-compatible embeddings endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// API base URL, e.g. `http://localhost:11434/v1`. `None` means the OpenAI API.
    pub base_url: Option<String>,
    /// Embedding model name.
    pub model: String,
    /// Output dimensionality of the model.
    pub dimensions: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { base_url: None, model: "BAAI/bge-small-en".to_string(), dimensions: 384 }
    }
}

/// Connection and generation settings for an OpenAI-compatible chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmSettings {
    /// API base URL, e.g. `http://localhost:8080/v1`. `None` means the OpenAI API.
    pub base_url: Option<String>,
    /// Chat model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens generated per reply.
    pub max_tokens: u32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            model: "llama-2-13b-chat".to_string(),
            temperature: 0.1,
            max_tokens: 256,
            timeout_secs: 120,
        }
    }
}

/// Top-level configuration for a research assistant deployment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssistantConfig {
    /// Vector index collection holding the corpus.
    pub collection: String,
    /// Language the synthesized answer is written in.
    pub output_language: String,
    /// Rewrite the user query into a concise search phrase before retrieval.
    pub transform_queries: bool,
    /// Prompt layout used for the final answer.
    pub synthesis_style: SynthesisStyle,
    pub retrieval: RetrievalConfig,
    pub hyde: HydeConfig,
    pub chunking: ChunkingConfig,
    pub ingest: IngestConfig,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            collection: "arxiv".to_string(),
            output_language: "English".to_string(),
            transform_queries: true,
            synthesis_style: SynthesisStyle::default(),
            retrieval: RetrievalConfig::default(),
            hyde: HydeConfig::default(),
            chunking: ChunkingConfig::default(),
            ingest: IngestConfig::default(),
            embedding: EmbeddingSettings::default(),
            llm: LlmSettings::default(),
        }
    }
}

impl AssistantConfig {
    /// Validate every nested section.
    ///
    /// # Errors
    ///
    /// Returns the first [`RagError::ConfigError`] found.
    pub fn validate(&self) -> Result<()> {
        if self.collection.trim().is_empty() {
            return Err(RagError::ConfigError("collection must not be empty".to_string()));
        }
        if self.embedding.dimensions == 0 {
            return Err(RagError::ConfigError(
                "embedding.dimensions must be greater than zero".to_string(),
            ));
        }
        self.retrieval.validate()?;
        self.hyde.validate()?;
        self.chunking.validate()?;
        self.ingest.validate()
    }
}
