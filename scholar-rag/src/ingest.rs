//! Corpus ingestion: chunk → embed → upsert.
//!
//! Chunks from consecutive documents are pooled and flushed in batches of
//! `batch_size`, so a corpus of short abstracts costs one embedding call per
//! batch rather than one per paper.
//!
//! # Example
//!
//! ```rust,ignore
//! use scholar_rag::{Ingestor, InMemoryVectorStore, RecursiveChunker};
//!
//! let ingestor = Ingestor::builder()
//!     .collection("arxiv")
//!     .embedding_provider(Arc::new(embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .chunker(Arc::new(RecursiveChunker::new(1024, 200)))
//!     .build()?;
//!
//! ingestor.ensure_ingested(&documents).await?;
//! ```

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::chunking::Chunker;
use crate::document::{Chunk, Document};
use crate::embedding::{EmbeddingProvider, check_dimensions};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// Counts from one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Documents that produced at least one chunk.
    pub documents: usize,
    /// Chunks embedded and stored.
    pub chunks: usize,
}

/// Writes documents into a vector store collection.
pub struct Ingestor {
    collection: String,
    batch_size: usize,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
}

impl Ingestor {
    /// Create a new [`IngestorBuilder`].
    pub fn builder() -> IngestorBuilder {
        IngestorBuilder::default()
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Create the collection with the embedding provider's dimensionality.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if the vector store operation fails.
    pub async fn create_collection(&self) -> Result<()> {
        let name = &self.collection;
        let dimensions = self.embedding_provider.dimensions();
        self.vector_store.create_collection(name, dimensions).await.map_err(|e| {
            error!(collection = %name, error = %e, "failed to create collection");
            RagError::PipelineError(format!("failed to create collection '{name}': {e}"))
        })
    }

    /// Number of chunks currently stored in the collection.
    pub async fn stored_chunks(&self) -> Result<usize> {
        self.vector_store.count(&self.collection).await
    }

    /// Chunk, embed, and store `documents`, creating the collection if needed.
    ///
    /// A failed run removes the chunks it already wrote, so a later
    /// [`ensure_ingested`](Self::ensure_ingested) does not mistake a partial
    /// corpus for a complete one.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] naming the first document of the
    /// failing batch if embedding or storage fails.
    pub async fn ingest_documents(&self, documents: &[Document]) -> Result<IngestReport> {
        self.create_collection().await?;

        let mut written = Vec::new();
        match self.write_documents(documents, &mut written).await {
            Ok(report) => {
                info!(
                    collection = %self.collection,
                    documents = report.documents,
                    chunks = report.chunks,
                    "ingestion completed"
                );
                Ok(report)
            }
            Err(e) => {
                self.roll_back(&written).await;
                Err(e)
            }
        }
    }

    /// Ingest `documents` only when the collection is empty.
    ///
    /// Returns `None` when the collection already holds chunks.
    pub async fn ensure_ingested(&self, documents: &[Document]) -> Result<Option<IngestReport>> {
        let existing = self.stored_chunks().await?;
        if existing > 0 {
            info!(
                collection = %self.collection,
                existing,
                "collection already populated, skipping ingestion"
            );
            return Ok(None);
        }
        self.ingest_documents(documents).await.map(Some)
    }

    async fn write_documents(
        &self,
        documents: &[Document],
        written: &mut Vec<String>,
    ) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        let mut pending: Vec<Chunk> = Vec::with_capacity(self.batch_size);

        for document in documents {
            let chunks = self.chunker.chunk(document);
            if chunks.is_empty() {
                continue;
            }
            report.documents += 1;
            pending.extend(chunks);

            while pending.len() >= self.batch_size {
                let rest = pending.split_off(self.batch_size);
                let batch = std::mem::replace(&mut pending, rest);
                report.chunks += self.flush(batch, written).await?;
            }
        }
        if !pending.is_empty() {
            report.chunks += self.flush(pending, written).await?;
        }
        Ok(report)
    }

    async fn flush(&self, mut batch: Vec<Chunk>, written: &mut Vec<String>) -> Result<usize> {
        let first_document = batch.first().map(|c| c.document_id.clone()).unwrap_or_default();
        let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();

        let embeddings = self
            .embedding_provider
            .embed_batch(&texts)
            .await
            .and_then(|embeddings| {
                if embeddings.len() != batch.len() {
                    return Err(RagError::EmbeddingError {
                        provider: self.embedding_provider.name().to_string(),
                        message: format!(
                            "expected {} embeddings, got {}",
                            batch.len(),
                            embeddings.len()
                        ),
                    });
                }
                for embedding in &embeddings {
                    check_dimensions(self.embedding_provider.as_ref(), embedding)?;
                }
                Ok(embeddings)
            })
            .map_err(|e| {
                error!(
                    document.id = %first_document,
                    error = %e,
                    "embedding failed during ingestion"
                );
                RagError::PipelineError(format!(
                    "embedding failed for batch starting at document '{first_document}': {e}"
                ))
            })?;

        for (chunk, embedding) in batch.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        self.vector_store.upsert(&self.collection, &batch).await.map_err(|e| {
            error!(document.id = %first_document, error = %e, "upsert failed during ingestion");
            RagError::PipelineError(format!(
                "upsert failed for batch starting at document '{first_document}': {e}"
            ))
        })?;

        written.extend(batch.iter().map(|c| c.id.clone()));
        Ok(batch.len())
    }

    async fn roll_back(&self, written: &[String]) {
        if written.is_empty() {
            return;
        }
        let ids: Vec<&str> = written.iter().map(String::as_str).collect();
        match self.vector_store.delete(&self.collection, &ids).await {
            Ok(()) => {
                warn!(
                    collection = %self.collection,
                    chunks = ids.len(),
                    "rolled back partial ingestion"
                );
            }
            Err(e) => {
                error!(
                    collection = %self.collection,
                    error = %e,
                    "failed to roll back partial ingestion"
                );
            }
        }
    }
}

/// Builder for constructing an [`Ingestor`].
///
/// `embedding_provider`, `vector_store` and `chunker` are required;
/// `collection` defaults to `"arxiv"` and `batch_size` to 100.
pub struct IngestorBuilder {
    collection: String,
    batch_size: usize,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl Default for IngestorBuilder {
    fn default() -> Self {
        Self {
            collection: "arxiv".to_string(),
            batch_size: 100,
            embedding_provider: None,
            vector_store: None,
            chunker: None,
        }
    }
}

impl IngestorBuilder {
    /// Set the target collection.
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Set how many chunks are embedded and upserted per round trip.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`Ingestor`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or
    /// `batch_size` is zero.
    pub fn build(self) -> Result<Ingestor> {
        if self.batch_size == 0 {
            return Err(RagError::ConfigError("batch_size must be greater than zero".to_string()));
        }
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let chunker =
            self.chunker.ok_or_else(|| RagError::ConfigError("chunker is required".to_string()))?;

        Ok(Ingestor {
            collection: self.collection,
            batch_size: self.batch_size,
            embedding_provider,
            vector_store,
            chunker,
        })
    }
}
