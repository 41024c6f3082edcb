//! In-memory vector store using cosine similarity.
//!
//! [`InMemoryVectorStore`] keeps every collection in a `BTreeMap` behind a
//! `tokio::sync::RwLock`, so many queries can read concurrently while
//! ingestion takes the write lock. A collection set can be written to and
//! restored from a JSON snapshot, which is how the CLI persists its index
//! between runs.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::document::{Chunk, RetrievedCandidate};
use crate::error::{RagError, Result};
use crate::retriever::sort_by_similarity;
use crate::vectorstore::{QueryMode, VectorSearch, VectorStore};

const BACKEND: &str = "InMemory";

/// One named collection: declared dimensionality and chunks keyed by ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Collection {
    dimensions: usize,
    chunks: BTreeMap<String, Chunk>,
}

/// An in-memory vector store using cosine similarity for search.
///
/// Only [`QueryMode::Default`] is supported. Ties in score keep chunk-ID order,
/// so identical inputs always produce identical rankings.
///
/// # Example
///
/// ```rust,ignore
/// use scholar_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("arxiv", 384).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a store from a snapshot written by [`save`](Self::save).
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let collections: HashMap<String, Collection> = serde_json::from_slice(&bytes)?;
        info!(path = %path.display(), collections = collections.len(), "loaded index snapshot");
        Ok(Self { collections: RwLock::new(collections) })
    }

    /// Like [`load`](Self::load), but returns an empty store when the file does not exist.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if tokio::fs::try_exists(path).await? {
            Self::load(path).await
        } else {
            debug!(path = %path.display(), "no index snapshot found, starting empty");
            Ok(Self::new())
        }
    }

    /// Write all collections to a JSON snapshot.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = {
            let collections = self.collections.read().await;
            serde_json::to_vec(&*collections)?
        };
        tokio::fs::write(path, bytes).await?;
        info!(path = %path.display(), "saved index snapshot");
        Ok(())
    }

    fn missing(collection: &str) -> RagError {
        RagError::VectorStoreError {
            backend: BACKEND.to_string(),
            message: format!("collection '{collection}' does not exist"),
        }
    }

    fn dimension_mismatch(collection: &str, expected: usize, actual: usize) -> RagError {
        RagError::VectorStoreError {
            backend: BACKEND.to_string(),
            message: format!(
                "collection '{collection}' holds {expected}-dimensional vectors, got {actual}"
            ),
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Accumulates in `f64` so large components cannot overflow the norms.
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)) as f32
}

#[async_trait]
impl VectorSearch for InMemoryVectorStore {
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
        mode: QueryMode,
    ) -> Result<Vec<RetrievedCandidate>> {
        if mode != QueryMode::Default {
            return Err(RagError::VectorStoreError {
                backend: BACKEND.to_string(),
                message: format!("query mode '{mode}' is not supported"),
            });
        }

        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| Self::missing(collection))?;
        if embedding.len() != store.dimensions {
            return Err(Self::dimension_mismatch(collection, store.dimensions, embedding.len()));
        }

        let mut scored: Vec<RetrievedCandidate> = store
            .chunks
            .values()
            .map(|chunk| {
                let similarity = cosine_similarity(&chunk.embedding, embedding);
                RetrievedCandidate::scored(chunk.clone(), similarity)
            })
            .collect();

        sort_by_similarity(&mut scored);
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map_or(0, |c| c.chunks.len()))
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(name.to_string())
            .or_insert_with(|| Collection { dimensions, chunks: BTreeMap::new() });
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| Self::missing(collection))?;
        if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != store.dimensions) {
            return Err(Self::dimension_mismatch(collection, store.dimensions, bad.embedding.len()));
        }
        for chunk in chunks {
            store.chunks.insert(chunk.id.clone(), chunk.clone());
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| Self::missing(collection))?;
        for id in ids {
            store.chunks.remove(*id);
        }
        Ok(())
    }
}
