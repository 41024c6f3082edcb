//! Qdrant backend for the retrieval index.
//!
//! Collections are created with cosine distance, so a higher score means a
//! closer abstract, matching the in-memory store. Point ids in Qdrant must be
//! integers or UUIDs: chunk ids such as `2101.00001_0` are mapped to a
//! name-based UUID and the original id travels in the payload.
//!
//! # Example
//!
//! ```rust,ignore
//! use scholar_rag::qdrant::QdrantVectorStore;
//!
//! let store = QdrantVectorStore::connect("http://localhost:6334", None)?;
//! store.create_collection("arxiv", 384).await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance, PointId,
    PointStruct, PointsIdsList, ScoredPoint, SearchPointsBuilder, UpsertPointsBuilder,
    Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant, QdrantError};
use tracing::debug;
use uuid::Uuid;

use crate::document::{Chunk, RetrievedCandidate};
use crate::error::{RagError, Result};
use crate::vectorstore::{QueryMode, VectorSearch, VectorStore};

const BACKEND: &str = "qdrant";

const CHUNK_ID_FIELD: &str = "chunk_id";
const TEXT_FIELD: &str = "text";
const DOCUMENT_ID_FIELD: &str = "document_id";
const METADATA_FIELD: &str = "metadata";

fn backend_error(e: QdrantError) -> RagError {
    RagError::VectorStoreError { backend: BACKEND.to_string(), message: e.to_string() }
}

/// Name-based UUID for a chunk id; the same chunk always lands on the same point.
fn point_id(chunk_id: &str) -> PointId {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk_id.as_bytes()).to_string().into()
}

fn to_payload(chunk: &Chunk) -> Payload {
    let metadata: serde_json::Map<String, serde_json::Value> =
        chunk.metadata.iter().map(|(k, v)| (k.clone(), v.clone().into())).collect();
    Payload::try_from(serde_json::json!({
        CHUNK_ID_FIELD: chunk.id,
        TEXT_FIELD: chunk.text,
        DOCUMENT_ID_FIELD: chunk.document_id,
        METADATA_FIELD: metadata,
    }))
    .unwrap_or_default()
}

fn as_string(value: &QdrantValue) -> Option<String> {
    match &value.kind {
        Some(Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    }
}

fn payload_string(point: &ScoredPoint, field: &str) -> String {
    point.payload.get(field).and_then(as_string).unwrap_or_default()
}

fn payload_metadata(point: &ScoredPoint) -> HashMap<String, String> {
    match point.payload.get(METADATA_FIELD).and_then(|v| v.kind.as_ref()) {
        Some(Kind::StructValue(fields)) => fields
            .fields
            .iter()
            .filter_map(|(key, value)| as_string(value).map(|s| (key.clone(), s)))
            .collect(),
        _ => HashMap::new(),
    }
}

fn to_candidate(point: ScoredPoint) -> RetrievedCandidate {
    let chunk = Chunk {
        id: payload_string(&point, CHUNK_ID_FIELD),
        text: payload_string(&point, TEXT_FIELD),
        embedding: Vec::new(),
        metadata: payload_metadata(&point),
        document_id: payload_string(&point, DOCUMENT_ID_FIELD),
    };
    RetrievedCandidate::scored(chunk, point.score)
}

/// A [`VectorStore`] backed by [Qdrant](https://qdrant.tech/) over gRPC.
pub struct QdrantVectorStore {
    client: Qdrant,
}

impl QdrantVectorStore {
    /// Connect to the Qdrant server at `url`, optionally authenticating.
    pub fn connect(url: &str, api_key: Option<String>) -> Result<Self> {
        let client = Qdrant::from_url(url).api_key(api_key).build().map_err(backend_error)?;
        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Qdrant) -> Self {
        Self { client }
    }

    async fn exists(&self, collection: &str) -> Result<bool> {
        self.client.collection_exists(collection).await.map_err(backend_error)
    }
}

#[async_trait]
impl VectorSearch for QdrantVectorStore {
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

        let request = SearchPointsBuilder::new(collection, embedding.to_vec(), top_k as u64)
            .with_payload(true);
        let response = self.client.search_points(request).await.map_err(backend_error)?;
        debug!(collection, hits = response.result.len(), "qdrant search completed");

        Ok(response.result.into_iter().map(to_candidate).collect())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        if !self.exists(collection).await? {
            return Ok(0);
        }
        let response = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await
            .map_err(backend_error)?;
        Ok(response.result.map_or(0, |r| r.count as usize))
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        if self.exists(name).await? {
            debug!(collection = name, "qdrant collection exists");
            return Ok(());
        }

        let vectors = VectorParamsBuilder::new(dimensions as u64, Distance::Cosine);
        self.client
            .create_collection(CreateCollectionBuilder::new(name).vectors_config(vectors))
            .await
            .map_err(backend_error)?;
        debug!(collection = name, dimensions, "created qdrant collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        if self.exists(name).await? {
            self.client.delete_collection(name).await.map_err(backend_error)?;
        }
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = chunks
            .iter()
            .map(|chunk| {
                PointStruct::new(point_id(&chunk.id), chunk.embedding.clone(), to_payload(chunk))
            })
            .collect();
        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(backend_error)?;
        debug!(collection, points = chunks.len(), "upserted chunks to qdrant");
        Ok(())
    }

    async fn delete(&self, collection: &str, ids: &[&str]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let selector = PointsIdsList { ids: ids.iter().map(|id| point_id(id)).collect() };
        self.client
            .delete_points(DeletePointsBuilder::new(collection).points(selector).wait(true))
            .await
            .map_err(backend_error)?;
        debug!(collection, points = ids.len(), "deleted points from qdrant");
        Ok(())
    }
}
