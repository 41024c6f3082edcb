//! Retrieval-and-confidence core for a research assistant over academic abstracts.
//!
//! A query is embedded, the vector index is asked for more chunk-level hits
//! than needed (`node_top_k`), and the hits are collapsed to at most one per
//! paper (`document_top_k`). A confidence gate then keeps only documents whose
//! similarity clears a threshold; an empty result means "do not generate".
//!
//! - [`ChunkRetriever`] / [`HydeRetriever`]: over-fetch, dedup by source
//! - [`ConfidenceGate`]: threshold filter producing [`DocListResponse`]s
//! - [`ResearchAssistant`]: transform → retrieve → gate → synthesize
//! - [`Ingestor`]: chunk → embed → upsert for building the index
//! - [`EmbeddingProvider`], [`VectorSearch`], [`VectorStore`], [`Llm`]: backend seams
//!
//! Backends behind cargo features:
//! - `openai`: [`openai::OpenAIEmbeddingProvider`] and [`openai::OpenAICompatibleLlm`]
//! - `qdrant`: [`qdrant::QdrantVectorStore`]

pub mod assistant;
pub mod chunking;
pub mod confidence;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod hyde;
pub mod ingest;
pub mod inmemory;
pub mod llm;
pub mod loader;
pub mod query_transform;
pub mod retriever;
pub mod synthesis;
pub mod vectorstore;

#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use assistant::{Answer, ResearchAssistant, ResearchAssistantBuilder};
pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker};
pub use confidence::{ConfidenceGate, build_doc_list, round_similarity};
pub use config::{
    AssistantConfig, ChunkingConfig, EmbeddingSettings, HydeConfig, IngestConfig, LlmSettings,
    RetrievalConfig, RetrievalConfigBuilder,
};
pub use document::{Chunk, DocListResponse, Document, RetrievedCandidate};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use hyde::HydeRetriever;
pub use ingest::{IngestReport, Ingestor, IngestorBuilder};
pub use inmemory::InMemoryVectorStore;
pub use llm::{ChatMessage, GenerationConfig, Llm, Role};
pub use loader::load_arxiv_snapshot;
pub use query_transform::QueryTransformer;
pub use retriever::{ChunkRetriever, Retriever, select_distinct_sources, sort_by_similarity};
pub use synthesis::{NO_RELEVANT_DOCUMENTS_MESSAGE, ResponseSynthesizer, SynthesisStyle};
pub use vectorstore::{QueryMode, VectorSearch, VectorStore};
