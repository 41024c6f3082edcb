//! Data types for corpus documents, chunks, retrieval candidates, and the
//! document-level records handed to response synthesis.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Metadata key holding the parent document's source identifier.
pub const SOURCE_KEY: &str = "source";
/// Metadata key holding the parent document's title.
pub const TITLE_KEY: &str = "title";
/// Metadata key holding the parent document's abstract.
pub const ABSTRACT_KEY: &str = "abstract";
/// Metadata key holding the position of a chunk within its document.
pub const CHUNK_INDEX_KEY: &str = "chunk_index";

/// Substituted when a chunk carries no source identifier.
pub const UNKNOWN_SOURCE: &str = "unknown_source";
/// Substituted when a chunk carries no title.
pub const NO_TITLE: &str = "No Title";
/// Substituted when a chunk carries no abstract.
pub const NO_ABSTRACT: &str = "No Abstract";

/// A corpus entry: one academic abstract with its identifier and title.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Stable identifier, unique across the corpus (e.g. an arXiv id).
    pub source_id: String,
    /// Display title.
    pub title: String,
    /// Abstract body.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

impl Document {
    /// Create a new document.
    pub fn new(
        source_id: impl Into<String>,
        title: impl Into<String>,
        abstract_text: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            title: title.into(),
            abstract_text: abstract_text.into(),
        }
    }

    /// The text that gets chunked and embedded: title, blank line, abstract.
    pub fn text(&self) -> String {
        format!("{}\n\n{}", self.title, self.abstract_text)
    }

    /// Metadata copied onto every chunk cut from this document.
    pub fn metadata(&self) -> HashMap<String, String> {
        HashMap::from([
            (SOURCE_KEY.to_string(), self.source_id.clone()),
            (TITLE_KEY.to_string(), self.title.clone()),
            (ABSTRACT_KEY.to_string(), self.abstract_text.clone()),
        ])
    }
}

/// A segment of a [`Document`] with its vector embedding.
///
/// Chunks carry a denormalized copy of the parent metadata so a single chunk
/// can be displayed as a search result without a lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk (`{source_id}_{chunk_index}`).
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// The vector embedding for this chunk's text. Empty until ingestion.
    pub embedding: Vec<f32>,
    /// Parent document metadata plus chunk-specific fields.
    pub metadata: HashMap<String, String>,
    /// The `source_id` of the parent [`Document`].
    pub document_id: String,
}

impl Chunk {
    /// Source identifier from metadata, or [`UNKNOWN_SOURCE`].
    pub fn source_id(&self) -> &str {
        self.metadata.get(SOURCE_KEY).map(String::as_str).unwrap_or(UNKNOWN_SOURCE)
    }

    /// Title from metadata, or [`NO_TITLE`].
    pub fn title(&self) -> &str {
        self.metadata.get(TITLE_KEY).map(String::as_str).unwrap_or(NO_TITLE)
    }

    /// Abstract from metadata, or [`NO_ABSTRACT`].
    pub fn abstract_text(&self) -> &str {
        self.metadata.get(ABSTRACT_KEY).map(String::as_str).unwrap_or(NO_ABSTRACT)
    }

    /// Whether any of the display fields fall back to a default.
    pub fn has_missing_metadata(&self) -> bool {
        [SOURCE_KEY, TITLE_KEY, ABSTRACT_KEY].iter().any(|key| !self.metadata.contains_key(*key))
    }
}

/// A single chunk-level hit returned by the vector index.
///
/// `similarity` is `None` when the backend returned no score. That is kept
/// distinct from a zero score until the confidence gate compares it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedCandidate {
    /// The matched chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more similar), if the index produced one.
    pub similarity: Option<f32>,
}

impl RetrievedCandidate {
    /// Create a candidate with a score.
    pub fn scored(chunk: Chunk, similarity: f32) -> Self {
        Self { chunk, similarity: Some(similarity) }
    }

    /// Create a candidate the index returned without a score.
    pub fn unscored(chunk: Chunk) -> Self {
        Self { chunk, similarity: None }
    }
}

/// A deduplicated, confidence-carrying document record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocListResponse {
    /// 1-based rank at construction time.
    pub index: usize,
    /// Title of the winning chunk's document.
    pub title: String,
    /// Abstract of the winning chunk's document.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Source identifier of the winning chunk's document.
    pub source_id: String,
    /// Winning chunk score, rounded to 4 decimal places.
    pub similarity: f32,
}
