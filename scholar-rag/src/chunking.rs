//! Document chunking strategies.
//!
//! - [`FixedSizeChunker`]: splits by character count with configurable overlap
//! - [`RecursiveChunker`]: splits by paragraphs, then sentences, then words
//!
//! Sizes are measured in characters, never bytes, so multi-byte text (accented
//! author names, math symbols in abstracts) is never cut mid-codepoint.

use crate::config::ChunkingConfig;
use crate::document::{CHUNK_INDEX_KEY, Chunk, Document};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no
/// embeddings; the ingestor attaches those.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks. Every chunk carries the document's
    /// `source`, `title` and `abstract` metadata plus its `chunk_index`.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Wrap raw chunk texts into [`Chunk`]s belonging to `document`.
fn into_chunks(document: &Document, texts: Vec<String>) -> Vec<Chunk> {
    let base = document.metadata();
    texts
        .into_iter()
        .filter(|text| !text.trim().is_empty())
        .enumerate()
        .map(|(i, text)| {
            let mut metadata = base.clone();
            metadata.insert(CHUNK_INDEX_KEY.to_string(), i.to_string());
            Chunk {
                id: format!("{}_{i}", document.source_id),
                text,
                embedding: Vec::new(),
                metadata,
                document_id: document.source_id.clone(),
            }
        })
        .collect()
}

/// Splits text into fixed-size chunks by character count with overlap.
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: characters shared by consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        into_chunks(document, split_by_size(&document.text(), self.chunk_size, self.chunk_overlap))
    }
}

/// Splits text hierarchically: paragraphs → sentences → words.
///
/// Segments are merged greedily up to `chunk_size`. When a chunk is closed,
/// the trailing segments that fit in `chunk_overlap` characters are carried
/// into the next one. A segment that is still too long is split with the
/// next separator, and finally by character count.
///
/// # Example
///
/// ```rust,ignore
/// use scholar_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1024, 200);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    const SEPARATORS: [&'static str; 5] = ["\n\n", ". ", "! ", "? ", " "];

    /// Create a new `RecursiveChunker`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }

    /// Create a chunker from a validated [`ChunkingConfig`].
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let texts = split_and_merge(
            &document.text(),
            self.chunk_size,
            self.chunk_overlap,
            &Self::SEPARATORS,
        );
        into_chunks(document, texts)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split by the first separator, merge segments up to `chunk_size`, recurse
/// with the remaining separators on anything still oversized.
fn split_and_merge(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if char_len(text) <= chunk_size {
        return vec![text.to_string()];
    }
    let Some((separator, rest)) = separators.split_first() else {
        return split_by_size(text, chunk_size, chunk_overlap);
    };

    let segments = split_keeping_separator(text, separator);
    if segments.len() == 1 {
        return split_and_merge(text, chunk_size, chunk_overlap, rest);
    }

    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0;

    for segment in segments {
        let segment_len = char_len(segment);
        if !current.is_empty() && current_len + segment_len > chunk_size {
            chunks.push(current.concat());

            // Carry trailing segments into the next chunk as overlap.
            let mut carried = Vec::new();
            let mut carried_len = 0;
            for prev in current.iter().rev() {
                let len = char_len(prev);
                if carried_len + len > chunk_overlap || carried_len + len + segment_len > chunk_size
                {
                    break;
                }
                carried.push(*prev);
                carried_len += len;
            }
            carried.reverse();
            current = carried;
            current_len = carried_len;
        }

        if segment_len > chunk_size {
            if !current.is_empty() {
                chunks.push(current.concat());
                current.clear();
                current_len = 0;
            }
            chunks.extend(split_and_merge(segment, chunk_size, chunk_overlap, rest));
            continue;
        }

        current.push(segment);
        current_len += segment_len;
    }

    if !current.is_empty() {
        chunks.push(current.concat());
    }

    chunks
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Character-window splitting with overlap.
fn split_by_size(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let step = chunk_size.saturating_sub(chunk_overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}
