//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use scholar_rag::document::{ABSTRACT_KEY, SOURCE_KEY, TITLE_KEY};
use scholar_rag::{
    ChatMessage, Chunk, EmbeddingProvider, Llm, QueryMode, RagError, Result, RetrievedCandidate,
    VectorSearch,
};

pub const DIM: usize = 8;

/// Build a chunk whose metadata names `source` (or omits it when `None`).
pub fn chunk(id: &str, source: Option<&str>) -> Chunk {
    let mut metadata = HashMap::new();
    if let Some(source) = source {
        metadata.insert(SOURCE_KEY.to_string(), source.to_string());
        metadata.insert(TITLE_KEY.to_string(), format!("Title {source}"));
        metadata.insert(ABSTRACT_KEY.to_string(), format!("Abstract {source}"));
    }
    Chunk {
        id: id.to_string(),
        text: format!("text of {id}"),
        embedding: Vec::new(),
        metadata,
        document_id: source.unwrap_or_default().to_string(),
    }
}

pub fn candidate(id: &str, source: &str, score: Option<f32>) -> RetrievedCandidate {
    RetrievedCandidate { chunk: chunk(id, Some(source)), similarity: score }
}

/// Candidates `c0, c1, ...` for `(source, score)` pairs, in the given order.
pub fn candidates(pairs: &[(&str, f32)]) -> Vec<RetrievedCandidate> {
    pairs
        .iter()
        .enumerate()
        .map(|(i, (source, score))| candidate(&format!("c{i}"), source, Some(*score)))
        .collect()
}

pub fn sources(candidates: &[RetrievedCandidate]) -> Vec<String> {
    candidates.iter().map(|c| c.chunk.source_id().to_string()).collect()
}

/// Returns the same unit vector for every input.
pub struct ConstantEmbedder;

#[async_trait]
impl EmbeddingProvider for ConstantEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0; DIM])
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Declares `DIM` dimensions but returns a shorter vector.
pub struct WrongSizeEmbedder;

#[async_trait]
impl EmbeddingProvider for WrongSizeEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0; DIM - 1])
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::EmbeddingError {
            provider: "test".to_string(),
            message: "connection refused".to_string(),
        })
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Bag-of-keywords embedder: one dimension per vocabulary word, plus a small
/// constant so no vector is all zeros.
pub struct KeywordEmbedder {
    vocabulary: Vec<&'static str>,
}

impl KeywordEmbedder {
    pub fn new(vocabulary: Vec<&'static str>) -> Self {
        Self { vocabulary }
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        let mut vector: Vec<f32> =
            self.vocabulary.iter().map(|word| lower.matches(word).count() as f32).collect();
        vector.push(0.01);
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.vocabulary.len() + 1
    }
}

/// Vector index returning a fixed hit list, truncated to `top_k`.
pub struct ScriptedIndex {
    hits: Vec<RetrievedCandidate>,
    pub requests: Mutex<Vec<(usize, QueryMode)>>,
}

impl ScriptedIndex {
    pub fn new(hits: Vec<RetrievedCandidate>) -> Self {
        Self { hits, requests: Mutex::new(Vec::new()) }
    }

    pub fn requested_top_k(&self) -> Vec<usize> {
        self.requests.lock().unwrap().iter().map(|(k, _)| *k).collect()
    }
}

#[async_trait]
impl VectorSearch for ScriptedIndex {
    async fn search(
        &self,
        _collection: &str,
        _embedding: &[f32],
        top_k: usize,
        mode: QueryMode,
    ) -> Result<Vec<RetrievedCandidate>> {
        self.requests.lock().unwrap().push((top_k, mode));
        Ok(self.hits.iter().take(top_k).cloned().collect())
    }

    async fn count(&self, _collection: &str) -> Result<usize> {
        Ok(self.hits.len())
    }
}

/// Ignores `top_k` and returns every hit it holds.
pub struct OverflowingIndex(pub Vec<RetrievedCandidate>);

#[async_trait]
impl VectorSearch for OverflowingIndex {
    async fn search(
        &self,
        _collection: &str,
        _embedding: &[f32],
        _top_k: usize,
        _mode: QueryMode,
    ) -> Result<Vec<RetrievedCandidate>> {
        Ok(self.0.clone())
    }

    async fn count(&self, _collection: &str) -> Result<usize> {
        Ok(self.0.len())
    }
}

pub struct FailingIndex;

#[async_trait]
impl VectorSearch for FailingIndex {
    async fn search(
        &self,
        _collection: &str,
        _embedding: &[f32],
        _top_k: usize,
        _mode: QueryMode,
    ) -> Result<Vec<RetrievedCandidate>> {
        Err(RagError::VectorStoreError {
            backend: "test".to_string(),
            message: "index unavailable".to_string(),
        })
    }

    async fn count(&self, _collection: &str) -> Result<usize> {
        Err(RagError::VectorStoreError {
            backend: "test".to_string(),
            message: "index unavailable".to_string(),
        })
    }
}

/// Replies from a queue, then repeats `fallback`; records every prompt.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<String>>,
    fallback: String,
    pub calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedLlm {
    pub fn new(replies: &[&str], fallback: &str) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            fallback: fallback.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always(reply: &str) -> Self {
        Self::new(&[], reply)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Llm for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        self.calls.lock().unwrap().push(messages.to_vec());
        let next = self.replies.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| self.fallback.clone()))
    }
}

pub struct FailingLlm;

#[async_trait]
impl Llm for FailingLlm {
    fn name(&self) -> &str {
        "failing"
    }

    async fn chat(&self, _messages: &[ChatMessage]) -> Result<String> {
        Err(RagError::LlmError { provider: "failing".to_string(), message: "timeout".to_string() })
    }
}
