//! Confidence gate: decide which retrieved documents are good enough to
//! synthesize from.
//!
//! Candidates become [`DocListResponse`] records ranked in input order, with
//! similarity rounded to four decimals. A missing score counts as `0`, so an
//! unscored hit never passes a positive threshold. No candidate clearing the
//! bar is a normal outcome reported as an empty list.

use tracing::info;

use crate::config::{RetrievalConfig, validate_threshold};
use crate::document::{DocListResponse, RetrievedCandidate};
use crate::error::Result;

/// Round a similarity score to four decimal places.
pub fn round_similarity(similarity: f32) -> f32 {
    (similarity * 10_000.0).round() / 10_000.0
}

/// Build document records from candidates, numbering them from 1 in input order.
pub fn build_doc_list(candidates: &[RetrievedCandidate]) -> Vec<DocListResponse> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| DocListResponse {
            index: i + 1,
            title: candidate.chunk.title().to_string(),
            abstract_text: candidate.chunk.abstract_text().to_string(),
            source_id: candidate.chunk.source_id().to_string(),
            similarity: round_similarity(candidate.similarity.unwrap_or(0.0)),
        })
        .collect()
}

/// Convert and keep only documents whose rounded similarity is `>= threshold`.
///
/// Relative order is preserved and `index` keeps the pre-filter rank.
pub fn filter(candidates: &[RetrievedCandidate], threshold: f32) -> Vec<DocListResponse> {
    build_doc_list(candidates).into_iter().filter(|doc| doc.similarity >= threshold).collect()
}

/// A [`filter`] bound to a fixed threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceGate {
    threshold: f32,
}

impl ConfidenceGate {
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`](crate::RagError::ConfigError) if
    /// `threshold` is outside `[0, 1]`.
    pub fn new(threshold: f32) -> Result<Self> {
        validate_threshold(threshold)?;
        Ok(Self { threshold })
    }

    /// Gate using `config.confidence_threshold`.
    pub fn from_config(config: &RetrievalConfig) -> Result<Self> {
        Self::new(config.confidence_threshold)
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Apply the gate. An empty return means "do not proceed to generation".
    pub fn filter(&self, candidates: &[RetrievedCandidate]) -> Vec<DocListResponse> {
        let kept = filter(candidates, self.threshold);
        info!(
            threshold = self.threshold,
            candidates = candidates.len(),
            kept = kept.len(),
            "confidence gate applied"
        );
        kept
    }
}
