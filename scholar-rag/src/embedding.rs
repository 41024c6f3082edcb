//! Embedding gateway trait for turning text into vectors.

use async_trait::async_trait;

use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap a concrete model (a local TEI/Ollama server, the
/// OpenAI API, a test double) behind one async interface. Output must have
/// [`dimensions`](EmbeddingProvider::dimensions) entries and be deterministic
/// for a given model version.
///
/// # Example
///
/// ```rust,ignore
/// use scholar_rag::EmbeddingProvider;
///
/// let vector = provider.embed("renormalized quasiparticles").await?;
/// assert_eq!(vector.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// Calls [`embed`](EmbeddingProvider::embed) sequentially by default.
    /// Backends with native batching should override it.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Short provider name used in logs and errors.
    fn name(&self) -> &str {
        "embedding"
    }
}

/// Reject a vector whose length disagrees with the provider's declared size.
///
/// A wrong-sized vector is a malformed backend response and is reported as
/// [`RagError::EmbeddingError`].
pub fn check_dimensions(provider: &dyn EmbeddingProvider, vector: &[f32]) -> Result<()> {
    let expected = provider.dimensions();
    if vector.len() != expected {
        return Err(RagError::EmbeddingError {
            provider: provider.name().to_string(),
            message: format!("expected {expected} dimensions, got {}", vector.len()),
        });
    }
    Ok(())
}
