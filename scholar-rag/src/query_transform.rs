//! Rewrite a conversational research query into a short search phrase.

use std::sync::Arc;

use tracing::{debug, error};

use crate::error::Result;
use crate::llm::{ChatMessage, Llm};

const SYSTEM_PROMPT: &str = "You rewrite research questions into search phrases. Reply with a \
     concise English phrase that keeps only the essential topic, with no filler words and no \
     commentary.";

const OUTPUT_MARKER: &str = "Output: \"";

/// Uses an LLM to condense the user's query before retrieval.
pub struct QueryTransformer {
    llm: Arc<dyn Llm>,
}

impl QueryTransformer {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm }
    }

    pub fn build_messages(query: &str) -> Vec<ChatMessage> {
        let prompt = format!(
            "Example:\nInput: \"I am researching about LLM models and their usage in medicine\"\n\
             Output: \"LLM models in medicine\"\n\n\
             Task:\nTransform the following user query into a concise phrase that captures the \
             main topic. Return only the phrase.\n\nUser Query:\n\"{query}\""
        );
        vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)]
    }

    /// Return the condensed query, or `query` itself when the model replies
    /// with nothing usable.
    ///
    /// # Errors
    ///
    /// Propagates [`RagError::LlmError`](crate::RagError::LlmError).
    pub async fn transform(&self, query: &str) -> Result<String> {
        let reply = self.llm.chat(&Self::build_messages(query)).await.inspect_err(|e| {
            error!(model = self.llm.name(), error = %e, "query transformation failed");
        })?;
        let transformed = clean_transformed_query(&reply, query);
        debug!(original = query, transformed = %transformed, "query transformed");
        Ok(transformed)
    }
}

/// Strip the echo artifacts models tend to add around the phrase.
///
/// Models that continue the few-shot example reply with `Output: "phrase"`;
/// the text after the last such marker is used. Surrounding quotes and
/// whitespace are removed. An empty result falls back to `original`.
pub fn clean_transformed_query(reply: &str, original: &str) -> String {
    let tail = match reply.rfind(OUTPUT_MARKER) {
        Some(pos) => &reply[pos + OUTPUT_MARKER.len()..],
        None => reply,
    };
    let cleaned = tail
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .trim_matches('"')
        .trim();

    if cleaned.is_empty() { original.to_string() } else { cleaned.to_string() }
}
