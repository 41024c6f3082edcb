//! Response synthesis: compare the user's research query with the gated
//! documents through a language model.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::document::DocListResponse;
use crate::error::Result;
use crate::llm::{ChatMessage, Llm};

/// Reply used whenever no document clears the confidence gate.
pub const NO_RELEVANT_DOCUMENTS_MESSAGE: &str =
    "I have not found relevant documents about the topic you are researching.";

/// Layout of the synthesized answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisStyle {
    /// Summary of matches plus the gaps and differences from the query.
    #[default]
    Comparison,
    /// One summary paragraph followed by `Index. Title (Similarity): summary` lines.
    Annotated,
}

/// Builds prompts from gated documents and asks the LLM for the answer.
pub struct ResponseSynthesizer {
    llm: Arc<dyn Llm>,
    style: SynthesisStyle,
}

impl ResponseSynthesizer {
    pub fn new(llm: Arc<dyn Llm>, style: SynthesisStyle) -> Self {
        Self { llm, style }
    }

    pub fn style(&self) -> SynthesisStyle {
        self.style
    }

    /// The system / user / instruction message triple sent to the model.
    pub fn build_messages(
        &self,
        query: &str,
        output_language: &str,
        documents: &[DocListResponse],
    ) -> Vec<ChatMessage> {
        let listing = match self.style {
            SynthesisStyle::Comparison => documents
                .iter()
                .enumerate()
                .map(|(i, doc)| {
                    format!(
                        "Document {}: Title: '{}' | Similarity Score: {}\nAbstract: {}",
                        i + 1,
                        doc.title,
                        doc.similarity,
                        doc.abstract_text
                    )
                })
                .collect::<Vec<_>>(),
            SynthesisStyle::Annotated => documents
                .iter()
                .map(|doc| {
                    format!(
                        "{}. Title: '{}' | Similarity Score: {}\nAbstract: {}",
                        doc.index, doc.title, doc.similarity, doc.abstract_text
                    )
                })
                .collect::<Vec<_>>(),
        }
        .join("\n");

        let prompt = format!(
            "User Query:\n\"{query}\"\n\nRetrieved Documents for Comparison:\n{listing}\n\n\
             Synthesize the comparison in a concise, professional summary."
        );

        let (system, instructions) = match self.style {
            SynthesisStyle::Comparison => (
                format!(
                    "You are a research assistant that compares a research query with related \
                     papers. Summarize the key findings, point out similarities, and note any gaps \
                     or differences. Answer clearly and concisely in {output_language}."
                ),
                format!(
                    "Instructions:\n\
                     1. Summarize the points of each document that relate closely to the query.\n\
                     2. Name the matching documents by title together with their similarity scores.\n\
                     3. Explain differences, gaps, or conflicts between the query and the documents.\n\
                     4. If no document really matches the topic, answer exactly: \
                     '{NO_RELEVANT_DOCUMENTS_MESSAGE}'"
                ),
            ),
            SynthesisStyle::Annotated => (
                format!(
                    "You are a research assistant that compares a research query with retrieved \
                     papers. Write one short paragraph on how the documents relate to the query, \
                     then list each relevant document. Do not consult any other source. \
                     Answer in {output_language}."
                ),
                format!(
                    "Instructions:\n\
                     1. Write at most one paragraph comparing the query with the documents.\n\
                     2. Then list each relevant document as:\n   \
                     <index>. <title> (<similarity>): <short summary of the abstract>\n\
                     3. If no document is relevant, answer only: '{NO_RELEVANT_DOCUMENTS_MESSAGE}'\n\
                     4. Add nothing beyond the paragraph and the list."
                ),
            ),
        };

        vec![
            ChatMessage::system(system),
            ChatMessage::user(prompt),
            ChatMessage::system(instructions),
        ]
    }

    /// Produce the answer text.
    ///
    /// With no documents the model is not called and
    /// [`NO_RELEVANT_DOCUMENTS_MESSAGE`] is returned.
    ///
    /// # Errors
    ///
    /// Propagates [`RagError::LlmError`](crate::RagError::LlmError) from the model.
    pub async fn synthesize(
        &self,
        query: &str,
        output_language: &str,
        documents: &[DocListResponse],
    ) -> Result<String> {
        if documents.is_empty() {
            return Ok(NO_RELEVANT_DOCUMENTS_MESSAGE.to_string());
        }

        let messages = self.build_messages(query, output_language, documents);
        let reply = self.llm.chat(&messages).await.inspect_err(|e| {
            error!(model = self.llm.name(), error = %e, "response synthesis failed");
        })?;

        info!(model = self.llm.name(), documents = documents.len(), "response synthesized");
        Ok(reply.trim().to_string())
    }
}
