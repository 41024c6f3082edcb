//! Research assistant orchestrator.
//!
//! [`ResearchAssistant`] ties the stages together for one query:
//! optional query transformation → retrieval → confidence gate → synthesis.
//! The three outcomes a caller must tell apart map to distinct values:
//! backend failures are `Err`, a low-confidence query is
//! [`Answer::NoRelevantDocuments`], and a confident one is
//! [`Answer::Synthesized`].
//!
//! # Example
//!
//! ```rust,ignore
//! use scholar_rag::{ResearchAssistant, ChunkRetriever, RetrievalConfig};
//!
//! let assistant = ResearchAssistant::builder()
//!     .retriever(Arc::new(retriever))
//!     .llm(Arc::new(llm))
//!     .confidence_threshold(0.8)
//!     .build()?;
//!
//! match assistant.ask("I am researching federated topic models", None).await? {
//!     Answer::Synthesized { text, .. } => println!("{text}"),
//!     Answer::NoRelevantDocuments => println!("{NO_RELEVANT_DOCUMENTS_MESSAGE}"),
//! }
//! ```

use std::sync::Arc;

use serde::{Serialize, Serializer};
use tracing::info;

use crate::config::AssistantConfig;
use crate::confidence::ConfidenceGate;
use crate::document::DocListResponse;
use crate::error::{RagError, Result};
use crate::llm::Llm;
use crate::query_transform::QueryTransformer;
use crate::retriever::Retriever;
use crate::synthesis::{NO_RELEVANT_DOCUMENTS_MESSAGE, ResponseSynthesizer, SynthesisStyle};

/// Result of [`ResearchAssistant::ask`].
///
/// Serializes as `{"outcome", "text", "documents"}` for both variants, so a
/// JSON consumer always receives the message shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// At least one document cleared the confidence gate.
    Synthesized {
        /// The model's comparison of the query with the documents.
        text: String,
        /// The gated documents the answer was built from.
        documents: Vec<DocListResponse>,
    },
    /// Nothing cleared the confidence gate; no generation was attempted.
    NoRelevantDocuments,
}

impl Answer {
    /// Text to show the user.
    pub fn text(&self) -> &str {
        match self {
            Self::Synthesized { text, .. } => text,
            Self::NoRelevantDocuments => NO_RELEVANT_DOCUMENTS_MESSAGE,
        }
    }

    /// Documents backing the answer; empty for [`Answer::NoRelevantDocuments`].
    pub fn documents(&self) -> &[DocListResponse] {
        match self {
            Self::Synthesized { documents, .. } => documents,
            Self::NoRelevantDocuments => &[],
        }
    }

    fn outcome(&self) -> &'static str {
        match self {
            Self::Synthesized { .. } => "synthesized",
            Self::NoRelevantDocuments => "no_relevant_documents",
        }
    }
}

impl Serialize for Answer {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            outcome: &'static str,
            text: &'a str,
            documents: &'a [DocListResponse],
        }

        Wire { outcome: self.outcome(), text: self.text(), documents: self.documents() }
            .serialize(serializer)
    }
}

/// Query-time pipeline over an already-ingested corpus.
pub struct ResearchAssistant {
    retriever: Arc<dyn Retriever>,
    gate: ConfidenceGate,
    synthesizer: ResponseSynthesizer,
    transformer: Option<QueryTransformer>,
    output_language: String,
}

impl ResearchAssistant {
    /// Create a new [`ResearchAssistantBuilder`].
    pub fn builder() -> ResearchAssistantBuilder {
        ResearchAssistantBuilder::default()
    }

    pub fn gate(&self) -> &ConfidenceGate {
        &self.gate
    }

    /// The query actually sent to the retriever.
    async fn search_query(&self, query: &str) -> Result<String> {
        match &self.transformer {
            Some(transformer) => transformer.transform(query).await,
            None => Ok(query.to_string()),
        }
    }

    /// Retrieve and gate without generating an answer.
    ///
    /// An empty list means no document was confident enough.
    ///
    /// # Errors
    ///
    /// [`RagError::InvalidQuery`] for blank input; backend errors otherwise.
    pub async fn lookup(&self, query: &str) -> Result<Vec<DocListResponse>> {
        if query.trim().is_empty() {
            return Err(RagError::InvalidQuery("query text must not be empty".to_string()));
        }
        let search_query = self.search_query(query).await?;
        let candidates = self.retriever.retrieve(&search_query).await?;
        Ok(self.gate.filter(&candidates))
    }

    /// Answer a research query in `output_language` (the configured language
    /// when `None`).
    ///
    /// The synthesis prompt uses the user's original wording, while retrieval
    /// uses the transformed query when transformation is enabled.
    pub async fn ask(&self, query: &str, output_language: Option<&str>) -> Result<Answer> {
        let documents = self.lookup(query).await?;
        if documents.is_empty() {
            info!("no document cleared the confidence gate, skipping generation");
            return Ok(Answer::NoRelevantDocuments);
        }

        let language = output_language.unwrap_or(&self.output_language);
        let text = self.synthesizer.synthesize(query, language, &documents).await?;
        Ok(Answer::Synthesized { text, documents })
    }
}

/// Builder for constructing a [`ResearchAssistant`].
///
/// `retriever` and `llm` are required.
pub struct ResearchAssistantBuilder {
    retriever: Option<Arc<dyn Retriever>>,
    llm: Option<Arc<dyn Llm>>,
    confidence_threshold: f32,
    synthesis_style: SynthesisStyle,
    transform_queries: bool,
    output_language: String,
}

impl Default for ResearchAssistantBuilder {
    fn default() -> Self {
        let config = AssistantConfig::default();
        Self {
            retriever: None,
            llm: None,
            confidence_threshold: config.retrieval.confidence_threshold,
            synthesis_style: config.synthesis_style,
            transform_queries: false,
            output_language: config.output_language,
        }
    }
}

impl ResearchAssistantBuilder {
    /// Take threshold, style, transformation and language from `config`.
    pub fn config(mut self, config: &AssistantConfig) -> Self {
        self.confidence_threshold = config.retrieval.confidence_threshold;
        self.synthesis_style = config.synthesis_style;
        self.transform_queries = config.transform_queries;
        self.output_language = config.output_language.clone();
        self
    }

    pub fn retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Model used for synthesis and, if enabled, query transformation.
    pub fn llm(mut self, llm: Arc<dyn Llm>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn synthesis_style(mut self, style: SynthesisStyle) -> Self {
        self.synthesis_style = style;
        self
    }

    pub fn transform_queries(mut self, enabled: bool) -> Self {
        self.transform_queries = enabled;
        self
    }

    pub fn output_language(mut self, language: impl Into<String>) -> Self {
        self.output_language = language.into();
        self
    }

    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or the
    /// threshold is outside `[0, 1]`.
    pub fn build(self) -> Result<ResearchAssistant> {
        let retriever = self
            .retriever
            .ok_or_else(|| RagError::ConfigError("retriever is required".to_string()))?;
        let llm = self.llm.ok_or_else(|| RagError::ConfigError("llm is required".to_string()))?;
        let gate = ConfidenceGate::new(self.confidence_threshold)?;

        Ok(ResearchAssistant {
            retriever,
            gate,
            transformer: self.transform_queries.then(|| QueryTransformer::new(Arc::clone(&llm))),
            synthesizer: ResponseSynthesizer::new(llm, self.synthesis_style),
            output_language: self.output_language,
        })
    }
}
