//! OpenAI-compatible HTTP backends: embeddings and chat completions.
//!
//! Both clients speak the `/v1/embeddings` and `/v1/chat/completions` wire
//! format, so they work against the OpenAI API as well as local servers that
//! mimic it (llama.cpp `server`, Ollama, text-embeddings-inference).
//!
//! This module is only available when the `openai` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::{EmbeddingSettings, LlmSettings};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::llm::{ChatMessage, GenerationConfig, Llm};

/// The default OpenAI API base URL.
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        error!(error = %e, "failed to build configured HTTP client, using defaults");
        reqwest::Client::new()
    })
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{path}", base_url.trim_end_matches('/'))
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Read a non-success response into a human-readable message.
async fn error_detail(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail =
        serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);
    format!("API returned {status}: {detail}")
}

// ── Embeddings ──────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by an OpenAI-compatible embeddings endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use scholar_rag::openai::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::new("BAAI/bge-small-en", 384)
///     .with_base_url("http://localhost:8080/v1");
/// let embedding = provider.embed("spin liquids").await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    dimensions: usize,
    /// If set, passed to the API for Matryoshka dimension truncation.
    request_dimensions: Option<usize>,
}

impl OpenAIEmbeddingProvider {
    /// Create a provider for `model` producing `dimensions`-length vectors.
    pub fn new(model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            client: build_client(Duration::from_secs(60)),
            base_url: OPENAI_API_BASE.to_string(),
            api_key: None,
            model: model.into(),
            dimensions,
            request_dimensions: None,
        }
    }

    /// Create a provider from [`EmbeddingSettings`].
    pub fn from_settings(settings: &EmbeddingSettings, api_key: Option<String>) -> Self {
        let mut provider = Self::new(&settings.model, settings.dimensions);
        if let Some(base_url) = &settings.base_url {
            provider = provider.with_base_url(base_url);
        }
        provider.api_key = api_key.filter(|k| !k.is_empty());
        provider
    }

    /// Point the provider at a different OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Send a bearer token with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Ask the API to truncate embeddings to `dims` (Matryoshka models).
    pub fn with_request_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.request_dimensions = Some(dims);
        self
    }

    fn err(message: impl Into<String>) -> RagError {
        RagError::EmbeddingError { provider: "OpenAI".into(), message: message.into() }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: Option<usize>,
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "OpenAI", text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| Self::err("API returned empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = "OpenAI",
            batch_size = texts.len(),
            model = %self.model,
            "embedding batch"
        );

        let request_body = EmbeddingRequest {
            model: &self.model,
            input: texts.to_vec(),
            dimensions: self.request_dimensions,
        };

        let mut request =
            self.client.post(endpoint(&self.base_url, "embeddings")).json(&request_body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            error!(provider = "OpenAI", error = %e, "embedding request failed");
            Self::err(format!("request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let detail = error_detail(response).await;
            error!(provider = "OpenAI", %detail, "embedding API error");
            return Err(Self::err(detail));
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = "OpenAI", error = %e, "failed to parse embedding response");
            Self::err(format!("failed to parse response: {e}"))
        })?;

        if parsed.data.len() != texts.len() {
            return Err(Self::err(format!(
                "requested {} embeddings, received {}",
                texts.len(),
                parsed.data.len()
            )));
        }
        // Servers may answer out of order; `index` restores request order.
        parsed.data.sort_by_key(|d| d.index.unwrap_or(usize::MAX));

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}

// ── Chat completions ────────────────────────────────────────

/// An [`Llm`] backed by an OpenAI-compatible chat completions endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use scholar_rag::openai::OpenAICompatibleLlm;
///
/// let llm = OpenAICompatibleLlm::new("llama-2-13b-chat")
///     .with_base_url("http://localhost:8080/v1");
/// ```
pub struct OpenAICompatibleLlm {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    generation: GenerationConfig,
}

impl OpenAICompatibleLlm {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: build_client(Duration::from_secs(120)),
            base_url: OPENAI_API_BASE.to_string(),
            api_key: None,
            model: model.into(),
            generation: GenerationConfig::default(),
        }
    }

    /// Create a client from [`LlmSettings`].
    pub fn from_settings(settings: &LlmSettings, api_key: Option<String>) -> Self {
        let mut llm = Self::new(&settings.model).with_generation(GenerationConfig {
            temperature: Some(settings.temperature),
            max_tokens: Some(settings.max_tokens),
        });
        llm.client = build_client(Duration::from_secs(settings.timeout_secs));
        if let Some(base_url) = &settings.base_url {
            llm.base_url = base_url.clone();
        }
        llm.api_key = api_key.filter(|k| !k.is_empty());
        llm
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    fn err(&self, message: impl Into<String>) -> RagError {
        RagError::LlmError { provider: self.model.clone(), message: message.into() }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
    /// Legacy completion-style servers put the text here.
    text: Option<String>,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[async_trait]
impl Llm for OpenAICompatibleLlm {
    fn name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        debug!(model = %self.model, messages = messages.len(), "sending chat request");

        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.generation.temperature,
            max_tokens: self.generation.max_tokens,
        };

        let mut request =
            self.client.post(endpoint(&self.base_url, "chat/completions")).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            error!(model = %self.model, error = %e, "chat request failed");
            self.err(format!("request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let detail = error_detail(response).await;
            error!(model = %self.model, %detail, "chat API error");
            return Err(self.err(detail));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!(model = %self.model, error = %e, "failed to parse chat response");
            self.err(format!("failed to parse response: {e}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.and_then(|m| m.content).or(choice.text))
            .ok_or_else(|| self.err("response contained no choices"))
    }
}
