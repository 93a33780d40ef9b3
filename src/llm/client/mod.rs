//! Gemini client for chat completion and embeddings.
//!
//! Talks to the Generative Language REST API:
//! - `models/{model}:generateContent` for triage and answers
//! - `models/{model}:batchEmbedContents` for chunk and query vectors
//!
//! Every call is a single request; there is no retry or backoff.

mod config;
pub mod prompts;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use config::{LlmConfig, DEFAULT_ENDPOINT};

/// Maximum number of texts the API accepts in one batchEmbedContents call.
const MAX_EMBED_BATCH: usize = 100;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Errors that can occur during model calls.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Failed to reach the API
    #[error("Connection error: {0}")]
    Connection(String),
    /// API returned an error
    #[error("API error: {0}")]
    Api(String),
    /// Failed to parse or validate a response
    #[error("Parse error: {0}")]
    Parse(String),
    /// No API key configured
    #[error("GEMINI_API_KEY not set. Add it to .env or the environment (https://ai.google.dev/)")]
    MissingApiKey,
}

/// Request envelope shared by chat model implementations.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    /// System instruction, if any.
    pub system: Option<&'a str>,
    /// User turn.
    pub prompt: &'a str,
    /// Ask the model to reply with a JSON document.
    pub json_output: bool,
}

impl<'a> ChatRequest<'a> {
    pub fn new(prompt: &'a str) -> Self {
        Self {
            system: None,
            prompt,
            json_output: false,
        }
    }

    pub fn with_system(mut self, system: &'a str) -> Self {
        self.system = Some(system);
        self
    }

    pub fn json(mut self) -> Self {
        self.json_output = true;
        self
    }
}

/// A model that turns a prompt into free text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<String, LlmError>;
}

/// A model that turns text into fixed-length vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed document chunks for storage in the index.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;

    /// Embed a user query for retrieval.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, LlmError>;
}

/// Embedding task hint understood by Gemini embedding models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmbeddingTask {
    RetrievalDocument,
    RetrievalQuery,
}

/// Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    config: LlmConfig,
    api_key: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    #[serde(rename = "taskType")]
    task_type: EmbeddingTask,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GeminiClient {
    /// Create a new Gemini client with the given configuration.
    ///
    /// Fails when no API key is configured.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/v1beta/{}:{}",
            self.config.endpoint.trim_end_matches('/'),
            model_path(model),
            method
        )
    }

    /// Authenticated JSON POST.
    fn request<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> RequestBuilder {
        self.client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
    }

    /// POST a JSON body and decode the JSON reply, mapping API errors.
    async fn post<B, R>(&self, url: &str, body: &B) -> Result<R, LlmError>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let resp = self
            .request(url, body)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!(
                "HTTP {}: {}",
                status,
                api_error_message(&body)
            )));
        }

        resp.json().await.map_err(|e| LlmError::Parse(e.to_string()))
    }

    async fn embed(&self, texts: &[&str], task: EmbeddingTask) -> Result<Vec<Vec<f32>>, LlmError> {
        let model = model_path(&self.config.embedding_model);
        let url = self.model_url(&self.config.embedding_model, "batchEmbedContents");
        let mut vectors = Vec::with_capacity(texts.len());

        for request in build_batches(&model, texts, task) {
            let expected = request.requests.len();
            debug!("Embedding batch of {} texts ({:?})", expected, task);
            let response: BatchEmbedResponse = self.post(&url, &request).await?;
            vectors.extend(batch_vectors(expected, response)?);
        }

        Ok(vectors)
    }
}

/// Group texts into batchEmbedContents requests of at most
/// `MAX_EMBED_BATCH` entries each.
fn build_batches<'a>(
    model: &'a str,
    texts: &[&'a str],
    task: EmbeddingTask,
) -> Vec<BatchEmbedRequest<'a>> {
    texts
        .chunks(MAX_EMBED_BATCH)
        .map(|batch| BatchEmbedRequest {
            requests: batch
                .iter()
                .map(|&text| EmbedRequest {
                    model,
                    content: Content {
                        role: None,
                        parts: vec![Part { text }],
                    },
                    task_type: task,
                })
                .collect(),
        })
        .collect()
}

/// Vectors of one batch reply; the count must match the request.
fn batch_vectors(expected: usize, response: BatchEmbedResponse) -> Result<Vec<Vec<f32>>, LlmError> {
    if response.embeddings.len() != expected {
        return Err(LlmError::Parse(format!(
            "Expected {} embeddings, got {}",
            expected,
            response.embeddings.len()
        )));
    }
    Ok(response.embeddings.into_iter().map(|e| e.values).collect())
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<String, LlmError> {
        let body = GenerateRequest {
            system_instruction: request.system.map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
                response_mime_type: request.json_output.then_some("application/json"),
            },
        };

        let url = self.model_url(&self.config.model, "generateContent");
        debug!("Calling {} ({} chars)", self.config.model, request.prompt.len());
        let response: GenerateResponse = self.post(&url, &body).await?;
        extract_text(response)
    }
}

#[async_trait]
impl Embedder for GeminiClient {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        self.embed(&refs, EmbeddingTask::RetrievalDocument).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.embed(&[text], EmbeddingTask::RetrievalQuery)
            .await?
            .pop()
            .ok_or_else(|| LlmError::Parse("Empty embedding response".to_string()))
    }
}

/// Qualify a bare model id with the `models/` prefix the API expects.
fn model_path(model: &str) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

/// Pull the human-readable message out of an API error body.
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(status) => format!("{} ({})", envelope.error.message, status),
            None => envelope.error.message,
        },
        Err(_) => body.trim().to_string(),
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(response: GenerateResponse) -> Result<String, LlmError> {
    let candidate = match response.candidates.and_then(|c| c.into_iter().next()) {
        Some(candidate) => candidate,
        None => {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(LlmError::Api(format!("Prompt rejected: {}", reason)));
        }
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
        return Err(LlmError::Parse(format!(
            "Empty response (finish reason: {})",
            reason
        )));
    }

    Ok(text)
}
