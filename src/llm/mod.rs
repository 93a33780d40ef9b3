//! Model integration for triage and policy question answering.
//!
//! Uses Google Gemini for both chat completion and embeddings.

mod client;

pub use client::prompts;
pub use client::{
    ChatModel, ChatRequest, Embedder, EmbeddingTask, GeminiClient, LlmConfig, LlmError,
    DEFAULT_ENDPOINT,
};
