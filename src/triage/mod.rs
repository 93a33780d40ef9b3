//! Request triage.
//!
//! Sends the triage instruction plus the user's message to the chat model
//! and validates the JSON verdict it returns.

mod models;

use tracing::{debug, info};

use crate::llm::prompts::TRIAGE_PROMPT;
use crate::llm::{ChatModel, ChatRequest, LlmError};

pub use models::{parse_triage_response, Decision, TriageResult, Urgency};

/// Classifies service-desk messages.
pub struct Triager<'a, M: ChatModel + ?Sized> {
    model: &'a M,
}

impl<'a, M: ChatModel + ?Sized> Triager<'a, M> {
    /// Create a triager for `model`.
    pub fn new(model: &'a M) -> Self {
        Self { model }
    }

    /// Classify one message. One model call, no retry.
    pub async fn classify(&self, message: &str) -> Result<TriageResult, LlmError> {
        debug!("Triaging message ({} chars)", message.len());
        let request = ChatRequest::new(message)
            .with_system(TRIAGE_PROMPT)
            .json();
        let reply = self.model.complete(&request).await?;
        let result = parse_triage_response(&reply)?;
        info!(
            "Triage: decision={} urgency={} missing={}",
            result.decision,
            result.urgency,
            result.missing_fields.len()
        );
        Ok(result)
    }
}
