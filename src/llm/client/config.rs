//! Gemini client configuration.
//!
//! Connection settings (endpoint, models, generation params) come from the
//! config file; the API key only ever comes from the environment.
//!
//! Env vars: GEMINI_API_KEY (GOOGLE_API_KEY accepted as fallback),
//! POLICYDESK_MODEL, POLICYDESK_EMBEDDING_MODEL, POLICYDESK_ENDPOINT

use serde::{Deserialize, Serialize};

/// Public Gemini REST endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Configuration for the Gemini client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API base URL (default: https://generativelanguage.googleapis.com)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Chat model used for triage and answers
    #[serde(default = "default_model")]
    pub model: String,
    /// Model used to embed document chunks and queries
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens in response (None = model default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// API key (from env only, never serialized)
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_embedding_model() -> String {
    "gemini-embedding-001".to_string()
}

fn default_temperature() -> f32 {
    0.0
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            temperature: default_temperature(),
            max_output_tokens: None,
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

impl LlmConfig {
    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup("GEMINI_API_KEY").or_else(|| lookup("GOOGLE_API_KEY")) {
            self.api_key = Some(key.trim().to_string());
        }
        if let Some(model) = lookup("POLICYDESK_MODEL") {
            self.model = model;
        }
        if let Some(model) = lookup("POLICYDESK_EMBEDDING_MODEL") {
            self.embedding_model = model;
        }
        if let Some(endpoint) = lookup("POLICYDESK_ENDPOINT") {
            self.endpoint = endpoint;
        }
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Get the provider name for display.
    pub fn provider_name(&self) -> &'static str {
        if self.endpoint.trim_end_matches('/') == DEFAULT_ENDPOINT {
            "Google Gemini"
        } else {
            "Gemini-compatible"
        }
    }

    /// Get an availability hint for error messages.
    pub fn availability_hint(&self) -> String {
        if self.api_key.is_none() {
            "GEMINI_API_KEY not set. Add it to .env or the environment (https://ai.google.dev/)"
                .to_string()
        } else {
            format!("Gemini API not reachable at {}", self.endpoint)
        }
    }
}
