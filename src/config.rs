//! Configuration management for policydesk using the prefer crate.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::llm::LlmConfig;

/// Default directory scanned for policy PDFs.
pub const DEFAULT_DOCS_DIR: &str = "docs";

/// Chunking and retrieval parameters for the question-answering assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum characters per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Maximum number of chunks handed to the model per question.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Minimum cosine similarity a chunk must exceed to be used.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
}

fn default_chunk_size() -> usize {
    300
}

fn default_chunk_overlap() -> usize {
    30
}

fn default_top_k() -> usize {
    4
}

fn default_score_threshold() -> f32 {
    0.3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            score_threshold: default_score_threshold(),
        }
    }
}

/// Application settings, resolved from config file, environment and defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory scanned for policy PDFs.
    pub docs_dir: PathBuf,
    /// Model client settings.
    pub llm: LlmConfig,
    /// Chunking and retrieval parameters.
    pub retrieval: RetrievalConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from(DEFAULT_DOCS_DIR),
            llm: LlmConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Directory containing policy PDFs (relative to the config file).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_dir: Option<String>,
    /// Gemini client configuration.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Chunking and retrieval parameters.
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers policydesk config files in standard locations.
    pub async fn load() -> Self {
        // Use prefer for file discovery, then parse with serde
        match prefer::load("policydesk").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config file {}: {:#}", path.display(), e);
                            Self::default_with_env()
                        }
                    }
                } else {
                    Self::default_with_env()
                }
            }
            Err(_) => {
                // No config file found, use defaults with env overrides
                Self::default_with_env()
            }
        }
    }

    /// Create a default config with environment variable overrides applied.
    pub fn default_with_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let mut config = Self::parse(&contents, path)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config.with_env_overrides())
    }

    /// Parse config contents, picking the format from the file extension.
    pub fn parse(contents: &str, path: &Path) -> anyhow::Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let config = match ext {
            "toml" => toml::from_str(contents).context("Failed to parse TOML config")?,
            "yaml" | "yml" => {
                serde_yaml::from_str(contents).context("Failed to parse YAML config")?
            }
            _ => serde_json::from_str(contents).context("Failed to parse JSON config")?,
        };
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("POLICYDESK_DOCS_DIR").filter(|s| !s.trim().is_empty()) {
            self.docs_dir = Some(dir);
        }
        self.llm = self.llm.with_overrides(lookup);
        self
    }

    /// Get the base directory for resolving relative paths.
    /// Returns the config file's parent directory if available, otherwise None.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    /// `base_dir` is used to resolve relative paths (typically config file dir or CWD).
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref docs_dir) = self.docs_dir {
            settings.docs_dir = self.resolve_path(docs_dir, base_dir);
        }
        settings.llm = self.llm.clone();
        settings.retrieval = self.retrieval.clone();
    }

    /// Render the config as TOML. The API key is never included.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
}

/// Load config from the explicit path or by discovery.
async fn load_file_config(options: &LoadOptions) -> Config {
    // Priority 1: Explicit --config flag
    if let Some(ref config_path) = options.config_path {
        return match Config::load_from_path(config_path).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{:#}; using defaults", e);
                Config::default_with_env()
            }
        };
    }

    // Priority 2: Auto-discover via prefer
    Config::load().await
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let config = load_file_config(&options).await;
    let mut settings = Settings::default();

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }
    tracing::debug!("Policy documents directory: {}", settings.docs_dir.display());

    (settings, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_toml() {
        let toml = r#"
docs_dir = "policies"

[llm]
model = "gemini-2.5-pro"
temperature = 0.2

[retrieval]
top_k = 6
score_threshold = 0.5
"#;
        let config = Config::parse(toml, Path::new("policydesk.toml")).unwrap();
        assert_eq!(config.docs_dir.as_deref(), Some("policies"));
        assert_eq!(config.llm.model, "gemini-2.5-pro");
        assert_eq!(config.llm.embedding_model, "gemini-embedding-001");
        assert_eq!(config.retrieval.top_k, 6);
        assert_eq!(config.retrieval.chunk_size, 300);
        assert_eq!(config.retrieval.chunk_overlap, 30);
    }

    #[test]
    fn test_parse_yaml_and_json() {
        let yaml = "retrieval:\n  chunk_size: 500\n";
        let config = Config::parse(yaml, Path::new("policydesk.yaml")).unwrap();
        assert_eq!(config.retrieval.chunk_size, 500);

        let json = r#"{"llm": {"model": "gemini-2.0-flash"}}"#;
        let config = Config::parse(json, Path::new("policydesk.json")).unwrap();
        assert_eq!(config.llm.model, "gemini-2.0-flash");
        assert_eq!(config.retrieval, RetrievalConfig::default());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Config::parse("[llm\nmodel=", Path::new("x.toml")).is_err());
    }

    #[test]
    fn test_api_key_in_file_is_ignored() {
        let toml = "[llm]\napi_key = \"from-file\"\n";
        let config = Config::parse(toml, Path::new("policydesk.toml")).unwrap();
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("POLICYDESK_DOCS_DIR", "/srv/policies"),
            ("GEMINI_API_KEY", "key"),
        ]
        .into_iter()
        .collect();
        let config = Config::default().with_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.docs_dir.as_deref(), Some("/srv/policies"));
        assert_eq!(config.llm.api_key(), Some("key"));
    }

    #[test]
    fn test_apply_to_settings_resolves_relative_docs_dir() {
        let config = Config {
            docs_dir: Some("policies".to_string()),
            ..Default::default()
        };
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, Path::new("/etc/policydesk"));
        assert_eq!(settings.docs_dir, PathBuf::from("/etc/policydesk/policies"));

        let config = Config {
            docs_dir: Some("/abs/docs".to_string()),
            ..Default::default()
        };
        config.apply_to_settings(&mut settings, Path::new("/etc/policydesk"));
        assert_eq!(settings.docs_dir, PathBuf::from("/abs/docs"));
    }

    #[test]
    fn test_to_toml_redacts_key() {
        let mut config = Config::default();
        config.llm.api_key = Some("super-secret".to_string());
        let rendered = config.to_toml().unwrap();
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("gemini-2.5-flash"));
    }

    #[tokio::test]
    async fn test_load_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("policydesk.toml");
        std::fs::write(&path, "docs_dir = \"pdfs\"\n").unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
        assert_eq!(config.base_dir().as_deref(), Some(dir.path()));
    }
}
