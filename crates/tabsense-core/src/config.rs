//! Process-wide pipeline configuration.
//!
//! Configuration is constructed once at startup (from literals or
//! environment variables), validated, and threaded through constructors.
//! Nothing in the pipeline reads the environment after this point.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::defaults;
use crate::error::{Error, Result};

fn env_var(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => Some(v),
        _ => None,
    }
}

/// Ollama completion backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for the Ollama API.
    pub base_url: String,
    /// Model used for text generation.
    pub generation_model: String,
    /// Model used for embeddings. `None` disables the embedding capability
    /// and the pipeline falls back to hash-only deduplication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    /// Timeout for generation requests (seconds).
    pub generation_timeout_secs: u64,
    /// Timeout for embedding requests (seconds).
    pub embedding_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::OLLAMA_URL.to_string(),
            generation_model: defaults::GEN_MODEL.to_string(),
            embedding_model: None,
            generation_timeout_secs: defaults::GEN_TIMEOUT_SECS,
            embedding_timeout_secs: defaults::EMBED_TIMEOUT_SECS,
        }
    }
}

impl OllamaConfig {
    /// Build from environment variables, falling back to defaults.
    ///
    /// Recognized: `OLLAMA_BASE_URL`, `OLLAMA_MODEL`, `OLLAMA_EMBED_MODEL`,
    /// `OLLAMA_TIMEOUT_SECONDS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env_var("OLLAMA_BASE_URL").unwrap_or(defaults.base_url),
            generation_model: env_var("OLLAMA_MODEL").unwrap_or(defaults.generation_model),
            embedding_model: env_var("OLLAMA_EMBED_MODEL"),
            generation_timeout_secs: env_var("OLLAMA_TIMEOUT_SECONDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.generation_timeout_secs),
            embedding_timeout_secs: defaults.embedding_timeout_secs,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::Config("Ollama base_url cannot be empty".to_string()));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "Ollama base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }

        if self.generation_model.is_empty() {
            return Err(Error::Config(
                "Ollama generation_model cannot be empty".to_string(),
            ));
        }

        if matches!(&self.embedding_model, Some(m) if m.is_empty()) {
            return Err(Error::Config(
                "Ollama embedding_model cannot be empty when set".to_string(),
            ));
        }

        Ok(())
    }
}

/// ScaleDown compression client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleDownConfig {
    /// API key sent in the `x-api-key` header.
    pub api_key: String,
    /// Base URL for the compression API.
    pub base_url: String,
    /// Timeout for compression requests (seconds).
    pub timeout_secs: u64,
}

impl ScaleDownConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: defaults::SCALEDOWN_URL.to_string(),
            timeout_secs: defaults::COMPRESS_TIMEOUT_SECS,
        }
    }

    /// Build from environment variables. Returns `None` when no
    /// `SCALEDOWN_API_KEY` is present: the compression capability is
    /// simply not configured in that case.
    ///
    /// Recognized: `SCALEDOWN_API_KEY`, `SCALEDOWN_BASE_URL`,
    /// `SCALEDOWN_TIMEOUT_SECONDS`.
    pub fn from_env() -> Option<Self> {
        let api_key = env_var("SCALEDOWN_API_KEY")?;
        let mut config = Self::new(api_key);
        if let Some(base_url) = env_var("SCALEDOWN_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(timeout) = env_var("SCALEDOWN_TIMEOUT_SECONDS").and_then(|v| v.parse().ok()) {
            config.timeout_secs = timeout;
        }
        Some(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(Error::Config("ScaleDown api_key cannot be empty".to_string()));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "ScaleDown base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }

        Ok(())
    }
}

/// Top-level pipeline configuration, built once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub ollama: OllamaConfig,
    /// Compression capability; `None` means prompts pass through unchanged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaledown: Option<ScaleDownConfig>,
    /// Sampling temperature for synthesis and query completions.
    pub temperature: f32,
    /// Maximum new insights accepted per synthesis round.
    pub max_new_insights: usize,
    /// Cosine similarity at or above which a candidate is a duplicate.
    pub similarity_threshold: f32,
    /// Optional JSON snapshot path for the memory store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ollama: OllamaConfig::default(),
            scaledown: None,
            temperature: defaults::TEMPERATURE,
            max_new_insights: defaults::MAX_NEW_INSIGHTS,
            similarity_threshold: defaults::SIMILARITY_THRESHOLD,
            persist_path: None,
        }
    }
}

impl PipelineConfig {
    /// Build from environment variables, falling back to defaults.
    ///
    /// Recognized beyond the backend variables: `MEMORY_STORE_PATH`.
    pub fn from_env() -> Self {
        let config = Self {
            ollama: OllamaConfig::from_env(),
            scaledown: ScaleDownConfig::from_env(),
            persist_path: env_var("MEMORY_STORE_PATH").map(PathBuf::from),
            ..Self::default()
        };
        debug!(
            compression = config.scaledown.is_some(),
            embeddings = config.ollama.embedding_model.is_some(),
            persistence = config.persist_path.is_some(),
            "Pipeline configuration loaded from environment"
        );
        config
    }

    /// Validate the full configuration.
    pub fn validate(&self) -> Result<()> {
        self.ollama.validate()?;
        if let Some(scaledown) = &self.scaledown {
            scaledown.validate()?;
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::Config(format!(
                "temperature must be in [0, 2], got: {}",
                self.temperature
            )));
        }

        if self.max_new_insights == 0 {
            return Err(Error::Config(
                "max_new_insights must be at least 1".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(Error::Config(format!(
                "similarity_threshold must be in [0, 1], got: {}",
                self.similarity_threshold
            )));
        }

        Ok(())
    }
}
