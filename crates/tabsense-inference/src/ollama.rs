//! Ollama completion backend implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use tabsense_core::{CompletionBackend, Error, OllamaConfig, Result};

/// Ollama completion backend.
///
/// Speaks the `/api/generate` endpoint for completions and `/api/embed`
/// for embeddings. The embedding capability is optional: when no embedding
/// model is configured, or when an embedding call fails for any reason,
/// [`CompletionBackend::embed`] returns the `None` sentinel rather than an
/// error.
pub struct OllamaBackend {
    client: Client,
    base_url: String,
    gen_model: String,
    embed_model: Option<String>,
    gen_timeout_secs: u64,
    embed_timeout_secs: u64,
}

impl OllamaBackend {
    /// Create a new Ollama backend from configuration.
    pub fn new(config: &OllamaConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.generation_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        info!(
            base_url = %config.base_url,
            gen_model = %config.generation_model,
            embed_model = config.embedding_model.as_deref().unwrap_or("<disabled>"),
            "Initializing Ollama backend"
        );

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            gen_model: config.generation_model.clone(),
            embed_model: config.embedding_model.clone(),
            gen_timeout_secs: config.generation_timeout_secs,
            embed_timeout_secs: config.embedding_timeout_secs,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self::new(&OllamaConfig::from_env())
    }

    /// True if an embedding model is configured.
    pub fn supports_embeddings(&self) -> bool {
        self.embed_model.is_some()
    }

    /// Check if the backend is available and responding.
    pub async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        match response {
            Ok(resp) => {
                if resp.status().is_success() {
                    info!("Ollama health check passed");
                    Ok(true)
                } else {
                    warn!("Ollama health check failed: {}", resp.status());
                    Ok(false)
                }
            }
            Err(e) => {
                warn!("Ollama health check error: {}", e);
                Ok(false)
            }
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl CompletionBackend for OllamaBackend {
    #[instrument(skip(self, prompt), fields(subsystem = "inference", component = "ollama", op = "complete", model = %self.gen_model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        let start = Instant::now();
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: self.gen_model.clone(),
            prompt: prompt.to_string(),
            temperature,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.gen_timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                Error::LlmUnavailable(format!("cannot reach Ollama at {}: {}", url, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::LlmUnavailable(format!(
                "Ollama at {} returned {}: {}",
                url, status, body
            )));
        }

        let result: GenerateResponse = response.json().await.map_err(|e| {
            Error::LlmUnavailable(format!("non-JSON response from Ollama at {}: {}", url, e))
        })?;

        let text = result.response.trim().to_string();
        if text.is_empty() {
            return Err(Error::LlmUnavailable(format!(
                "empty response from Ollama model {}",
                self.gen_model
            )));
        }

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            response_len = text.len(),
            duration_ms = elapsed,
            "Completion finished"
        );
        if elapsed > 30000 {
            warn!(
                duration_ms = elapsed,
                prompt_len = prompt.len(),
                slow = true,
                "Slow completion operation"
            );
        }
        Ok(text)
    }

    #[instrument(skip(self, texts), fields(subsystem = "inference", component = "ollama", op = "embed", input_count = texts.len()))]
    async fn embed(&self, texts: &[String]) -> Option<Vec<Vec<f32>>> {
        let model = match &self.embed_model {
            Some(m) => m.clone(),
            None => return None,
        };
        if texts.is_empty() {
            return Some(vec![]);
        }

        let start = Instant::now();
        let url = format!("{}/api/embed", self.base_url);
        let request = EmbeddingRequest {
            model,
            input: texts.to_vec(),
        };

        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.embed_timeout_secs))
            .json(&request)
            .send()
            .await;

        // Embedding failures are signalled as capability absence, not as
        // errors. The dedup path falls back to hash-only comparison.
        let response = match response {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                warn!(status = %resp.status(), "Embedding request rejected, falling back");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Embedding request failed, falling back");
                return None;
            }
        };

        let result: EmbeddingResponse = match response.json().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Embedding response undecodable, falling back");
                return None;
            }
        };

        if result.embeddings.len() != texts.len() {
            warn!(
                expected = texts.len(),
                got = result.embeddings.len(),
                "Embedding count mismatch, falling back"
            );
            return None;
        }

        debug!(
            result_count = result.embeddings.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Embedding complete"
        );
        Some(result.embeddings)
    }

    fn model_name(&self) -> &str {
        &self.gen_model
    }
}
