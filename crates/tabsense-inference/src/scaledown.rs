//! ScaleDown prompt compression client.
//!
//! Compression only, never answer generation. The client raises on every
//! failure; recovery is the compression gate's job, which forwards the
//! uncompressed prompt instead.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use tabsense_core::{CompressionBackend, Error, Result, ScaleDownConfig};

/// ScaleDown compression client.
///
/// Endpoint: `POST {base}/compress/raw/` with the prompt as a plain-text
/// body and the API key in the `x-api-key` header.
pub struct ScaleDownClient {
    client: Client,
    base_url: String,
    api_key: String,
    timeout_secs: u64,
}

impl ScaleDownClient {
    /// Create a new compression client from configuration.
    pub fn new(config: &ScaleDownConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        info!(base_url = %config.base_url, "Initializing ScaleDown compression client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout_secs: config.timeout_secs,
        }
    }

    /// Create from environment variables, when `SCALEDOWN_API_KEY` is set.
    pub fn from_env() -> Option<Self> {
        ScaleDownConfig::from_env().map(|config| Self::new(&config))
    }
}

#[async_trait]
impl CompressionBackend for ScaleDownClient {
    #[instrument(skip(self, prompt), fields(subsystem = "inference", component = "scaledown", op = "compress", prompt_len = prompt.len()))]
    async fn compress(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let url = format!("{}/compress/raw/", self.base_url);

        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .header("x-api-key", &self.api_key)
            .header("Content-Type", "text/plain")
            .header("Accept", "text/plain")
            .body(prompt.to_string())
            .send()
            .await
            .map_err(|e| Error::Compression(format!("cannot reach ScaleDown at {}: {}", url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Compression(format!(
                "ScaleDown returned {}: {}",
                status, body
            )));
        }

        let compressed = response
            .text()
            .await
            .map_err(|e| Error::Compression(format!("unreadable ScaleDown response: {}", e)))?
            .trim()
            .to_string();

        if compressed.is_empty() {
            return Err(Error::Compression(
                "empty response from ScaleDown compression".to_string(),
            ));
        }

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            response_len = compressed.len(),
            duration_ms = elapsed,
            "Compression complete"
        );
        if compressed.len() > prompt.len() {
            warn!(
                prompt_len = prompt.len(),
                response_len = compressed.len(),
                "Compression output larger than input"
            );
        }
        Ok(compressed)
    }
}
