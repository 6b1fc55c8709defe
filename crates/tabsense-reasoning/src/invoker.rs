//! Thin seam between the pipeline and the completion capability.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument, warn};

use tabsense_core::{CompletionBackend, Result};

/// Submits finished prompts to the completion capability at the configured
/// temperature.
///
/// Failures are not retried here: `LlmUnavailable` propagates to the
/// pipeline caller as fatal for the current request. The embedding side is
/// a passthrough; its `None` sentinel is a normal outcome.
#[derive(Clone)]
pub struct LlmInvoker {
    backend: Arc<dyn CompletionBackend>,
    temperature: f32,
}

impl LlmInvoker {
    pub fn new(backend: Arc<dyn CompletionBackend>, temperature: f32) -> Self {
        Self {
            backend,
            temperature,
        }
    }

    /// Generation model name in use.
    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Submit a prompt, returning the raw generated text.
    #[instrument(skip(self, prompt), fields(subsystem = "reasoning", component = "invoker", op = "complete", model = %self.backend.model_name(), prompt_len = prompt.len()))]
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let result = self.backend.complete(prompt, self.temperature).await;
        let elapsed = start.elapsed().as_millis() as u64;

        match &result {
            Ok(text) => {
                debug!(
                    response_len = text.len(),
                    duration_ms = elapsed,
                    "Completion returned"
                );
            }
            Err(e) => {
                warn!(duration_ms = elapsed, error = %e, "Completion failed");
            }
        }
        result
    }

    /// Embed texts via the optional capability. `None` means the
    /// capability is absent or currently failing; callers fall back to
    /// hash-only comparisons.
    pub async fn embed(&self, texts: &[String]) -> Option<Vec<Vec<f32>>> {
        self.backend.embed(texts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tabsense_core::Error;

    struct TemperatureProbe {
        seen: Mutex<Vec<f32>>,
    }

    #[async_trait]
    impl CompletionBackend for TemperatureProbe {
        async fn complete(&self, _prompt: &str, temperature: f32) -> Result<String> {
            self.seen.lock().unwrap().push(temperature);
            Ok("ok".to_string())
        }

        async fn embed(&self, texts: &[String]) -> Option<Vec<Vec<f32>>> {
            Some(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn model_name(&self) -> &str {
            "probe"
        }
    }

    struct Unavailable;

    #[async_trait]
    impl CompletionBackend for Unavailable {
        async fn complete(&self, _prompt: &str, _temperature: f32) -> Result<String> {
            Err(Error::LlmUnavailable("connection refused".to_string()))
        }

        async fn embed(&self, _texts: &[String]) -> Option<Vec<Vec<f32>>> {
            None
        }

        fn model_name(&self) -> &str {
            "unavailable"
        }
    }

    #[tokio::test]
    async fn forwards_configured_temperature() {
        let probe = Arc::new(TemperatureProbe {
            seen: Mutex::new(Vec::new()),
        });
        let invoker = LlmInvoker::new(probe.clone(), 0.35);

        invoker.complete("p").await.unwrap();
        assert_eq!(*probe.seen.lock().unwrap(), vec![0.35]);
        assert_eq!(invoker.model_name(), "probe");
    }

    #[tokio::test]
    async fn propagates_unavailability_unretried() {
        let invoker = LlmInvoker::new(Arc::new(Unavailable), 0.2);
        let err = invoker.complete("p").await.unwrap_err();
        assert!(matches!(err, Error::LlmUnavailable(_)));
    }

    #[tokio::test]
    async fn embed_passes_through() {
        let probe = Arc::new(TemperatureProbe {
            seen: Mutex::new(Vec::new()),
        });
        let invoker = LlmInvoker::new(probe, 0.2);

        let vectors = invoker.embed(&["a".to_string()]).await.unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0]]);

        let none = LlmInvoker::new(Arc::new(Unavailable), 0.2);
        assert!(none.embed(&["a".to_string()]).await.is_none());
    }
}
