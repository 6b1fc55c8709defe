//! Optional prompt compression ahead of model invocation.

use std::sync::Arc;

use tracing::{debug, warn};

use tabsense_core::CompressionBackend;

/// Gate in front of the optional compression capability.
///
/// Compression is never essential: an unconfigured gate passes prompts
/// through unchanged, and a failing backend is logged and bypassed. This
/// operation cannot fail and cannot block the pipeline on a non-essential
/// dependency.
#[derive(Clone)]
pub struct CompressionGate {
    backend: Option<Arc<dyn CompressionBackend>>,
}

impl CompressionGate {
    pub fn new(backend: Option<Arc<dyn CompressionBackend>>) -> Self {
        Self { backend }
    }

    /// Gate with no compression capability configured.
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Compress the prompt when a capability is configured and succeeds;
    /// otherwise return the prompt unchanged.
    pub async fn maybe_compress(&self, prompt: String) -> String {
        let Some(backend) = &self.backend else {
            return prompt;
        };

        match backend.compress(&prompt).await {
            Ok(compressed) => {
                debug!(
                    subsystem = "reasoning",
                    component = "compression_gate",
                    prompt_len = prompt.len(),
                    response_len = compressed.len(),
                    "Prompt compressed"
                );
                compressed
            }
            Err(e) => {
                warn!(
                    subsystem = "reasoning",
                    component = "compression_gate",
                    error = %e,
                    "Prompt compression failed, using original prompt"
                );
                prompt
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tabsense_core::{Error, Result};

    struct Shortener;

    #[async_trait]
    impl CompressionBackend for Shortener {
        async fn compress(&self, prompt: &str) -> Result<String> {
            Ok(prompt[..prompt.len() / 2].to_string())
        }
    }

    struct AlwaysFails {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompressionBackend for AlwaysFails {
        async fn compress(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::Compression("network timeout".to_string()))
        }
    }

    #[tokio::test]
    async fn unconfigured_gate_is_identity() {
        let gate = CompressionGate::disabled();
        assert!(!gate.is_enabled());
        assert_eq!(gate.maybe_compress("prompt".to_string()).await, "prompt");
    }

    #[tokio::test]
    async fn successful_compression_is_forwarded() {
        let gate = CompressionGate::new(Some(Arc::new(Shortener)));
        assert!(gate.is_enabled());

        let out = gate.maybe_compress("12345678".to_string()).await;
        assert_eq!(out, "1234");
    }

    #[tokio::test]
    async fn failure_falls_back_to_original_prompt() {
        let backend = Arc::new(AlwaysFails {
            calls: AtomicUsize::new(0),
        });
        let gate = CompressionGate::new(Some(backend.clone()));

        let out = gate.maybe_compress("the original prompt".to_string()).await;
        assert_eq!(out, "the original prompt");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }
}
