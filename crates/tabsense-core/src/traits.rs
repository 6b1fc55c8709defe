//! Capability traits for external inference services.
//!
//! These traits define the interfaces that concrete backends must satisfy,
//! enabling pluggable transports and testability. Absence of an optional
//! capability is represented by omitting the dependency (compression) or by
//! a sentinel result (embeddings), never by runtime type inspection.

use async_trait::async_trait;

use crate::error::Result;

/// Backend for text completion, with optional embedding support.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Submit a finished prompt and sampling temperature, returning raw
    /// generated text.
    ///
    /// Fails with [`crate::Error::LlmUnavailable`] when the capability
    /// cannot be reached, times out, or the target model is absent. The
    /// failure is not retried here; it propagates to the pipeline caller.
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String>;

    /// Generate embeddings for the given texts, one vector per input.
    ///
    /// `None` is the "not supported" sentinel: an unconfigured embedding
    /// model or a failed embedding call both yield `None`, never an error,
    /// and downstream consumers fall back to hash-only deduplication.
    async fn embed(&self, texts: &[String]) -> Option<Vec<Vec<f32>>>;

    /// Generation model name in use.
    fn model_name(&self) -> &str;
}

/// Backend for prompt compression.
///
/// Compression is a token-reduction service only; it never generates
/// answers. Failures here are recoverable by construction: the compression
/// gate catches them and forwards the uncompressed prompt.
#[async_trait]
pub trait CompressionBackend: Send + Sync {
    /// Compress a prompt to reduce its token count.
    async fn compress(&self, prompt: &str) -> Result<String>;
}
