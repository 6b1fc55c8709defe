//! Canonical default values shared across the workspace.
//!
//! Every tunable that appears in more than one crate is defined here once,
//! so the pipeline, the backends, and the tests agree on a single source
//! of truth.

/// Default Ollama endpoint.
pub const OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default generation model.
pub const GEN_MODEL: &str = "llama3.1:8b";

/// Default embedding model.
pub const EMBED_MODEL: &str = "nomic-embed-text";

/// Timeout for generation requests (seconds).
pub const GEN_TIMEOUT_SECS: u64 = 120;

/// Timeout for embedding requests (seconds).
pub const EMBED_TIMEOUT_SECS: u64 = 30;

/// Default ScaleDown compression endpoint.
pub const SCALEDOWN_URL: &str = "https://api.scaledown.xyz";

/// Timeout for compression requests (seconds).
pub const COMPRESS_TIMEOUT_SECS: u64 = 30;

/// Default sampling temperature for synthesis and query calls.
pub const TEMPERATURE: f32 = 0.2;

/// Maximum new insights accepted from a single synthesis round.
pub const MAX_NEW_INSIGHTS: usize = 8;

/// Cosine similarity at or above which a candidate insight is a duplicate.
pub const SIMILARITY_THRESHOLD: f32 = 0.88;

/// Hard cap on existing-insight summaries embedded in a synthesis prompt.
pub const SYNTHESIS_SUMMARY_CAP: usize = 50;

/// Hard cap on insight summaries embedded in a query prompt.
pub const QUERY_SUMMARY_CAP: usize = 80;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ollama_url_is_local() {
        assert!(OLLAMA_URL.starts_with("http://127.0.0.1"));
    }

    #[test]
    fn similarity_threshold_in_unit_range() {
        assert!(SIMILARITY_THRESHOLD > 0.0 && SIMILARITY_THRESHOLD < 1.0);
    }

    #[test]
    fn query_cap_exceeds_synthesis_cap() {
        // Query prompts carry more summaries since they add no candidates.
        assert!(QUERY_SUMMARY_CAP > SYNTHESIS_SUMMARY_CAP);
    }
}
