//! Error types for tabsense.

use thiserror::Error;

/// Result type alias using tabsense's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for tabsense operations.
///
/// Every variant carries a `String` payload so the enum stays `Clone`:
/// the compute cache broadcasts one outcome to every waiter on a key, and
/// that requires cloning failures as well as values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Completion capability unreachable, timed out, or model missing.
    /// Fatal for the current request; never retried internally.
    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    /// Compression capability failed. Raised by the client, absorbed by
    /// the compression gate; never surfaced to entry-point callers.
    #[error("Compression error: {0}")]
    Compression(String),

    /// Model output did not conform to the expected structure. Recovered
    /// with request-kind-specific fallbacks.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Malformed dataset identity, version, or question. Rejected before
    /// any external call is made.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Embedding generation failed.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O operation failed (persistence snapshots).
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}
