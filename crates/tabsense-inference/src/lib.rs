//! # tabsense-inference
//!
//! Completion and compression backends for tabsense.
//!
//! This crate provides:
//! - `OllamaBackend`: local completion capability with optional embeddings
//! - `ScaleDownClient`: prompt compression capability
//! - Deterministic mock backends for testing (feature `mock`)
//!
//! # Example
//!
//! ```rust,no_run
//! use tabsense_core::{CompletionBackend, OllamaConfig};
//! use tabsense_inference::OllamaBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = OllamaBackend::new(&OllamaConfig::default());
//!     let text = backend.complete("Say hello.", 0.2).await.unwrap();
//!     println!("{text}");
//! }
//! ```

pub mod ollama;
pub mod scaledown;

// Mock backends for deterministic tests, shared with downstream crates.
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use ollama::OllamaBackend;
pub use scaledown::ScaleDownClient;
