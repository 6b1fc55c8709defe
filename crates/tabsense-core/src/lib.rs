//! # tabsense-core
//!
//! Core types, traits, and abstractions for the tabsense insight engine.
//!
//! This crate provides:
//! - The workspace-wide error taxonomy and `Result` alias
//! - Versioned record types (schemas, analyses, insights, query answers)
//! - Capability traits for completion and compression backends
//! - Deterministic hashing and fingerprint derivation
//! - Process-wide pipeline configuration
//! - Structured logging field schema

pub mod config;
pub mod defaults;
pub mod error;
pub mod hashing;
pub mod logging;
pub mod models;
pub mod traits;

pub use config::{OllamaConfig, PipelineConfig, ScaleDownConfig};
pub use error::{Error, Result};
pub use hashing::{
    insight_id, normalize_text, query_fingerprint, semantic_hash, stable_hash,
    synthesis_fingerprint,
};
pub use models::{
    AnalysisRecord, CacheKey, CacheKind, DatasetVersion, Insight, QueryRecord, SchemaRecord,
};
pub use traits::{CompletionBackend, CompressionBackend};
