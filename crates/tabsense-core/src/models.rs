//! Versioned record types stored and exchanged by the pipeline.
//!
//! Schema and analysis payloads are opaque compressed JSON strings produced
//! by external collaborators. The core never parses their internal
//! structure; it embeds them verbatim into prompts and hashes them for
//! cache-key derivation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An identified snapshot of a dataset's ingested content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetVersion {
    pub dataset_id: String,
    pub version: String,
    /// Content hash of the ingested file.
    pub content_hash: String,
}

/// Compressed schema for a dataset version. Created once per ingested file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRecord {
    pub dataset_id: String,
    pub version: String,
    /// Hash of the source file this schema was extracted from.
    pub file_hash: String,
    /// Opaque compressed schema JSON.
    pub schema_json: String,
}

/// Compressed analysis signals for a dataset version. Created once per
/// `(dataset_id, version)` on first analysis request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub dataset_id: String,
    pub version: String,
    /// Opaque compressed analysis-result JSON.
    pub analysis_json: String,
    /// Content hash of `analysis_json`.
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A synthesized insight, owned by its dataset-version scope.
///
/// Immutable after creation. The scope's set only grows, via dedup-gated
/// insertion; insights are never merged or rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    /// Deterministic identity: stable across re-runs for the same semantic
    /// insight within the scope.
    pub id: String,
    pub dataset_id: String,
    pub version: String,
    pub title: String,
    /// Rendered summary: `"{title}: {technical_summary}"`.
    pub summary: String,
    /// Model-reported confidence, clamped to `[0, 1]`.
    pub confidence: f32,
    /// SHA-256 over the normalized dedup key.
    pub semantic_hash: String,
    /// Embedding captured at acceptance time, when the capability was
    /// available. `None` participates in hash-only dedup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

/// A cached natural-language answer, write-once per question fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub dataset_id: String,
    pub version: String,
    pub question_fingerprint: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

/// The four record kinds addressed by the content-addressed cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheKind {
    Schema,
    Analysis,
    InsightSet,
    Query,
}

impl std::fmt::Display for CacheKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schema => write!(f, "schema"),
            Self::Analysis => write!(f, "analysis"),
            Self::InsightSet => write!(f, "insight-set"),
            Self::Query => write!(f, "query"),
        }
    }
}

/// Content-addressed cache entry identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub kind: CacheKind,
    pub fingerprint: String,
}

impl CacheKey {
    pub fn new(kind: CacheKind, fingerprint: impl Into<String>) -> Self {
        Self {
            kind,
            fingerprint: fingerprint.into(),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.fingerprint)
    }
}
