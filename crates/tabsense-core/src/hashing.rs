//! Deterministic hashing and fingerprint derivation.
//!
//! Every cache key, insight identity, and dedup comparison in the pipeline
//! reduces to one of the functions here. All of them are pure: the same
//! input always yields the same hex digest, across runs and across
//! processes.

use sha2::{Digest, Sha256};

/// Deterministic SHA-256 of a UTF-8 string, as lowercase hex.
pub fn stable_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Normalize free text for semantic hashing.
///
/// Case-folds, collapses internal whitespace runs to single spaces, and
/// strips punctuation other than word characters and hyphens, so hashes
/// stay stable across trivial phrasing differences.
pub fn normalize_text(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let filtered: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .collect();
    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Semantic hash of a dedup key: SHA-256 over the normalized text.
pub fn semantic_hash(dedup_key: &str) -> String {
    stable_hash(&normalize_text(dedup_key))
}

/// Deterministic insight identity, stable across re-runs for the same
/// semantic insight within a dataset-version scope.
pub fn insight_id(dataset_id: &str, version: &str, semantic_hash: &str) -> String {
    let base = format!("{}|{}|{}", dataset_id, version, semantic_hash);
    stable_hash(&base)[..16].to_string()
}

/// Fingerprint addressing a cached query answer.
///
/// Incorporates dataset identity, version, and the normalized question so
/// identical questions against different versions never collide.
pub fn query_fingerprint(dataset_id: &str, version: &str, question: &str) -> String {
    stable_hash(&format!(
        "{}|{}|{}",
        dataset_id,
        version,
        normalize_text(question)
    ))
}

/// Fingerprint addressing one synthesis round.
///
/// Hashes the scope identity together with content hashes of every input
/// the prompt is built from. A repeat call with byte-identical inputs is a
/// cache hit; any drift (including growth of the existing-summary set)
/// produces a fresh fingerprint.
pub fn synthesis_fingerprint(
    dataset_id: &str,
    version: &str,
    schema_text: &str,
    analysis_text: &str,
    existing_summaries: &[String],
) -> String {
    let summaries_digest = stable_hash(&existing_summaries.join("\n"));
    stable_hash(&format!(
        "{}|{}|{}|{}|{}",
        dataset_id,
        version,
        stable_hash(schema_text),
        stable_hash(analysis_text),
        summaries_digest
    ))
}
