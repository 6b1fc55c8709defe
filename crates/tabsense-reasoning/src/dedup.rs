//! Semantic deduplication of candidate insights.
//!
//! Two independent gates, applied left-to-right across a batch:
//!
//! 1. Exact: a candidate whose semantic hash matches a retained insight
//!    (or an earlier acceptance from the same batch) is dropped.
//! 2. Similarity: when the embedding capability yields vectors, a
//!    candidate whose maximum cosine similarity against retained and
//!    earlier-accepted embeddings reaches the threshold is dropped.
//!
//! Survivors get deterministic identities and keep their batch order.
//! Duplicates are dropped, never merged.

use chrono::Utc;
use tracing::{debug, trace};

use tabsense_core::{hashing, Insight};

use crate::invoker::LlmInvoker;
use crate::parser::InsightCandidate;

/// Cosine similarity between two vectors, `0.0` for mismatched or empty
/// inputs and for zero-magnitude vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom > 0.0 {
        dot / denom
    } else {
        0.0
    }
}

/// Decides which candidates are genuinely new for a dataset-version scope.
#[derive(Clone)]
pub struct InsightDeduplicator {
    similarity_threshold: f32,
}

impl InsightDeduplicator {
    pub fn new(similarity_threshold: f32) -> Self {
        Self {
            similarity_threshold,
        }
    }

    pub fn similarity_threshold(&self) -> f32 {
        self.similarity_threshold
    }

    /// Filter a candidate batch against the retained insights of a scope,
    /// returning the accepted candidates as fully-formed [`Insight`]s in
    /// surviving batch order.
    ///
    /// Candidate embeddings come from one batched `embed` call; the `None`
    /// sentinel skips the similarity gate entirely, leaving the exact-hash
    /// gate in force.
    pub async fn filter_new(
        &self,
        dataset_id: &str,
        version: &str,
        candidates: Vec<InsightCandidate>,
        existing: &[Insight],
        invoker: &LlmInvoker,
    ) -> Vec<Insight> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let embedding_texts: Vec<String> =
            candidates.iter().map(|c| c.embedding_text()).collect();
        let candidate_embeddings = invoker.embed(&embedding_texts).await;
        if candidate_embeddings.is_none() {
            debug!(
                subsystem = "reasoning",
                component = "dedup",
                dataset_id,
                version,
                "Embeddings unavailable, exact-hash dedup only"
            );
        }

        let mut accepted: Vec<Insight> = Vec::new();

        for (idx, candidate) in candidates.into_iter().enumerate() {
            let semantic_hash = hashing::semantic_hash(&candidate.dedup_key);

            let hash_taken = existing.iter().any(|i| i.semantic_hash == semantic_hash)
                || accepted.iter().any(|i| i.semantic_hash == semantic_hash);
            if hash_taken {
                trace!(
                    subsystem = "reasoning",
                    component = "dedup",
                    title = %candidate.title,
                    "Dropping exact duplicate"
                );
                continue;
            }

            let embedding = candidate_embeddings
                .as_ref()
                .and_then(|vecs| vecs.get(idx))
                .cloned();

            if let Some(candidate_vec) = &embedding {
                let max_similarity = existing
                    .iter()
                    .chain(accepted.iter())
                    .filter_map(|i| i.embedding.as_ref())
                    .map(|vec| cosine_similarity(candidate_vec, vec))
                    .fold(f32::NEG_INFINITY, f32::max);

                if max_similarity >= self.similarity_threshold {
                    debug!(
                        subsystem = "reasoning",
                        component = "dedup",
                        title = %candidate.title,
                        similarity = max_similarity,
                        "Dropping semantic duplicate"
                    );
                    continue;
                }
            }

            accepted.push(Insight {
                id: hashing::insight_id(dataset_id, version, &semantic_hash),
                dataset_id: dataset_id.to_string(),
                version: version.to_string(),
                title: candidate.title.clone(),
                summary: candidate.summary(),
                confidence: candidate.confidence,
                semantic_hash,
                embedding,
                created_at: Utc::now(),
            });
        }

        accepted
    }
}
