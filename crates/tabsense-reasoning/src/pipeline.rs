//! Pipeline entry points: insight synthesis and query answering.
//!
//! Both entry points are cache-first: a request's fingerprint is checked
//! against stored state before any prompt is built, and on a miss the
//! whole build → compress → invoke → parse → dedupe/store sequence runs
//! under the compute cache's per-key single-flight discipline. Only
//! `LlmUnavailable` and `InvalidRequest` surface to callers; every other
//! failure mode is absorbed with its documented fallback.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use tabsense_core::{
    hashing, CacheKey, CacheKind, CompletionBackend, CompressionBackend, Error, Insight,
    PipelineConfig, QueryRecord, Result,
};
use tabsense_memory::{ComputeCache, MemoryStore};

use crate::compression::CompressionGate;
use crate::dedup::InsightDeduplicator;
use crate::invoker::LlmInvoker;
use crate::parser;
use crate::prompt;

/// Outcome of a query request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryAnswer {
    pub answer: String,
    /// True when the answer came from a previously stored record.
    pub cached: bool,
    pub fingerprint: String,
}

/// The insight reasoning and caching pipeline.
///
/// Capabilities are injected at construction: the completion backend is
/// required, compression is optional, and embedding support is whatever
/// the completion backend reports per call. Absent capabilities are
/// represented by `None` or the embed sentinel, never by runtime type
/// inspection.
pub struct InsightPipeline {
    config: PipelineConfig,
    store: Arc<MemoryStore>,
    invoker: LlmInvoker,
    gate: CompressionGate,
    dedup: InsightDeduplicator,
    synthesis_cache: ComputeCache<Vec<Insight>>,
    query_cache: ComputeCache<String>,
}

impl InsightPipeline {
    /// Build a pipeline from validated configuration and injected
    /// capabilities.
    pub fn new(
        config: PipelineConfig,
        completion: Arc<dyn CompletionBackend>,
        compression: Option<Arc<dyn CompressionBackend>>,
        store: Arc<MemoryStore>,
    ) -> Result<Self> {
        config.validate()?;

        let invoker = LlmInvoker::new(completion, config.temperature);
        let gate = CompressionGate::new(compression);
        let dedup = InsightDeduplicator::new(config.similarity_threshold);

        info!(
            subsystem = "reasoning",
            model = invoker.model_name(),
            compression = gate.is_enabled(),
            "Insight pipeline initialized"
        );

        Ok(Self {
            config,
            store,
            invoker,
            gate,
            dedup,
            synthesis_cache: ComputeCache::new(),
            query_cache: ComputeCache::new(),
        })
    }

    /// The backing store, for front-end bookkeeping (version listing,
    /// schema/analysis registration).
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Synthesize new insights for a dataset-version scope.
    ///
    /// Returns only the insights newly accepted by this call (the stored
    /// scope is updated as a side effect). Idempotent with respect to
    /// already-stored insights: repeating a call changes nothing, because
    /// identical inputs hit the request cache and drifted inputs fall
    /// through to dedup.
    #[instrument(skip_all, fields(subsystem = "reasoning", op = "synthesize_insights", dataset_id = %dataset_id, version = %version))]
    pub async fn synthesize_insights(
        &self,
        dataset_id: &str,
        version: &str,
        schema_text: &str,
        analysis_text: &str,
        existing_summaries: &[String],
    ) -> Result<Vec<Insight>> {
        validate_identifier("dataset_id", dataset_id)?;
        validate_identifier("version", version)?;

        let fingerprint = hashing::synthesis_fingerprint(
            dataset_id,
            version,
            schema_text,
            analysis_text,
            existing_summaries,
        );
        info!(
            request_id = %Uuid::now_v7(),
            fingerprint = %fingerprint,
            "Insight synthesis requested"
        );

        let rendered_prompt = prompt::build_synthesis_prompt(
            dataset_id,
            version,
            schema_text,
            analysis_text,
            existing_summaries,
            self.config.max_new_insights,
        );

        let gate = self.gate.clone();
        let invoker = self.invoker.clone();
        let dedup = self.dedup.clone();
        let store = Arc::clone(&self.store);
        let dataset_id = dataset_id.to_string();
        let version = version.to_string();
        let max_new_insights = self.config.max_new_insights;

        self.synthesis_cache
            .get_or_compute(
                CacheKey::new(CacheKind::InsightSet, fingerprint),
                async move {
                    let final_prompt = gate.maybe_compress(rendered_prompt).await;
                    let raw = invoker.complete(&final_prompt).await?;

                    let mut candidates = parser::parse_insight_candidates(&raw);
                    candidates.truncate(max_new_insights);
                    debug!(result_count = candidates.len(), "Candidates parsed");

                    // The scope lock spans reading the retained set through
                    // inserting survivors, so concurrent rounds for the
                    // same scope cannot race to insert overlapping
                    // duplicates.
                    let scope = store.scope_lock(&dataset_id, &version);
                    let _guard = scope.lock().await;

                    let existing = store.insights_for(&dataset_id, &version).await;
                    let accepted = dedup
                        .filter_new(&dataset_id, &version, candidates, &existing, &invoker)
                        .await;
                    let inserted = store.append_insights(accepted).await?;

                    info!(
                        result_count = inserted.len(),
                        dataset_id = %dataset_id,
                        version = %version,
                        "Synthesis round stored"
                    );
                    Ok(inserted)
                },
            )
            .await
    }

    /// Answer a natural-language question from compressed stored context.
    ///
    /// Answers are cached by `(dataset_id, version, normalized question)`;
    /// a stored answer short-circuits before any prompt is built.
    #[instrument(skip_all, fields(subsystem = "reasoning", op = "answer_query", dataset_id = %dataset_id, version = %version))]
    pub async fn answer_query(
        &self,
        dataset_id: &str,
        version: &str,
        question: &str,
        schema_text: &str,
        analysis_text: Option<&str>,
        insight_summaries: &[String],
    ) -> Result<QueryAnswer> {
        validate_identifier("dataset_id", dataset_id)?;
        validate_identifier("version", version)?;
        if question.trim().is_empty() {
            return Err(Error::InvalidRequest("question must not be empty".to_string()));
        }

        let fingerprint = hashing::query_fingerprint(dataset_id, version, question);
        info!(
            request_id = %Uuid::now_v7(),
            fingerprint = %fingerprint,
            "Query requested"
        );

        if let Some(record) = self
            .store
            .get_cached_query(dataset_id, version, &fingerprint)
            .await
        {
            debug!(cache_hit = true, "Serving stored answer");
            return Ok(QueryAnswer {
                answer: record.answer,
                cached: true,
                fingerprint,
            });
        }

        let rendered_prompt = prompt::build_query_prompt(
            dataset_id,
            version,
            question,
            schema_text,
            analysis_text,
            insight_summaries,
        );

        let gate = self.gate.clone();
        let invoker = self.invoker.clone();
        let store = Arc::clone(&self.store);
        let dataset_id_owned = dataset_id.to_string();
        let version_owned = version.to_string();
        let fingerprint_owned = fingerprint.clone();

        let answer = self
            .query_cache
            .get_or_compute(
                CacheKey::new(CacheKind::Query, fingerprint.clone()),
                async move {
                    let final_prompt = gate.maybe_compress(rendered_prompt).await;
                    let raw = invoker.complete(&final_prompt).await?;
                    let answer = parser::parse_answer(&raw);

                    store
                        .save_query(QueryRecord {
                            dataset_id: dataset_id_owned,
                            version: version_owned,
                            question_fingerprint: fingerprint_owned,
                            answer: answer.clone(),
                            created_at: Utc::now(),
                        })
                        .await?;
                    Ok(answer)
                },
            )
            .await?;

        Ok(QueryAnswer {
            answer,
            cached: false,
            fingerprint,
        })
    }
}

fn validate_identifier(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidRequest(format!("{field} must not be empty")));
    }
    if value.chars().any(|c| c.is_control()) {
        return Err(Error::InvalidRequest(format!(
            "{field} must not contain control characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabsense_inference::mock::MockCompletionBackend;

    fn pipeline(backend: MockCompletionBackend) -> InsightPipeline {
        InsightPipeline::new(
            PipelineConfig::default(),
            Arc::new(backend),
            None,
            Arc::new(MemoryStore::new()),
        )
        .unwrap()
    }

    #[test]
    fn construction_rejects_invalid_config() {
        let config = PipelineConfig {
            similarity_threshold: 2.0,
            ..Default::default()
        };
        let result = InsightPipeline::new(
            config,
            Arc::new(MockCompletionBackend::new()),
            None,
            Arc::new(MemoryStore::new()),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn empty_dataset_id_is_rejected_before_any_call() {
        let backend = MockCompletionBackend::new();
        let pipeline = pipeline(backend.clone());

        let err = pipeline
            .synthesize_insights("  ", "v1", "{}", "{}", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert_eq!(backend.complete_call_count(), 0);
    }

    #[tokio::test]
    async fn empty_version_is_rejected() {
        let pipeline = pipeline(MockCompletionBackend::new());
        let err = pipeline
            .synthesize_insights("orders", "", "{}", "{}", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn control_characters_in_identity_are_rejected() {
        let pipeline = pipeline(MockCompletionBackend::new());
        let err = pipeline
            .answer_query("or\x00ders", "v1", "Why?", "{}", None, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn empty_question_is_rejected_before_any_call() {
        let backend = MockCompletionBackend::new();
        let pipeline = pipeline(backend.clone());

        let err = pipeline
            .answer_query("orders", "v1", "   ", "{}", None, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert_eq!(backend.complete_call_count(), 0);
    }
}
