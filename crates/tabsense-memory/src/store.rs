//! Versioned, write-once artifact store with optional JSON persistence.
//!
//! Records live for the store lifetime; nothing here deletes them. Insight
//! sets per `(dataset_id, version)` scope only grow, guarded by a semantic
//! hash index, and the store hands out a per-scope async mutex so callers
//! can serialize their dedupe-and-insert sections.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use tabsense_core::{
    hashing, AnalysisRecord, DatasetVersion, Insight, QueryRecord, Result, SchemaRecord,
};

type ScopeKey = (String, String);
type QueryKey = (String, String, String);

#[derive(Default)]
struct StoreInner {
    schemas: HashMap<ScopeKey, SchemaRecord>,
    analyses: HashMap<ScopeKey, AnalysisRecord>,
    /// Insights per scope, in insertion order.
    insights: HashMap<ScopeKey, Vec<Insight>>,
    /// `(dataset_id, version, semantic_hash)` → insight id.
    semantic_index: HashMap<(String, String, String), String>,
    queries: HashMap<QueryKey, QueryRecord>,
}

/// On-disk snapshot shape. Flat arrays keep the file format independent of
/// the in-memory index layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    schemas: Vec<SchemaRecord>,
    analyses: Vec<AnalysisRecord>,
    insights: Vec<Insight>,
    queries: Vec<QueryRecord>,
}

/// Dict-backed, deterministic memory store with optional JSON persistence.
///
/// Core principle: consumers must check memory BEFORE recomputation. This
/// store never performs analysis or reasoning; it only saves and retrieves.
pub struct MemoryStore {
    inner: RwLock<StoreInner>,
    scope_locks: Mutex<HashMap<ScopeKey, Arc<tokio::sync::Mutex<()>>>>,
    persist_path: Option<PathBuf>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an in-memory store with no persistence.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            scope_locks: Mutex::new(HashMap::new()),
            persist_path: None,
        }
    }

    /// Create a store backed by a JSON snapshot file. If the file exists,
    /// its contents are loaded; every mutation rewrites it atomically.
    pub fn with_persistence(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut inner = StoreInner::default();

        if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            let snapshot: Snapshot = if raw.trim().is_empty() {
                Snapshot::default()
            } else {
                serde_json::from_str(&raw)?
            };
            inner.absorb(snapshot);
            info!(
                subsystem = "memory",
                path = %path.display(),
                "Loaded memory store snapshot"
            );
        }

        Ok(Self {
            inner: RwLock::new(inner),
            scope_locks: Mutex::new(HashMap::new()),
            persist_path: Some(path),
        })
    }

    // -----------------------------------------------------------------------
    // Schemas
    // -----------------------------------------------------------------------

    /// Persist a compressed schema for a dataset version. Write-once:
    /// returns `false` without touching anything if the key is taken.
    pub async fn save_schema(&self, record: SchemaRecord) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let key = (record.dataset_id.clone(), record.version.clone());
        if inner.schemas.contains_key(&key) {
            return Ok(false);
        }
        inner.schemas.insert(key, record);
        self.persist(&inner)?;
        Ok(true)
    }

    /// Retrieve a stored schema, or `None` if not present.
    pub async fn get_schema(&self, dataset_id: &str, version: &str) -> Option<SchemaRecord> {
        let inner = self.inner.read().await;
        inner
            .schemas
            .get(&(dataset_id.to_string(), version.to_string()))
            .cloned()
    }

    /// Known versions for a dataset, sorted lexicographically.
    pub async fn list_versions(&self, dataset_id: &str) -> Vec<String> {
        let inner = self.inner.read().await;
        let mut versions: Vec<String> = inner
            .schemas
            .keys()
            .filter(|(ds, _)| ds == dataset_id)
            .map(|(_, v)| v.clone())
            .collect();
        versions.sort();
        versions
    }

    /// Latest version for a dataset, preferring `vN` numeric ordering and
    /// falling back to lexicographic order for unrecognized labels.
    pub async fn latest_version(&self, dataset_id: &str) -> Option<String> {
        let versions = self.list_versions(dataset_id).await;
        if versions.is_empty() {
            return None;
        }
        if versions.iter().any(|v| version_number(v) > 0) {
            versions.into_iter().max_by_key(|v| version_number(v))
        } else {
            versions.into_iter().last()
        }
    }

    /// Next version label for a dataset: `v1`, `v2`, ...
    pub async fn next_version(&self, dataset_id: &str) -> String {
        let max = self
            .list_versions(dataset_id)
            .await
            .iter()
            .map(|v| version_number(v))
            .max()
            .unwrap_or(0);
        format!("v{}", max + 1)
    }

    /// Find the version whose schema was extracted from a file with this
    /// hash. Lets a front-end deduplicate repeat ingestions.
    pub async fn find_version_by_hash(&self, dataset_id: &str, file_hash: &str) -> Option<String> {
        let inner = self.inner.read().await;
        let mut matches: Vec<&SchemaRecord> = inner
            .schemas
            .values()
            .filter(|s| s.dataset_id == dataset_id && s.file_hash == file_hash)
            .collect();
        matches.sort_by(|a, b| a.version.cmp(&b.version));
        matches.first().map(|s| s.version.clone())
    }

    /// Register an ingested file as a dataset version, reusing the
    /// existing version when the same content hash was seen before.
    ///
    /// Performed atomically under the store's write lock, so concurrent
    /// registrations of the same file cannot mint duplicate versions.
    /// Returns the version identity and whether it was already known.
    pub async fn register_ingestion(
        &self,
        dataset_id: &str,
        file_hash: &str,
        schema_json: &str,
    ) -> Result<(DatasetVersion, bool)> {
        let mut inner = self.inner.write().await;

        let mut known: Vec<&SchemaRecord> = inner
            .schemas
            .values()
            .filter(|s| s.dataset_id == dataset_id && s.file_hash == file_hash)
            .collect();
        known.sort_by(|a, b| a.version.cmp(&b.version));
        if let Some(existing) = known.first() {
            return Ok((
                DatasetVersion {
                    dataset_id: dataset_id.to_string(),
                    version: existing.version.clone(),
                    content_hash: file_hash.to_string(),
                },
                true,
            ));
        }

        let max = inner
            .schemas
            .keys()
            .filter(|(ds, _)| ds == dataset_id)
            .map(|(_, v)| version_number(v))
            .max()
            .unwrap_or(0);
        let version = format!("v{}", max + 1);

        inner.schemas.insert(
            (dataset_id.to_string(), version.clone()),
            SchemaRecord {
                dataset_id: dataset_id.to_string(),
                version: version.clone(),
                file_hash: file_hash.to_string(),
                schema_json: schema_json.to_string(),
            },
        );
        self.persist(&inner)?;

        info!(
            subsystem = "memory",
            dataset_id,
            version = %version,
            "Registered new dataset version"
        );
        Ok((
            DatasetVersion {
                dataset_id: dataset_id.to_string(),
                version,
                content_hash: file_hash.to_string(),
            },
            false,
        ))
    }

    // -----------------------------------------------------------------------
    // Analyses
    // -----------------------------------------------------------------------

    /// Persist compressed analysis results for a dataset version.
    /// Write-once, like [`MemoryStore::save_schema`].
    pub async fn save_analysis(&self, record: AnalysisRecord) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let key = (record.dataset_id.clone(), record.version.clone());
        if inner.analyses.contains_key(&key) {
            return Ok(false);
        }
        inner.analyses.insert(key, record);
        self.persist(&inner)?;
        Ok(true)
    }

    /// Build and store an [`AnalysisRecord`] from opaque analysis text,
    /// stamping its content hash and creation time. Write-once; returns
    /// the stored record either way.
    pub async fn record_analysis(
        &self,
        dataset_id: &str,
        version: &str,
        analysis_json: &str,
    ) -> Result<AnalysisRecord> {
        let record = AnalysisRecord {
            dataset_id: dataset_id.to_string(),
            version: version.to_string(),
            analysis_json: analysis_json.to_string(),
            content_hash: hashing::stable_hash(analysis_json),
            created_at: Utc::now(),
        };
        if self.save_analysis(record.clone()).await? {
            return Ok(record);
        }
        // Key already taken: the first write is authoritative.
        Ok(self.get_analysis(dataset_id, version).await.unwrap_or(record))
    }

    /// Retrieve stored analysis, or `None` if not present.
    pub async fn get_analysis(&self, dataset_id: &str, version: &str) -> Option<AnalysisRecord> {
        let inner = self.inner.read().await;
        inner
            .analyses
            .get(&(dataset_id.to_string(), version.to_string()))
            .cloned()
    }

    /// True if analysis exists; callers use this to skip recomputation.
    pub async fn has_analysis(&self, dataset_id: &str, version: &str) -> bool {
        let inner = self.inner.read().await;
        inner
            .analyses
            .contains_key(&(dataset_id.to_string(), version.to_string()))
    }

    // -----------------------------------------------------------------------
    // Insights
    // -----------------------------------------------------------------------

    /// All stored insights for a scope, in insertion order.
    pub async fn insights_for(&self, dataset_id: &str, version: &str) -> Vec<Insight> {
        let inner = self.inner.read().await;
        inner
            .insights
            .get(&(dataset_id.to_string(), version.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Stored insight summaries for a scope, in insertion order.
    pub async fn insight_summaries(&self, dataset_id: &str, version: &str) -> Vec<String> {
        self.insights_for(dataset_id, version)
            .await
            .into_iter()
            .map(|i| i.summary)
            .collect()
    }

    /// Deterministic existence check by semantic hash within a scope.
    pub async fn insight_exists(
        &self,
        dataset_id: &str,
        version: &str,
        semantic_hash: &str,
    ) -> bool {
        let inner = self.inner.read().await;
        inner.semantic_index.contains_key(&(
            dataset_id.to_string(),
            version.to_string(),
            semantic_hash.to_string(),
        ))
    }

    /// Append a batch of insights, skipping any whose `(scope,
    /// semantic_hash)` is already taken. Dedup here is strict and
    /// deterministic; it never merges. Returns the insights actually
    /// inserted, in input order.
    #[instrument(skip(self, batch), fields(subsystem = "memory", op = "append_insights", result_count = batch.len()))]
    pub async fn append_insights(&self, batch: Vec<Insight>) -> Result<Vec<Insight>> {
        let mut inner = self.inner.write().await;
        let mut inserted = Vec::new();

        for insight in batch {
            let index_key = (
                insight.dataset_id.clone(),
                insight.version.clone(),
                insight.semantic_hash.clone(),
            );
            if inner.semantic_index.contains_key(&index_key) {
                debug!(
                    dataset_id = %insight.dataset_id,
                    version = %insight.version,
                    "Skipping insight with taken semantic hash"
                );
                continue;
            }
            inner.semantic_index.insert(index_key, insight.id.clone());
            inner
                .insights
                .entry((insight.dataset_id.clone(), insight.version.clone()))
                .or_default()
                .push(insight.clone());
            inserted.push(insight);
        }

        if !inserted.is_empty() {
            self.persist(&inner)?;
        }
        Ok(inserted)
    }

    /// The mutation lock for one `(dataset_id, version)` scope. Callers
    /// hold it across their dedupe-and-insert section so concurrent
    /// synthesis rounds for the same scope cannot interleave.
    pub fn scope_lock(&self, dataset_id: &str, version: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.scope_locks.lock().unwrap();
        locks
            .entry((dataset_id.to_string(), version.to_string()))
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    // -----------------------------------------------------------------------
    // Query cache
    // -----------------------------------------------------------------------

    /// Retrieve a cached answer for a question fingerprint.
    pub async fn get_cached_query(
        &self,
        dataset_id: &str,
        version: &str,
        fingerprint: &str,
    ) -> Option<QueryRecord> {
        let inner = self.inner.read().await;
        inner
            .queries
            .get(&(
                dataset_id.to_string(),
                version.to_string(),
                fingerprint.to_string(),
            ))
            .cloned()
    }

    /// Store a computed answer. Write-once per fingerprint.
    pub async fn save_query(&self, record: QueryRecord) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let key = (
            record.dataset_id.clone(),
            record.version.clone(),
            record.question_fingerprint.clone(),
        );
        if inner.queries.contains_key(&key) {
            return Ok(false);
        }
        inner.queries.insert(key, record);
        self.persist(&inner)?;
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    fn persist(&self, inner: &StoreInner) -> Result<()> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };
        let snapshot = inner.snapshot();
        write_snapshot(path, &snapshot)
    }
}

impl StoreInner {
    fn absorb(&mut self, snapshot: Snapshot) {
        for record in snapshot.schemas {
            self.schemas
                .insert((record.dataset_id.clone(), record.version.clone()), record);
        }
        for record in snapshot.analyses {
            self.analyses
                .insert((record.dataset_id.clone(), record.version.clone()), record);
        }
        for insight in snapshot.insights {
            self.semantic_index.insert(
                (
                    insight.dataset_id.clone(),
                    insight.version.clone(),
                    insight.semantic_hash.clone(),
                ),
                insight.id.clone(),
            );
            self.insights
                .entry((insight.dataset_id.clone(), insight.version.clone()))
                .or_default()
                .push(insight);
        }
        for record in snapshot.queries {
            self.queries.insert(
                (
                    record.dataset_id.clone(),
                    record.version.clone(),
                    record.question_fingerprint.clone(),
                ),
                record,
            );
        }
    }

    fn snapshot(&self) -> Snapshot {
        let mut schemas: Vec<SchemaRecord> = self.schemas.values().cloned().collect();
        schemas.sort_by(|a, b| (&a.dataset_id, &a.version).cmp(&(&b.dataset_id, &b.version)));

        let mut analyses: Vec<AnalysisRecord> = self.analyses.values().cloned().collect();
        analyses.sort_by(|a, b| (&a.dataset_id, &a.version).cmp(&(&b.dataset_id, &b.version)));

        // Scopes sorted by key; within a scope, insertion order is kept.
        let mut scope_keys: Vec<&ScopeKey> = self.insights.keys().collect();
        scope_keys.sort();
        let insights: Vec<Insight> = scope_keys
            .into_iter()
            .flat_map(|key| self.insights[key].iter().cloned())
            .collect();

        let mut queries: Vec<QueryRecord> = self.queries.values().cloned().collect();
        queries.sort_by(|a, b| {
            (&a.dataset_id, &a.version, &a.question_fingerprint).cmp(&(
                &b.dataset_id,
                &b.version,
                &b.question_fingerprint,
            ))
        });

        Snapshot {
            schemas,
            analyses,
            insights,
            queries,
        }
    }
}

fn version_number(version: &str) -> u64 {
    version
        .trim()
        .to_lowercase()
        .strip_prefix('v')
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let payload = serde_json::to_string(snapshot)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, payload)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn schema(dataset_id: &str, version: &str, file_hash: &str) -> SchemaRecord {
        SchemaRecord {
            dataset_id: dataset_id.to_string(),
            version: version.to_string(),
            file_hash: file_hash.to_string(),
            schema_json: r#"{"cols":3}"#.to_string(),
        }
    }

    fn insight(dataset_id: &str, version: &str, semantic_hash: &str, summary: &str) -> Insight {
        Insight {
            id: format!("id-{semantic_hash}"),
            dataset_id: dataset_id.to_string(),
            version: version.to_string(),
            title: summary.to_string(),
            summary: summary.to_string(),
            confidence: 0.7,
            semantic_hash: semantic_hash.to_string(),
            embedding: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn schema_save_is_write_once() {
        let store = MemoryStore::new();

        assert!(store.save_schema(schema("orders", "v1", "h1")).await.unwrap());
        assert!(!store.save_schema(schema("orders", "v1", "h2")).await.unwrap());

        // The first write is authoritative.
        let stored = store.get_schema("orders", "v1").await.unwrap();
        assert_eq!(stored.file_hash, "h1");
    }

    #[tokio::test]
    async fn list_versions_is_sorted_and_scoped() {
        let store = MemoryStore::new();
        store.save_schema(schema("orders", "v2", "h2")).await.unwrap();
        store.save_schema(schema("orders", "v1", "h1")).await.unwrap();
        store.save_schema(schema("users", "v1", "h3")).await.unwrap();

        assert_eq!(store.list_versions("orders").await, vec!["v1", "v2"]);
        assert_eq!(store.list_versions("users").await, vec!["v1"]);
        assert!(store.list_versions("missing").await.is_empty());
    }

    #[tokio::test]
    async fn version_arithmetic() {
        let store = MemoryStore::new();
        assert_eq!(store.next_version("orders").await, "v1");
        assert!(store.latest_version("orders").await.is_none());

        store.save_schema(schema("orders", "v1", "h1")).await.unwrap();
        store.save_schema(schema("orders", "v9", "h9")).await.unwrap();
        store.save_schema(schema("orders", "v10", "h10")).await.unwrap();

        // Numeric ordering, not lexicographic: v10 > v9.
        assert_eq!(store.latest_version("orders").await.unwrap(), "v10");
        assert_eq!(store.next_version("orders").await, "v11");
    }

    #[tokio::test]
    async fn find_version_by_hash_deduplicates_ingestion() {
        let store = MemoryStore::new();
        store.save_schema(schema("orders", "v1", "h1")).await.unwrap();
        store.save_schema(schema("orders", "v2", "h2")).await.unwrap();

        assert_eq!(
            store.find_version_by_hash("orders", "h2").await.unwrap(),
            "v2"
        );
        assert!(store.find_version_by_hash("orders", "h3").await.is_none());
        assert!(store.find_version_by_hash("users", "h1").await.is_none());
    }

    #[tokio::test]
    async fn register_ingestion_mints_sequential_versions() {
        let store = MemoryStore::new();

        let (first, cached) = store
            .register_ingestion("orders", "h1", r#"{"cols":3}"#)
            .await
            .unwrap();
        assert_eq!(first.version, "v1");
        assert_eq!(first.content_hash, "h1");
        assert!(!cached);

        let (second, cached) = store
            .register_ingestion("orders", "h2", r#"{"cols":4}"#)
            .await
            .unwrap();
        assert_eq!(second.version, "v2");
        assert!(!cached);
    }

    #[tokio::test]
    async fn register_ingestion_reuses_version_for_known_hash() {
        let store = MemoryStore::new();
        store
            .register_ingestion("orders", "h1", r#"{"cols":3}"#)
            .await
            .unwrap();

        let (reused, cached) = store
            .register_ingestion("orders", "h1", r#"{"cols":999}"#)
            .await
            .unwrap();
        assert_eq!(reused.version, "v1");
        assert!(cached);

        // The original schema is untouched.
        let schema = store.get_schema("orders", "v1").await.unwrap();
        assert_eq!(schema.schema_json, r#"{"cols":3}"#);
    }

    #[tokio::test]
    async fn record_analysis_stamps_hash_and_is_write_once() {
        let store = MemoryStore::new();

        let record = store
            .record_analysis("orders", "v1", r#"{"rows":10}"#)
            .await
            .unwrap();
        assert_eq!(record.content_hash, hashing::stable_hash(r#"{"rows":10}"#));

        // A second recording returns the authoritative first record.
        let repeat = store
            .record_analysis("orders", "v1", r#"{"rows":999}"#)
            .await
            .unwrap();
        assert_eq!(repeat.analysis_json, r#"{"rows":10}"#);
        assert_eq!(repeat.created_at, record.created_at);
    }

    #[tokio::test]
    async fn analysis_save_is_write_once() {
        let store = MemoryStore::new();
        let record = AnalysisRecord {
            dataset_id: "orders".to_string(),
            version: "v1".to_string(),
            analysis_json: r#"{"rows":10}"#.to_string(),
            content_hash: "h".to_string(),
            created_at: Utc::now(),
        };

        assert!(!store.has_analysis("orders", "v1").await);
        assert!(store.save_analysis(record.clone()).await.unwrap());
        assert!(store.has_analysis("orders", "v1").await);
        assert!(!store.save_analysis(record).await.unwrap());
    }

    #[tokio::test]
    async fn append_insights_skips_taken_hashes() {
        let store = MemoryStore::new();

        let first = store
            .append_insights(vec![insight("orders", "v1", "aaa", "Sales peak in Q4")])
            .await
            .unwrap();
        assert_eq!(first.len(), 1);
        assert!(store.insight_exists("orders", "v1", "aaa").await);

        // Same hash again: deterministic no-op.
        let second = store
            .append_insights(vec![
                insight("orders", "v1", "aaa", "Sales peak in Q4."),
                insight("orders", "v1", "bbb", "Churn rises in January"),
            ])
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].semantic_hash, "bbb");

        let all = store.insights_for("orders", "v1").await;
        assert_eq!(all.len(), 2);
        // Insertion order is preserved.
        assert_eq!(all[0].semantic_hash, "aaa");
        assert_eq!(all[1].semantic_hash, "bbb");
    }

    #[tokio::test]
    async fn insight_scopes_are_isolated() {
        let store = MemoryStore::new();
        store
            .append_insights(vec![insight("orders", "v1", "aaa", "s")])
            .await
            .unwrap();

        // The same semantic hash is free in another version scope.
        assert!(!store.insight_exists("orders", "v2", "aaa").await);
        let inserted = store
            .append_insights(vec![insight("orders", "v2", "aaa", "s")])
            .await
            .unwrap();
        assert_eq!(inserted.len(), 1);
    }

    #[tokio::test]
    async fn query_cache_is_write_once() {
        let store = MemoryStore::new();
        let record = QueryRecord {
            dataset_id: "orders".to_string(),
            version: "v1".to_string(),
            question_fingerprint: "fp".to_string(),
            answer: "first answer".to_string(),
            created_at: Utc::now(),
        };

        assert!(store.get_cached_query("orders", "v1", "fp").await.is_none());
        assert!(store.save_query(record.clone()).await.unwrap());

        let mut overwrite = record;
        overwrite.answer = "second answer".to_string();
        assert!(!store.save_query(overwrite).await.unwrap());

        let cached = store.get_cached_query("orders", "v1", "fp").await.unwrap();
        assert_eq!(cached.answer, "first answer");
    }

    #[tokio::test]
    async fn scope_lock_is_shared_per_scope() {
        let store = MemoryStore::new();
        let a = store.scope_lock("orders", "v1");
        let b = store.scope_lock("orders", "v1");
        let other = store.scope_lock("orders", "v2");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[tokio::test]
    async fn persistence_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let store = MemoryStore::with_persistence(&path).unwrap();
            store.save_schema(schema("orders", "v1", "h1")).await.unwrap();
            store
                .append_insights(vec![insight("orders", "v1", "aaa", "Sales peak in Q4")])
                .await
                .unwrap();
            store
                .save_query(QueryRecord {
                    dataset_id: "orders".to_string(),
                    version: "v1".to_string(),
                    question_fingerprint: "fp".to_string(),
                    answer: "42".to_string(),
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }

        let reloaded = MemoryStore::with_persistence(&path).unwrap();
        assert!(reloaded.get_schema("orders", "v1").await.is_some());
        assert!(reloaded.insight_exists("orders", "v1", "aaa").await);
        assert_eq!(
            reloaded
                .get_cached_query("orders", "v1", "fp")
                .await
                .unwrap()
                .answer,
            "42"
        );
    }

    #[tokio::test]
    async fn persistence_tolerates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "").unwrap();

        let store = MemoryStore::with_persistence(&path).unwrap();
        assert!(store.list_versions("orders").await.is_empty());
    }

    #[test]
    fn version_number_parsing() {
        assert_eq!(version_number("v1"), 1);
        assert_eq!(version_number("V12"), 12);
        assert_eq!(version_number(" v3 "), 3);
        assert_eq!(version_number("latest"), 0);
        assert_eq!(version_number(""), 0);
    }
}
