//! Mock backends for deterministic testing.
//!
//! Scripted completion responses, exact-match embedding overrides, and a
//! deterministic embedding generator. No randomness anywhere: the same
//! test inputs always produce the same behavior, including failures.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use tabsense_core::{CompletionBackend, CompressionBackend, Error, Result};

/// One recorded backend invocation.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

#[derive(Debug, Default)]
struct MockCompletionConfig {
    responses: Vec<String>,
    default_response: String,
    fail_completion: Option<String>,
    latency_ms: u64,
    embeddings_enabled: bool,
    embedding_overrides: HashMap<String, Vec<f32>>,
    embedding_dimension: usize,
}

/// Mock completion backend with scripted responses and call logging.
#[derive(Clone)]
pub struct MockCompletionBackend {
    config: Arc<MockCompletionConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
    response_cursor: Arc<Mutex<usize>>,
}

impl MockCompletionBackend {
    /// Create a new mock backend answering every completion with an empty
    /// JSON object.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockCompletionConfig {
                default_response: "{}".to_string(),
                embedding_dimension: 64,
                ..Default::default()
            }),
            call_log: Arc::new(Mutex::new(Vec::new())),
            response_cursor: Arc::new(Mutex::new(0)),
        }
    }

    fn config_mut(&mut self) -> &mut MockCompletionConfig {
        Arc::get_mut(&mut self.config).expect("configure mocks before cloning them")
    }

    /// Answer every completion with a fixed response.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        self.config_mut().default_response = response.into();
        self
    }

    /// Answer completions from a sequence; the last entry repeats once the
    /// sequence is exhausted.
    pub fn with_response_sequence(mut self, responses: Vec<String>) -> Self {
        self.config_mut().responses = responses;
        self
    }

    /// Fail every completion with `LlmUnavailable` carrying this detail.
    pub fn with_unavailable(mut self, detail: impl Into<String>) -> Self {
        self.config_mut().fail_completion = Some(detail.into());
        self
    }

    /// Delay every completion, so concurrency tests can observe callers
    /// joining an in-flight computation.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.config_mut().latency_ms = latency_ms;
        self
    }

    /// Enable the embedding capability (deterministic generated vectors).
    pub fn with_embeddings(mut self, dimension: usize) -> Self {
        let config = self.config_mut();
        config.embeddings_enabled = true;
        config.embedding_dimension = dimension;
        self
    }

    /// Pin the embedding returned for one exact input text. Implies the
    /// embedding capability is enabled.
    pub fn with_embedding(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        let config = self.config_mut();
        config.embeddings_enabled = true;
        config.embedding_overrides.insert(text.into(), vector);
        self
    }

    /// All logged calls, in invocation order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of completion invocations recorded.
    pub fn complete_call_count(&self) -> usize {
        self.count_operation("complete")
    }

    /// Number of embedding invocations recorded.
    pub fn embed_call_count(&self) -> usize {
        self.count_operation("embed")
    }

    fn count_operation(&self, operation: &str) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    fn log_call(&self, operation: &str, input: &str) {
        self.call_log.lock().unwrap().push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
        });
    }
}

impl Default for MockCompletionBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionBackend for MockCompletionBackend {
    async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String> {
        self.log_call("complete", prompt);

        if self.config.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.latency_ms)).await;
        }

        if let Some(detail) = &self.config.fail_completion {
            return Err(Error::LlmUnavailable(detail.clone()));
        }

        if !self.config.responses.is_empty() {
            let mut cursor = self.response_cursor.lock().unwrap();
            let idx = (*cursor).min(self.config.responses.len() - 1);
            *cursor += 1;
            return Ok(self.config.responses[idx].clone());
        }

        Ok(self.config.default_response.clone())
    }

    async fn embed(&self, texts: &[String]) -> Option<Vec<Vec<f32>>> {
        self.log_call("embed", &texts.join("\n"));

        if !self.config.embeddings_enabled {
            return None;
        }

        Some(
            texts
                .iter()
                .map(|text| {
                    self.config
                        .embedding_overrides
                        .get(text)
                        .cloned()
                        .unwrap_or_else(|| {
                            MockEmbeddingGenerator::generate(text, self.config.embedding_dimension)
                        })
                })
                .collect(),
        )
    }

    fn model_name(&self) -> &str {
        "mock-completion"
    }
}

/// Deterministic embedding generator.
pub struct MockEmbeddingGenerator;

impl MockEmbeddingGenerator {
    /// Generate a deterministic unit vector from text.
    ///
    /// Uses character-based hashing for reproducibility; the same text
    /// always produces the same embedding.
    pub fn generate(text: &str, dimension: usize) -> Vec<f32> {
        let mut vec = vec![0.0; dimension];
        for (i, c) in text.chars().enumerate() {
            let idx = (c as usize + i) % dimension;
            vec[idx] += 0.1;
        }
        Self::normalize(&mut vec);
        vec
    }

    fn normalize(vec: &mut [f32]) {
        let magnitude: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            vec.iter_mut().for_each(|x| *x /= magnitude);
        }
    }
}

/// Mock compression backend.
#[derive(Clone)]
pub struct MockCompressionBackend {
    fail: Option<String>,
    call_count: Arc<Mutex<usize>>,
}

impl MockCompressionBackend {
    /// Create a mock that "compresses" by prefixing a marker, so tests can
    /// observe whether the gate forwarded the compressed form.
    pub fn new() -> Self {
        Self {
            fail: None,
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Fail every compression call with this detail.
    pub fn with_failure(detail: impl Into<String>) -> Self {
        Self {
            fail: Some(detail.into()),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Number of compression invocations recorded.
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Marker prepended to successfully compressed prompts.
    pub const MARKER: &'static str = "[compressed] ";
}

impl Default for MockCompressionBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompressionBackend for MockCompressionBackend {
    async fn compress(&self, prompt: &str) -> Result<String> {
        *self.call_count.lock().unwrap() += 1;
        match &self.fail {
            Some(detail) => Err(Error::Compression(detail.clone())),
            None => Ok(format!("{}{}", Self::MARKER, prompt)),
        }
    }
}
