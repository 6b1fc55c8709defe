//! Best-effort, deterministic parsing of model output.
//!
//! Two tiers for both request kinds: a strict JSON parse, then extraction
//! of the first `{` .. last `}` substring when the model wrapped its JSON
//! in prose. What happens when both tiers fail depends on the request
//! kind: synthesis yields an empty candidate list (a malformed generation
//! contributes nothing rather than corrupting stored state), while query
//! answering returns the raw trimmed text (free-form answers are
//! acceptable output for that request kind).

use serde_json::Value;
use tracing::debug;

/// A candidate insight extracted from one synthesis response.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightCandidate {
    pub title: String,
    pub technical_summary: String,
    pub business_impact: String,
    /// Clamped to `[0, 1]`.
    pub confidence: f32,
    /// Short normalized phrase capturing the semantic core; falls back to
    /// the title when the model omits it.
    pub dedup_key: String,
}

impl InsightCandidate {
    /// Stored summary rendering.
    pub fn summary(&self) -> String {
        format!("{}: {}", self.title, self.technical_summary)
    }

    /// Text embedded for similarity comparison.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.title, self.technical_summary)
    }
}

/// Parse a JSON object out of raw model text.
///
/// Tier 1 parses the whole trimmed text; tier 2 extracts the first JSON
/// object substring. Non-object payloads fail both tiers.
fn parse_json_object(raw: &str) -> Option<Value> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        if value.is_object() {
            return Some(value);
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(value) if value.is_object() => Some(value),
        _ => None,
    }
}

fn text_field(obj: &serde_json::Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn candidate_from_value(value: &Value) -> Option<InsightCandidate> {
    let obj = value.as_object()?;

    let title = text_field(obj, "title");
    let technical_summary = text_field(obj, "technical_summary");
    let business_impact = text_field(obj, "business_impact");
    let confidence = obj
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.5)
        .clamp(0.0, 1.0) as f32;

    let mut dedup_key = text_field(obj, "dedup_key");
    if dedup_key.is_empty() {
        dedup_key = title.clone();
    }

    // A candidate with no title and no dedup key carries nothing to retain
    // or compare against.
    if dedup_key.is_empty() {
        return None;
    }

    Some(InsightCandidate {
        title,
        technical_summary,
        business_impact,
        confidence,
        dedup_key,
    })
}

/// Extract candidate insights from a synthesis response.
///
/// Malformed payloads, missing `insights` arrays, and malformed entries
/// all degrade to fewer (possibly zero) candidates; this never fails.
pub fn parse_insight_candidates(raw: &str) -> Vec<InsightCandidate> {
    let Some(value) = parse_json_object(raw) else {
        debug!(
            subsystem = "reasoning",
            component = "parser",
            response_len = raw.len(),
            "Synthesis response not parseable, contributing no candidates"
        );
        return Vec::new();
    };

    let Some(items) = value.get("insights").and_then(Value::as_array) else {
        return Vec::new();
    };

    items.iter().filter_map(candidate_from_value).collect()
}

/// Extract the answer from a query response.
///
/// Falls back to the raw trimmed text when no structured `answer` field
/// can be found; failure-to-parse is not failure-to-answer.
pub fn parse_answer(raw: &str) -> String {
    if let Some(value) = parse_json_object(raw) {
        if let Some(answer) = value.get("answer").and_then(Value::as_str) {
            let trimmed = answer.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }
    raw.trim().to_string()
}
