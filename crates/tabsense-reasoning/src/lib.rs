//! # tabsense-reasoning
//!
//! The AI reasoning layer: turns deterministic, compressed analytical
//! artifacts into human-meaningful insights and cached answers.
//!
//! What this crate consumes (compressed only):
//! - Compressed schema JSON (from the schema collaborator)
//! - Compressed analysis-result JSON (from the analysis collaborator)
//! - Existing stored insight summaries (from `tabsense-memory`)
//!
//! What it must NOT do:
//! - No dataframe access
//! - No statistic computation
//! - No rule-based importance ranking
//!
//! Pipeline per request: build prompt → compress (optional) → invoke
//! model → parse → deduplicate/store, with every stage's failure policy
//! documented on the component.

pub mod compression;
pub mod dedup;
pub mod invoker;
pub mod parser;
pub mod pipeline;
pub mod prompt;

pub use compression::CompressionGate;
pub use dedup::{cosine_similarity, InsightDeduplicator};
pub use invoker::LlmInvoker;
pub use parser::{parse_answer, parse_insight_candidates, InsightCandidate};
pub use pipeline::{InsightPipeline, QueryAnswer};
pub use prompt::{build_query_prompt, build_synthesis_prompt};
