//! Prompt templates for insight synthesis and query answering.
//!
//! Rendering is deterministic: no clock, no randomness, and compact JSON
//! with sorted keys for the context payload, so the same inputs always
//! produce byte-identical prompts (and therefore identical fingerprints
//! downstream).

use tabsense_core::defaults;

const SYSTEM_RULES: &str = "You are an expert data analyst.\n\
You must ONLY use the provided context. Do not invent data.\n\
Do NOT compute statistics. Treat all numbers in the context as given.\n\
Return valid JSON only, with no markdown, no commentary.";

/// Render the one-shot synthesis prompt.
///
/// Inputs are already compressed; instruction text stays short and the
/// existing-insight list is hard-capped to bound prompt size.
pub fn build_synthesis_prompt(
    dataset_id: &str,
    version: &str,
    schema_json: &str,
    analysis_json: &str,
    existing_summaries: &[String],
    max_new_insights: usize,
) -> String {
    let existing: Vec<&String> = existing_summaries
        .iter()
        .take(defaults::SYNTHESIS_SUMMARY_CAP)
        .collect();

    let payload = serde_json::json!({
        "dataset_id": dataset_id,
        "version": version,
        "schema": schema_json,
        "analysis": analysis_json,
        "existing_insights": existing,
        "constraints": {
            "max_new_insights": max_new_insights,
            "no_new_statistics": true,
            "no_dataframe_access": true,
        },
    });

    format!(
        "{SYSTEM_RULES}\n\
         \n\
         Task:\n\
         Synthesize up to {max_new_insights} non-redundant insights by combining multiple signals when appropriate.\n\
         \n\
         Each insight must include:\n\
         - title: short, specific\n\
         - technical_summary: explain signals and how they connect\n\
         - business_impact: why it matters in business terms (no made-up metrics)\n\
         - confidence: float 0..1 based on support/consistency/strength in provided signals\n\
         - dedup_key: a short normalized phrase capturing the semantic core (used for semantic hashing)\n\
         \n\
         Avoid duplicates vs existing_insights. Deduplicate semantically (not string equality).\n\
         \n\
         Return JSON in this exact shape:\n\
         {{\"insights\":[{{\"title\":..., \"technical_summary\":..., \"business_impact\":..., \"confidence\":..., \"dedup_key\":...}}, ...]}}\n\
         \n\
         Context (JSON):\n\
         {payload}"
    )
}

/// Render the query-answering prompt.
///
/// The model must answer using only compressed schema + analysis + stored
/// insights; no new statistics may be computed.
pub fn build_query_prompt(
    dataset_id: &str,
    version: &str,
    question: &str,
    schema_json: &str,
    analysis_json: Option<&str>,
    insight_summaries: &[String],
) -> String {
    let insights: Vec<&String> = insight_summaries
        .iter()
        .take(defaults::QUERY_SUMMARY_CAP)
        .collect();

    let payload = serde_json::json!({
        "dataset_id": dataset_id,
        "version": version,
        "question": question,
        "schema": schema_json,
        "analysis": analysis_json,
        "insights": insights,
    });

    format!(
        "{SYSTEM_RULES}\n\
         \n\
         Task:\n\
         Answer the user's question using ONLY the provided context.\n\
         If the context is insufficient, say what is missing and suggest the minimum additional analysis needed.\n\
         Do NOT compute new statistics or invent values.\n\
         \n\
         Return JSON in this shape:\n\
         {{\"answer\":string,\"used\":[\"schema\"|\"analysis\"|\"insights\"],\"limitations\":string}}\n\
         \n\
         Context (JSON):\n\
         {payload}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesis_prompt_is_deterministic() {
        let summaries = vec!["Sales peak in Q4".to_string()];
        let a = build_synthesis_prompt("orders", "v1", "{\"c\":1}", "{\"r\":2}", &summaries, 8);
        let b = build_synthesis_prompt("orders", "v1", "{\"c\":1}", "{\"r\":2}", &summaries, 8);
        assert_eq!(a, b);
    }

    #[test]
    fn synthesis_prompt_embeds_inputs_verbatim() {
        let prompt = build_synthesis_prompt(
            "orders",
            "v3",
            "{\"columns\":[\"amount\"]}",
            "{\"mean\":42.5}",
            &["Churn rises in January".to_string()],
            5,
        );

        assert!(prompt.contains("{\\\"columns\\\":[\\\"amount\\\"]}"));
        assert!(prompt.contains("{\\\"mean\\\":42.5}"));
        assert!(prompt.contains("Churn rises in January"));
        assert!(prompt.contains("Synthesize up to 5 non-redundant insights"));
        assert!(prompt.contains("\"version\":\"v3\""));
    }

    #[test]
    fn synthesis_prompt_caps_existing_summaries() {
        let summaries: Vec<String> = (0..200).map(|i| format!("summary-{i:03}")).collect();
        let prompt = build_synthesis_prompt("orders", "v1", "{}", "{}", &summaries, 8);

        assert!(prompt.contains("summary-049"));
        assert!(!prompt.contains("summary-050"));
    }

    #[test]
    fn query_prompt_is_deterministic() {
        let summaries = vec!["Sales peak in Q4".to_string()];
        let a = build_query_prompt("orders", "v1", "Why?", "{}", Some("{}"), &summaries);
        let b = build_query_prompt("orders", "v1", "Why?", "{}", Some("{}"), &summaries);
        assert_eq!(a, b);
    }

    #[test]
    fn query_prompt_carries_question_and_null_analysis() {
        let prompt = build_query_prompt(
            "orders",
            "v1",
            "What is the average order value?",
            "{\"cols\":3}",
            None,
            &[],
        );

        assert!(prompt.contains("What is the average order value?"));
        assert!(prompt.contains("\"analysis\":null"));
        assert!(prompt.contains("Answer the user's question using ONLY the provided context."));
    }

    #[test]
    fn query_prompt_caps_insight_summaries() {
        let summaries: Vec<String> = (0..200).map(|i| format!("summary-{i:03}")).collect();
        let prompt = build_query_prompt("orders", "v1", "Why?", "{}", None, &summaries);

        assert!(prompt.contains("summary-079"));
        assert!(!prompt.contains("summary-080"));
    }

    #[test]
    fn prompts_announce_json_only_output() {
        let prompt = build_synthesis_prompt("orders", "v1", "{}", "{}", &[], 8);
        assert!(prompt.starts_with("You are an expert data analyst."));
        assert!(prompt.contains("Return valid JSON only"));
    }
}
