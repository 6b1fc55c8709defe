//! Integration tests for the Ollama backend against a mock HTTP server.
//!
//! Verifies the wire format of completion and embedding requests, the
//! `LlmUnavailable` classification of transport failures, and the `None`
//! sentinel behavior of the embedding capability.

use tabsense_core::{CompletionBackend, Error, OllamaConfig};
use tabsense_inference::OllamaBackend;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: String) -> OllamaConfig {
    OllamaConfig {
        base_url,
        generation_model: "test-gen".to_string(),
        embedding_model: Some("test-embed".to_string()),
        generation_timeout_secs: 5,
        embedding_timeout_secs: 5,
    }
}

#[tokio::test]
async fn complete_posts_generate_payload_and_returns_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(serde_json::json!({
            "model": "test-gen",
            "prompt": "Say hello.",
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "test-gen",
            "response": "Hello there!",
            "done": true
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = OllamaBackend::new(&test_config(mock_server.uri()));
    let text = backend.complete("Say hello.", 0.2).await.unwrap();
    assert_eq!(text, "Hello there!");
}

#[tokio::test]
async fn complete_classifies_http_error_as_unavailable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
        .mount(&mock_server)
        .await;

    let backend = OllamaBackend::new(&test_config(mock_server.uri()));
    let err = backend.complete("hi", 0.2).await.unwrap_err();

    match err {
        Error::LlmUnavailable(detail) => {
            assert!(detail.contains("404"), "detail should name the status: {detail}");
            assert!(detail.contains("model not found"));
        }
        other => panic!("expected LlmUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn complete_classifies_unreachable_endpoint_as_unavailable() {
    // Nothing is listening on this port.
    let config = test_config("http://127.0.0.1:9".to_string());
    let backend = OllamaBackend::new(&config);

    let err = backend.complete("hi", 0.2).await.unwrap_err();
    match err {
        Error::LlmUnavailable(detail) => {
            assert!(detail.contains("/api/generate"), "detail should name the endpoint");
        }
        other => panic!("expected LlmUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn complete_rejects_empty_response_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": "   ",
            "done": true
        })))
        .mount(&mock_server)
        .await;

    let backend = OllamaBackend::new(&test_config(mock_server.uri()));
    let err = backend.complete("hi", 0.2).await.unwrap_err();
    assert!(matches!(err, Error::LlmUnavailable(_)));
}

#[tokio::test]
async fn embed_returns_vectors_on_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(serde_json::json!({
            "model": "test-embed",
            "input": ["alpha", "beta"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "embeddings": [[0.1, 0.2], [0.3, 0.4]]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = OllamaBackend::new(&test_config(mock_server.uri()));
    let vectors = backend
        .embed(&["alpha".to_string(), "beta".to_string()])
        .await
        .unwrap();

    assert_eq!(vectors.len(), 2);
    assert_eq!(vectors[0], vec![0.1, 0.2]);
}

#[tokio::test]
async fn embed_failure_is_sentinel_not_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let backend = OllamaBackend::new(&test_config(mock_server.uri()));
    assert!(backend.embed(&["alpha".to_string()]).await.is_none());
}

#[tokio::test]
async fn embed_count_mismatch_is_sentinel() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "embeddings": [[0.1, 0.2]]
        })))
        .mount(&mock_server)
        .await;

    let backend = OllamaBackend::new(&test_config(mock_server.uri()));
    let out = backend
        .embed(&["alpha".to_string(), "beta".to_string()])
        .await;
    assert!(out.is_none());
}

#[tokio::test]
async fn health_check_reports_endpoint_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"models": []})))
        .mount(&mock_server)
        .await;

    let backend = OllamaBackend::new(&test_config(mock_server.uri()));
    assert!(backend.health_check().await.unwrap());

    let dead = OllamaBackend::new(&test_config("http://127.0.0.1:9".to_string()));
    assert!(!dead.health_check().await.unwrap());
}
