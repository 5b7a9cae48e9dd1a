//! HTTP client tests against a mock server.
//!
//! Covers the Gemini `generateContent` client, the rate-limited wrapper's
//! retry behaviour over real HTTP, and the OpenAI-compatible embedder.

use std::time::Duration;

use assessrec::embedding::{EmbeddingService, OpenAiEmbedding};
use assessrec::llm::{GeminiModel, LanguageModel, RateLimitedModel, RetryPolicy};
use assessrec::{LanguageModelError, LlmConfig, RateLimitConfig, RecommenderError};
use httpmock::prelude::*;
use serde_json::json;

const MODEL: &str = "gemini-test";
const GENERATE_PATH: &str = "/v1beta/models/gemini-test:generateContent";

fn gemini_config(server: &MockServer) -> LlmConfig {
    LlmConfig {
        api_key: "test-key".into(),
        model: MODEL.into(),
        base_url: server.url("/v1beta"),
        timeout: Duration::from_secs(5),
    }
}

fn fast_retries(max_retries: u32) -> RateLimitConfig {
    RateLimitConfig {
        max_retries,
        ..RateLimitConfig::disabled()
    }
}

// ============================================================================
// Gemini
// ============================================================================

#[test]
fn test_gemini_sends_prompt_and_decodes_text() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(GENERATE_PATH)
            .header("x-goog-api-key", "test-key")
            .body_includes("Java developer");
        then.status(200).json_body(json!({
            "candidates": [{
                "content": {"parts": [{"text": "Name: Java\n"}, {"text": "Assessment Length: <=40"}]}
            }]
        }));
    });

    let model = GeminiModel::new(&gemini_config(&server)).unwrap();
    let text = model.generate("refine: Java developer").unwrap();

    mock.assert();
    assert_eq!(text, "Name: Java\nAssessment Length: <=40");
}

#[test]
fn test_gemini_quota_error_is_transient() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(429).body("Resource has been exhausted");
    });

    let model = GeminiModel::new(&gemini_config(&server)).unwrap();
    let err = model.generate("prompt").unwrap_err();

    assert!(err.is_transient());
    match err {
        RecommenderError::LanguageModel(LanguageModelError::Status { status, body }) => {
            assert_eq!(status, 429);
            assert!(body.contains("exhausted"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_gemini_bad_request_is_permanent() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(400).body("API key not valid");
    });

    let model = GeminiModel::new(&gemini_config(&server)).unwrap();
    let err = model.generate("prompt").unwrap_err();
    assert!(err.is_language_model());
    assert!(!err.is_transient());
}

#[test]
fn test_gemini_empty_candidates() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(200).json_body(json!({"candidates": []}));
    });

    let model = GeminiModel::new(&gemini_config(&server)).unwrap();
    let err = model.generate("prompt").unwrap_err();
    assert!(matches!(
        err,
        RecommenderError::LanguageModel(LanguageModelError::EmptyResponse)
    ));
}

#[test]
fn test_gemini_malformed_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(200).body("not json");
    });

    let model = GeminiModel::new(&gemini_config(&server)).unwrap();
    let err = model.generate("prompt").unwrap_err();
    assert!(matches!(
        err,
        RecommenderError::LanguageModel(LanguageModelError::Decode(_))
    ));
}

#[test]
fn test_rate_limited_model_retries_server_errors() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(503).body("overloaded");
    });

    let model = RateLimitedModel::new(
        GeminiModel::new(&gemini_config(&server)).unwrap(),
        &fast_retries(2),
    );
    assert!(model.generate("prompt").is_err());
    mock.assert_hits(3);
}

#[test]
fn test_rate_limited_model_does_not_retry_client_errors() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path(GENERATE_PATH);
        then.status(403).body("forbidden");
    });

    let model = RateLimitedModel::new(
        GeminiModel::new(&gemini_config(&server)).unwrap(),
        &fast_retries(3),
    );
    assert!(model.generate("prompt").is_err());
    mock.assert_hits(1);
}

// ============================================================================
// OpenAI-compatible embeddings
// ============================================================================

fn embedder(server: &MockServer, max_retries: u32) -> OpenAiEmbedding {
    OpenAiEmbedding::new(
        "sk-test",
        &server.url("/v1"),
        "text-embedding-3-small",
        3,
        Duration::from_secs(5),
        max_retries,
    )
    .unwrap()
    .with_retry_policy(RetryPolicy::new(max_retries, Duration::ZERO, Duration::ZERO))
}

#[test]
fn test_openai_batch_sorted_by_index() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/embeddings")
            .header("authorization", "Bearer sk-test")
            .body_includes("\"dimensions\":3");
        then.status(200).json_body(json!({
            "data": [
                {"embedding": [0.0, 1.0, 0.0], "index": 1},
                {"embedding": [1.0, 0.0, 0.0], "index": 0}
            ]
        }));
    });

    let service = embedder(&server, 0);
    let vectors = service.embed_batch(&["first", "second"]).unwrap();

    mock.assert();
    assert_eq!(vectors, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);
}

#[test]
fn test_openai_single_embed() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/embeddings");
        then.status(200).json_body(json!({
            "data": [{"embedding": [0.5, 0.5, 0.0], "index": 0}]
        }));
    });

    let service = embedder(&server, 0);
    assert_eq!(service.embed("text").unwrap(), vec![0.5, 0.5, 0.0]);
    assert_eq!(service.dimension(), 3);
}

#[test]
fn test_openai_retries_server_errors_then_fails() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/v1/embeddings");
        then.status(502).body("bad gateway");
    });

    let service = embedder(&server, 2);
    let err = service.embed("text").unwrap_err();

    assert!(err.is_embedding());
    mock.assert_hits(3);
}

#[test]
fn test_openai_does_not_retry_auth_errors() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/v1/embeddings");
        then.status(401).body("invalid key");
    });

    let service = embedder(&server, 3);
    assert!(service.embed("text").unwrap_err().is_embedding());
    mock.assert_hits(1);
}

#[test]
fn test_openai_count_mismatch_is_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/embeddings");
        then.status(200).json_body(json!({
            "data": [{"embedding": [0.5, 0.5, 0.0], "index": 0}]
        }));
    });

    let service = embedder(&server, 0);
    assert!(service.embed_batch(&["a", "b"]).is_err());
}
