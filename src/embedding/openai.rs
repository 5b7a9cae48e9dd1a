//! OpenAI-compatible embedding client.
//!
//! Talks to any endpoint implementing `POST {base_url}/embeddings`
//! (OpenAI, Azure OpenAI, vLLM, Ollama's compatibility layer, ...).
//! Requests are blocking; 429, 5xx and transient transport failures are
//! retried with exponential backoff.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::embedding::EmbeddingService;
use crate::error::{RecommenderError, Result};
use crate::llm::RetryPolicy;
use crate::types::Embedding;

/// Blocking embeddings client for OpenAI-compatible endpoints.
pub struct OpenAiEmbedding {
    client: Client,
    endpoint: String,
    model: String,
    dimension: usize,
    /// Sent as `dimensions` only for models that accept truncation.
    requested_dimensions: Option<usize>,
    retry: RetryPolicy,
}

impl OpenAiEmbedding {
    /// Builds a new client.
    ///
    /// # Errors
    ///
    /// Returns `RecommenderError::Config` for an empty key or model, and
    /// `RecommenderError::Embedding` if the HTTP client cannot be built.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        dimension: usize,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(RecommenderError::config("missing embedding API key"));
        }
        if model.trim().is_empty() {
            return Err(RecommenderError::config("missing embedding model name"));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| RecommenderError::config("invalid embedding API key"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| RecommenderError::embedding(format!("failed to build HTTP client: {e}")))?;

        let requested_dimensions = model.starts_with("text-embedding-3").then_some(dimension);

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.to_string(),
            dimension,
            requested_dimensions,
            retry: RetryPolicy::new(max_retries, Duration::from_millis(500), Duration::from_secs(16)),
        })
    }

    /// Overrides the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn request(&self, inputs: &[&str]) -> Result<Vec<Embedding>> {
        let mut attempt = 0u32;
        loop {
            let body = EmbeddingRequest {
                model: &self.model,
                input: inputs,
                dimensions: self.requested_dimensions,
            };

            match self.client.post(&self.endpoint).json(&body).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return self.decode(resp, inputs.len());
                    }

                    let text = resp
                        .text()
                        .unwrap_or_else(|_| "<body unavailable>".to_string());
                    if should_retry(status) && attempt < self.retry.max_retries {
                        attempt += 1;
                        warn!(%status, attempt, "Embedding request failed, retrying");
                        thread::sleep(self.retry.backoff(attempt));
                        continue;
                    }
                    return Err(RecommenderError::embedding(format!(
                        "embeddings request failed ({status}): {text}"
                    )));
                }
                Err(err) => {
                    if is_retryable_error(&err) && attempt < self.retry.max_retries {
                        attempt += 1;
                        warn!(error = %err, attempt, "Embedding transport error, retrying");
                        thread::sleep(self.retry.backoff(attempt));
                        continue;
                    }
                    return Err(RecommenderError::embedding(format!(
                        "embeddings request failed: {err}"
                    )));
                }
            }
        }
    }

    fn decode(&self, resp: reqwest::blocking::Response, expected: usize) -> Result<Vec<Embedding>> {
        let mut parsed: EmbeddingResponse = resp.json().map_err(|e| {
            RecommenderError::embedding(format!("failed to parse embedding response: {e}"))
        })?;
        parsed.data.sort_by_key(|entry| entry.index);

        if parsed.data.len() != expected {
            return Err(RecommenderError::embedding(format!(
                "endpoint returned {} embeddings for {} inputs",
                parsed.data.len(),
                expected
            )));
        }

        debug!(count = expected, model = %self.model, "Embeddings received");
        Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
    }
}

impl EmbeddingService for OpenAiEmbedding {
    fn embed(&self, text: &str) -> Result<Embedding> {
        if text.is_empty() {
            return Err(RecommenderError::embedding("Cannot embed empty text"));
        }
        self.request(&[text])?
            .pop()
            .ok_or_else(|| RecommenderError::embedding("endpoint returned no embedding"))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
