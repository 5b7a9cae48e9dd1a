//! Embedding service abstractions.
//!
//! Embeddings are dense vector representations of text used for semantic
//! search. The same service embeds catalog documents at ingestion time and
//! refined queries at search time, so both live in one vector space.
//!
//! # Providers
//!
//! - `OnnxEmbedding` - Local ONNX model (requires `builtin-embeddings` feature)
//! - [`OpenAiEmbedding`] - OpenAI-compatible `/embeddings` endpoint
//!
//! # Failure Handling
//!
//! Inside the search pipeline an embedding failure is not an error: it is
//! logged and the search returns no results. [`embed_or_none`] implements
//! that boundary.

#[cfg(feature = "builtin-embeddings")]
pub mod onnx;
pub mod openai;

pub use openai::OpenAiEmbedding;

use tracing::warn;

use crate::config::{Config, EmbeddingProvider};
use crate::error::{RecommenderError, Result, ValidationError};
use crate::types::Embedding;

/// Embedding service trait for generating vector representations of text.
///
/// Implementations must be thread-safe (`Send + Sync`).
///
/// # Implementing a Custom Provider
///
/// ```rust,ignore
/// use assessrec::embedding::EmbeddingService;
/// use assessrec::{Embedding, Result};
///
/// struct MyEmbeddingService {
///     client: MyApiClient,
/// }
///
/// impl EmbeddingService for MyEmbeddingService {
///     fn embed(&self, text: &str) -> Result<Embedding> {
///         Ok(self.client.get_embedding(text)?)
///     }
///
///     fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
///         texts.iter().map(|t| self.embed(t)).collect()
///     }
///
///     fn dimension(&self) -> usize {
///         384
///     }
/// }
/// ```
pub trait EmbeddingService: Send + Sync {
    /// Generates an embedding for a single text.
    ///
    /// # Errors
    ///
    /// Returns `RecommenderError::Embedding` if embedding generation fails.
    fn embed(&self, text: &str) -> Result<Embedding>;

    /// Generates embeddings for multiple texts, in input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Returns the dimension of embeddings produced by this service.
    fn dimension(&self) -> usize;

    /// Validates that an embedding has the correct dimension.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::DimensionMismatch` if dimensions don't match.
    fn validate_embedding(&self, embedding: &Embedding) -> Result<()> {
        let expected = self.dimension();
        let actual = embedding.len();

        if actual != expected {
            return Err(RecommenderError::Validation(
                ValidationError::dimension_mismatch(expected, actual),
            ));
        }

        Ok(())
    }
}

/// Embeds `text`, converting any failure into `None`.
///
/// A provider error or a vector of the wrong dimension is logged at `warn`
/// level. Callers treat `None` as "no results" (search) or "skip" (ingestion).
pub fn embed_or_none(service: &dyn EmbeddingService, text: &str) -> Option<Embedding> {
    let embedding = match service.embed(text) {
        Ok(embedding) => embedding,
        Err(e) => {
            warn!(error = %e, "Embedding generation failed");
            return None;
        }
    };

    if let Err(e) = service.validate_embedding(&embedding) {
        warn!(error = %e, "Embedding rejected");
        return None;
    }

    Some(embedding)
}

/// Creates an embedding service based on the configuration.
///
/// # Errors
///
/// Returns an error if:
/// - Builtin embeddings requested but feature not enabled
/// - ONNX model loading fails (for builtin provider)
/// - The HTTP client for a remote provider cannot be built
pub fn create_embedding_service(config: &Config) -> Result<Box<dyn EmbeddingService>> {
    match &config.embedding_provider {
        #[cfg(feature = "builtin-embeddings")]
        EmbeddingProvider::Builtin { model_path } => {
            let service = onnx::OnnxEmbedding::with_dimension(model_path.clone(), config.dimension())?;
            Ok(Box::new(service))
        }

        #[cfg(not(feature = "builtin-embeddings"))]
        EmbeddingProvider::Builtin { .. } => Err(RecommenderError::embedding(
            "Builtin embeddings require the 'builtin-embeddings' feature",
        )),

        EmbeddingProvider::OpenAi {
            api_key,
            base_url,
            model,
        } => {
            let service = OpenAiEmbedding::new(
                api_key,
                base_url,
                model,
                config.dimension(),
                config.llm.timeout,
                config.rate_limit.max_retries,
            )?;
            Ok(Box::new(service))
        }
    }
}
