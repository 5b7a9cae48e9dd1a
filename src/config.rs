//! Configuration types for the assessment recommender.
//!
//! The [`Config`] struct controls:
//! - Embedding provider (builtin ONNX or an OpenAI-compatible endpoint)
//! - Embedding dimension (384, 768, or custom)
//! - Durability of the document store
//! - HNSW graph parameters
//! - Search oversampling and skill fan-out limits
//! - Language model endpoint, rate limiting and retry
//!
//! Configuration is built once per process and handed to
//! [`Recommender::open`](crate::Recommender::open). The only environment
//! read happens in [`LlmConfig::from_env`].
//!
//! # Example
//! ```rust
//! use assessrec::{Config, EmbeddingDimension, SearchConfig};
//!
//! let config = Config {
//!     embedding_dimension: EmbeddingDimension::D768,
//!     search: SearchConfig {
//!         num_candidates: 800,
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Environment variable holding the language model API key.
pub const LLM_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default hosted language model.
pub const DEFAULT_LLM_MODEL: &str = "gemini-2.0-flash-001";

/// Default language model REST endpoint.
pub const DEFAULT_LLM_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Recommender configuration options.
///
/// All fields have sensible defaults. Use struct update syntax to override
/// specific settings.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// How embeddings are generated.
    pub embedding_provider: EmbeddingProvider,

    /// Embedding vector dimension (must match provider output).
    pub embedding_dimension: EmbeddingDimension,

    /// Durability mode for ingestion writes.
    pub sync_mode: SyncMode,

    /// HNSW vector index parameters.
    pub hnsw: HnswConfig,

    /// Vector search and fan-out settings.
    pub search: SearchConfig,

    /// Language model endpoint.
    pub llm: LlmConfig,

    /// Spacing and retry policy for language model calls.
    pub rate_limit: RateLimitConfig,
}

impl Config {
    /// Creates a new Config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a Config that embeds through an OpenAI-compatible endpoint.
    ///
    /// # Example
    /// ```rust
    /// use assessrec::{Config, EmbeddingDimension};
    ///
    /// let config = Config::with_openai_embeddings(
    ///     "sk-test",
    ///     "text-embedding-3-small",
    ///     EmbeddingDimension::Custom(1536),
    /// );
    /// assert!(config.embedding_provider.is_openai());
    /// ```
    pub fn with_openai_embeddings(
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimension: EmbeddingDimension,
    ) -> Self {
        Self {
            embedding_provider: EmbeddingProvider::OpenAi {
                api_key: api_key.into(),
                base_url: "https://api.openai.com/v1".to_string(),
                model: model.into(),
            },
            embedding_dimension: dimension,
            ..Default::default()
        }
    }

    /// Validates the configuration.
    ///
    /// Called automatically by `Recommender::open()` and
    /// `Recommender::from_parts()`.
    ///
    /// # Errors
    /// Returns `ValidationError` if:
    /// - Custom dimension is 0 or > 4096
    /// - `search.candidate_limit` is 0 or exceeds `search.num_candidates`
    /// - `search.max_skills` is 0
    /// - HNSW connection count or capacity is 0
    /// - `llm.timeout` is zero
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let EmbeddingDimension::Custom(dim) = self.embedding_dimension {
            if dim == 0 {
                return Err(ValidationError::invalid_field(
                    "embedding_dimension",
                    "custom dimension must be greater than 0",
                ));
            }
            if dim > 4096 {
                return Err(ValidationError::invalid_field(
                    "embedding_dimension",
                    "custom dimension must not exceed 4096",
                ));
            }
        }

        if self.search.candidate_limit == 0 {
            return Err(ValidationError::invalid_field(
                "search.candidate_limit",
                "must be greater than 0",
            ));
        }
        if self.search.num_candidates < self.search.candidate_limit {
            return Err(ValidationError::invalid_field(
                "search.num_candidates",
                "must be at least search.candidate_limit",
            ));
        }
        if self.search.max_skills == 0 {
            return Err(ValidationError::invalid_field(
                "search.max_skills",
                "must be greater than 0",
            ));
        }

        if self.hnsw.max_nb_connection == 0 {
            return Err(ValidationError::invalid_field(
                "hnsw.max_nb_connection",
                "must be greater than 0",
            ));
        }
        if self.hnsw.max_elements == 0 {
            return Err(ValidationError::invalid_field(
                "hnsw.max_elements",
                "must be greater than 0",
            ));
        }

        if self.llm.timeout.is_zero() {
            return Err(ValidationError::invalid_field(
                "llm.timeout",
                "must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Returns the embedding dimension as a numeric value.
    pub fn dimension(&self) -> usize {
        self.embedding_dimension.size()
    }
}

/// Embedding provider configuration.
#[derive(Clone, Debug)]
pub enum EmbeddingProvider {
    /// Local ONNX model (requires the `builtin-embeddings` feature).
    ///
    /// The default model is all-MiniLM-L6-v2 (384 dimensions).
    Builtin {
        /// Custom model directory. If `None`, uses the cache directory.
        model_path: Option<PathBuf>,
    },

    /// OpenAI-compatible `/embeddings` endpoint.
    OpenAi {
        /// Bearer token.
        api_key: String,
        /// Base URL without the `/embeddings` suffix.
        base_url: String,
        /// Embedding model name.
        model: String,
    },
}

impl Default for EmbeddingProvider {
    fn default() -> Self {
        Self::Builtin { model_path: None }
    }
}

impl EmbeddingProvider {
    /// Returns true if this is the builtin provider.
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin { .. })
    }

    /// Returns true if this is the OpenAI-compatible provider.
    pub fn is_openai(&self) -> bool {
        matches!(self, Self::OpenAi { .. })
    }
}

/// Embedding vector dimensions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbeddingDimension {
    /// 384 dimensions (all-MiniLM-L6-v2, default builtin model).
    #[default]
    D384,

    /// 768 dimensions (bge-base-en-v1.5, BERT-base).
    D768,

    /// Custom dimension for other embedding models.
    ///
    /// Must be between 1 and 4096.
    Custom(usize),
}

impl EmbeddingDimension {
    /// Returns the numeric size of this dimension.
    ///
    /// # Example
    /// ```rust
    /// use assessrec::EmbeddingDimension;
    ///
    /// assert_eq!(EmbeddingDimension::D384.size(), 384);
    /// assert_eq!(EmbeddingDimension::Custom(1536).size(), 1536);
    /// ```
    #[inline]
    pub const fn size(&self) -> usize {
        match self {
            Self::D384 => 384,
            Self::D768 => 768,
            Self::Custom(n) => *n,
        }
    }
}

/// Durability mode for write operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMode {
    /// Sync to disk on transaction commit.
    #[default]
    Normal,

    /// Async sync (faster bulk ingestion, may lose recent writes on crash).
    Fast,

    /// Two-phase commit with full sync.
    Paranoid,
}

impl SyncMode {
    /// Returns true if this mode syncs on every write.
    pub fn is_paranoid(&self) -> bool {
        matches!(self, Self::Paranoid)
    }

    /// Returns true if this mode is async (may lose data on crash).
    pub fn is_fast(&self) -> bool {
        matches!(self, Self::Fast)
    }
}

/// HNSW graph parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct HnswConfig {
    /// Maximum bidirectional connections per node (M).
    pub max_nb_connection: usize,

    /// Candidate list size during construction.
    pub ef_construction: usize,

    /// Maximum number of graph layers.
    pub max_layer: usize,

    /// Initial capacity hint; the graph grows past it if needed.
    pub max_elements: usize,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            max_nb_connection: 16,
            ef_construction: 200,
            max_layer: 16,
            max_elements: 10_000,
        }
    }
}

/// How duplicate names are resolved when merging per-skill result lists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergePolicy {
    /// A later occurrence replaces an earlier one, whatever its score.
    #[default]
    LastWriteWins,

    /// The occurrence with the highest score is kept.
    KeepHighestScore,
}

/// Vector search and skill fan-out settings.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchConfig {
    /// Candidates explored by the ANN search (oversampling factor).
    pub num_candidates: usize,

    /// Candidates returned by the ANN search, before the duration filter.
    pub candidate_limit: usize,

    /// Maximum skills requested from the language model in fan-out mode.
    pub max_skills: usize,

    /// Duplicate resolution for fan-out mode.
    pub merge_policy: MergePolicy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            num_candidates: 600,
            candidate_limit: 100,
            max_skills: 7,
            merge_policy: MergePolicy::LastWriteWins,
        }
    }
}

/// Language model endpoint configuration.
#[derive(Clone)]
pub struct LlmConfig {
    /// API key sent with each request. Empty means unauthenticated.
    pub api_key: String,

    /// Model identifier.
    pub model: String,

    /// REST base URL, without the `/models/...` path.
    pub base_url: String,

    /// Per-request timeout enforced by the HTTP client.
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_LLM_MODEL.to_string(),
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl LlmConfig {
    /// Builds the default configuration with the API key read from
    /// [`LLM_API_KEY_ENV`]. A missing variable leaves the key empty.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(LLM_API_KEY_ENV).unwrap_or_default(),
            ..Default::default()
        }
    }
}

/// Spacing and retry policy for language model calls.
#[derive(Clone, Debug, PartialEq)]
pub struct RateLimitConfig {
    /// Minimum time between the start of two consecutive calls.
    pub min_interval: Duration,

    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,

    /// Backoff before the first retry; doubles per attempt.
    pub base_backoff: Duration,

    /// Upper bound on a single backoff.
    pub max_backoff: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            // 15 requests per minute on the free tier
            min_interval: Duration::from_secs(4),
            max_retries: 3,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RateLimitConfig {
    /// No spacing and no retries. Useful for tests and local models.
    pub fn disabled() -> Self {
        Self {
            min_interval: Duration::ZERO,
            max_retries: 0,
            base_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }
}
