//! Error types for the assessment recommender.
//!
//! Errors are hierarchical:
//! - `RecommenderError` is the top-level error returned by all public APIs
//! - Specific error types (`StorageError`, `ValidationError`, `LanguageModelError`)
//!   provide detail
//!
//! Embedding and vector-search failures inside a search call are *not*
//! surfaced here; they degrade to an empty result list. Language model
//! failures always propagate.
//!
//! # Error Handling Pattern
//! ```rust,ignore
//! use assessrec::{Recommender, Config, Result};
//!
//! fn example() -> Result<()> {
//!     let rec = Recommender::open("./catalog.db", Config::default())?;
//!     let results = rec.search("Java developer, 40 minutes", 10)?;
//!     rec.close()?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Result type alias for recommender operations.
pub type Result<T> = std::result::Result<T, RecommenderError>;

/// Top-level error enum for all recommender operations.
#[derive(Debug, Error)]
pub enum RecommenderError {
    /// Storage layer error (I/O, corruption, transactions).
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Language model call failed (transport, quota, decoding).
    #[error("Language model error: {0}")]
    LanguageModel(#[from] LanguageModelError),

    /// Configuration error.
    #[error("Configuration error: {reason}")]
    Config {
        /// Description of what's wrong with the configuration.
        reason: String,
    },

    /// General I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedding generation/validation error.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector index error (HNSW operations).
    #[error("Vector index error: {0}")]
    Vector(String),
}

impl RecommenderError {
    /// Creates a configuration error with the given reason.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Creates an embedding error with the given message.
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    /// Creates a vector index error with the given message.
    pub fn vector(msg: impl Into<String>) -> Self {
        Self::Vector(msg.into())
    }

    /// Returns true if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a storage error.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if this is a language model error.
    pub fn is_language_model(&self) -> bool {
        matches!(self, Self::LanguageModel(_))
    }

    /// Returns true if this is an embedding error.
    pub fn is_embedding(&self) -> bool {
        matches!(self, Self::Embedding(_))
    }

    /// Returns true if this is a vector index error.
    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Vector(_))
    }

    /// Returns true if retrying the same call may succeed.
    ///
    /// Only language model errors classified as transient (rate limiting,
    /// server errors, timeouts) qualify.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::LanguageModel(err) => err.is_transient(),
            _ => false,
        }
    }
}

/// Failures of the document store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Stored bytes or metadata are unreadable.
    #[error("Database corrupted: {0}")]
    Corrupted(String),

    /// Begin or commit failed.
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// A document or metadata record did not (de)serialize.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Any other redb failure.
    #[error("Storage engine error: {0}")]
    Redb(String),

    /// The file was written by an incompatible schema.
    #[error("Schema version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch {
        /// Version this build reads.
        expected: u32,
        /// Version recorded in the file.
        found: u32,
    },
}

impl StorageError {
    /// Creates a corruption error with the given message.
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::Corrupted(msg.into())
    }

    /// Creates a transaction error with the given message.
    pub fn transaction(msg: impl Into<String>) -> Self {
        Self::Transaction(msg.into())
    }

    /// Creates a serialization error with the given message.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}

/// Maps foreign error types onto a `StorageError` variant and lifts them
/// into `RecommenderError` as well, so `?` works at both levels.
macro_rules! storage_conversions {
    ($($source:ty => $variant:ident $(($prefix:literal))?;)*) => {
        $(
            impl From<$source> for StorageError {
                fn from(err: $source) -> Self {
                    StorageError::$variant(format!(concat!($($prefix, ": ",)? "{}"), err))
                }
            }

            impl From<$source> for RecommenderError {
                fn from(err: $source) -> Self {
                    RecommenderError::Storage(StorageError::from(err))
                }
            }
        )*
    };
}

storage_conversions! {
    redb::Error => Redb;
    redb::DatabaseError => Redb;
    redb::TableError => Redb("table");
    redb::StorageError => Redb("io");
    redb::TransactionError => Transaction;
    redb::CommitError => Transaction("commit");
    bincode::Error => Serialization;
}

/// Validation errors for input data.
///
/// These errors indicate problems with data provided by the caller.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Embedding dimension doesn't match the store's configured dimension.
    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected dimension from configuration.
        expected: usize,
        /// Actual dimension provided.
        got: usize,
    },

    /// A field has an invalid value.
    #[error("Invalid field '{field}': {reason}")]
    InvalidField {
        /// Name of the invalid field.
        field: String,
        /// Why the value is invalid.
        reason: String,
    },

    /// A required field is missing or empty.
    #[error("Required field missing: {field}")]
    RequiredField {
        /// Name of the missing field.
        field: String,
    },
}

impl ValidationError {
    /// Creates a dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, got: usize) -> Self {
        Self::DimensionMismatch { expected, got }
    }

    /// Creates an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a required field error.
    pub fn required_field(field: impl Into<String>) -> Self {
        Self::RequiredField {
            field: field.into(),
        }
    }
}

/// Errors from the hosted language model.
#[derive(Debug, Error)]
pub enum LanguageModelError {
    /// The request never produced an HTTP response (connect, timeout, TLS).
    #[error("Transport failure: {message}")]
    Transport {
        /// Underlying client message.
        message: String,
        /// Whether the failure looks temporary (timeout, connect).
        retryable: bool,
    },

    /// The service answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The response carried no candidate text.
    #[error("Model returned no text")]
    EmptyResponse,

    /// The response body could not be decoded.
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl LanguageModelError {
    /// Creates a transport error.
    pub fn transport(message: impl Into<String>, retryable: bool) -> Self {
        Self::Transport {
            message: message.into(),
            retryable,
        }
    }

    /// Creates a status error.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Creates a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Returns true for quota (429), server (5xx) and retryable transport errors.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { retryable, .. } => *retryable,
            Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
            Self::EmptyResponse | Self::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for LanguageModelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::status(status.as_u16(), err.to_string());
        }
        let retryable = err.is_timeout() || err.is_connect() || err.is_request();
        Self::transport(err.to_string(), retryable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RecommenderError::config("Invalid dimension");
        assert_eq!(err.to_string(), "Configuration error: Invalid dimension");
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::SchemaVersionMismatch {
            expected: 2,
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "Schema version mismatch: expected 2, found 1"
        );
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::dimension_mismatch(384, 768);
        assert_eq!(
            err.to_string(),
            "Embedding dimension mismatch: expected 384, got 768"
        );
    }

    #[test]
    fn test_is_validation() {
        let err: RecommenderError = ValidationError::required_field("query").into();
        assert!(err.is_validation());
        assert!(!err.is_language_model());
    }

    #[test]
    fn test_language_model_transient_classification() {
        assert!(LanguageModelError::status(429, "quota").is_transient());
        assert!(LanguageModelError::status(503, "unavailable").is_transient());
        assert!(!LanguageModelError::status(400, "bad request").is_transient());
        assert!(!LanguageModelError::status(401, "unauthorized").is_transient());
        assert!(LanguageModelError::transport("timed out", true).is_transient());
        assert!(!LanguageModelError::EmptyResponse.is_transient());
        assert!(!LanguageModelError::decode("not json").is_transient());
    }

    #[test]
    fn test_recommender_error_is_transient() {
        let err: RecommenderError = LanguageModelError::status(429, "slow down").into();
        assert!(err.is_language_model());
        assert!(err.is_transient());

        let err = RecommenderError::embedding("model missing");
        assert!(err.is_embedding());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_vector_error_display() {
        let err = RecommenderError::vector("HNSW insert failed");
        assert_eq!(err.to_string(), "Vector index error: HNSW insert failed");
        assert!(err.is_vector());
        assert!(!err.is_storage());
    }

    #[test]
    fn test_redb_conversion_prefixes() {
        let err = StorageError::from(redb::CommitError::Storage(redb::StorageError::Corrupted(
            "bad page".into(),
        )));
        assert!(matches!(err, StorageError::Transaction(ref m) if m.starts_with("commit: ")));
    }

    #[test]
    fn test_error_conversion_chain() {
        fn inner() -> Result<()> {
            Err(StorageError::corrupted("test corruption"))?
        }

        let result = inner();
        assert!(result.is_err());
        assert!(result.unwrap_err().is_storage());
    }
}
