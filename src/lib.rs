//! # assessrec
//!
//! Assessment recommendation engine: turns a free-text hiring request into a
//! ranked list of assessments from a product catalog.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use assessrec::{Config, LlmConfig, Recommender};
//!
//! let rec = Recommender::open("./catalog.db", Config {
//!     llm: LlmConfig::from_env(),
//!     ..Default::default()
//! })?;
//!
//! // One query, at most 10 results
//! let results = rec.search("Java developer who collaborates well, about 40 minutes", 10)?;
//!
//! // One search per extracted skill, merged
//! let results = rec.search_multiple_skills("SQL and Python data analyst", 5, 10)?;
//!
//! rec.close()?;
//! ```
//!
//! ## Pipeline
//!
//! 1. **Refine**: a language model rewrites the request into the catalog's
//!    labelled-line layout (`Name:`, `Description:`, `Test Type:`, ...).
//! 2. **Parse**: an `Assessment Length:` line in the refined text becomes a
//!    [`DurationFilter`] (`<=60`, `>=30`, `30-40` or `45`).
//! 3. **Embed**: the refined text is embedded with the same model used for
//!    catalog documents.
//! 4. **Search**: approximate nearest neighbours are fetched from the store,
//!    filtered by duration, sorted by similarity and truncated.
//!
//! Fan-out search runs steps 1 to 4 once per skill the model extracts from the
//! request and merges the lists by assessment name.
//!
//! ## Failure Semantics
//!
//! Language model failures are errors. Embedding and store failures during
//! a search are logged and produce an empty result list.
//!
//! ## Features
//!
//! - `builtin-embeddings` - Enable built-in ONNX embedding generation
//!
//! ## Thread Safety
//!
//! [`Recommender`] is `Send + Sync` and can be shared across threads using
//! `Arc`. All operations are blocking.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

// ============================================================================
// Module declarations
// ============================================================================

mod config;
mod error;
mod recommender;
mod types;

pub mod catalog;
pub mod embedding;
pub mod eval;
pub mod llm;
pub mod refine;
pub mod search;
pub mod storage;

/// Vector index module for HNSW-based approximate nearest neighbor search.
pub mod vector;

// ============================================================================
// Public API re-exports
// ============================================================================

// Main interface
pub use recommender::Recommender;

// Configuration
pub use config::{
    Config, EmbeddingDimension, EmbeddingProvider, HnswConfig, LlmConfig, MergePolicy,
    RateLimitConfig, SearchConfig, SyncMode, DEFAULT_LLM_BASE_URL, DEFAULT_LLM_MODEL,
    LLM_API_KEY_ENV,
};

// Error handling
pub use error::{LanguageModelError, RecommenderError, Result, StorageError, ValidationError};

// Core types
pub use types::{Embedding, Timestamp};

// Domain types
pub use catalog::{CatalogRecord, IngestStats, StoredDocument, TestType, YesNo};

// Search
pub use search::{DurationFilter, SearchResult};

// Storage (for advanced users)
pub use storage::DatabaseMetadata;

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Convenient imports for common usage.
///
/// ```rust
/// use assessrec::prelude::*;
/// ```
pub mod prelude {
    pub use crate::catalog::{CatalogRecord, TestType};
    pub use crate::config::{Config, EmbeddingDimension, LlmConfig, MergePolicy};
    pub use crate::error::{RecommenderError, Result};
    pub use crate::recommender::Recommender;
    pub use crate::search::{DurationFilter, SearchResult};
}
