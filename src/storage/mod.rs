//! Document store abstractions.
//!
//! This module provides a trait-based abstraction over the corpus store,
//! allowing different backends to be used (e.g., redb, an in-memory mock
//! for testing, or a hosted vector database).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Recommender                              │
//! │                         │                                    │
//! │                         ▼                                    │
//! │              ┌─────────────────────┐                        │
//! │              │   DocumentStore     │  ← Trait               │
//! │              └─────────────────────┘                        │
//! │                    ▲         ▲                              │
//! │                    │         │                              │
//! │       ┌────────────┴──┐   ┌──┴──────────┐                  │
//! │       │RedbDocument-  │   │ Mock stores │                  │
//! │       │Store (+HNSW)  │   │             │                  │
//! │       └───────────────┘   └─────────────┘                  │
//! │           (prod)              (test)                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod redb;
pub mod schema;

pub use self::redb::RedbDocumentStore;
pub use schema::{DatabaseMetadata, SCHEMA_VERSION};

use std::path::Path;

use crate::catalog::StoredDocument;
use crate::config::Config;
use crate::error::Result;

/// A document returned by nearest-neighbour search, with its similarity.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredDocument {
    /// The stored document. Its `embedding` field is left empty.
    pub document: StoredDocument,

    /// Similarity to the query vector; higher is more similar.
    pub score: f32,
}

/// Corpus store contract.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so the recommender can be shared
/// across threads. Search never mutates the corpus.
pub trait DocumentStore: Send + Sync {
    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Returns the database metadata (schema version, dimension, timestamps).
    fn metadata(&self) -> &DatabaseMetadata;

    /// Closes the store, flushing any pending writes.
    fn close(self: Box<Self>) -> Result<()>;

    /// Returns the path to the database file, if applicable.
    fn path(&self) -> Option<&Path>;

    // =========================================================================
    // Documents
    // =========================================================================

    /// Inserts or replaces the document with the same name.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::DimensionMismatch` if the embedding length
    /// doesn't match the store, or a storage error if the write fails.
    fn upsert(&self, document: &StoredDocument) -> Result<()>;

    /// Retrieves a document, with its embedding, by name.
    fn get(&self, name: &str) -> Result<Option<StoredDocument>>;

    /// Number of documents in the store.
    fn count(&self) -> Result<usize>;

    // =========================================================================
    // Search
    // =========================================================================

    /// Approximate nearest-neighbour search.
    ///
    /// Explores `num_candidates` candidates and returns at most `limit`
    /// documents, ordered by descending score.
    fn nearest(
        &self,
        query: &[f32],
        num_candidates: usize,
        limit: usize,
    ) -> Result<Vec<ScoredDocument>>;
}

/// Opens the default store backend (redb + HNSW) at `path`.
pub fn open_storage(path: impl AsRef<Path>, config: &Config) -> Result<Box<dyn DocumentStore>> {
    let storage = RedbDocumentStore::open(path, config)?;
    Ok(Box::new(storage))
}
