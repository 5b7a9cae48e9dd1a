//! HNSW vector index implementation using hnsw_rs.
//!
//! Wraps `hnsw_rs::Hnsw<f32, DistCosine>` with:
//! - Bidirectional document name ↔ `usize` ID mapping
//! - Soft-delete via `HashSet` + filtered search, used when a name is
//!   re-upserted with a new embedding
//!
//! # Thread Safety
//!
//! The `hnsw_rs::Hnsw` graph uses `parking_lot::RwLock` internally,
//! so `insert()` takes `&self`. Our ID bookkeeping (`IndexState`) is
//! protected by `std::sync::RwLock`.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use anndists::dist::DistCosine;
use hnsw_rs::prelude::*;

use crate::config::HnswConfig;
use crate::error::{RecommenderError, Result};

/// HNSW vector index over document embeddings.
///
/// The graph is not persisted. Embeddings stored in redb are the source of
/// truth and the index is rebuilt from them on open.
pub struct HnswIndex {
    /// The underlying HNSW graph. Uses `'static` lifetime because
    /// all data is heap-owned (not memory-mapped).
    hnsw: Hnsw<'static, f32, DistCosine>,

    /// Mutable ID bookkeeping protected by RwLock.
    state: RwLock<IndexState>,

    /// Embedding dimension (must match all inserted vectors).
    dimension: usize,
}

#[derive(Debug, Default)]
struct IndexState {
    /// Forward map: live document name → internal usize ID.
    name_to_internal: HashMap<String, usize>,

    /// Reverse map: internal usize ID → document name.
    /// Superseded entries keep their slot so IDs stay positional.
    internal_to_name: Vec<String>,

    /// Superseded internal IDs (excluded from search).
    deleted: HashSet<usize>,
}

impl IndexState {
    /// Allocates the next internal ID for `name`, superseding any previous one.
    fn assign(&mut self, name: &str) -> usize {
        let id = self.internal_to_name.len();
        if let Some(previous) = self.name_to_internal.insert(name.to_string(), id) {
            self.deleted.insert(previous);
        }
        self.internal_to_name.push(name.to_string());
        id
    }
}

impl HnswIndex {
    /// Creates a new empty HNSW index.
    pub fn new(dimension: usize, config: &HnswConfig) -> Self {
        let hnsw = Hnsw::new(
            config.max_nb_connection,
            config.max_elements,
            config.max_layer,
            config.ef_construction,
            DistCosine,
        );

        Self {
            hnsw,
            state: RwLock::new(IndexState::default()),
            dimension,
        }
    }

    /// Inserts or replaces the embedding for a document name.
    ///
    /// HNSW graphs don't support point removal, so a replaced vector stays
    /// in the graph and is soft-deleted.
    pub fn upsert(&self, name: &str, embedding: &[f32]) -> Result<()> {
        self.check_dimension(embedding.len(), "Embedding")?;

        let mut state = self
            .state
            .write()
            .map_err(|_| RecommenderError::vector("Index state lock poisoned"))?;

        let internal_id = state.assign(name);

        // Keep the state lock while inserting so a concurrent search never
        // sees an ID without its name.
        self.hnsw.insert((embedding, internal_id));

        Ok(())
    }

    /// Searches for the `k` nearest documents.
    ///
    /// `ef_search` is the candidate list size explored during traversal.
    /// Returns `(name, cosine distance)` pairs, closest first.
    pub fn search(&self, query: &[f32], k: usize, ef_search: usize) -> Result<Vec<(String, f32)>> {
        self.check_dimension(query.len(), "Query")?;

        let state = self
            .state
            .read()
            .map_err(|_| RecommenderError::vector("Index state lock poisoned"))?;

        if state.name_to_internal.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        // A concrete closure auto-implements hnsw_rs::FilterT.
        let deleted_ref = &state.deleted;
        let filter_fn = |id: &usize| -> bool { !deleted_ref.contains(id) };
        let ef_search = ef_search.max(k);
        let neighbours = if state.deleted.is_empty() {
            self.hnsw.search(query, k, ef_search)
        } else {
            self.hnsw
                .search_filter(query, k, ef_search, Some(&filter_fn))
        };

        Ok(neighbours
            .into_iter()
            .filter_map(|n| {
                state
                    .internal_to_name
                    .get(n.d_id)
                    .map(|name| (name.clone(), n.distance))
            })
            .collect())
    }

    /// Returns true if the name has a live vector in the index.
    pub fn contains(&self, name: &str) -> bool {
        self.state
            .read()
            .ok()
            .is_some_and(|s| s.name_to_internal.contains_key(name))
    }

    /// Returns the number of live (non-superseded) vectors.
    pub fn active_count(&self) -> usize {
        self.state.read().map_or(0, |s| s.name_to_internal.len())
    }

    /// Returns the total number of vectors in the graph, superseded included.
    pub fn total_count(&self) -> usize {
        self.hnsw.get_nb_point()
    }

    /// Returns true if the index has no live vectors.
    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    /// Embedding dimension accepted by this index.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Rebuilds an index from stored embeddings.
    ///
    /// Used when opening a store to reconstruct the graph from redb.
    pub fn rebuild_from_embeddings(
        dimension: usize,
        config: &HnswConfig,
        embeddings: Vec<(String, Vec<f32>)>,
    ) -> Result<Self> {
        let index = Self::new(dimension, config);

        if embeddings.is_empty() {
            return Ok(index);
        }

        if let Some((name, bad)) = embeddings.iter().find(|(_, e)| e.len() != dimension) {
            return Err(RecommenderError::vector(format!(
                "Stored embedding for '{}' has dimension {}, expected {}",
                name,
                bad.len(),
                dimension
            )));
        }

        let mut state = index
            .state
            .write()
            .map_err(|_| RecommenderError::vector("Index state lock poisoned"))?;

        let batch: Vec<(&Vec<f32>, usize)> = embeddings
            .iter()
            .map(|(name, embedding)| (embedding, state.assign(name)))
            .collect();

        drop(state);

        // Parallel bulk insert (uses rayon internally)
        index.hnsw.parallel_insert(&batch);

        Ok(index)
    }

    fn check_dimension(&self, got: usize, what: &str) -> Result<()> {
        if got != self.dimension {
            return Err(RecommenderError::vector(format!(
                "{what} dimension mismatch: expected {}, got {}",
                self.dimension, got
            )));
        }
        Ok(())
    }
}

// ==========================================================================
// Tests
// ==========================================================================
