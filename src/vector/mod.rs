//! Vector index for approximate nearest neighbor search.
//!
//! The implementation uses [`hnsw_rs`] (pure Rust) with cosine distance.
//!
//! Embeddings stored in redb are the **source of truth**. The HNSW index
//! is a derived, rebuildable structure, reconstructed from stored
//! embeddings every time a store is opened.
//!
//! Similarity reported to callers is `1 - cosine distance`; see
//! [`similarity_from_distance`].

mod hnsw;

pub use hnsw::HnswIndex;

/// Converts a cosine distance (0.0 identical, 2.0 opposite) to a
/// similarity score where higher is better.
#[inline]
pub fn similarity_from_distance(distance: f32) -> f32 {
    1.0 - distance
}
