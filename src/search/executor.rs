//! Vector search with duration post-filtering.

use tracing::{debug, warn};

use super::filter::DurationFilter;
use super::result::{rank_by_score, SearchResult};
use crate::config::SearchConfig;
use crate::storage::DocumentStore;

/// Runs one nearest-neighbour query against the store and shapes the
/// candidates into ranked results.
///
/// The store is asked for a fixed-size candidate pool
/// ([`SearchConfig::candidate_limit`], explored with
/// [`SearchConfig::num_candidates`]). The duration filter is applied to that
/// pool, so a selective filter can return fewer than `limit` results even
/// when more matching documents exist in the corpus.
pub struct VectorSearchExecutor<'a> {
    store: &'a dyn DocumentStore,
    config: &'a SearchConfig,
}

impl<'a> VectorSearchExecutor<'a> {
    /// Creates an executor over `store`.
    pub fn new(store: &'a dyn DocumentStore, config: &'a SearchConfig) -> Self {
        Self { store, config }
    }

    /// Returns at most `limit` results, sorted by descending score.
    ///
    /// A store failure is logged and yields an empty list.
    pub fn execute(
        &self,
        query: &[f32],
        filter: &DurationFilter,
        limit: usize,
    ) -> Vec<SearchResult> {
        let candidates = match self.store.nearest(
            query,
            self.config.num_candidates,
            self.config.candidate_limit,
        ) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, "Vector search failed");
                return Vec::new();
            }
        };
        let pool = candidates.len();

        let mut results: Vec<SearchResult> = candidates
            .into_iter()
            .filter(|c| filter.matches(c.document.assessment_length))
            .map(|c| SearchResult::from_document(c.document, c.score))
            .collect();

        debug!(
            candidates = pool,
            matched = results.len(),
            filter = %filter,
            "Duration filter applied"
        );

        rank_by_score(&mut results);
        results.truncate(limit);
        results
    }
}
