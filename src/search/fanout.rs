//! Merging of per-skill result lists.

use std::collections::HashMap;

use super::result::{rank_by_score, SearchResult};
use crate::config::MergePolicy;

/// Accumulates results from several searches, deduplicated by name.
///
/// Each name keeps the position where it was first seen; the
/// [`MergePolicy`] decides which occurrence's fields and score survive.
#[derive(Debug)]
pub struct ResultMerger {
    policy: MergePolicy,
    merged: Vec<SearchResult>,
    by_name: HashMap<String, usize>,
}

impl ResultMerger {
    /// Creates an empty merger.
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            policy,
            merged: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Adds one result.
    pub fn push(&mut self, result: SearchResult) {
        match self.by_name.get(&result.name) {
            Some(&slot) => {
                let replace = match self.policy {
                    MergePolicy::LastWriteWins => true,
                    MergePolicy::KeepHighestScore => result.score > self.merged[slot].score,
                };
                if replace {
                    self.merged[slot] = result;
                }
            }
            None => {
                self.by_name.insert(result.name.clone(), self.merged.len());
                self.merged.push(result);
            }
        }
    }

    /// Adds every result of one search, in order.
    pub fn extend(&mut self, results: impl IntoIterator<Item = SearchResult>) {
        for result in results {
            self.push(result);
        }
    }

    /// Number of distinct names seen.
    pub fn len(&self) -> usize {
        self.merged.len()
    }

    /// Returns true if nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.merged.is_empty()
    }

    /// Sorts by descending score (ties keep first-seen order) and keeps at
    /// most `limit` results.
    pub fn into_ranked(mut self, limit: usize) -> Vec<SearchResult> {
        rank_by_score(&mut self.merged);
        self.merged.truncate(limit);
        self.merged
    }
}
