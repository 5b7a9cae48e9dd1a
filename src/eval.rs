//! Retrieval quality metrics.
//!
//! Pure functions over ranked name lists, used to score the recommender
//! against a labelled query set. Running the queries is left to the caller.
//!
//! ```rust
//! use assessrec::eval::{average_precision_at_k, recall_at_k};
//!
//! let expected = ["A", "B"];
//! let predicted = ["A", "X", "B"];
//! assert_eq!(recall_at_k(&expected, &predicted, 2), 0.5);
//! assert!((average_precision_at_k(&expected, &predicted, 3) - (1.0 + 2.0 / 3.0) / 2.0).abs() < 1e-9);
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Fraction of `expected` found in the first `k` predictions.
///
/// Returns 0 when `expected` is empty.
pub fn recall_at_k<E, P>(expected: &[E], predicted: &[P], k: usize) -> f64
where
    E: AsRef<str>,
    P: AsRef<str>,
{
    if expected.is_empty() {
        return 0.0;
    }
    let relevant = relevant_set(expected);
    let hits: HashSet<&str> = top_k(predicted, k)
        .filter(|name| relevant.contains(name))
        .collect();
    hits.len() as f64 / expected.len() as f64
}

/// Distinct relevant items in the first `k` predictions, divided by `k`.
///
/// Returns 0 when `expected` is empty or `k` is 0.
pub fn precision_at_k<E, P>(expected: &[E], predicted: &[P], k: usize) -> f64
where
    E: AsRef<str>,
    P: AsRef<str>,
{
    if expected.is_empty() || k == 0 {
        return 0.0;
    }
    let relevant = relevant_set(expected);
    let hits: HashSet<&str> = top_k(predicted, k)
        .filter(|name| relevant.contains(name))
        .collect();
    hits.len() as f64 / k as f64
}

/// Average precision over the first `k` predictions.
///
/// Sums precision@i at every rank `i` holding a relevant item and divides
/// by `expected.len()`. Returns 0 when `expected` is empty.
pub fn average_precision_at_k<E, P>(expected: &[E], predicted: &[P], k: usize) -> f64
where
    E: AsRef<str>,
    P: AsRef<str>,
{
    if expected.is_empty() {
        return 0.0;
    }
    let relevant = relevant_set(expected);

    let mut hits = 0usize;
    let mut sum = 0.0;
    for (rank, name) in top_k(predicted, k).enumerate() {
        if relevant.contains(name) {
            hits += 1;
            sum += hits as f64 / (rank + 1) as f64;
        }
    }
    sum / expected.len() as f64
}

fn relevant_set<E: AsRef<str>>(expected: &[E]) -> HashSet<&str> {
    expected.iter().map(AsRef::as_ref).collect()
}

fn top_k<P: AsRef<str>>(predicted: &[P], k: usize) -> impl Iterator<Item = &str> {
    predicted.iter().take(k).map(AsRef::as_ref)
}

/// One labelled query and what the recommender returned for it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalCase {
    /// The query text.
    pub query: String,
    /// Names of the relevant assessments.
    pub expected: Vec<String>,
    /// Names returned, in rank order.
    pub predicted: Vec<String>,
}

/// Mean metrics over a set of cases at one cutoff.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvalSummary {
    /// Cutoff.
    pub k: usize,
    /// Number of cases scored.
    pub queries: usize,
    /// Mean recall@k.
    pub mean_recall: f64,
    /// Mean average precision@k (MAP@k).
    pub mean_average_precision: f64,
}

impl EvalSummary {
    /// Scores every case at cutoff `k`. An empty set yields zero means.
    pub fn from_cases(cases: &[EvalCase], k: usize) -> Self {
        let queries = cases.len();
        if queries == 0 {
            return Self {
                k,
                queries,
                mean_recall: 0.0,
                mean_average_precision: 0.0,
            };
        }

        let (recall, ap) = cases.iter().fold((0.0, 0.0), |(r, a), case| {
            (
                r + recall_at_k(&case.expected, &case.predicted, k),
                a + average_precision_at_k(&case.expected, &case.predicted, k),
            )
        });

        Self {
            k,
            queries,
            mean_recall: recall / queries as f64,
            mean_average_precision: ap / queries as f64,
        }
    }
}
