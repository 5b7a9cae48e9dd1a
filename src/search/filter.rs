//! Duration post-filter for vector search.
//!
//! [`DurationFilter`] narrows ANN candidates by their assessment length.
//! It is parsed out of the refined query text (see [`super::duration`]) and
//! applied after the primary HNSW retrieval, before truncation.

use serde::{Deserialize, Serialize};

use super::duration::parse_duration_filter;

/// Constraint on an assessment's duration in minutes.
///
/// At most one form is active per search. Any active form rejects documents
/// whose duration is unknown.
///
/// # Example
///
/// ```rust
/// use assessrec::DurationFilter;
///
/// let filter = DurationFilter::parse("Name: Java\nAssessment Length: <=60");
/// assert_eq!(filter, DurationFilter::AtMost(60));
/// assert!(filter.matches(Some(45)));
/// assert!(!filter.matches(Some(75)));
/// assert!(!filter.matches(None));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationFilter {
    /// No constraint; every document passes.
    #[default]
    None,

    /// Duration equals the value.
    Exact(u32),

    /// Duration is at least the value.
    AtLeast(u32),

    /// Duration is at most the value.
    AtMost(u32),

    /// Duration lies in the closed interval. Empty when `min > max`.
    Range {
        /// Inclusive lower bound.
        min: u32,
        /// Inclusive upper bound.
        max: u32,
    },
}

impl DurationFilter {
    /// Parses the first valid `Assessment Length:` constraint in `text`.
    ///
    /// Returns [`DurationFilter::None`] when no occurrence matches the
    /// grammar. Never fails.
    pub fn parse(text: &str) -> Self {
        parse_duration_filter(text)
    }

    /// Returns true when no constraint is active.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns `true` if a document with the given duration passes.
    pub fn matches(&self, minutes: Option<u32>) -> bool {
        let value = match (self, minutes) {
            (Self::None, _) => return true,
            (_, None) => return false,
            (_, Some(v)) => v,
        };

        match *self {
            Self::None => true,
            Self::Exact(n) => value == n,
            Self::AtLeast(n) => value >= n,
            Self::AtMost(n) => value <= n,
            Self::Range { min, max } => min <= value && value <= max,
        }
    }

    /// Renders the constraint back into refined-query form.
    ///
    /// Returns `None` for [`DurationFilter::None`]. The output parses back to
    /// the same filter.
    pub fn constraint_line(&self) -> Option<String> {
        let operand = match *self {
            Self::None => return None,
            Self::Exact(n) => n.to_string(),
            Self::AtLeast(n) => format!(">={n}"),
            Self::AtMost(n) => format!("<={n}"),
            Self::Range { min, max } => format!("{min}-{max}"),
        };
        Some(format!("Assessment Length: {operand}"))
    }
}

impl std::fmt::Display for DurationFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::None => f.write_str("none"),
            Self::Exact(n) => write!(f, "exact({n})"),
            Self::AtLeast(n) => write!(f, "at_least({n})"),
            Self::AtMost(n) => write!(f, "at_most({n})"),
            Self::Range { min, max } => write!(f, "range({min},{max})"),
        }
    }
}
