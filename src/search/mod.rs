//! Search pipeline building blocks.
//!
//! - [`DurationFilter`] parses the `Assessment Length:` constraint out of
//!   refined query text and tests stored durations against it.
//! - [`VectorSearchExecutor`] runs one ANN query and applies the filter.
//! - [`ResultMerger`] deduplicates the per-skill lists of fan-out search.
//!
//! The [`Recommender`](crate::Recommender) wires these together with the
//! query refiner and embedding service.

mod duration;
mod executor;
mod fanout;
mod filter;
mod result;

pub use duration::{parse_duration_filter, ASSESSMENT_LENGTH_LABEL};
pub use executor::VectorSearchExecutor;
pub use fanout::ResultMerger;
pub use filter::DurationFilter;
pub use result::{rank_by_score, SearchResult};
