//! Assessment catalog module.
//!
//! A **catalog record** is one flat product row as supplied by catalog
//! acquisition. Ingestion renders it to canonical text, embeds it and stores
//! it as a [`StoredDocument`] keyed by name.
//!
//! # Operations
//!
//! Ingestion is available on [`Recommender`](crate::Recommender):
//!
//! - [`ingest_record(record)`](crate::Recommender::ingest_record)
//! - [`ingest_catalog(records)`](crate::Recommender::ingest_catalog)

pub mod types;
mod validation;

pub use types::{
    parse_assessment_length, render_document_text, CatalogRecord, StoredDocument, TestType, YesNo,
};

pub(crate) use validation::validate_record;

/// Counters reported by a catalog ingestion run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Records seen.
    pub processed: usize,
    /// Records embedded and upserted.
    pub upserted: usize,
    /// Records skipped because their embedding could not be produced.
    pub skipped: usize,
}
