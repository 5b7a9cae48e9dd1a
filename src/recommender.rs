//! The recommender handle and its pipeline operations.
//!
//! [`Recommender`] owns the corpus store, the embedding service and the
//! language model, and wires them into the two search flows:
//!
//! ```text
//! search(query, L)
//!   refine ──► parse duration ──► embed ──► nearest + filter ──► top L
//!
//! search_multiple_skills(query, P, F)
//!   extract skills ─┐
//!   refine (filter) ┴─► for each skill: search(skill query, P) ──► merge ──► top F
//! ```
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use assessrec::{CatalogRecord, Config, LlmConfig, Recommender};
//!
//! let config = Config {
//!     llm: LlmConfig::from_env(),
//!     ..Default::default()
//! };
//! let rec = Recommender::open("./catalog.db", config)?;
//!
//! rec.ingest_catalog(&records)?;
//! for hit in rec.search("Java developer, about 40 minutes", 10)? {
//!     println!("{:.3} {} ({} min)", hit.score, hit.name, hit.duration_minutes());
//! }
//!
//! rec.close()?;
//! ```
//!
//! # Thread Safety
//!
//! `Recommender` is `Send + Sync` and can be shared across threads using
//! `Arc`. Searches never write to the store.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::catalog::{validate_record, CatalogRecord, IngestStats, StoredDocument};
use crate::config::Config;
use crate::embedding::{create_embedding_service, embed_or_none, EmbeddingService};
use crate::error::{RecommenderError, Result, ValidationError};
use crate::llm::{create_language_model, LanguageModel};
use crate::refine::prompts::skill_query;
use crate::refine::QueryRefiner;
use crate::search::{DurationFilter, ResultMerger, SearchResult, VectorSearchExecutor};
use crate::storage::{open_storage, DatabaseMetadata, DocumentStore};

/// Records between two ingestion progress log lines.
const INGEST_PROGRESS_INTERVAL: usize = 50;

/// The assessment recommender.
///
/// Create with [`Recommender::open()`] (or [`Recommender::from_parts()`]
/// with custom components) and release with [`Recommender::close()`].
pub struct Recommender {
    /// Corpus store (redb + HNSW, or a mock in tests).
    store: Box<dyn DocumentStore>,

    /// Embeds documents at ingestion and refined queries at search time.
    embedding: Box<dyn EmbeddingService>,

    /// Query refinement and skill extraction.
    llm: Box<dyn LanguageModel>,

    config: Config,
}

impl std::fmt::Debug for Recommender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recommender")
            .field("config", &self.config)
            .field("embedding_dimension", &self.embedding_dimension())
            .field("model", &self.llm.model_name())
            .finish_non_exhaustive()
    }
}

impl Recommender {
    /// Opens or creates the corpus at `path` and builds the configured
    /// embedding service and language model.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration is invalid (see [`Config::validate`])
    /// - The database file is corrupted, locked, or from another schema version
    /// - The embedding dimension doesn't match the existing database
    /// - The embedding provider or HTTP client cannot be initialized
    #[instrument(skip(config), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        config.validate().map_err(RecommenderError::from)?;

        info!("Opening recommender");

        let store = open_storage(&path, &config)?;
        let embedding = create_embedding_service(&config)?;
        let llm = create_language_model(&config)?;

        info!(
            dimension = config.dimension(),
            model = llm.model_name(),
            sync_mode = ?config.sync_mode,
            "Recommender opened"
        );

        Ok(Self {
            store,
            embedding,
            llm,
            config,
        })
    }

    /// Assembles a recommender from already-built components.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the configuration is invalid or the
    /// embedding service or store dimension differs from the configured one.
    pub fn from_parts(
        store: Box<dyn DocumentStore>,
        embedding: Box<dyn EmbeddingService>,
        llm: Box<dyn LanguageModel>,
        config: Config,
    ) -> Result<Self> {
        config.validate().map_err(RecommenderError::from)?;

        let expected = config.dimension();
        for got in [embedding.dimension(), store.metadata().embedding_dimension.size()] {
            if got != expected {
                return Err(ValidationError::dimension_mismatch(expected, got).into());
            }
        }

        Ok(Self {
            store,
            embedding,
            llm,
            config,
        })
    }

    /// Closes the store, flushing pending writes. Consumes the handle.
    #[instrument(skip(self))]
    pub fn close(self) -> Result<()> {
        info!("Closing recommender");
        self.store.close()?;
        info!("Recommender closed");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Configuration the recommender was built with.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Store metadata (schema version, dimension, timestamps).
    #[inline]
    pub fn metadata(&self) -> &DatabaseMetadata {
        self.store.metadata()
    }

    /// Dimension of stored and query embeddings.
    #[inline]
    pub fn embedding_dimension(&self) -> usize {
        self.config.dimension()
    }

    /// Number of documents in the corpus.
    pub fn document_count(&self) -> Result<usize> {
        self.store.count()
    }

    /// Looks up a stored document by name.
    pub fn get_document(&self, name: &str) -> Result<Option<StoredDocument>> {
        self.store.get(name)
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Recommends at most `limit` assessments for a free-text request.
    ///
    /// The query is refined by the language model, any `Assessment Length:`
    /// constraint in the refined text becomes a duration filter, and the
    /// refined text is embedded and searched. Results are sorted by
    /// descending score.
    ///
    /// An embedding or store failure yields `Ok(vec![])`.
    ///
    /// # Errors
    ///
    /// - `RecommenderError::Validation` for a blank query or `limit == 0`
    /// - `RecommenderError::LanguageModel` if refinement fails
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        validate_query(query)?;
        validate_limit("limit", limit)?;

        let refined = self.refiner().refine(query)?;
        let filter = DurationFilter::parse(&refined);
        debug!(filter = %filter, "Duration constraint parsed");

        let Some(vector) = embed_or_none(self.embedding.as_ref(), &refined) else {
            return Ok(Vec::new());
        };

        let results = self.executor().execute(&vector, &filter, limit);
        debug!(count = results.len(), "Search complete");
        Ok(results)
    }

    /// Searches once per skill named in the request and merges the lists.
    ///
    /// Skills come from the language model. The duration constraint of the
    /// full request is applied to every skill search. Results are
    /// deduplicated by name according to [`SearchConfig::merge_policy`],
    /// sorted by descending score and truncated to `final_limit`.
    ///
    /// # Errors
    ///
    /// - `RecommenderError::Validation` for a blank query or a zero limit
    /// - `RecommenderError::LanguageModel` if any model call fails
    ///
    /// [`SearchConfig::merge_policy`]: crate::SearchConfig::merge_policy
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub fn search_multiple_skills(
        &self,
        query: &str,
        limit_per_skill: usize,
        final_limit: usize,
    ) -> Result<Vec<SearchResult>> {
        validate_query(query)?;
        validate_limit("limit_per_skill", limit_per_skill)?;
        validate_limit("final_limit", final_limit)?;

        let refiner = self.refiner();
        let skills = refiner.extract_skills(query, self.config.search.max_skills)?;
        let filter = DurationFilter::parse(&refiner.refine(query)?);

        info!(skills = skills.len(), filter = %filter, "Fan-out search");

        let mut merger = ResultMerger::new(self.config.search.merge_policy);
        for skill in &skills {
            let results = self.search(&skill_query(skill, &filter), limit_per_skill)?;
            debug!(skill = %skill, count = results.len(), "Skill search complete");
            merger.extend(results);
        }

        Ok(merger.into_ranked(final_limit))
    }

    /// Returns the refined form of `query` without searching.
    ///
    /// # Errors
    ///
    /// Same as the refinement step of [`search`](Self::search).
    pub fn refine_query(&self, query: &str) -> Result<String> {
        self.refiner().refine(query)
    }

    /// Returns the skills the language model extracts from `query`.
    pub fn extract_skills(&self, query: &str) -> Result<Vec<String>> {
        self.refiner()
            .extract_skills(query, self.config.search.max_skills)
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Embeds and stores one catalog record, replacing any document with the
    /// same name.
    ///
    /// Returns `Ok(false)` when the embedding could not be produced; the
    /// record is skipped and nothing is written.
    ///
    /// # Errors
    ///
    /// - `RecommenderError::Validation` if the record fails validation
    /// - `RecommenderError::Storage` if the write fails
    pub fn ingest_record(&self, record: &CatalogRecord) -> Result<bool> {
        validate_record(record)?;

        let mut document = StoredDocument::from_record(record, Vec::new());
        let Some(vector) = embed_or_none(self.embedding.as_ref(), &document.text) else {
            debug!(name = %record.name, "Skipping record without embedding");
            return Ok(false);
        };
        document.embedding = vector;

        self.store.upsert(&document)?;
        Ok(true)
    }

    /// Ingests every record in order.
    ///
    /// Stops at the first validation or storage error. Records whose
    /// embedding fails are skipped and counted.
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub fn ingest_catalog(&self, records: &[CatalogRecord]) -> Result<IngestStats> {
        info!("Ingesting catalog");

        let mut stats = IngestStats::default();
        for record in records {
            if self.ingest_record(record)? {
                stats.upserted += 1;
            } else {
                stats.skipped += 1;
            }
            stats.processed += 1;

            if stats.processed % INGEST_PROGRESS_INTERVAL == 0 {
                info!(processed = stats.processed, total = records.len(), "Ingestion progress");
            }
        }

        info!(
            processed = stats.processed,
            upserted = stats.upserted,
            skipped = stats.skipped,
            "Catalog ingested"
        );
        Ok(stats)
    }

    /// Loads a catalog export and ingests it.
    ///
    /// The file holds a JSON array of records keyed by the catalog's column
    /// names (`"Name"`, `"Assessment Length"`, ...).
    ///
    /// # Errors
    ///
    /// - `RecommenderError::Io` if the file cannot be read
    /// - `RecommenderError::Validation` if the file is not a record array
    /// - any error from [`ingest_catalog`](Self::ingest_catalog)
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn ingest_catalog_file(&self, path: impl AsRef<Path>) -> Result<IngestStats> {
        let bytes = std::fs::read(path.as_ref())?;
        let records: Vec<CatalogRecord> = serde_json::from_slice(&bytes)
            .map_err(|e| ValidationError::invalid_field("catalog", e.to_string()))?;
        debug!(records = records.len(), "Catalog file decoded");
        self.ingest_catalog(&records)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn refiner(&self) -> QueryRefiner<'_> {
        QueryRefiner::new(self.llm.as_ref())
    }

    fn executor(&self) -> VectorSearchExecutor<'_> {
        VectorSearchExecutor::new(self.store.as_ref(), &self.config.search)
    }
}

fn validate_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(ValidationError::required_field("query").into());
    }
    Ok(())
}

fn validate_limit(field: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(ValidationError::invalid_field(field, "must be at least 1").into());
    }
    Ok(())
}
