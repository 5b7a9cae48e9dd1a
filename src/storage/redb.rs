//! redb document store implementation.
//!
//! This module provides the primary storage backend using
//! [redb](https://docs.rs/redb), a pure Rust embedded key-value store,
//! paired with an in-memory HNSW index for vector search.
//!
//! # Features
//!
//! - ACID transactions with MVCC
//! - Single-writer, multiple-reader concurrency
//! - Automatic crash recovery
//! - HNSW graph rebuilt from stored embeddings on open
//!
//! # File Layout
//!
//! When you open a store at `./catalog.db`, redb creates a single file
//! `./catalog.db`. The HNSW index lives only in memory.

use std::path::{Path, PathBuf};

use ::redb::{Database, Durability, ReadableTable, ReadableTableMetadata};
use tracing::{debug, info, instrument, warn};

use super::schema::{
    decode_embedding, encode_embedding, DatabaseMetadata, DOCUMENTS_TABLE, EMBEDDINGS_TABLE,
    METADATA_KEY, METADATA_TABLE,
};
use super::{DocumentStore, ScoredDocument};
use crate::catalog::StoredDocument;
use crate::config::{Config, EmbeddingDimension, SyncMode};
use crate::error::{Result, StorageError, ValidationError};
use crate::vector::{similarity_from_distance, HnswIndex};

/// redb-backed document store with an HNSW vector index.
///
/// # Thread Safety
///
/// `RedbDocumentStore` is `Send + Sync`. redb handles internal
/// synchronization using MVCC for readers and exclusive locking for writers;
/// the HNSW index guards its own state.
pub struct RedbDocumentStore {
    /// The redb database handle.
    db: Database,

    /// Cached database metadata.
    metadata: DatabaseMetadata,

    /// Path to the database file.
    path: PathBuf,

    /// Vector index over the embeddings table.
    index: HnswIndex,

    /// Sync mode applied to write transactions.
    sync_mode: SyncMode,
}

impl std::fmt::Debug for RedbDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbDocumentStore")
            .field("path", &self.path)
            .field("metadata", &self.metadata)
            .field("documents", &self.index.active_count())
            .finish_non_exhaustive()
    }
}

impl RedbDocumentStore {
    /// Opens or creates a store at the given path.
    ///
    /// If the store doesn't exist, it is created and initialized with the
    /// configuration settings. If it exists, the configuration is validated
    /// against the stored metadata and the HNSW index is rebuilt from the
    /// embeddings table.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The database file is corrupted
    /// - Schema version doesn't match
    /// - Embedding dimension doesn't match (for existing stores)
    #[instrument(skip(config), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let path = path.as_ref();
        let db_exists = path.exists();

        debug!(db_exists = db_exists, "Opening document store");

        let db = Database::create(path).map_err(StorageError::from)?;

        let metadata = if db_exists {
            Self::open_existing(&db, config)?
        } else {
            Self::initialize_new(&db, config)?
        };

        let index = Self::rebuild_index(&db, config)?;

        info!(
            schema_version = metadata.schema_version,
            dimension = metadata.embedding_dimension.size(),
            documents = index.active_count(),
            "Document store opened"
        );

        Ok(Self {
            db,
            metadata,
            path: path.to_path_buf(),
            index,
            sync_mode: config.sync_mode,
        })
    }

    /// Writes fresh metadata and creates the tables.
    fn initialize_new(db: &Database, config: &Config) -> Result<DatabaseMetadata> {
        info!("Initializing new document store");
        let metadata = DatabaseMetadata::new(config.embedding_dimension);
        Self::write_metadata(db, &metadata)?;
        Ok(metadata)
    }

    /// Loads and checks the metadata of an existing file, then records the open.
    fn open_existing(db: &Database, config: &Config) -> Result<DatabaseMetadata> {
        let mut metadata = {
            let read_txn = db.begin_read().map_err(StorageError::from)?;
            let table = read_txn.open_table(METADATA_TABLE).map_err(|e| {
                StorageError::corrupted(format!("Cannot open metadata table: {e}"))
            })?;
            let bytes = table
                .get(METADATA_KEY)
                .map_err(StorageError::from)?
                .ok_or_else(|| StorageError::corrupted("Missing database metadata"))?;
            DatabaseMetadata::from_bytes(bytes.value())?
        };

        if let Err(err) = metadata.ensure_matches(config.embedding_dimension) {
            warn!(
                schema_version = metadata.schema_version,
                stored_dimension = metadata.embedding_dimension.size(),
                configured_dimension = config.dimension(),
                "Refusing to open document store"
            );
            return Err(err);
        }

        metadata.touch();
        Self::write_metadata(db, &metadata)?;
        Ok(metadata)
    }

    /// Stores `metadata` and makes sure every table exists.
    fn write_metadata(db: &Database, metadata: &DatabaseMetadata) -> Result<()> {
        let bytes = metadata.to_bytes()?;
        let txn = db.begin_write().map_err(StorageError::from)?;
        {
            txn.open_table(METADATA_TABLE)?
                .insert(METADATA_KEY, bytes.as_slice())?;
            txn.open_table(DOCUMENTS_TABLE)?;
            txn.open_table(EMBEDDINGS_TABLE)?;
        }
        txn.commit().map_err(StorageError::from)?;
        Ok(())
    }

    /// Rebuilds the HNSW index from every stored embedding.
    fn rebuild_index(db: &Database, config: &Config) -> Result<HnswIndex> {
        let read_txn = db.begin_read().map_err(StorageError::from)?;
        let table = read_txn.open_table(EMBEDDINGS_TABLE)?;

        let mut embeddings = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry.map_err(StorageError::from)?;
            embeddings.push((key.value().to_string(), decode_embedding(value.value())?));
        }

        debug!(count = embeddings.len(), "Rebuilding HNSW index");
        HnswIndex::rebuild_from_embeddings(config.dimension(), &config.hnsw, embeddings)
    }

    /// Returns the embedding dimension configured for this store.
    #[inline]
    pub fn embedding_dimension(&self) -> EmbeddingDimension {
        self.metadata.embedding_dimension
    }

    /// Returns a reference to the underlying redb database.
    #[cfg(test)]
    pub(crate) fn database(&self) -> &Database {
        &self.db
    }

    fn read_document(
        table: &impl ReadableTable<&'static str, &'static [u8]>,
        name: &str,
    ) -> Result<Option<StoredDocument>> {
        match table.get(name)? {
            Some(value) => {
                let doc: StoredDocument = bincode::deserialize(value.value())
                    .map_err(|e| StorageError::serialization(e.to_string()))?;
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }
}

/// Maps the configured sync mode to redb durability and the two-phase
/// commit flag.
fn durability_for(mode: SyncMode) -> (Durability, bool) {
    match mode {
        SyncMode::Normal => (Durability::Immediate, false),
        SyncMode::Fast => (Durability::Eventual, false),
        SyncMode::Paranoid => (Durability::Immediate, true),
    }
}

impl DocumentStore for RedbDocumentStore {
    fn metadata(&self) -> &DatabaseMetadata {
        &self.metadata
    }

    #[instrument(skip(self))]
    fn close(self: Box<Self>) -> Result<()> {
        info!("Closing document store");

        // redb flushes all data durably on drop
        drop(self.db);

        info!("Document store closed");
        Ok(())
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn upsert(&self, document: &StoredDocument) -> Result<()> {
        let expected = self.metadata.embedding_dimension.size();
        if document.embedding.len() != expected {
            return Err(ValidationError::dimension_mismatch(expected, document.embedding.len()).into());
        }

        let doc_bytes = bincode::serialize(document)
            .map_err(|e| StorageError::serialization(e.to_string()))?;
        let embedding_bytes = encode_embedding(&document.embedding);

        let mut write_txn = self.db.begin_write().map_err(StorageError::from)?;
        let (durability, two_phase) = durability_for(self.sync_mode);
        write_txn.set_durability(durability);
        write_txn.set_two_phase_commit(two_phase);
        {
            let mut docs = write_txn.open_table(DOCUMENTS_TABLE)?;
            docs.insert(document.name.as_str(), doc_bytes.as_slice())?;

            let mut embeddings = write_txn.open_table(EMBEDDINGS_TABLE)?;
            embeddings.insert(document.name.as_str(), embedding_bytes.as_slice())?;
        }
        write_txn.commit().map_err(StorageError::from)?;

        self.index.upsert(&document.name, &document.embedding)?;

        debug!(name = %document.name, "Document upserted");
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<StoredDocument>> {
        let read_txn = self.db.begin_read().map_err(StorageError::from)?;
        let docs = read_txn.open_table(DOCUMENTS_TABLE)?;

        let Some(mut doc) = Self::read_document(&docs, name)? else {
            return Ok(None);
        };

        let embeddings = read_txn.open_table(EMBEDDINGS_TABLE)?;
        if let Some(value) = embeddings.get(name)? {
            doc.embedding = decode_embedding(value.value())?;
        }

        Ok(Some(doc))
    }

    fn count(&self) -> Result<usize> {
        let read_txn = self.db.begin_read().map_err(StorageError::from)?;
        let docs = read_txn.open_table(DOCUMENTS_TABLE)?;
        Ok(docs.len()? as usize)
    }

    fn nearest(
        &self,
        query: &[f32],
        num_candidates: usize,
        limit: usize,
    ) -> Result<Vec<ScoredDocument>> {
        let hits = self.index.search(query, limit, num_candidates)?;

        let read_txn = self.db.begin_read().map_err(StorageError::from)?;
        let docs = read_txn.open_table(DOCUMENTS_TABLE)?;

        let mut results = Vec::with_capacity(hits.len());
        for (name, distance) in hits {
            match Self::read_document(&docs, &name)? {
                Some(document) => results.push(ScoredDocument {
                    document,
                    score: similarity_from_distance(distance),
                }),
                None => warn!(name = %name, "Indexed document missing from documents table"),
            }
        }

        debug!(
            candidates = num_candidates,
            limit,
            returned = results.len(),
            "Nearest-neighbour search"
        );
        Ok(results)
    }
}

// RedbDocumentStore is auto Send + Sync: Database, DatabaseMetadata,
// PathBuf and HnswIndex are all Send + Sync.
