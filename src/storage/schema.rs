//! Database schema definitions and versioning.
//!
//! This module defines the table structure for the redb storage engine.
//! All table definitions are compile-time constants to ensure consistency.
//!
//! # Schema Versioning
//!
//! The schema version is stored in the metadata table. When opening an
//! existing database, we check the version and fail if it doesn't match.
//!
//! # Table Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ METADATA_TABLE                                               │
//! │   Key: &str                                                  │
//! │   Value: &[u8] (bincode)                                     │
//! │   Entries: "db_metadata" -> DatabaseMetadata                 │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │ DOCUMENTS_TABLE                                              │
//! │   Key: &str (assessment name)                               │
//! │   Value: &[u8] (bincode-serialized StoredDocument)          │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │ EMBEDDINGS_TABLE                                             │
//! │   Key: &str (assessment name)                               │
//! │   Value: &[u8] (dimension * 4 bytes, little-endian f32)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use redb::TableDefinition;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingDimension;
use crate::error::{RecommenderError, StorageError, ValidationError};
use crate::types::Timestamp;

/// Current schema version.
///
/// Increment this when making breaking changes to the schema.
/// The database will refuse to open if versions don't match.
pub const SCHEMA_VERSION: u32 = 1;

/// Maximum length of an assessment name (the primary key), in bytes.
pub const MAX_NAME_LENGTH: usize = 512;

/// Maximum size of any single catalog text column (100 KB).
pub const MAX_FIELD_SIZE: usize = 100 * 1024;

// ============================================================================
// Table Definitions
// ============================================================================

/// Metadata table for database-level information.
pub const METADATA_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("metadata");

/// Documents table.
///
/// Key: assessment name
/// Value: bincode-serialized StoredDocument (without embedding)
pub const DOCUMENTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("documents");

/// Embeddings table.
///
/// Stored separately from documents so the HNSW rebuild on open only reads
/// vectors.
/// Key: assessment name
/// Value: raw f32 bytes (dimension * 4 bytes)
pub const EMBEDDINGS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("embeddings");

// ============================================================================
// Database Metadata
// ============================================================================

/// Key of the single record in [`METADATA_TABLE`].
pub const METADATA_KEY: &str = "db_metadata";

/// Store-level facts fixed at creation, kept under [`METADATA_KEY`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    /// Layout version the file was written with.
    pub schema_version: u32,

    /// Dimension every stored embedding has. Fixed for the file's lifetime.
    pub embedding_dimension: EmbeddingDimension,

    /// When the file was created.
    pub created_at: Timestamp,

    /// Refreshed on every open.
    pub last_opened_at: Timestamp,
}

impl DatabaseMetadata {
    /// Metadata for a store created now.
    pub fn new(embedding_dimension: EmbeddingDimension) -> Self {
        let now = Timestamp::now();
        Self {
            schema_version: SCHEMA_VERSION,
            embedding_dimension,
            created_at: now,
            last_opened_at: now,
        }
    }

    /// Updates the last_opened_at timestamp.
    pub fn touch(&mut self) {
        self.last_opened_at = Timestamp::now();
    }

    /// Checks if this metadata is compatible with the current schema.
    pub fn is_compatible(&self) -> bool {
        self.schema_version == SCHEMA_VERSION
    }

    /// Rejects a file written by another schema or for another dimension.
    pub fn ensure_matches(&self, dimension: EmbeddingDimension) -> Result<(), RecommenderError> {
        if !self.is_compatible() {
            return Err(StorageError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION,
                found: self.schema_version,
            }
            .into());
        }
        if self.embedding_dimension != dimension {
            return Err(ValidationError::dimension_mismatch(
                dimension.size(),
                self.embedding_dimension.size(),
            )
            .into());
        }
        Ok(())
    }

    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>, StorageError> {
        bincode::serialize(self).map_err(|e| StorageError::serialization(e.to_string()))
    }

    pub(crate) fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        bincode::deserialize(bytes)
            .map_err(|e| StorageError::corrupted(format!("Invalid metadata format: {e}")))
    }
}

// ============================================================================
// Embedding Encoding Helpers
// ============================================================================

/// Encodes an embedding as little-endian f32 bytes.
#[inline]
pub fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decodes little-endian f32 bytes back into an embedding.
///
/// # Errors
///
/// Returns `StorageError::Corrupted` if the byte length is not a multiple of 4.
pub fn decode_embedding(bytes: &[u8]) -> Result<Vec<f32>, StorageError> {
    if bytes.len() % 4 != 0 {
        return Err(StorageError::corrupted(format!(
            "Embedding byte length {} is not a multiple of 4",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
