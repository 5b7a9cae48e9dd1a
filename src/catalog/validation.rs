//! Input validation for catalog records.
//!
//! ```text
//! Recommender::ingest_record()
//!     ├── validate_record()          ← column-level checks
//!     ├── embed_or_none()            ← skip on embedding failure
//!     └── store.upsert()             ← only reached if valid
//! ```

use crate::catalog::types::CatalogRecord;
use crate::error::{RecommenderError, ValidationError};
use crate::storage::schema::{MAX_FIELD_SIZE, MAX_NAME_LENGTH};

/// Validates a [`CatalogRecord`] before ingestion.
///
/// # Rules
///
/// | Field | Constraint |
/// |-------|------------|
/// | `name` | Non-blank, max 512 bytes |
/// | every text column | max 100 KB |
///
/// The duration column is not validated: a non-numeric value is stored as
/// "unknown" and simply never satisfies a duration filter.
pub(crate) fn validate_record(record: &CatalogRecord) -> Result<(), RecommenderError> {
    if record.name.trim().is_empty() {
        return Err(ValidationError::required_field("name").into());
    }

    if record.name.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::invalid_field(
            "name",
            format!(
                "must be at most {MAX_NAME_LENGTH} bytes, got {}",
                record.name.len()
            ),
        )
        .into());
    }

    let columns = [
        ("url", &record.url),
        ("test_type", &record.test_type),
        ("description", &record.description),
        ("job_levels", &record.job_levels),
        ("languages", &record.languages),
        ("assessment_length", &record.assessment_length),
    ];
    for (field, value) in columns {
        if value.len() > MAX_FIELD_SIZE {
            return Err(ValidationError::invalid_field(
                field,
                format!("must be at most {MAX_FIELD_SIZE} bytes, got {}", value.len()),
            )
            .into());
        }
    }

    Ok(())
}
