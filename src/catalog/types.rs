//! Catalog record and stored document types.

use serde::{Deserialize, Serialize};

use crate::types::{Embedding, Timestamp};

// ============================================================================
// TestType
// ============================================================================

/// The fixed assessment category taxonomy.
///
/// The product catalog abbreviates each category with a single letter;
/// records carry the full labels, comma-joined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestType {
    /// `A`
    AbilityAptitude,
    /// `B`
    BiodataSituationalJudgement,
    /// `C`
    Competencies,
    /// `D`
    Development360,
    /// `E`
    AssessmentExercises,
    /// `K`
    KnowledgeSkills,
    /// `P`
    PersonalityBehavior,
    /// `S`
    Simulations,
}

impl TestType {
    /// All categories in catalog order.
    pub const ALL: [TestType; 8] = [
        TestType::AbilityAptitude,
        TestType::BiodataSituationalJudgement,
        TestType::Competencies,
        TestType::Development360,
        TestType::AssessmentExercises,
        TestType::KnowledgeSkills,
        TestType::PersonalityBehavior,
        TestType::Simulations,
    ];

    /// Human-readable label as it appears in records and prompts.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::AbilityAptitude => "Ability & Aptitude",
            Self::BiodataSituationalJudgement => "Biodata & Situational Judgement",
            Self::Competencies => "Competencies",
            Self::Development360 => "Development & 360",
            Self::AssessmentExercises => "Assessment Exercises",
            Self::KnowledgeSkills => "Knowledge & Skills",
            Self::PersonalityBehavior => "Personality & Behavior",
            Self::Simulations => "Simulations",
        }
    }

    /// Single-letter catalog code.
    pub const fn code(&self) -> char {
        match self {
            Self::AbilityAptitude => 'A',
            Self::BiodataSituationalJudgement => 'B',
            Self::Competencies => 'C',
            Self::Development360 => 'D',
            Self::AssessmentExercises => 'E',
            Self::KnowledgeSkills => 'K',
            Self::PersonalityBehavior => 'P',
            Self::Simulations => 'S',
        }
    }

    /// Looks up a category by its catalog letter (case-insensitive).
    pub fn from_code(code: char) -> Option<Self> {
        let upper = code.to_ascii_uppercase();
        Self::ALL.into_iter().find(|t| t.code() == upper)
    }

    /// Looks up a category by its exact label, ignoring surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|t| t.label() == label)
    }

    /// Parses a comma-joined label list. Unknown labels are skipped.
    pub fn parse_list(joined: &str) -> Vec<Self> {
        joined.split(',').filter_map(Self::from_label).collect()
    }

    /// Renders categories the way the catalog joins them.
    pub fn join(types: &[TestType]) -> String {
        types
            .iter()
            .map(TestType::label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for TestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// YesNo
// ============================================================================

/// Boolean rendered as the catalog's `Yes` / `No` strings.
///
/// Anything other than `Yes` (case-insensitive) reads as `No`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum YesNo {
    /// Supported.
    Yes,
    /// Not supported or unknown.
    #[default]
    No,
}

impl YesNo {
    /// Returns true for `Yes`.
    pub fn is_yes(&self) -> bool {
        matches!(self, Self::Yes)
    }

    /// Catalog rendering.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }
}

impl From<String> for YesNo {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("yes") {
            Self::Yes
        } else {
            Self::No
        }
    }
}

impl From<YesNo> for String {
    fn from(value: YesNo) -> Self {
        value.as_str().to_string()
    }
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value {
            Self::Yes
        } else {
            Self::No
        }
    }
}

// ============================================================================
// CatalogRecord
// ============================================================================

/// One flat catalog row, as produced by catalog acquisition.
///
/// Serde names match the catalog's column labels, so a JSON export of the
/// catalog deserializes directly. Missing columns default to empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogRecord {
    /// Product name; the upsert key.
    #[serde(rename = "Name")]
    pub name: String,

    /// Product detail page.
    #[serde(rename = "URL")]
    pub url: String,

    /// Remote proctoring support.
    #[serde(rename = "Remote Testing")]
    pub remote_testing: YesNo,

    /// Adaptive (IRT) delivery support.
    #[serde(rename = "Adaptive/IRT")]
    pub adaptive: YesNo,

    /// Comma-joined [`TestType`] labels.
    #[serde(rename = "Test Type")]
    pub test_type: String,

    /// Free-text description.
    #[serde(rename = "Description")]
    pub description: String,

    /// Target job levels, free text.
    #[serde(rename = "Job Levels")]
    pub job_levels: String,

    /// Available languages, free text.
    #[serde(rename = "Languages")]
    pub languages: String,

    /// Duration in minutes, or empty when unknown.
    #[serde(rename = "Assessment Length")]
    pub assessment_length: String,
}

impl CatalogRecord {
    /// Creates a record with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style setter for the duration column.
    pub fn with_length(mut self, minutes: impl ToString) -> Self {
        self.assessment_length = minutes.to_string();
        self
    }

    /// Builder-style setter for the description column.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder-style setter for the test type column.
    pub fn with_test_types(mut self, types: &[TestType]) -> Self {
        self.test_type = TestType::join(types);
        self
    }
}

// ============================================================================
// StoredDocument
// ============================================================================

/// A persisted corpus entry, keyed by `name`.
///
/// The embedding lives in a separate table and is not serialized with the
/// document body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Product name (primary key).
    pub name: String,
    /// Product detail page.
    pub url: String,
    /// Remote proctoring support.
    pub remote_testing: YesNo,
    /// Adaptive (IRT) delivery support.
    pub adaptive: YesNo,
    /// Comma-joined [`TestType`] labels.
    pub test_type: String,
    /// Free-text description.
    pub description: String,
    /// Target job levels.
    pub job_levels: String,
    /// Available languages.
    pub languages: String,
    /// Duration in minutes; `None` when the record had no numeric value.
    pub assessment_length: Option<u32>,
    /// Canonical rendering that was embedded.
    pub text: String,
    /// When this name was last (re-)ingested.
    pub ingested_at: Timestamp,

    /// Embedding vector. Stored in the embeddings table.
    #[serde(skip)]
    pub embedding: Embedding,
}

impl StoredDocument {
    /// Builds a document from a catalog record and its embedding.
    pub fn from_record(record: &CatalogRecord, embedding: Embedding) -> Self {
        Self {
            name: record.name.clone(),
            url: record.url.clone(),
            remote_testing: record.remote_testing,
            adaptive: record.adaptive,
            test_type: record.test_type.clone(),
            description: record.description.clone(),
            job_levels: record.job_levels.clone(),
            languages: record.languages.clone(),
            assessment_length: parse_assessment_length(&record.assessment_length),
            text: render_document_text(record),
            ingested_at: Timestamp::now(),
            embedding,
        }
    }

    /// Parsed test type categories.
    pub fn test_types(&self) -> Vec<TestType> {
        TestType::parse_list(&self.test_type)
    }
}

/// Renders the canonical text of a record used for its embedding.
///
/// One `Field: value` line per searchable field, in the same field order the
/// query refiner produces.
pub fn render_document_text(record: &CatalogRecord) -> String {
    format!(
        "Name: {}\nDescription: {}\nTest Type: {}\nJob Levels: {}\nLanguages: {}\nAssessment Length: {}",
        record.name,
        record.description,
        record.test_type,
        record.job_levels,
        record.languages,
        record.assessment_length.trim(),
    )
}

/// Parses the duration column into whole minutes.
///
/// Accepts plain integers and integral decimals (`"17.0"`, as spreadsheet
/// exports produce). Empty, negative, fractional or non-numeric values yield
/// `None`.
pub fn parse_assessment_length(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(minutes) = raw.parse::<u32>() {
        return Some(minutes);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Some(value as u32)
    } else {
        None
    }
}
