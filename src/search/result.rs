//! Search result projection.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::catalog::{StoredDocument, TestType, YesNo};

/// A ranked recommendation.
///
/// Carries every stored document field except the canonical text and the
/// embedding, plus the similarity score (higher is better). Scores are only
/// comparable within one result list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Product name.
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
    /// Duration in minutes, if known.
    pub assessment_length: Option<u32>,
    /// Similarity to the query vector.
    pub score: f32,
}

impl SearchResult {
    /// Projects a stored document, attaching the similarity score.
    pub fn from_document(doc: StoredDocument, score: f32) -> Self {
        Self {
            name: doc.name,
            url: doc.url,
            remote_testing: doc.remote_testing,
            adaptive: doc.adaptive,
            test_type: doc.test_type,
            description: doc.description,
            job_levels: doc.job_levels,
            languages: doc.languages,
            assessment_length: doc.assessment_length,
            score,
        }
    }

    /// The comma-joined test type column split into trimmed labels.
    ///
    /// Labels outside the known taxonomy are kept verbatim.
    pub fn test_types(&self) -> Vec<String> {
        self.test_type
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Known test type categories.
    pub fn known_test_types(&self) -> Vec<TestType> {
        TestType::parse_list(&self.test_type)
    }

    /// Duration in minutes, with unknown reported as 0.
    pub fn duration_minutes(&self) -> u32 {
        self.assessment_length.unwrap_or(0)
    }

    /// `"Yes"` or `"No"` for remote testing.
    pub fn remote_support(&self) -> &'static str {
        self.remote_testing.as_str()
    }

    /// `"Yes"` or `"No"` for adaptive delivery.
    pub fn adaptive_support(&self) -> &'static str {
        self.adaptive.as_str()
    }
}

/// Stable sort by descending score. NaN scores sort last.
pub fn rank_by_score(results: &mut [SearchResult]) {
    results.sort_by(|a, b| score_desc(a.score, b.score));
}

fn score_desc(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogRecord;

    fn result_with_types(test_type: &str, length: Option<u32>) -> SearchResult {
        let mut doc = StoredDocument::from_record(&CatalogRecord::named("R"), vec![]);
        doc.test_type = test_type.to_string();
        doc.assessment_length = length;
        SearchResult::from_document(doc, 0.5)
    }

    #[test]
    fn test_projection_keeps_fields() {
        let record = CatalogRecord {
            url: "https://example.com/r".into(),
            remote_testing: YesNo::Yes,
            ..CatalogRecord::named("R").with_length("30")
        };
        let doc = StoredDocument::from_record(&record, vec![1.0]);
        let result = SearchResult::from_document(doc, 0.87);
        assert_eq!(result.name, "R");
        assert_eq!(result.url, "https://example.com/r");
        assert_eq!(result.assessment_length, Some(30));
        assert_eq!(result.remote_support(), "Yes");
        assert_eq!(result.adaptive_support(), "No");
        assert!((result.score - 0.87).abs() < f32::EPSILON);
    }

    #[test]
    fn test_test_types_trims_labels() {
        let result = result_with_types("Knowledge & Skills, Simulations,", None);
        assert_eq!(result.test_types(), vec!["Knowledge & Skills", "Simulations"]);
        assert_eq!(
            result.known_test_types(),
            vec![TestType::KnowledgeSkills, TestType::Simulations]
        );
    }

    #[test]
    fn test_duration_minutes_defaults_to_zero() {
        assert_eq!(result_with_types("", None).duration_minutes(), 0);
        assert_eq!(result_with_types("", Some(45)).duration_minutes(), 45);
    }

    #[test]
    fn test_rank_by_score_is_stable_and_descending() {
        let mut results: Vec<SearchResult> = [("a", 0.5), ("b", 0.9), ("c", 0.5), ("d", f32::NAN), ("e", 0.7)]
            .into_iter()
            .map(|(name, score)| {
                let mut r = result_with_types("", None);
                r.name = name.to_string();
                r.score = score;
                r
            })
            .collect();

        rank_by_score(&mut results);
        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b", "e", "a", "c", "d"]);
    }
}
