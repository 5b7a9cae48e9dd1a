//! Query refinement through the language model.
//!
//! A free-text hiring request ("Java developer who can collaborate, about
//! 40 minutes") is rewritten into the same labelled-line layout used for
//! catalog documents, so the refined text embeds close to matching
//! documents and carries a parseable `Assessment Length:` line.

pub mod prompts;

use tracing::debug;

use crate::error::{RecommenderError, Result, ValidationError};
use crate::llm::LanguageModel;

/// Runs the refinement and skill-extraction prompts against a model.
pub struct QueryRefiner<'a> {
    model: &'a dyn LanguageModel,
}

impl<'a> QueryRefiner<'a> {
    /// Creates a refiner backed by `model`.
    pub fn new(model: &'a dyn LanguageModel) -> Self {
        Self { model }
    }

    /// Rewrites `query` into catalog document form.
    ///
    /// The model's response is trimmed and returned as is; its format is
    /// not validated.
    ///
    /// # Errors
    ///
    /// - `ValidationError::RequiredField` for a blank query (no model call)
    /// - `RecommenderError::LanguageModel` if the model call fails
    pub fn refine(&self, query: &str) -> Result<String> {
        require_query(query)?;

        let response = self.model.generate(&prompts::refine_prompt(query))?;
        let refined = response.trim().to_string();

        debug!(model = self.model.model_name(), refined = %refined, "Query refined");
        Ok(refined)
    }

    /// Asks the model for up to `max` skills named in `query`.
    ///
    /// The response is split on commas and each piece trimmed. Empty and
    /// repeated entries are kept, and the count is not enforced.
    ///
    /// # Errors
    ///
    /// Same as [`refine`](Self::refine).
    pub fn extract_skills(&self, query: &str, max: usize) -> Result<Vec<String>> {
        require_query(query)?;

        let response = self
            .model
            .generate(&prompts::skill_extraction_prompt(query, max))?;
        let skills = split_skills(&response);

        debug!(count = skills.len(), ?skills, "Skills extracted");
        Ok(skills)
    }
}

fn require_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(RecommenderError::Validation(
            ValidationError::required_field("query"),
        ));
    }
    Ok(())
}

fn split_skills(response: &str) -> Vec<String> {
    response.split(',').map(|s| s.trim().to_string()).collect()
}
