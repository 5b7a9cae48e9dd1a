//! Language model access.
//!
//! The recommender uses a hosted model for two prompts: rewriting a free
//! text request into the catalog document format, and extracting skills
//! for fan-out search. Both go through the [`LanguageModel`] trait so tests
//! can script responses.

mod gemini;
mod rate_limit;

pub use gemini::GeminiModel;
pub use rate_limit::{RateLimitedModel, RateLimiter, RetryPolicy};

use crate::config::Config;
use crate::error::Result;

/// Text generation contract.
///
/// Implementations must be `Send + Sync`. Failures are returned as
/// `RecommenderError::LanguageModel`; callers never receive partial text.
pub trait LanguageModel: Send + Sync {
    /// Sends `prompt` and returns the model's text response, untrimmed.
    fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}

impl<T: LanguageModel + ?Sized> LanguageModel for Box<T> {
    fn generate(&self, prompt: &str) -> Result<String> {
        (**self).generate(prompt)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Creates the configured language model, wrapped with rate limiting.
///
/// # Errors
///
/// Returns `RecommenderError::Config` if the HTTP client cannot be built.
pub fn create_language_model(config: &Config) -> Result<Box<dyn LanguageModel>> {
    let model = GeminiModel::new(&config.llm)?;
    Ok(Box::new(RateLimitedModel::new(model, &config.rate_limit)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_language_model_uses_configured_name() {
        let mut config = Config::default();
        config.llm.model = "gemini-test".into();
        let model = create_language_model(&config).unwrap();
        assert_eq!(model.model_name(), "gemini-test");
    }

    #[test]
    fn test_language_model_is_object_safe() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn LanguageModel>();
    }
}
