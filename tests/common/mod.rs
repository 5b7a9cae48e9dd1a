//! Shared fixtures for integration tests.
//!
//! - [`KeywordEmbedding`]: deterministic bag-of-words embedder
//! - [`FailingEmbedding`]: always errors
//! - [`ScriptedModel`]: language model answering from a closure
//! - [`ScriptedStore`]: in-memory store replaying queued search results

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use assessrec::embedding::EmbeddingService;
use assessrec::llm::LanguageModel;
use assessrec::storage::{DocumentStore, RedbDocumentStore, ScoredDocument};
use assessrec::{
    CatalogRecord, Config, DatabaseMetadata, Embedding, EmbeddingDimension, LanguageModelError,
    RateLimitConfig, Recommender, RecommenderError, Result, StorageError, StoredDocument,
    TestType,
};
use tempfile::TempDir;

/// Embedding dimension used throughout the tests (D384).
pub const DIM: usize = 384;

/// Marker the refine prompt starts with; the user query follows it.
const REFINE_PREFIX: &str = "the user query is ";

/// Marker present only in the skill extraction prompt.
const SKILL_MARKER: &str = "distinct skills";

// ============================================================================
// Embeddings
// ============================================================================

/// Hashes lowercase alphanumeric tokens into [`DIM`] buckets and L2
/// normalizes. Texts sharing words embed close together.
#[derive(Default)]
pub struct KeywordEmbedding {
    /// Texts containing this marker fail to embed.
    fail_marker: Option<String>,
}

impl KeywordEmbedding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
        }
    }
}

fn bucket(token: &str) -> usize {
    // FNV-1a
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in token.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    (hash % DIM as u64) as usize
}

pub fn keyword_vector(text: &str) -> Embedding {
    let mut v = vec![0.0f32; DIM];
    let mut any = false;
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        v[bucket(&token.to_lowercase())] += 1.0;
        any = true;
    }
    if !any {
        v[0] = 1.0;
    }
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    v.iter().map(|x| x / norm).collect()
}

impl EmbeddingService for KeywordEmbedding {
    fn embed(&self, text: &str) -> Result<Embedding> {
        if let Some(marker) = &self.fail_marker {
            if text.contains(marker.as_str()) {
                return Err(RecommenderError::embedding("refusing marked text"));
            }
        }
        Ok(keyword_vector(text))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

/// Always fails.
pub struct FailingEmbedding;

impl EmbeddingService for FailingEmbedding {
    fn embed(&self, _text: &str) -> Result<Embedding> {
        Err(RecommenderError::embedding("embedding service offline"))
    }

    fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Embedding>> {
        Err(RecommenderError::embedding("embedding service offline"))
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

// ============================================================================
// Language model
// ============================================================================

type Responder = dyn Fn(&str) -> Result<String> + Send + Sync;

/// Language model answering from a closure, recording every prompt.
pub struct ScriptedModel {
    respond: Box<Responder>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedModel {
    pub fn new(respond: impl Fn(&str) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            respond: Box::new(respond),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answers refine prompts with `refine(query)` and skill prompts with
    /// `skills`.
    pub fn routing(
        refine: impl Fn(&str) -> String + Send + Sync + 'static,
        skills: &str,
    ) -> Self {
        let skills = skills.to_string();
        Self::new(move |prompt| {
            if prompt.contains(SKILL_MARKER) {
                Ok(skills.clone())
            } else {
                Ok(refine(user_query(prompt)))
            }
        })
    }

    /// Refines every query to itself.
    pub fn echo() -> Self {
        Self::routing(|q| q.to_string(), "")
    }

    /// Refines every query to `text`.
    pub fn fixed(text: &str) -> Self {
        let text = text.to_string();
        Self::routing(move |_| text.clone(), "")
    }

    /// Fails every call with the given HTTP status.
    pub fn failing(status: u16) -> Self {
        Self::new(move |_| Err(LanguageModelError::status(status, "scripted failure").into()))
    }

    /// Handle to the prompt log; stays valid after the model is boxed.
    pub fn prompt_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }
}

impl LanguageModel for ScriptedModel {
    fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.respond)(prompt)
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Extracts the user query from a refine prompt.
pub fn user_query(prompt: &str) -> &str {
    let rest = prompt.strip_prefix(REFINE_PREFIX).unwrap_or(prompt);
    match rest.find("\nYou are a search query optimizer") {
        Some(end) => &rest[..end],
        None => rest,
    }
}

/// Queries from every refine prompt in the log, in call order.
pub fn refined_queries(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|p| p.starts_with(REFINE_PREFIX))
        .map(|p| user_query(p).to_string())
        .collect()
}

// ============================================================================
// Store
// ============================================================================

/// In-memory store whose `nearest` replays queued responses in order, then
/// returns empty lists.
pub struct ScriptedStore {
    metadata: DatabaseMetadata,
    responses: Mutex<VecDeque<Result<Vec<ScoredDocument>>>>,
    documents: Mutex<HashMap<String, StoredDocument>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self {
            metadata: DatabaseMetadata::new(EmbeddingDimension::D384),
            responses: Mutex::new(VecDeque::new()),
            documents: Mutex::new(HashMap::new()),
        }
    }

    pub fn respond(self, hits: Vec<ScoredDocument>) -> Self {
        self.responses.lock().unwrap().push_back(Ok(hits));
        self
    }

    pub fn fail_next(self) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(StorageError::transaction("scripted failure").into()));
        self
    }
}

impl DocumentStore for ScriptedStore {
    fn metadata(&self) -> &DatabaseMetadata {
        &self.metadata
    }

    fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }

    fn path(&self) -> Option<&Path> {
        None
    }

    fn upsert(&self, document: &StoredDocument) -> Result<()> {
        self.documents
            .lock()
            .unwrap()
            .insert(document.name.clone(), document.clone());
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<StoredDocument>> {
        Ok(self.documents.lock().unwrap().get(name).cloned())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.documents.lock().unwrap().len())
    }

    fn nearest(
        &self,
        _query: &[f32],
        _num_candidates: usize,
        _limit: usize,
    ) -> Result<Vec<ScoredDocument>> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// A scored hit for [`ScriptedStore`].
pub fn hit(name: &str, length: &str, score: f32) -> ScoredDocument {
    ScoredDocument {
        document: StoredDocument::from_record(&record(name, length, ""), Vec::new()),
        score,
    }
}

// ============================================================================
// Catalog & recommender helpers
// ============================================================================

/// A catalog record with the given duration column and description.
pub fn record(name: &str, length: &str, description: &str) -> CatalogRecord {
    CatalogRecord::named(name)
        .with_length(length)
        .with_description(description)
        .with_test_types(&[TestType::KnowledgeSkills])
}

/// Config with no rate limiting, for fast tests.
pub fn test_config() -> Config {
    Config {
        rate_limit: RateLimitConfig::disabled(),
        ..Default::default()
    }
}

/// Opens a redb-backed recommender in `dir` with the given components.
pub fn open_recommender(
    dir: &TempDir,
    embedding: impl EmbeddingService + 'static,
    model: impl LanguageModel + 'static,
) -> Recommender {
    open_recommender_with(dir, embedding, model, test_config())
}

pub fn open_recommender_with(
    dir: &TempDir,
    embedding: impl EmbeddingService + 'static,
    model: impl LanguageModel + 'static,
    config: Config,
) -> Recommender {
    let store = RedbDocumentStore::open(dir.path().join("catalog.db"), &config).unwrap();
    Recommender::from_parts(Box::new(store), Box::new(embedding), Box::new(model), config)
        .unwrap()
}

/// Builds a recommender over a [`ScriptedStore`].
pub fn scripted_recommender(
    store: ScriptedStore,
    model: impl LanguageModel + 'static,
    config: Config,
) -> Recommender {
    Recommender::from_parts(
        Box::new(store),
        Box::new(KeywordEmbedding::new()),
        Box::new(model),
        config,
    )
    .unwrap()
}

pub fn names(results: &[assessrec::SearchResult]) -> Vec<&str> {
    results.iter().map(|r| r.name.as_str()).collect()
}
