//! Local sentence embeddings through ONNX Runtime.
//!
//! Requires the `builtin-embeddings` feature. Two sentence-transformer
//! checkpoints are known by dimension:
//!
//! | Dimension | Model | Max tokens |
//! |-----------|-------|------------|
//! | 384 | all-MiniLM-L6-v2 (default) | 256 |
//! | 768 | bge-base-en-v1.5 | 512 |
//!
//! Any other dimension needs an explicit model directory.
//!
//! ```rust,ignore
//! use assessrec::embedding::onnx::OnnxEmbedding;
//!
//! OnnxEmbedding::download_default_model(384)?;
//! let service = OnnxEmbedding::new(None)?;
//! let vector = service.embed("Name: Core Java\nDescription: ...")?;
//! assert_eq!(vector.len(), 384);
//! ```
//!
//! Catalog documents and refined queries share one path: tokenize, pad the
//! batch to its longest row, run the model once, mean-pool each row over its
//! attention mask, L2-normalize.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ndarray::Array2;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use tokenizers::{Encoding, Tokenizer, TruncationParams, TruncationStrategy};
use tracing::{debug, info};

use crate::embedding::EmbeddingService;
use crate::error::{RecommenderError, Result};
use crate::types::Embedding;

const MODEL_FILE: &str = "model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";

/// A checkpoint that can be fetched from HuggingFace by dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct KnownModel {
    name: &'static str,
    repo: &'static str,
    dimension: usize,
    max_tokens: usize,
}

const KNOWN_MODELS: [KnownModel; 2] = [
    KnownModel {
        name: "all-MiniLM-L6-v2",
        repo: "sentence-transformers/all-MiniLM-L6-v2",
        dimension: 384,
        max_tokens: 256,
    },
    KnownModel {
        name: "bge-base-en-v1.5",
        repo: "BAAI/bge-base-en-v1.5",
        dimension: 768,
        max_tokens: 512,
    },
];

impl KnownModel {
    fn for_dimension(dimension: usize) -> Option<Self> {
        KNOWN_MODELS.iter().copied().find(|m| m.dimension == dimension)
    }

    fn require(dimension: usize) -> Result<Self> {
        Self::for_dimension(dimension).ok_or_else(|| {
            let known: Vec<String> = KNOWN_MODELS
                .iter()
                .map(|m| format!("{} ({})", m.dimension, m.name))
                .collect();
            RecommenderError::embedding(format!(
                "No default model for dimension {dimension}; known: {}. \
                 Pass a model directory for other dimensions",
                known.join(", ")
            ))
        })
    }

    fn url(&self, file: &str) -> String {
        match file {
            MODEL_FILE => format!("https://huggingface.co/{}/resolve/main/onnx/{file}", self.repo),
            _ => format!("https://huggingface.co/{}/resolve/main/{file}", self.repo),
        }
    }

    fn cache_dir(&self) -> PathBuf {
        model_cache_root().join(self.name)
    }
}

/// Root of the per-user model cache (`<cache>/assessrec/models`).
fn model_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("assessrec")
        .join("models")
}

/// Embedding service backed by a local ONNX sentence-transformer.
///
/// Model files are loaded in the constructor, so a missing download is
/// reported by `Recommender::open()`.
pub struct OnnxEmbedding {
    // `Session::run` needs `&mut`.
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    dimension: usize,
    max_tokens: usize,
}

impl OnnxEmbedding {
    /// Loads all-MiniLM-L6-v2 (384d) from `model_path` or the cache.
    pub fn new(model_path: Option<PathBuf>) -> Result<Self> {
        Self::with_dimension(model_path, 384)
    }

    /// Loads a model producing `dimension`-sized vectors.
    ///
    /// Without `model_path` the dimension must be one of the known
    /// checkpoints and its files must already be in the cache.
    pub fn with_dimension(model_path: Option<PathBuf>, dimension: usize) -> Result<Self> {
        let known = KnownModel::for_dimension(dimension);
        let max_tokens = known.map_or(256, |m| m.max_tokens);

        let dir = match model_path {
            Some(dir) if dir.is_dir() => dir,
            Some(dir) => {
                return Err(RecommenderError::embedding(format!(
                    "Model directory not found: {}",
                    dir.display()
                )))
            }
            None => KnownModel::require(dimension)?.cache_dir(),
        };

        info!(dir = %dir.display(), dimension, max_tokens, "Loading ONNX embedding model");

        let model_file = existing_file(&dir, MODEL_FILE, dimension)?;
        let tokenizer_file = existing_file(&dir, TOKENIZER_FILE, dimension)?;

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.commit_from_file(&model_file))
            .map_err(|e| {
                RecommenderError::embedding(format!(
                    "Failed to load ONNX model {}: {e}",
                    model_file.display()
                ))
            })?;
        let tokenizer = load_tokenizer(&tokenizer_file, max_tokens)?;

        debug!(dimension, "ONNX embedding model ready");
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            dimension,
            max_tokens,
        })
    }

    /// Fetches the known checkpoint for `dimension` into the cache.
    ///
    /// Files already present are left alone. Returns the model directory.
    pub fn download_default_model(dimension: usize) -> Result<PathBuf> {
        let model = KnownModel::require(dimension)?;
        let dir = model.cache_dir();
        fs::create_dir_all(&dir).map_err(|e| {
            RecommenderError::embedding(format!("Cannot create {}: {e}", dir.display()))
        })?;

        for file in [MODEL_FILE, TOKENIZER_FILE] {
            let dest = dir.join(file);
            if dest.exists() {
                continue;
            }
            let url = model.url(file);
            info!(url = %url, dest = %dest.display(), "Downloading model file");
            download(&url, &dest)?;
        }

        Ok(dir)
    }

    fn infer(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let encodings = texts
            .iter()
            .map(|text| self.tokenizer.encode(*text, true))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| RecommenderError::embedding(format!("Tokenization failed: {e}")))?;
        let batch = PaddedBatch::from_encodings(&encodings, self.max_tokens);

        let mut session = self
            .session
            .lock()
            .map_err(|_| RecommenderError::embedding("ONNX session lock poisoned"))?;
        let outputs = session
            .run(ort::inputs![
                "input_ids" => batch.tensor(&batch.ids)?,
                "attention_mask" => batch.tensor(&batch.mask)?,
                "token_type_ids" => batch.tensor(&vec![0; batch.ids.len()])?,
            ])
            .map_err(|e| RecommenderError::embedding(format!("ONNX inference failed: {e}")))?;

        // Token states, [rows, width, dimension].
        let (_, states) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| RecommenderError::embedding(format!("Bad model output: {e}")))?;

        batch.pool(states, self.dimension)
    }
}

impl EmbeddingService for OnnxEmbedding {
    fn embed(&self, text: &str) -> Result<Embedding> {
        if text.is_empty() {
            return Err(RecommenderError::embedding("Cannot embed empty text"));
        }
        self.infer(&[text])?
            .pop()
            .ok_or_else(|| RecommenderError::embedding("Model produced no embedding"))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.infer(texts)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Token ids and masks for a batch, right-padded to the longest row.
#[derive(Debug)]
struct PaddedBatch {
    rows: usize,
    width: usize,
    ids: Vec<i64>,
    mask: Vec<i64>,
}

impl PaddedBatch {
    fn from_encodings(encodings: &[Encoding], max_tokens: usize) -> Self {
        let rows = encodings.len();
        let width = encodings
            .iter()
            .map(|e| e.get_ids().len().min(max_tokens))
            .max()
            .unwrap_or(0);

        let mut ids = vec![0; rows * width];
        let mut mask = vec![0; rows * width];
        for (row, encoding) in encodings.iter().enumerate() {
            let start = row * width;
            let tokens = encoding.get_ids().iter().zip(encoding.get_attention_mask());
            for (col, (&id, &m)) in tokens.take(width).enumerate() {
                ids[start + col] = i64::from(id);
                mask[start + col] = i64::from(m);
            }
        }

        Self {
            rows,
            width,
            ids,
            mask,
        }
    }

    fn tensor(&self, values: &[i64]) -> Result<ort::value::Tensor<i64>> {
        let array = Array2::from_shape_vec((self.rows, self.width), values.to_vec())
            .map_err(|e| RecommenderError::embedding(format!("Tensor shape error: {e}")))?;
        ort::value::Tensor::from_array(array)
            .map_err(|e| RecommenderError::embedding(format!("Tensor creation failed: {e}")))
    }

    /// Mean-pools each row's unmasked token states and normalizes the result.
    fn pool(&self, states: &[f32], dimension: usize) -> Result<Vec<Embedding>> {
        let row_len = self.width * dimension;
        if states.len() < self.rows * row_len {
            return Err(RecommenderError::embedding(format!(
                "Model output has {} values, expected {}",
                states.len(),
                self.rows * row_len
            )));
        }

        let pooled = (0..self.rows)
            .map(|row| {
                let mask = &self.mask[row * self.width..(row + 1) * self.width];
                let tokens = states[row * row_len..(row + 1) * row_len].chunks_exact(dimension);
                let mut sum = vec![0.0f32; dimension];
                let mut count = 0.0f32;
                for (token, _) in tokens.zip(mask).filter(|(_, m)| **m != 0) {
                    count += 1.0;
                    for (acc, value) in sum.iter_mut().zip(token) {
                        *acc += value;
                    }
                }
                if count > 0.0 {
                    sum.iter_mut().for_each(|v| *v /= count);
                }
                normalize(sum)
            })
            .collect();

        Ok(pooled)
    }
}

/// Scales `v` to unit length; a zero vector is returned unchanged.
fn normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

fn existing_file(dir: &Path, name: &str, dimension: usize) -> Result<PathBuf> {
    let path = dir.join(name);
    if path.is_file() {
        Ok(path)
    } else {
        Err(RecommenderError::embedding(format!(
            "{name} not found in {}. Fetch it with \
             OnnxEmbedding::download_default_model({dimension}) or point model_path at a \
             directory containing {MODEL_FILE} and {TOKENIZER_FILE}",
            dir.display()
        )))
    }
}

fn load_tokenizer(path: &Path, max_tokens: usize) -> Result<Tokenizer> {
    let mut tokenizer = Tokenizer::from_file(path).map_err(|e| {
        RecommenderError::embedding(format!("Failed to load tokenizer {}: {e}", path.display()))
    })?;
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_tokens,
            strategy: TruncationStrategy::LongestFirst,
            ..Default::default()
        }))
        .map_err(|e| RecommenderError::embedding(format!("Failed to set truncation: {e}")))?;
    // PaddedBatch pads per batch.
    tokenizer.with_padding(None);
    Ok(tokenizer)
}

fn download(url: &str, dest: &Path) -> Result<()> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| RecommenderError::embedding(format!("Download failed for {url}: {e}")))?;

    // Renamed into place only once complete.
    let partial = dest.with_extension("part");
    let write = || -> io::Result<()> {
        let mut file = File::create(&partial)?;
        io::copy(&mut response.into_body().into_reader(), &mut file)?;
        fs::rename(&partial, dest)
    };
    write().map_err(|e| {
        let _ = fs::remove_file(&partial);
        RecommenderError::embedding(format!("Failed to write {}: {e}", dest.display()))
    })
}
