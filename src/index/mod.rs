//! Similarity backends.
//!
//! One trait, three interchangeable strategies selected by explicit
//! configuration:
//! - `DenseIndex`: embeddings from an external endpoint, cosine ranking
//! - `TfIdfIndex`: local sparse term weights, no external calls
//! - `OverlapIndex`: token-set overlap, the no-dependency fallback

mod dense;
mod overlap;
mod tfidf;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use dense::DenseIndex;
pub use overlap::OverlapIndex;
pub use tfidf::TfIdfIndex;

use crate::core::errors::ApiError;
use crate::llm::ollama::OllamaConfig;
use crate::llm::LlmProvider;
use crate::pipeline::types::{BuildReport, Chunk};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Dense,
    TfIdf,
    Overlap,
}

/// Capability shared by all backends: swallow a chunk set once, then
/// score queries against it.
///
/// `score` returns one score per stored chunk, in storage order;
/// ranking policy lives in the retriever. `build` fully replaces any
/// prior state, so rebuilding never accumulates duplicates.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    fn name(&self) -> &str;

    async fn build(&mut self, chunks: Vec<Chunk>) -> BuildReport;

    fn chunk_count(&self) -> usize;

    fn chunk_at(&self, index: usize) -> &Chunk;

    async fn score(&self, query: &str) -> Result<Vec<f32>, ApiError>;
}

pub fn create_index(
    kind: BackendKind,
    provider: Arc<dyn LlmProvider>,
    ollama: &OllamaConfig,
) -> Box<dyn SearchIndex> {
    match kind {
        BackendKind::Dense => Box::new(DenseIndex::new(
            provider,
            ollama.embedding_model.clone(),
        )),
        BackendKind::TfIdf => Box::new(TfIdfIndex::default()),
        BackendKind::Overlap => Box::new(OverlapIndex::default()),
    }
}

/// Common english stop words filtered out of sparse representations.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "all", "also", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him",
    "his", "how", "if", "in", "into", "is", "it", "its", "just", "more", "most", "my", "no",
    "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "out",
    "over", "own", "same", "she", "should", "so", "some", "such", "than", "that", "the",
    "their", "theirs", "them", "then", "there", "these", "they", "this", "those", "through",
    "to", "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where",
    "which", "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours",
];

/// Lowercase word tokens of at least two characters, stop words
/// removed. Both the indexing side and the query side go through this
/// so representations stay in the same feature space.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(|t| t.to_lowercase())
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}
