use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocFormat {
    Text,
    Markdown,
}

/// A source file as loaded from the data directory. Immutable once
/// loaded; lives for one indexing pass.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub path: PathBuf,
    pub content: String,
    pub format: DocFormat,
}

/// A bounded slice of one document's text, the unit of indexing and
/// retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Deterministic id, `{file stem}_chunk_{index}`.
    pub id: String,
    /// Name of the owning document.
    pub document: String,
    pub text: String,
    /// Position within the owning document.
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub score: f32,
}

/// Per-query search outcome. The synthesizer words its answer so a
/// caller can tell these apart.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// The index holds no chunks at all.
    NoDocuments,
    /// Chunks exist but none scored above zero; carries the single
    /// best-scoring chunk anyway.
    NoMatch(SearchResult),
    /// At least one chunk scored above zero.
    Matched(Vec<SearchResult>),
}

/// The one response shape the pipeline exposes to any caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query: String,
    pub answer: String,
    pub sources: Vec<String>,
    pub processing_time: f64,
    pub model_used: String,
}

/// Result of one index build.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BuildReport {
    pub documents: usize,
    pub indexed: usize,
    pub skipped: usize,
}
