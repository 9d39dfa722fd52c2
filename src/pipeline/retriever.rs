use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::types::{SearchOutcome, SearchResult};
use crate::core::errors::ApiError;
use crate::index::SearchIndex;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Default number of results per query
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

/// Ranks the index's scores for a query and applies the shared
/// retrieval policy:
///
/// - results come back in descending score order, ties keeping the
///   original chunk order (stable sort)
/// - non-positive scores are dropped
/// - if dropping them would leave nothing while the index holds at
///   least one chunk, the single best-scoring chunk is returned
///   anyway (`NoMatch`), so callers always get a lead to follow
/// - an empty index is the distinct `NoDocuments` outcome
pub async fn search(
    index: &dyn SearchIndex,
    query: &str,
    top_k: usize,
) -> Result<SearchOutcome, ApiError> {
    if index.chunk_count() == 0 {
        return Ok(SearchOutcome::NoDocuments);
    }

    let scores = index.score(query).await?;
    let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let top_k = top_k.max(1);
    let results: Vec<SearchResult> = ranked
        .iter()
        .filter(|(_, score)| *score > 0.0)
        .take(top_k)
        .map(|(chunk_index, score)| SearchResult {
            chunk: index.chunk_at(*chunk_index).clone(),
            score: *score,
        })
        .collect();

    if results.is_empty() {
        let (best_index, best_score) = ranked[0];
        return Ok(SearchOutcome::NoMatch(SearchResult {
            chunk: index.chunk_at(best_index).clone(),
            score: best_score,
        }));
    }

    Ok(SearchOutcome::Matched(results))
}
