use std::collections::HashSet;

use async_trait::async_trait;

use super::{tokenize, SearchIndex};
use crate::core::errors::ApiError;
use crate::pipeline::types::{BuildReport, Chunk};

/// Token-overlap backend: no external calls, no weighting, just set
/// arithmetic. Score = Jaccard similarity plus query-term coverage,
/// which lands in [0, 2].
#[derive(Default)]
pub struct OverlapIndex {
    chunks: Vec<Chunk>,
    token_sets: Vec<HashSet<String>>,
}

impl OverlapIndex {
    fn score_one(query_tokens: &HashSet<String>, chunk_tokens: &HashSet<String>) -> f32 {
        if query_tokens.is_empty() || chunk_tokens.is_empty() {
            return 0.0;
        }

        let intersection = query_tokens.intersection(chunk_tokens).count() as f32;
        if intersection == 0.0 {
            return 0.0;
        }
        let union = query_tokens.union(chunk_tokens).count() as f32;

        let jaccard = intersection / union;
        let coverage = intersection / query_tokens.len() as f32;
        jaccard + coverage
    }
}

#[async_trait]
impl SearchIndex for OverlapIndex {
    fn name(&self) -> &str {
        "overlap"
    }

    async fn build(&mut self, chunks: Vec<Chunk>) -> BuildReport {
        self.token_sets = chunks
            .iter()
            .map(|chunk| tokenize(&chunk.text).into_iter().collect())
            .collect();
        self.chunks = chunks;

        BuildReport {
            documents: 0,
            indexed: self.chunks.len(),
            skipped: 0,
        }
    }

    fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    fn chunk_at(&self, index: usize) -> &Chunk {
        &self.chunks[index]
    }

    async fn score(&self, query: &str) -> Result<Vec<f32>, ApiError> {
        let query_tokens: HashSet<String> = tokenize(query).into_iter().collect();
        Ok(self
            .token_sets
            .iter()
            .map(|tokens| Self::score_one(&query_tokens, tokens))
            .collect())
    }
}
