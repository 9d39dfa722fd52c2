use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{tokenize, SearchIndex};
use crate::core::errors::ApiError;
use crate::pipeline::types::{BuildReport, Chunk};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TfIdfConfig {
    /// Vocabulary cap; most frequent terms win
    pub max_features: usize,
    /// Terms present in more than this fraction of chunks are dropped
    pub max_df: f32,
}

impl Default for TfIdfConfig {
    fn default() -> Self {
        Self {
            max_features: 1000,
            max_df: 0.95,
        }
    }
}

/// Local TF-IDF backend over unigrams and bigrams.
///
/// The vocabulary and idf weights are frozen at build time and reused
/// for every query, so query vectors and chunk vectors always live in
/// the same feature space. Chunk vectors are L2-normalized; scoring is
/// a sparse dot product, i.e. cosine similarity.
pub struct TfIdfIndex {
    config: TfIdfConfig,
    chunks: Vec<Chunk>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    vectors: Vec<Vec<(usize, f32)>>,
}

impl Default for TfIdfIndex {
    fn default() -> Self {
        Self::new(TfIdfConfig::default())
    }
}

impl TfIdfIndex {
    pub fn new(config: TfIdfConfig) -> Self {
        Self {
            config,
            chunks: Vec::new(),
            vocabulary: HashMap::new(),
            idf: Vec::new(),
            vectors: Vec::new(),
        }
    }

    /// Unigrams plus adjacent-pair bigrams over the stop-filtered
    /// token stream.
    fn terms(text: &str) -> Vec<String> {
        let tokens = tokenize(text);
        let mut terms = tokens.clone();
        for pair in tokens.windows(2) {
            terms.push(format!("{} {}", pair[0], pair[1]));
        }
        terms
    }

    fn weigh(&self, terms: &[String]) -> Vec<(usize, f32)> {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for term in terms {
            if let Some(&term_id) = self.vocabulary.get(term) {
                *counts.entry(term_id).or_insert(0.0) += 1.0;
            }
        }

        let mut vector: Vec<(usize, f32)> = counts
            .into_iter()
            .map(|(term_id, tf)| (term_id, tf * self.idf[term_id]))
            .collect();
        vector.sort_by_key(|(term_id, _)| *term_id);

        let norm: f32 = vector.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in vector.iter_mut() {
                *w /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl SearchIndex for TfIdfIndex {
    fn name(&self) -> &str {
        "tfidf"
    }

    async fn build(&mut self, chunks: Vec<Chunk>) -> BuildReport {
        self.vocabulary.clear();
        self.idf.clear();
        self.vectors.clear();

        let term_lists: Vec<Vec<String>> =
            chunks.iter().map(|chunk| Self::terms(&chunk.text)).collect();
        let total = chunks.len();

        // Document frequency and corpus-wide counts per term.
        let mut df: HashMap<&str, usize> = HashMap::new();
        let mut totals: HashMap<&str, usize> = HashMap::new();
        for terms in &term_lists {
            let mut seen: Vec<&str> = Vec::new();
            for term in terms {
                *totals.entry(term.as_str()).or_insert(0) += 1;
                if !seen.contains(&term.as_str()) {
                    seen.push(term.as_str());
                    *df.entry(term.as_str()).or_insert(0) += 1;
                }
            }
        }

        let df_cap = (self.config.max_df * total as f32).ceil() as usize;
        let mut candidates: Vec<(&str, usize)> = df
            .iter()
            .filter(|(_, &count)| total <= 1 || count <= df_cap)
            .map(|(&term, &count)| (term, count))
            .collect();

        // Cap the vocabulary by corpus frequency, ties alphabetical so
        // rebuilds are reproducible.
        candidates.sort_by(|a, b| {
            totals[b.0]
                .cmp(&totals[a.0])
                .then_with(|| a.0.cmp(b.0))
        });
        candidates.truncate(self.config.max_features);
        candidates.sort_by(|a, b| a.0.cmp(b.0));

        self.idf = Vec::with_capacity(candidates.len());
        for (term_id, (term, term_df)) in candidates.iter().enumerate() {
            self.vocabulary.insert((*term).to_string(), term_id);
            let idf = ((1.0 + total as f32) / (1.0 + *term_df as f32)).ln() + 1.0;
            self.idf.push(idf);
        }

        let vectors: Vec<Vec<(usize, f32)>> =
            term_lists.iter().map(|terms| self.weigh(terms)).collect();
        self.vectors = vectors;
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
        let query_vector = self.weigh(&Self::terms(query));
        if query_vector.is_empty() {
            return Ok(vec![0.0; self.chunks.len()]);
        }

        let query_map: HashMap<usize, f32> = query_vector.into_iter().collect();
        Ok(self
            .vectors
            .iter()
            .map(|vector| {
                vector
                    .iter()
                    .filter_map(|(term_id, w)| query_map.get(term_id).map(|qw| qw * w))
                    .sum()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_chunk(text: &str, document: &str, index: usize) -> Chunk {
        Chunk {
            id: format!("{}_chunk_{}", document, index),
            document: format!("{}.txt", document),
            text: text.to_string(),
            index,
        }
    }

    async fn sample_index() -> TfIdfIndex {
        let mut index = TfIdfIndex::default();
        index
            .build(vec![
                make_chunk("quantum computers use qubits for computation", "quantum", 0),
                make_chunk("whales swim across the deep ocean", "ocean", 0),
                make_chunk("neural networks learn from training data", "ml", 0),
            ])
            .await;
        index
    }

    #[tokio::test]
    async fn verbatim_chunk_text_ranks_its_chunk_first() {
        let index = sample_index().await;
        let scores = index
            .score("quantum computers use qubits for computation")
            .await
            .expect("scoring works");

        let best = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(best, 0);
        assert!(scores[0] > 0.9, "self-similarity should be near 1.0");
    }

    #[tokio::test]
    async fn out_of_vocabulary_query_scores_zero_everywhere() {
        let index = sample_index().await;
        let scores = index
            .score("zymurgy perihelion")
            .await
            .expect("scoring works");
        assert!(scores.iter().all(|&s| s == 0.0));
    }

    #[tokio::test]
    async fn query_uses_frozen_vocabulary() {
        let index = sample_index().await;
        // "qubits" was indexed, "zzz" was not; the query vector keeps
        // only the known term, so the quantum chunk still wins.
        let scores = index.score("qubits zzz").await.expect("scoring works");
        assert!(scores[0] > 0.0);
        assert_eq!(scores[1], 0.0);
        assert_eq!(scores[2], 0.0);
    }

    #[tokio::test]
    async fn zero_chunks_mean_empty_scores() {
        let mut index = TfIdfIndex::default();
        index.build(vec![]).await;
        assert_eq!(index.chunk_count(), 0);
        let scores = index.score("anything").await.expect("scoring works");
        assert!(scores.is_empty());
    }

    #[tokio::test]
    async fn rebuild_is_idempotent_and_replaces_state() {
        let mut index = TfIdfIndex::default();
        let chunks = vec![
            make_chunk("alpha beta gamma", "a", 0),
            make_chunk("delta epsilon zeta", "b", 0),
        ];

        index.build(chunks.clone()).await;
        let first_scores = index.score("alpha beta").await.expect("scoring works");

        index.build(chunks).await;
        let second_scores = index.score("alpha beta").await.expect("scoring works");

        assert_eq!(index.chunk_count(), 2);
        assert_eq!(first_scores, second_scores);
    }

    #[tokio::test]
    async fn vocabulary_cap_keeps_most_frequent_terms() {
        let mut index = TfIdfIndex::new(TfIdfConfig {
            max_features: 2,
            max_df: 1.0,
        });
        index
            .build(vec![
                make_chunk("common common common rare", "a", 0),
                make_chunk("common frequent frequent", "b", 0),
            ])
            .await;

        assert!(index.vocabulary.len() <= 2);
        assert!(index.vocabulary.contains_key("common"));
    }
}
