use std::sync::Arc;

use async_trait::async_trait;

use super::SearchIndex;
use crate::core::errors::ApiError;
use crate::llm::LlmProvider;
use crate::pipeline::types::{BuildReport, Chunk};
use crate::vector_math::cosine_similarity;

/// Dense embedding backend.
///
/// Delegates text-to-vector conversion to the provider, one call per
/// chunk. A chunk whose embedding call fails is excluded from the
/// index and logged; the build itself never fails. Query scoring
/// embeds the query with the same model and ranks by cosine.
pub struct DenseIndex {
    provider: Arc<dyn LlmProvider>,
    model: String,
    chunks: Vec<Chunk>,
    embeddings: Vec<Vec<f32>>,
}

impl DenseIndex {
    pub fn new(provider: Arc<dyn LlmProvider>, model: String) -> Self {
        Self {
            provider,
            model,
            chunks: Vec::new(),
            embeddings: Vec::new(),
        }
    }
}

#[async_trait]
impl SearchIndex for DenseIndex {
    fn name(&self) -> &str {
        "dense"
    }

    async fn build(&mut self, chunks: Vec<Chunk>) -> BuildReport {
        self.chunks.clear();
        self.embeddings.clear();

        let mut skipped = 0;
        for chunk in chunks {
            match self.provider.embed(&chunk.text, &self.model).await {
                Ok(embedding) => {
                    self.chunks.push(chunk);
                    self.embeddings.push(embedding);
                }
                Err(err) => {
                    skipped += 1;
                    tracing::warn!("Error embedding chunk {}: {}", chunk.id, err);
                }
            }
        }

        BuildReport {
            documents: 0,
            indexed: self.chunks.len(),
            skipped,
        }
    }

    fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    fn chunk_at(&self, index: usize) -> &Chunk {
        &self.chunks[index]
    }

    async fn score(&self, query: &str) -> Result<Vec<f32>, ApiError> {
        if self.chunks.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.provider.embed(query, &self.model).await?;
        Ok(self
            .embeddings
            .iter()
            .map(|embedding| cosine_similarity(&query_embedding, embedding))
            .collect())
    }
}
