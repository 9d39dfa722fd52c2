//! The document Q&A pipeline.
//!
//! Loader -> Chunker -> Index (once, at startup or on reindex) ->
//! Retriever -> Synthesizer (per query). `RagPipeline` is an explicit
//! service object handed to request handlers; it owns the index behind
//! a `RwLock` so queries run concurrently while rebuilds are
//! exclusive.

pub mod chunker;
pub mod loader;
pub mod retriever;
pub mod synthesizer;
pub mod types;

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;

use crate::core::config::{AppConfig, AppPaths};
use crate::index::{create_index, SearchIndex};
use crate::llm::LlmProvider;
use synthesizer::Synthesizer;
use types::{BuildReport, QueryResponse};

pub struct RagPipeline {
    config: AppConfig,
    paths: AppPaths,
    index: RwLock<Box<dyn SearchIndex>>,
    synthesizer: Synthesizer,
}

/// Read-only snapshot for the stats/documents endpoints.
#[derive(Debug, Clone)]
pub struct PipelineStats {
    pub backend: String,
    pub documents: Vec<String>,
    pub chunk_count: usize,
}

impl RagPipeline {
    /// Builds the pipeline in its uninitialized state (no chunks
    /// indexed). Call [`rebuild`](Self::rebuild) to ingest the data
    /// directory.
    pub fn new(config: AppConfig, paths: AppPaths, provider: Arc<dyn LlmProvider>) -> Self {
        let index = create_index(config.backend, provider.clone(), &config.ollama);
        let synthesizer = Synthesizer::new(provider, config.synthesizer.clone());

        Self {
            config,
            paths,
            index: RwLock::new(index),
            synthesizer,
        }
    }

    /// Loads the data directory, chunks every document and rebuilds
    /// the index from scratch. Exclusive: queries wait until the
    /// rebuild finishes. Documents added after a build are invisible
    /// until the next call.
    pub async fn rebuild(&self) -> BuildReport {
        let data_dir = self.config.data_path(&self.paths);
        let documents = loader::load_documents(&data_dir);

        let mut chunks = Vec::new();
        for document in &documents {
            chunks.extend(chunker::chunk_document(document, &self.config.chunking));
        }
        tracing::info!(
            "Chunked {} documents into {} chunks",
            documents.len(),
            chunks.len()
        );

        let mut index = self.index.write().await;
        let mut report = index.build(chunks).await;
        report.documents = documents.len();

        if report.skipped > 0 {
            tracing::warn!(
                "Indexed {} chunks, skipped {}",
                report.indexed,
                report.skipped
            );
        } else {
            tracing::info!("Indexed {} chunks", report.indexed);
        }
        report
    }

    /// The one operation other collaborators depend on. Never returns
    /// an error: every failure mode is folded into the answer text.
    pub async fn answer(&self, query: &str, top_k: usize) -> QueryResponse {
        let started = Instant::now();

        let outcome = {
            let index = self.index.read().await;
            match retriever::search(index.as_ref(), query, top_k).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::warn!("Search failed for query: {}", err);
                    return QueryResponse {
                        query: query.to_string(),
                        answer: format!(
                            "Search is unavailable: the embedding endpoint could not be \
                             reached ({}). No documents were consulted.",
                            err
                        ),
                        sources: Vec::new(),
                        processing_time: started.elapsed().as_secs_f64(),
                        model_used: "none".to_string(),
                    };
                }
            }
        };

        let synthesis = self.synthesizer.synthesize(query, &outcome).await;

        QueryResponse {
            query: query.to_string(),
            answer: synthesis.answer,
            sources: synthesis.sources,
            processing_time: started.elapsed().as_secs_f64(),
            model_used: synthesis.model_used,
        }
    }

    pub async fn stats(&self) -> PipelineStats {
        let index = self.index.read().await;
        let chunk_count = index.chunk_count();

        let mut documents = Vec::new();
        for i in 0..chunk_count {
            let name = &index.chunk_at(i).document;
            if !documents.contains(name) {
                documents.push(name.clone());
            }
        }

        PipelineStats {
            backend: index.name().to_string(),
            documents,
            chunk_count,
        }
    }

    /// First-chunk preview per document, for the documents endpoint.
    pub async fn document_previews(&self, max_chars: usize) -> Vec<(String, String)> {
        let index = self.index.read().await;
        let mut previews: Vec<(String, String)> = Vec::new();

        for i in 0..index.chunk_count() {
            let chunk = index.chunk_at(i);
            if previews.iter().any(|(name, _)| name == &chunk.document) {
                continue;
            }
            let preview: String = chunk.text.chars().take(max_chars).collect();
            previews.push((chunk.document.clone(), preview));
        }

        previews
    }

    pub fn default_top_k(&self) -> usize {
        self.config.retrieval.top_k
    }
}
