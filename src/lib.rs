//! Quarry — local document Q&A backend.
//!
//! Loads plain-text and markdown files from a data directory, indexes
//! them under a configurable similarity backend (dense embeddings via
//! an Ollama-compatible server, TF-IDF, or token overlap), and answers
//! queries with retrieved context — through a local generation model
//! when one is reachable, extractively otherwise.
//!
//! - [`pipeline`] — loader, chunker, retriever, synthesizer, and the
//!   `RagPipeline` service object
//! - [`index`] — the `SearchIndex` trait and its three backends
//! - [`llm`] — provider trait and the Ollama client
//! - [`server`] — axum routes exposing the pipeline over HTTP
//! - [`core`] — configuration, errors, logging

pub mod core;
pub mod index;
pub mod llm;
pub mod pipeline;
pub mod server;
pub mod state;
pub mod vector_math;

pub use crate::core::config::{AppConfig, AppPaths};
pub use crate::core::errors::ApiError;
pub use crate::pipeline::types::{BuildReport, Chunk, Document, QueryResponse, SearchResult};
pub use crate::pipeline::RagPipeline;
