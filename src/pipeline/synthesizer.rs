use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::types::{SearchOutcome, SearchResult};
use crate::core::errors::ApiError;
use crate::llm::types::{GenerateOptions, GenerateRequest};
use crate::llm::LlmProvider;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesizerConfig {
    pub generation_model: String,
    /// Tried when the primary model fails all its attempts
    pub fallback_model: Option<String>,
    /// Attempts per model before moving on
    pub max_attempts: usize,
    /// Consume the generate endpoint in streaming mode
    pub streaming: bool,
    pub temperature: f64,
    pub top_p: f64,
    pub num_predict: i64,
    /// Per-chunk context budget in characters
    pub max_snippet_chars: usize,
    /// Total context budget in characters
    pub max_context_chars: usize,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            generation_model: "mistral".to_string(),
            fallback_model: None,
            max_attempts: 2,
            streaming: false,
            temperature: 0.3,
            top_p: 0.9,
            num_predict: 100,
            max_snippet_chars: 300,
            max_context_chars: 4000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SynthesisResult {
    pub answer: String,
    pub sources: Vec<String>,
    pub model_used: String,
}

/// Turns retrieved chunks plus the question into a final answer.
///
/// The generative path builds a bounded context and calls the model
/// server with bounded retry and an optional fallback model; every
/// failure mode degrades into an extractive answer with a diagnostic,
/// so callers always receive a non-empty answer and never an error.
pub struct Synthesizer {
    provider: Arc<dyn LlmProvider>,
    config: SynthesizerConfig,
}

impl Synthesizer {
    pub fn new(provider: Arc<dyn LlmProvider>, config: SynthesizerConfig) -> Self {
        Self { provider, config }
    }

    pub async fn synthesize(&self, question: &str, outcome: &SearchOutcome) -> SynthesisResult {
        match outcome {
            SearchOutcome::NoDocuments => SynthesisResult {
                answer: "No documents are indexed; there is nothing to search. Add .txt or \
                         .md files to the data directory and reindex."
                    .to_string(),
                sources: Vec::new(),
                model_used: "none".to_string(),
            },
            SearchOutcome::NoMatch(best) => {
                let snippet = extract_relevant(question, &best.chunk.text)
                    .unwrap_or_else(|| truncate_chars(&best.chunk.text, self.config.max_snippet_chars).to_string());
                SynthesisResult {
                    answer: format!(
                        "No passage scored above the relevance threshold for this query. \
                         Closest passage, from {}: {}",
                        best.chunk.document, snippet
                    ),
                    sources: vec![best.chunk.document.clone()],
                    model_used: "extractive".to_string(),
                }
            }
            SearchOutcome::Matched(results) => self.answer_matched(question, results).await,
        }
    }

    async fn answer_matched(&self, question: &str, results: &[SearchResult]) -> SynthesisResult {
        let sources = distinct_sources(results);
        let context = self.build_context(results);
        let prompt = format!(
            "Answer this question using the provided context. Be concise.\n\n\
             Context: {}\n\nQuestion: {}\n\nAnswer:",
            context, question
        );

        match self.generate_with_retry(&prompt).await {
            Ok((answer, model)) if !answer.trim().is_empty() => SynthesisResult {
                answer: answer.trim().to_string(),
                sources,
                model_used: model,
            },
            Ok((_, model)) => {
                tracing::warn!("Model {} returned an empty answer", model);
                SynthesisResult {
                    answer: format!(
                        "The generation model returned an empty answer. {}",
                        extractive_answer(question, results)
                    ),
                    sources,
                    model_used: "extractive".to_string(),
                }
            }
            Err(err) => {
                tracing::warn!("Generation failed, answering extractively: {}", err);
                SynthesisResult {
                    answer: format!(
                        "The generation endpoint was unavailable ({}). Falling back to the \
                         most relevant passages.\n\n{}",
                        err,
                        extractive_answer(question, results)
                    ),
                    sources,
                    model_used: "extractive".to_string(),
                }
            }
        }
    }

    /// Concatenates chunk snippets with source attribution, staying
    /// inside the configured context budget.
    fn build_context(&self, results: &[SearchResult]) -> String {
        let mut context = String::new();

        for (i, result) in results.iter().enumerate() {
            let snippet = truncate_chars(&result.chunk.text, self.config.max_snippet_chars);
            let entry = format!(
                "Source {} ({}):\n{}\n\n",
                i + 1,
                result.chunk.document,
                snippet
            );

            if context.len() + entry.len() > self.config.max_context_chars {
                break;
            }
            context.push_str(&entry);
        }

        context.trim_end().to_string()
    }

    /// Tries each configured model in turn, `max_attempts` times each.
    /// Returns the first non-error answer together with the model that
    /// produced it.
    async fn generate_with_retry(&self, prompt: &str) -> Result<(String, String), ApiError> {
        let mut models = vec![self.config.generation_model.clone()];
        if let Some(fallback) = &self.config.fallback_model {
            if fallback != &self.config.generation_model {
                models.push(fallback.clone());
            }
        }

        let mut last_error = ApiError::Upstream("no generation attempt made".to_string());

        for model in models {
            for attempt in 1..=self.config.max_attempts {
                let request = GenerateRequest::new(prompt.to_string()).with_options(
                    GenerateOptions {
                        temperature: Some(self.config.temperature),
                        top_p: Some(self.config.top_p),
                        num_predict: Some(self.config.num_predict),
                    },
                );

                let result = if self.config.streaming {
                    self.collect_stream(request, &model).await
                } else {
                    self.provider.generate(request, &model).await
                };

                match result {
                    Ok(answer) => return Ok((answer, model)),
                    Err(err) => {
                        tracing::warn!(
                            "Generation attempt {}/{} with {} failed: {}",
                            attempt,
                            self.config.max_attempts,
                            model,
                            err
                        );
                        last_error = err;
                    }
                }
            }
        }

        Err(last_error)
    }

    /// Drains a streaming response, concatenating fragments in arrival
    /// order until the stream completes.
    async fn collect_stream(
        &self,
        request: GenerateRequest,
        model: &str,
    ) -> Result<String, ApiError> {
        let mut rx = self.provider.stream_generate(request, model).await?;
        let mut answer = String::new();
        while let Some(fragment) = rx.recv().await {
            answer.push_str(&fragment?);
        }
        Ok(answer)
    }
}

/// Distinct document names of the results actually used, keeping their
/// relative order.
fn distinct_sources(results: &[SearchResult]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for result in results {
        if !sources.contains(&result.chunk.document) {
            sources.push(result.chunk.document.clone());
        }
    }
    sources
}

/// No-LLM answer: pull the passages most related to the question out
/// of the retrieved chunks.
fn extractive_answer(question: &str, results: &[SearchResult]) -> String {
    let mut parts = Vec::new();

    for result in results.iter().take(3) {
        let snippet = extract_relevant(question, &result.chunk.text)
            .unwrap_or_else(|| truncate_chars(&result.chunk.text, 200).to_string());
        parts.push(format!("From {}: {}", result.chunk.document, snippet));
    }

    if parts.is_empty() {
        "I found relevant documents but could not extract a specific passage for this query."
            .to_string()
    } else {
        format!("Based on the available documents:\n\n{}", parts.join("\n\n"))
    }
}

/// Returns the sentences of `text` that mention a query term, up to
/// three, or None when no sentence matches.
fn extract_relevant(question: &str, text: &str) -> Option<String> {
    let terms: Vec<String> = question
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if terms.is_empty() {
        return None;
    }

    let sentences: Vec<&str> = text
        .split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let matching: Vec<&str> = sentences
        .into_iter()
        .filter(|sentence| {
            let lower = sentence.to_lowercase();
            terms.iter().any(|term| lower.contains(term))
        })
        .take(3)
        .collect();

    if matching.is_empty() {
        None
    } else {
        Some(matching.join(" "))
    }
}

/// Char-boundary-safe prefix of at most `max` characters.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
