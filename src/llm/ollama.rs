use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::provider::LlmProvider;
use super::types::GenerateRequest;
use crate::core::errors::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub embedding_model: String,
    pub request_timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// Client for an Ollama-compatible model server.
///
/// Covers the three endpoints the pipeline needs: `/api/embeddings`,
/// `/api/generate` (both streaming and non-streaming) and `/api/tags`
/// for reachability checks.
#[derive(Clone)]
pub struct OllamaProvider {
    base_url: String,
    client: Client,
}

impl OllamaProvider {
    pub fn new(config: &OllamaConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    fn generate_body(request: &GenerateRequest, model_id: &str, stream: bool) -> Value {
        let mut options = serde_json::Map::new();
        if let Some(t) = request.options.temperature {
            options.insert("temperature".to_string(), json!(t));
        }
        if let Some(t) = request.options.top_p {
            options.insert("top_p".to_string(), json!(t));
        }
        if let Some(n) = request.options.num_predict {
            options.insert("num_predict".to_string(), json!(n));
        }

        json!({
            "model": model_id,
            "prompt": request.prompt,
            "stream": stream,
            "options": Value::Object(options),
        })
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn embed(&self, input: &str, model_id: &str) -> Result<Vec<f32>, ApiError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let body = json!({
            "model": model_id,
            "prompt": input,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "Ollama embed error ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::upstream)?;
        let embedding = payload["embedding"]
            .as_array()
            .ok_or_else(|| ApiError::Upstream("malformed embedding payload".to_string()))?
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect::<Vec<f32>>();

        if embedding.is_empty() {
            return Err(ApiError::Upstream("empty embedding payload".to_string()));
        }

        Ok(embedding)
    }

    async fn generate(
        &self,
        request: GenerateRequest,
        model_id: &str,
    ) -> Result<String, ApiError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = Self::generate_body(&request, model_id, false);

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "Ollama generate error ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::upstream)?;
        let response = payload["response"]
            .as_str()
            .ok_or_else(|| ApiError::Upstream("malformed generate payload".to_string()))?;

        Ok(response.to_string())
    }

    async fn stream_generate(
        &self,
        request: GenerateRequest,
        model_id: &str,
    ) -> Result<mpsc::Receiver<Result<String, ApiError>>, ApiError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = Self::generate_body(&request, model_id, true);

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::upstream)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "Ollama stream error ({}): {}",
                status, text
            )));
        }

        let (tx, rx) = mpsc::channel(32);
        let mut stream = res.bytes_stream();

        tokio::spawn(async move {
            // The stream is NDJSON; byte chunks can split a line, so
            // carry the partial tail across reads.
            let mut buffer = String::new();

            while let Some(item) = stream.next().await {
                match item {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));

                        while let Some(pos) = buffer.find('\n') {
                            let line: String = buffer.drain(..=pos).collect();
                            let Some((fragment, done)) = parse_stream_line(line.trim()) else {
                                continue;
                            };

                            if !fragment.is_empty()
                                && tx.send(Ok(fragment)).await.is_err()
                            {
                                return;
                            }
                            if done {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(ApiError::upstream(e))).await;
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }
}

/// Parses one NDJSON fragment from a streaming generate response.
/// Returns the text delta and the completion flag, or None for
/// blank/unparseable lines.
fn parse_stream_line(line: &str) -> Option<(String, bool)> {
    if line.is_empty() {
        return None;
    }
    let value: Value = serde_json::from_str(line).ok()?;
    let fragment = value["response"].as_str().unwrap_or_default().to_string();
    let done = value["done"].as_bool().unwrap_or(false);
    Some((fragment, done))
}
