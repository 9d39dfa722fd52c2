use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::GenerateRequest;
use crate::core::errors::ApiError;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "ollama")
    fn name(&self) -> &str;

    /// check if the provider is healthy/reachable
    async fn health_check(&self) -> Result<bool, ApiError>;

    /// embed a single text into a fixed-length vector
    async fn embed(&self, input: &str, model_id: &str) -> Result<Vec<f32>, ApiError>;

    /// prompt completion (non-streaming)
    async fn generate(&self, request: GenerateRequest, model_id: &str)
        -> Result<String, ApiError>;

    /// prompt completion (streaming); fragments arrive in generation order
    async fn stream_generate(
        &self,
        request: GenerateRequest,
        model_id: &str,
    ) -> Result<mpsc::Receiver<Result<String, ApiError>>, ApiError>;
}
