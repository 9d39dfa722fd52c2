use std::sync::Arc;

use crate::core::config::{AppConfig, AppPaths};
use crate::llm::{LlmProvider, OllamaProvider};
use crate::pipeline::RagPipeline;

/// Shared application state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: AppConfig,
    pub provider: Arc<dyn LlmProvider>,
    pub pipeline: Arc<RagPipeline>,
}

impl AppState {
    /// Loads configuration, wires the provider and pipeline, and runs
    /// the initial index build.
    pub async fn initialize(paths: Arc<AppPaths>) -> anyhow::Result<Arc<Self>> {
        let config = AppConfig::load(&paths.config_path())?;

        let provider: Arc<dyn LlmProvider> = Arc::new(OllamaProvider::new(&config.ollama));
        let pipeline = Arc::new(RagPipeline::new(
            config.clone(),
            (*paths).clone(),
            provider.clone(),
        ));

        let report = pipeline.rebuild().await;
        tracing::info!(
            "Pipeline ready: {} documents, {} chunks indexed ({} skipped)",
            report.documents,
            report.indexed,
            report.skipped
        );

        Ok(Arc::new(Self {
            paths,
            config,
            provider,
            pipeline,
        }))
    }
}
