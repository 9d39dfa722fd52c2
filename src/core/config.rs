use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::index::BackendKind;
use crate::llm::ollama::OllamaConfig;
use crate::pipeline::chunker::ChunkingConfig;
use crate::pipeline::retriever::RetrievalConfig;
use crate::pipeline::synthesizer::SynthesizerConfig;

/// Filesystem locations the service works with.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub log_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let project_root = discover_project_root();
        let log_dir = project_root.join("logs");

        AppPaths {
            project_root,
            log_dir,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("QUARRY_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        self.project_root.join("config.yml")
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_project_root() -> PathBuf {
    if let Ok(root) = env::var("QUARRY_ROOT") {
        return PathBuf::from(root);
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    if manifest_dir.join("config.yml").exists() {
        return manifest_dir;
    }

    env::current_dir().unwrap_or(manifest_dir)
}

/// Top-level service configuration, loaded from `config.yml`.
///
/// Every section has working defaults so the service starts with no
/// config file at all (data directory `./data`, TF-IDF backend).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: String,
    pub backend: BackendKind,
    pub chunking: ChunkingConfig,
    pub ollama: OllamaConfig,
    pub retrieval: RetrievalConfig,
    pub synthesizer: SynthesizerConfig,
    pub server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            backend: BackendKind::TfIdf,
            chunking: ChunkingConfig::default(),
            ollama: OllamaConfig::default(),
            retrieval: RetrievalConfig::default(),
            synthesizer: SynthesizerConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the given path. A missing file is not an
    /// error; it yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ApiError> {
        if !path.exists() {
            tracing::info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(ApiError::internal)?;
        let config: AppConfig = serde_yaml::from_str(&contents).map_err(|err| {
            ApiError::BadRequest(format!("Invalid config at '{}': {}", path.display(), err))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.chunking.chunk_size == 0 {
            return Err(config_error("chunking.chunk_size", "must be at least 1"));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(config_error(
                "chunking.chunk_overlap",
                "must be smaller than chunk_size",
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(config_error("retrieval.top_k", "must be at least 1"));
        }
        if self.synthesizer.max_attempts == 0 {
            return Err(config_error("synthesizer.max_attempts", "must be at least 1"));
        }
        if self.synthesizer.max_snippet_chars == 0 {
            return Err(config_error(
                "synthesizer.max_snippet_chars",
                "must be at least 1",
            ));
        }
        if self.ollama.request_timeout_secs == 0 {
            return Err(config_error(
                "ollama.request_timeout_secs",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Resolves the data directory against the project root when relative.
    pub fn data_path(&self, paths: &AppPaths) -> PathBuf {
        let configured = PathBuf::from(&self.data_dir);
        if configured.is_absolute() {
            configured
        } else {
            paths.project_root.join(configured)
        }
    }
}

fn config_error(path: &str, message: &str) -> ApiError {
    ApiError::BadRequest(format!("Invalid config at '{}': {}", path, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.data_dir, "./data");
        assert_eq!(config.backend, BackendKind::TfIdf);
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        let mut config = AppConfig::default();
        config.chunking.chunk_size = 50;
        config.chunking.chunk_overlap = 50;
        assert!(matches!(
            config.validate(),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn rejects_zero_top_k() {
        let mut config = AppConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_yaml_with_defaults() {
        let yaml = "backend: overlap\nchunking:\n  chunk_size: 120\n";
        let config: AppConfig = serde_yaml::from_str(yaml).expect("partial config parses");
        assert_eq!(config.backend, BackendKind::Overlap);
        assert_eq!(config.chunking.chunk_size, 120);
        // Untouched sections keep their defaults.
        assert_eq!(config.chunking.chunk_overlap, 50);
        assert_eq!(config.retrieval.top_k, 3);
    }
}
