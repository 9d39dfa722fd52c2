//! Route-level tests against the axum router with an unreachable
//! model provider, exercising the contract that pipeline-level
//! failures surface inside well-formed responses, not HTTP errors.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use quarry_backend::core::config::{AppConfig, AppPaths};
use quarry_backend::index::BackendKind;
use quarry_backend::llm::types::GenerateRequest;
use quarry_backend::llm::LlmProvider;
use quarry_backend::server::router::router;
use quarry_backend::state::AppState;
use quarry_backend::{ApiError, RagPipeline};

/// Provider that is down for everything, like a stopped Ollama.
struct DownProvider;

#[async_trait]
impl LlmProvider for DownProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        Ok(false)
    }

    async fn embed(&self, _input: &str, _model_id: &str) -> Result<Vec<f32>, ApiError> {
        Err(ApiError::Upstream("connection refused".to_string()))
    }

    async fn generate(
        &self,
        _request: GenerateRequest,
        _model_id: &str,
    ) -> Result<String, ApiError> {
        Err(ApiError::Upstream("connection refused".to_string()))
    }

    async fn stream_generate(
        &self,
        _request: GenerateRequest,
        _model_id: &str,
    ) -> Result<mpsc::Receiver<Result<String, ApiError>>, ApiError> {
        Err(ApiError::Upstream("connection refused".to_string()))
    }
}

async fn make_state(data_dir: &Path, backend: BackendKind) -> Arc<AppState> {
    let mut config = AppConfig::default();
    config.data_dir = data_dir.to_string_lossy().to_string();
    config.backend = backend;

    let paths = Arc::new(AppPaths {
        project_root: data_dir.to_path_buf(),
        log_dir: data_dir.join("logs"),
    });

    let provider: Arc<dyn LlmProvider> = Arc::new(DownProvider);
    let pipeline = Arc::new(RagPipeline::new(
        config.clone(),
        (*paths).clone(),
        provider.clone(),
    ));
    pipeline.rebuild().await;

    Arc::new(AppState {
        paths,
        config,
        provider,
        pipeline,
    })
}

fn json_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collects")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is json")
}

#[tokio::test]
async fn empty_query_is_a_bad_request() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = make_state(dir.path(), BackendKind::TfIdf).await;
    let app = router(state);

    let response = app
        .oneshot(json_request("/api/query", r#"{"query": "   "}"#))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("query"));
}

#[tokio::test]
async fn query_with_provider_down_still_returns_well_formed_response() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("a.txt"),
        "Quantum computers use qubits. Qubits exploit superposition.",
    )
    .expect("write corpus");

    let state = make_state(dir.path(), BackendKind::TfIdf).await;
    let app = router(state);

    let response = app
        .oneshot(json_request(
            "/api/query",
            r#"{"query": "qubits", "top_k": 1}"#,
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    assert_eq!(body["sources"], serde_json::json!(["a.txt"]));
    assert!(!body["answer"].as_str().unwrap().is_empty());
    assert!(body["processing_time"].as_f64().unwrap() >= 0.0);
    assert_eq!(body["model_used"], "extractive");
}

#[tokio::test]
async fn health_reports_unreachable_provider_without_failing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = make_state(dir.path(), BackendKind::Overlap).await;
    let app = router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["provider_reachable"], false);
    assert_eq!(body["chunks"], 0);
}

#[tokio::test]
async fn stats_and_reindex_reflect_the_data_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = make_state(dir.path(), BackendKind::Overlap).await;

    // Index was built over an empty directory.
    let response = router(state.clone())
        .oneshot(
            Request::builder()
                .uri("/api/stats")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    let body = json_body(response).await;
    assert_eq!(body["status"], "empty");

    // Drop a file in and reindex through the API.
    fs::write(dir.path().join("late.txt"), "added after startup").expect("write corpus");
    let response = router(state.clone())
        .oneshot(json_request("/api/reindex", "{}"))
        .await
        .expect("router responds");
    let body = json_body(response).await;
    assert_eq!(body["documents"], 1);
    assert_eq!(body["indexed"], 1);

    let response = router(state)
        .oneshot(
            Request::builder()
                .uri("/api/stats")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    let body = json_body(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["documents"], serde_json::json!(["late.txt"]));
}
