use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::llm::LlmProvider;
use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.pipeline.stats().await;
    let provider_reachable = state.provider.health_check().await.unwrap_or(false);

    Json(json!({
        "status": "ok",
        "backend": stats.backend,
        "documents": stats.documents.len(),
        "chunks": stats.chunk_count,
        "provider": state.provider.name(),
        "provider_reachable": provider_reachable,
    }))
}
