use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

const PREVIEW_CHARS: usize = 100;

pub async fn list_documents(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let previews = state.pipeline.document_previews(PREVIEW_CHARS).await;

    let documents: Vec<_> = previews
        .into_iter()
        .map(|(name, preview)| json!({ "name": name, "preview": preview }))
        .collect();

    Json(json!({
        "total_documents": documents.len(),
        "documents": documents,
    }))
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.pipeline.stats().await;
    let status = if stats.chunk_count == 0 { "empty" } else { "ready" };

    Json(json!({
        "backend": stats.backend,
        "documents": stats.documents,
        "chunks": stats.chunk_count,
        "status": status,
    }))
}

/// `POST /api/reindex` — re-ingests the data directory. Documents
/// added since the last build become visible after this completes.
pub async fn reindex(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let report = state.pipeline.rebuild().await;
    Json(json!({
        "documents": report.documents,
        "indexed": report.indexed,
        "skipped": report.skipped,
    }))
}
