use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub top_k: Option<usize>,
}

/// `POST /api/query` — the HTTP face of `RagPipeline::answer`.
///
/// Pipeline-level conditions (no documents, no match, model outage)
/// are reported inside the response body; only a malformed request is
/// an HTTP error.
pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let question = request.query.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }

    let top_k = request.top_k.unwrap_or_else(|| state.pipeline.default_top_k());
    if top_k == 0 {
        return Err(ApiError::BadRequest("top_k must be at least 1".to_string()));
    }

    tracing::info!("Processing query: {}", question);
    let response = state.pipeline.answer(question, top_k).await;

    Ok(Json(response))
}
