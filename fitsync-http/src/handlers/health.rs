use axum::{extract::State, Json};
use std::sync::Arc;

use super::AppState;
use crate::dto::HealthResponse;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is healthy", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = state.manager.status().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        online: status.is_online,
        queue_length: status.queue_length,
        sync_in_progress: status.sync_in_progress,
        build_profile: if cfg!(debug_assertions) { "debug" } else { "release" }.to_string(),
    })
}
