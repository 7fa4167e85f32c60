use axum::{extract::State, Json};
use std::sync::Arc;

use super::AppState;
use fitsync::error::SyncError;
use fitsync::manager::DrainOutcome;
use fitsync::types::SyncStatus;

/// Drain the queue now
///
/// Returns `skipped` with reason `already_draining` when a drain is already
/// running.
#[utoipa::path(
    post,
    path = "/1/sync",
    tag = "sync",
    responses(
        (status = 200, description = "Drain pass result", body = DrainOutcome),
        (status = 503, description = "Device is offline; queue unchanged")
    )
)]
pub async fn force_sync(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DrainOutcome>, SyncError> {
    let outcome = state.manager.force_sync().await?;
    Ok(Json(outcome))
}

/// Current queue status
#[utoipa::path(
    get,
    path = "/1/sync/status",
    tag = "sync",
    responses(
        (status = 200, description = "Queue length and connectivity", body = SyncStatus)
    )
)]
pub async fn sync_status(State(state): State<Arc<AppState>>) -> Json<SyncStatus> {
    Json(state.manager.status().await)
}
