use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use super::AppState;
use crate::dto::{ClearQueueResponse, EnqueueRequest};
use fitsync::error::SyncError;
use fitsync::types::{MutationPayload, SyncQueueItem};

/// Queue a mutation for sync
#[utoipa::path(
    post,
    path = "/1/queue",
    tag = "queue",
    request_body = EnqueueRequest,
    responses(
        (status = 201, description = "Mutation queued", body = SyncQueueItem),
        (status = 400, description = "Payload does not match its type")
    )
)]
pub async fn enqueue(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EnqueueRequest>,
) -> Result<(StatusCode, Json<SyncQueueItem>), SyncError> {
    let payload = MutationPayload::from_parts(&req.kind, req.data)?;
    let item = state
        .manager
        .enqueue(payload, req.priority.unwrap_or_default())
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// List pending mutations in drain order
#[utoipa::path(
    get,
    path = "/1/queue",
    tag = "queue",
    responses(
        (status = 200, description = "Pending mutations, next to sync first", body = Vec<SyncQueueItem>)
    )
)]
pub async fn list_queue(State(state): State<Arc<AppState>>) -> Json<Vec<SyncQueueItem>> {
    Json(state.manager.pending().await)
}

/// Discard every pending mutation
#[utoipa::path(
    delete,
    path = "/1/queue",
    tag = "queue",
    responses(
        (status = 200, description = "Queue cleared", body = ClearQueueResponse)
    )
)]
pub async fn clear_queue(State(state): State<Arc<AppState>>) -> Json<ClearQueueResponse> {
    let cleared = state.manager.clear().await;
    Json(ClearQueueResponse { cleared })
}
