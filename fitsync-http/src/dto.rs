use fitsync::types::{Priority, SetEntry, SyncStatus};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /1/queue`. `data` must match the shape registered for `type`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EnqueueRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub priority: Option<Priority>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClearQueueResponse {
    pub cleared: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NetworkRequest {
    pub online: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NetworkResponse {
    /// Whether this call flipped the connectivity state.
    pub changed: bool,
    pub status: SyncStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StartSessionRequest {
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub workout_plan_id: Option<String>,
}

/// Body of `POST /1/sessions/{id}/sets`.
pub type RecordSetRequest = SetEntry;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub online: bool,
    pub queue_length: usize,
    pub sync_in_progress: bool,
    pub build_profile: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_request_priority_is_optional() {
        let req: EnqueueRequest = serde_json::from_str(
            r#"{"type": "user_preference", "data": {"user_id": "u1", "key": "units", "value": 1}}"#,
        )
        .unwrap();
        assert_eq!(req.kind, "user_preference");
        assert!(req.priority.is_none());

        let req: EnqueueRequest =
            serde_json::from_str(r#"{"type": "progress_update", "data": {}, "priority": "high"}"#)
                .unwrap();
        assert_eq!(req.priority, Some(Priority::High));
    }
}
