use fitsync::types::{MutationPayload, SyncQueueItem};
use serde::{Deserialize, Serialize};

/// Body of `POST {base_url}/sync`: the item id plus its `type`/`data` pair.
#[derive(Debug, Clone, Serialize)]
pub struct SyncRequest<'a> {
    pub id: &'a str,
    #[serde(flatten)]
    pub payload: &'a MutationPayload,
}

impl<'a> From<&'a SyncQueueItem> for SyncRequest<'a> {
    fn from(item: &'a SyncQueueItem) -> Self {
        Self {
            id: &item.id,
            payload: &item.payload,
        }
    }
}

/// Error body a backend may return; only used to enrich log lines.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl RemoteErrorBody {
    pub fn summary(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }
}

/// Client-side view of the remote link, for status endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteStatus {
    pub base_url: String,
    pub device_id: String,
    /// Unix seconds of the last 2xx, 0 if none yet.
    pub last_success: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitsync::types::{Priority, UserPreference};

    #[test]
    fn test_request_shape() {
        let item = SyncQueueItem::new(
            MutationPayload::UserPreference(UserPreference {
                user_id: "u1".to_string(),
                key: "units".to_string(),
                value: serde_json::json!("metric"),
            }),
            Priority::Low,
        );

        let v = serde_json::to_value(SyncRequest::from(&item)).unwrap();
        assert_eq!(v["id"], item.id.as_str());
        assert_eq!(v["type"], "user_preference");
        assert_eq!(v["data"]["key"], "units");
        assert!(v.get("retryCount").is_none());
        assert!(v.get("priority").is_none());
    }
}
