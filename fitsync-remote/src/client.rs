use super::config::RemoteConfig;
use super::types::{RemoteErrorBody, RemoteStatus, SyncRequest};
use async_trait::async_trait;
use fitsync::{RemoteSyncAdapter, SyncError, SyncQueueItem};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// HTTP client that replays queued mutations against the backend.
pub struct RemoteClient {
    base_url: String,
    device_id: String,
    auth_token: Option<String>,
    http_client: reqwest::Client,
    last_success: Arc<AtomicU64>, // Unix timestamp in seconds
}

impl RemoteClient {
    pub fn new(config: &RemoteConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            device_id: config.device_id.clone(),
            auth_token: config.auth_token.clone(),
            http_client,
            last_success: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn last_success_timestamp(&self) -> u64 {
        self.last_success.load(Ordering::Relaxed)
    }

    pub fn status(&self) -> RemoteStatus {
        RemoteStatus {
            base_url: self.base_url.clone(),
            device_id: self.device_id.clone(),
            last_success: self.last_success_timestamp(),
        }
    }

    /// Send one mutation to `POST {base_url}/sync`.
    ///
    /// The item id doubles as the `Idempotency-Key`, so a replay after a lost
    /// acknowledgement is safe for backends that honour it.
    pub async fn push(&self, item: &SyncQueueItem) -> Result<(), SyncError> {
        let url = format!("{}/sync", self.base_url);

        let mut request = self
            .http_client
            .post(&url)
            .header("Idempotency-Key", item.id.as_str())
            .header("X-Device-Id", self.device_id.as_str())
            .json(&SyncRequest::from(item));
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            SyncError::Remote(format!("failed to send {} to {}: {}", item.id, url, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body: RemoteErrorBody = response.json().await.unwrap_or_default();
            let message = body
                .summary()
                .map(str::to_string)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            tracing::debug!(
                "[REMOTE] {} {} rejected with {}: {}",
                item.kind(),
                item.id,
                status,
                message
            );
            return Err(SyncError::RemoteStatus {
                status: status.as_u16(),
                message,
            });
        }

        self.mark_success();
        Ok(())
    }

    /// `GET {base_url}/health`; true on any 2xx.
    pub async fn check_health(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.http_client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                self.mark_success();
                true
            }
            Ok(response) => {
                tracing::debug!("[REMOTE] health check returned {}", response.status());
                false
            }
            Err(e) => {
                tracing::debug!("[REMOTE] health check failed: {}", e);
                false
            }
        }
    }

    fn mark_success(&self) {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.last_success.store(now, Ordering::Relaxed);
    }
}

#[async_trait]
impl RemoteSyncAdapter for RemoteClient {
    async fn sync_item(&self, item: &SyncQueueItem) -> fitsync::Result<()> {
        self.push(item).await
    }
}
