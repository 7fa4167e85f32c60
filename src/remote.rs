use async_trait::async_trait;

use crate::error::Result;
use crate::types::SyncQueueItem;

/// Performs the remote write for one queued mutation.
///
/// Any `Err` counts as a transient failure and is retried by the manager up
/// to its cap. Delivery is at-least-once: an item whose remote write landed
/// but whose acknowledgement was lost will be sent again, so implementations
/// should key on [`SyncQueueItem::id`] to stay idempotent.
#[async_trait]
pub trait RemoteSyncAdapter: Send + Sync {
    async fn sync_item(&self, item: &SyncQueueItem) -> Result<()>;
}
