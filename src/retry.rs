use crate::types::SyncQueueItem;

/// Failed attempts after which a queued mutation is discarded.
pub const MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Keep the item for the next drain.
    Retry { retry_count: u32 },
    /// Evict the item without applying it remotely.
    Drop { retry_count: u32 },
}

/// Fixed-cap retry policy.
///
/// There is no backoff: a kept item is simply attempted again on the next
/// drain, whatever triggers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries: max_retries.max(1),
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Count a failed attempt against `item` and decide its fate.
    pub fn on_failure(&self, item: &mut SyncQueueItem) -> RetryDecision {
        item.retry_count = item.retry_count.saturating_add(1);
        if item.retry_count >= self.max_retries {
            RetryDecision::Drop {
                retry_count: item.retry_count,
            }
        } else {
            RetryDecision::Retry {
                retry_count: item.retry_count,
            }
        }
    }

    /// Whether an item already carries as many failures as the policy allows,
    /// e.g. one persisted under a higher cap.
    pub fn is_exhausted(&self, item: &SyncQueueItem) -> bool {
        item.retry_count >= self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_RETRIES)
    }
}
