//! Sync queue manager: enqueue, prioritized single-flight draining, retry and
//! drop handling, and the background drain trigger.
//!
//! One manager owns one queue. Build it once at startup and share the
//! returned `Arc` with whoever needs to enqueue or drain.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, Notify};
use tracing::{Instrument, Span};

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::network::NetworkMonitor;
use crate::remote::RemoteSyncAdapter;
use crate::retry::{RetryDecision, RetryPolicy};
use crate::store::QueueStore;
use crate::types::{sort_for_drain, MutationPayload, Priority, SyncEvent, SyncQueueItem, SyncStatus};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Shortest accepted drain interval; smaller values (including zero) are
/// raised to this.
pub const MIN_DRAIN_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub retry: RetryPolicy,
    pub drain_interval: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            drain_interval: Duration::from_secs(30),
        }
    }
}

impl From<&SyncConfig> for ManagerConfig {
    fn from(config: &SyncConfig) -> Self {
        Self {
            retry: RetryPolicy::new(config.max_retries),
            drain_interval: config.drain_interval(),
        }
    }
}

/// Per-pass counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DrainReport {
    pub attempted: usize,
    pub synced: usize,
    pub retried: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum SkipReason {
    AlreadyDraining,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum DrainOutcome {
    Completed(DrainReport),
    Skipped { reason: SkipReason },
}

/// Clears the single-flight flag when a drain pass ends, however it ends.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SyncQueueManager {
    queue: Mutex<Vec<SyncQueueItem>>,
    store: QueueStore,
    network: Arc<NetworkMonitor>,
    remote: Arc<dyn RemoteSyncAdapter>,
    retry: RetryPolicy,
    drain_interval: Duration,
    draining: AtomicBool,
    dropped_total: AtomicU64,
    /// Epoch millis of the last finished drain pass, 0 if none yet.
    last_sync_ms: AtomicI64,
    events: broadcast::Sender<SyncEvent>,
    shutdown: Notify,
    span: Span,
}

impl SyncQueueManager {
    /// Build a manager and load the persisted queue.
    ///
    /// Items that already carry as many failures as `config.retry` allows
    /// (e.g. persisted under a higher cap) are evicted immediately.
    pub fn new(
        store: QueueStore,
        network: Arc<NetworkMonitor>,
        remote: Arc<dyn RemoteSyncAdapter>,
        config: ManagerConfig,
        span: Span,
    ) -> Arc<Self> {
        let (queue, exhausted): (Vec<_>, Vec<_>) = store
            .load()
            .into_iter()
            .partition(|item| !config.retry.is_exhausted(item));

        span.in_scope(|| {
            for item in &exhausted {
                tracing::warn!(
                    "[SYNC] dropping {} item {} on load: {} failed attempts",
                    item.kind(),
                    item.id,
                    item.retry_count
                );
            }
            tracing::info!(
                "[SYNC] manager ready: {} pending items (key '{}', max_retries={})",
                queue.len(),
                store.key(),
                config.retry.max_retries()
            );
        });
        if !exhausted.is_empty() {
            store.save(&queue);
        }

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            queue: Mutex::new(queue),
            store,
            network,
            remote,
            retry: config.retry,
            drain_interval: config.drain_interval.max(MIN_DRAIN_INTERVAL),
            draining: AtomicBool::new(false),
            dropped_total: AtomicU64::new(exhausted.len() as u64),
            last_sync_ms: AtomicI64::new(0),
            events,
            shutdown: Notify::new(),
            span,
        })
    }

    pub fn network(&self) -> &Arc<NetworkMonitor> {
        &self.network
    }

    pub fn drain_interval(&self) -> Duration {
        self.drain_interval
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// Validate and append a mutation, persist the queue, and kick off a
    /// drain if the device is online.
    ///
    /// The returned item is already visible to [`status`](Self::status).
    pub async fn enqueue(
        self: &Arc<Self>,
        payload: MutationPayload,
        priority: Priority,
    ) -> Result<SyncQueueItem> {
        payload.validate()?;
        let item = SyncQueueItem::new(payload, priority);

        {
            let mut queue = self.queue.lock().await;
            queue.push(item.clone());
            self.store.save(&queue);
            self.span.in_scope(|| {
                tracing::debug!(
                    "[SYNC] enqueued {} {} (priority={}, queue={})",
                    item.kind(),
                    item.id,
                    item.priority,
                    queue.len()
                )
            });
        }

        self.emit(SyncEvent::Enqueued {
            id: item.id.clone(),
            kind: item.kind(),
            priority: item.priority,
        });

        if self.network.is_online() && !self.is_draining() {
            let manager = Arc::clone(self);
            tokio::spawn(async move {
                manager.drain().await;
            });
        }

        Ok(item)
    }

    /// Run one drain pass over the items queued right now.
    ///
    /// Single-flight: a call made while another pass is running returns
    /// [`SkipReason::AlreadyDraining`] without touching the queue.
    pub async fn drain(&self) -> DrainOutcome {
        self.drain_pass().instrument(self.span.clone()).await
    }

    /// Like [`drain`](Self::drain), but reports offline as an error.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Offline`] if the device is offline; the queue is
    /// left untouched.
    pub async fn force_sync(&self) -> Result<DrainOutcome> {
        if !self.network.is_online() {
            self.span
                .in_scope(|| tracing::info!("[SYNC] forced sync refused: offline"));
            return Err(SyncError::Offline);
        }
        Ok(self.drain().await)
    }

    pub async fn status(&self) -> SyncStatus {
        let queue_length = self.queue.lock().await.len();
        let last_ms = self.last_sync_ms.load(Ordering::Acquire);
        SyncStatus {
            queue_length,
            is_online: self.network.is_online(),
            sync_in_progress: self.is_draining(),
            dropped_total: self.dropped_total.load(Ordering::Relaxed),
            last_sync_at: (last_ms > 0)
                .then(|| DateTime::<Utc>::from_timestamp_millis(last_ms))
                .flatten(),
        }
    }

    /// Remove every pending item without syncing it. Returns how many were
    /// removed.
    pub async fn clear(&self) -> usize {
        let mut queue = self.queue.lock().await;
        let cleared = queue.len();
        queue.clear();
        self.store.save(&queue);
        self.span
            .in_scope(|| tracing::info!("[SYNC] cleared {} pending items", cleared));
        cleared
    }

    /// Snapshot of the pending items in drain order.
    pub async fn pending(&self) -> Vec<SyncQueueItem> {
        let mut items = self.queue.lock().await.clone();
        sort_for_drain(&mut items);
        items
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Drive draining until [`shutdown`](Self::shutdown): every
    /// `drain_interval` while online, and on each offline → online
    /// transition.
    pub async fn run_background(self: Arc<Self>) {
        let span = self.span.clone();
        self.background_loop().instrument(span).await
    }

    async fn background_loop(&self) {
        let mut ticker = tokio::time::interval(self.drain_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await; // first tick is immediate

        let mut network = self.network.subscribe();
        network.borrow_and_update();
        let mut seen_reconnects = self.network.reconnect_count();

        tracing::info!(
            "[SYNC] background drain every {}s",
            self.drain_interval.as_secs_f64()
        );

        if self.network.is_online() && !self.queue.lock().await.is_empty() {
            self.drain_pass().await;
        }

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.network.is_online() && !self.is_draining() {
                        self.drain_pass().await;
                    }
                }
                changed = network.changed() => {
                    if changed.is_err() {
                        tracing::debug!("[SYNC] network monitor gone, stopping background drain");
                        break;
                    }
                    let online = *network.borrow_and_update();
                    let reconnects = self.network.reconnect_count();
                    // Also catches an offline/online flip made during the last pass.
                    if online && reconnects != seen_reconnects {
                        tracing::info!("[SYNC] back online, draining");
                        self.drain_pass().await;
                    }
                    seen_reconnects = reconnects;
                }
                _ = self.shutdown.notified() => {
                    tracing::info!("[SYNC] background drain stopped");
                    break;
                }
            }
        }
    }

    /// Stop the background loop and persist the current queue.
    pub async fn shutdown(&self) {
        self.shutdown.notify_one();
        let queue = self.queue.lock().await;
        self.store.save(&queue);
        self.span.in_scope(|| {
            tracing::info!("[SYNC] shutdown: persisted {} pending items", queue.len())
        });
    }

    async fn drain_pass(&self) -> DrainOutcome {
        if self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("[SYNC] drain already in progress, skipping");
            return DrainOutcome::Skipped {
                reason: SkipReason::AlreadyDraining,
            };
        }
        let _guard = DrainGuard(&self.draining);

        if !self.network.is_online() {
            tracing::debug!("[SYNC] offline, skipping drain");
            return DrainOutcome::Skipped {
                reason: SkipReason::Offline,
            };
        }

        let mut batch = self.queue.lock().await.clone();
        sort_for_drain(&mut batch);

        let mut report = DrainReport::default();
        if !batch.is_empty() {
            tracing::info!("[SYNC] draining {} items", batch.len());
        }

        for item in &batch {
            report.attempted += 1;
            match self.remote.sync_item(item).await {
                Ok(()) => {
                    self.queue.lock().await.retain(|q| q.id != item.id);
                    report.synced += 1;
                    tracing::debug!("[SYNC] synced {} {}", item.kind(), item.id);
                    self.emit(SyncEvent::Synced {
                        id: item.id.clone(),
                        kind: item.kind(),
                    });
                }
                Err(e) => {
                    let mut queue = self.queue.lock().await;
                    // Cleared while the call was in flight.
                    let Some(pos) = queue.iter().position(|q| q.id == item.id) else {
                        continue;
                    };
                    match self.retry.on_failure(&mut queue[pos]) {
                        RetryDecision::Retry { retry_count } => {
                            drop(queue);
                            report.retried += 1;
                            tracing::debug!(
                                "[SYNC] {} {} failed (attempt {}): {}",
                                item.kind(),
                                item.id,
                                retry_count,
                                e
                            );
                            self.emit(SyncEvent::Retrying {
                                id: item.id.clone(),
                                kind: item.kind(),
                                retry_count,
                            });
                        }
                        RetryDecision::Drop { retry_count } => {
                            queue.remove(pos);
                            drop(queue);
                            report.dropped += 1;
                            self.dropped_total.fetch_add(1, Ordering::Relaxed);
                            tracing::warn!(
                                "[SYNC] dropping {} {} after {} failed attempts: {}",
                                item.kind(),
                                item.id,
                                retry_count,
                                e
                            );
                            self.emit(SyncEvent::Dropped {
                                id: item.id.clone(),
                                kind: item.kind(),
                                retry_count,
                            });
                        }
                    }
                }
            }
        }

        {
            let queue = self.queue.lock().await;
            self.store.save(&queue);
            self.last_sync_ms
                .store(Utc::now().timestamp_millis(), Ordering::Release);
            if report.attempted > 0 {
                tracing::info!(
                    "[SYNC] drain done: synced={} retried={} dropped={} remaining={}",
                    report.synced,
                    report.retried,
                    report.dropped,
                    queue.len()
                );
            }
        }

        DrainOutcome::Completed(report)
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
