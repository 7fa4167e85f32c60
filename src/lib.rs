//! # fitsync
//!
//! Durable, prioritized offline mutation queue for fitness-tracking clients.
//!
//! Writes made while the device is offline (logged sets, progress
//! measurements, preference changes) are queued, persisted to a local
//! key-value store, and replayed against the backend once connectivity
//! returns. Draining is single-flight and ordered by priority, then age.
//! Items that fail are retried on later drains and dropped after
//! [`retry::MAX_RETRIES`] failed attempts.
//!
//! The HTTP remote adapter lives in `fitsync-remote`; an axum service
//! exposing the queue lives in `fitsync-http` and `fitsync-server`.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use fitsync::{
//!     FileKeyValueStore, MutationPayload, NetworkMonitor, Priority, QueueStore,
//!     RemoteSyncAdapter, SyncQueueItem, SyncQueueManager, UserPreference,
//! };
//! use std::sync::Arc;
//!
//! struct PrintAdapter;
//!
//! #[async_trait]
//! impl RemoteSyncAdapter for PrintAdapter {
//!     async fn sync_item(&self, item: &SyncQueueItem) -> fitsync::Result<()> {
//!         println!("sync {} {}", item.kind(), item.id);
//!         Ok(())
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> fitsync::Result<()> {
//! let kv = Arc::new(FileKeyValueStore::open(std::path::Path::new("./data"))?);
//! let manager = SyncQueueManager::new(
//!     QueueStore::new(kv, "sync_queue"),
//!     NetworkMonitor::new(false),
//!     Arc::new(PrintAdapter),
//!     Default::default(),
//!     tracing::info_span!("sync"),
//! );
//!
//! // Offline: queued and persisted, nothing sent yet.
//! manager
//!     .enqueue(
//!         MutationPayload::UserPreference(UserPreference {
//!             user_id: "u1".into(),
//!             key: "units".into(),
//!             value: "metric".into(),
//!         }),
//!         Priority::Normal,
//!     )
//!     .await?;
//! assert_eq!(manager.status().await.queue_length, 1);
//!
//! // Back online: drain now.
//! manager.network().set_online(true);
//! manager.force_sync().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! | Feature | Dependencies | Use case |
//! |---------|-------------|----------|
//! | `axum-support` | axum | [`SyncError`] implements `IntoResponse` |
//! | `openapi` | utoipa | OpenAPI schemas for the public types |
//!
//! Both are enabled by default. Use `default-features = false` for the bare
//! queue library.

pub mod config;
pub mod error;
pub mod manager;
pub mod network;
pub mod remote;
pub mod retry;
pub mod session;
pub mod store;
pub mod types;

pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use manager::{DrainOutcome, DrainReport, ManagerConfig, SkipReason, SyncQueueManager};
pub use network::NetworkMonitor;
pub use remote::RemoteSyncAdapter;
pub use retry::{RetryDecision, RetryPolicy, MAX_RETRIES};
pub use session::{OfflineSessionStore, OfflineWorkoutSession, SESSIONS_KEY};
pub use store::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, QueueStore};
pub use types::*;

use std::sync::Arc;

/// Everything a host process needs, wired from one [`SyncConfig`].
pub struct SyncRuntime {
    pub config: SyncConfig,
    pub store: Arc<FileKeyValueStore>,
    pub network: Arc<NetworkMonitor>,
    pub manager: Arc<SyncQueueManager>,
    pub sessions: Arc<OfflineSessionStore>,
}

impl SyncRuntime {
    /// Open the data directory and build the manager and session store.
    ///
    /// # Errors
    ///
    /// [`SyncError::StoreLocked`] if another process owns `config.data_dir`,
    /// [`SyncError::Io`] if it cannot be created.
    pub fn open(
        config: SyncConfig,
        remote: Arc<dyn RemoteSyncAdapter>,
        span: tracing::Span,
    ) -> Result<Self> {
        let store = Arc::new(FileKeyValueStore::open(&config.data_dir)?);
        let network = NetworkMonitor::new(config.start_online);
        let manager = SyncQueueManager::new(
            QueueStore::new(store.clone(), config.queue_key.clone()),
            network.clone(),
            remote,
            ManagerConfig::from(&config),
            span,
        );
        let sessions = Arc::new(OfflineSessionStore::open(store.clone(), manager.clone()));
        Ok(Self {
            config,
            store,
            network,
            manager,
            sessions,
        })
    }
}
