use fitsync::{NetworkMonitor, OfflineSessionStore, SyncQueueManager};
use std::sync::Arc;

pub mod health;
pub mod network;
pub mod queue;
pub mod sessions;
pub mod sync;

pub struct AppState {
    pub manager: Arc<SyncQueueManager>,
    pub sessions: Arc<OfflineSessionStore>,
    pub network: Arc<NetworkMonitor>,
}

pub use health::health;
pub use network::set_network;
pub use queue::{clear_queue, enqueue, list_queue};
pub use sessions::{
    complete_session, delete_session, get_session, list_sessions, record_set, start_session,
};
pub use sync::{force_sync, sync_status};
