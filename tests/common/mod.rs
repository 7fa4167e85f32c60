use async_trait::async_trait;
use fitsync::{
    FileKeyValueStore, NetworkMonitor, OfflineSessionStore, QueueStore, RemoteSyncAdapter,
    SyncError, SyncQueueItem, SyncQueueManager,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Adapter that records every attempt and can be switched to fail.
#[derive(Default)]
pub struct RecordingRemote {
    attempts: Mutex<Vec<SyncQueueItem>>,
    failing: AtomicBool,
}

#[allow(dead_code)]
impl RecordingRemote {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> Vec<SyncQueueItem> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn attempted_ids(&self) -> Vec<String> {
        self.attempts().into_iter().map(|i| i.id).collect()
    }
}

#[async_trait]
impl RemoteSyncAdapter for RecordingRemote {
    async fn sync_item(&self, item: &SyncQueueItem) -> fitsync::Result<()> {
        self.attempts.lock().unwrap().push(item.clone());
        if self.failing.load(Ordering::SeqCst) {
            return Err(SyncError::Remote("backend unavailable".to_string()));
        }
        Ok(())
    }
}

pub struct Harness {
    pub manager: Arc<SyncQueueManager>,
    pub sessions: Arc<OfflineSessionStore>,
    pub network: Arc<NetworkMonitor>,
    pub remote: Arc<RecordingRemote>,
    pub dir: TempDir,
}

/// Manager + session store over a fresh file-backed data dir.
pub fn harness(online: bool) -> Harness {
    let dir = TempDir::new().unwrap();
    harness_in(dir, online)
}

pub fn harness_in(dir: TempDir, online: bool) -> Harness {
    let kv = Arc::new(FileKeyValueStore::open(dir.path()).unwrap());
    let network = NetworkMonitor::new(online);
    let remote = Arc::new(RecordingRemote::default());
    let manager = SyncQueueManager::new(
        QueueStore::new(kv.clone(), "sync_queue"),
        network.clone(),
        remote.clone(),
        Default::default(),
        tracing::Span::none(),
    );
    let sessions = Arc::new(OfflineSessionStore::open(kv, manager.clone()));
    Harness {
        manager,
        sessions,
        network,
        remote,
        dir,
    }
}

#[allow(dead_code)]
impl Harness {
    /// Tear everything down, releasing the directory lock, but keep the files.
    pub fn into_dir(self) -> TempDir {
        self.dir
    }
}

#[allow(dead_code)]
pub fn app_state(h: &Harness) -> Arc<fitsync_http::handlers::AppState> {
    Arc::new(fitsync_http::handlers::AppState {
        manager: h.manager.clone(),
        sessions: h.sessions.clone(),
        network: h.network.clone(),
    })
}

/// Serve the full router on an ephemeral port. Returns the base URL.
#[allow(dead_code)]
pub async fn spawn_server(h: &Harness) -> String {
    let app = fitsync_http::build_router(app_state(h));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

    format!("http://{}", addr)
}

/// Poll `cond` every 10ms for up to 2s.
#[allow(dead_code)]
pub async fn wait_until<F: Fn() -> bool>(cond: F) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 2s");
}
