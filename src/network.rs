use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Binary online/offline tracker fed by environment events.
///
/// Whoever observes connectivity (an HTTP hook, a probe, a platform callback)
/// calls [`NetworkMonitor::set_online`]; the queue manager subscribes and
/// drains on every offline → online transition.
pub struct NetworkMonitor {
    state: watch::Sender<bool>,
    /// Offline → online transitions seen so far.
    reconnects: AtomicU64,
}

impl NetworkMonitor {
    pub fn new(initially_online: bool) -> Arc<Self> {
        let (state, _) = watch::channel(initially_online);
        Arc::new(Self {
            state,
            reconnects: AtomicU64::new(0),
        })
    }

    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// Record a connectivity event. Returns `true` if the state changed.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.state.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            if online {
                self.reconnects.fetch_add(1, Ordering::AcqRel);
            }
            true
        });
        if changed {
            tracing::info!(
                "[NET] connectivity changed: {}",
                if online { "online" } else { "offline" }
            );
        }
        changed
    }

    /// Number of offline → online transitions since construction.
    ///
    /// A watch receiver only sees the latest state, so a quick
    /// offline/online flip reads as "still online". Comparing this counter
    /// catches it.
    pub fn reconnect_count(&self) -> u64 {
        self.reconnects.load(Ordering::Acquire)
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}
