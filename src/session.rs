//! Offline workout sessions.
//!
//! A session logged while offline is cached locally and every change to it
//! (each set, and the final completion) is pushed through the sync queue as a
//! `workout_session` mutation.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::error::{Result, SyncError};
use crate::manager::SyncQueueManager;
use crate::store::KeyValueStore;
use crate::types::{
    MutationPayload, Priority, SessionChange, SessionId, SetEntry, SyncQueueItem,
    WorkoutSessionUpdate,
};

pub const SESSIONS_KEY: &str = "offline_workout_sessions";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct OfflineWorkoutSession {
    pub id: SessionId,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workout_plan_id: Option<String>,
    pub name: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sets: Vec<SetEntry>,
    pub offline: bool,
}

impl OfflineWorkoutSession {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

pub struct OfflineSessionStore {
    sessions: DashMap<SessionId, OfflineWorkoutSession>,
    kv: Arc<dyn KeyValueStore>,
    manager: Arc<SyncQueueManager>,
    /// Held across snapshot and write so an older snapshot never lands last.
    persist_lock: Mutex<()>,
}

impl OfflineSessionStore {
    /// Open the store, loading any sessions persisted under [`SESSIONS_KEY`].
    pub fn open(kv: Arc<dyn KeyValueStore>, manager: Arc<SyncQueueManager>) -> Self {
        let sessions = DashMap::new();
        for session in load_sessions(kv.as_ref()) {
            sessions.insert(session.id.clone(), session);
        }
        tracing::debug!("[SESSION] loaded {} offline sessions", sessions.len());
        Self {
            sessions,
            kv,
            manager,
            persist_lock: Mutex::new(()),
        }
    }

    pub fn start(
        &self,
        user_id: &str,
        name: &str,
        workout_plan_id: Option<String>,
    ) -> Result<OfflineWorkoutSession> {
        if user_id.trim().is_empty() {
            return Err(SyncError::InvalidPayload(
                "user_id must not be empty".to_string(),
            ));
        }
        let session = OfflineWorkoutSession {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            workout_plan_id,
            name: name.to_string(),
            started_at: Utc::now(),
            completed_at: None,
            sets: Vec::new(),
            offline: true,
        };
        self.sessions.insert(session.id.clone(), session.clone());
        self.persist();
        tracing::info!(
            "[SESSION] started offline session {} for user {}",
            session.id,
            session.user_id
        );
        Ok(session)
    }

    /// Append a set to the session and queue it for sync at normal priority.
    ///
    /// # Errors
    ///
    /// [`SyncError::SessionNotFound`] for an unknown id,
    /// [`SyncError::InvalidPayload`] if the session is already completed or
    /// the set does not validate.
    pub async fn record_set(&self, session_id: &str, set: SetEntry) -> Result<SyncQueueItem> {
        let user_id = {
            let session = self.lookup(session_id)?;
            if session.is_completed() {
                return Err(SyncError::InvalidPayload(format!(
                    "session {} is already completed",
                    session_id
                )));
            }
            session.user_id.clone()
        };

        let payload = MutationPayload::WorkoutSession(WorkoutSessionUpdate {
            session_id: session_id.to_string(),
            user_id,
            recorded_at: Utc::now(),
            change: SessionChange::Set(set.clone()),
        });
        let item = self.manager.enqueue(payload, Priority::Normal).await?;

        if let Some(mut session) = self.sessions.get_mut(session_id) {
            session.sets.push(set);
        }
        self.persist();
        Ok(item)
    }

    /// Mark the session finished and queue the completion at high priority.
    /// Completing an already completed session changes nothing.
    pub async fn complete(&self, session_id: &str) -> Result<OfflineWorkoutSession> {
        let (user_id, total_sets) = {
            let session = self.lookup(session_id)?;
            if session.is_completed() {
                return Ok(session.clone());
            }
            (session.user_id.clone(), session.sets.len() as u32)
        };

        let completed_at = Utc::now();
        let payload = MutationPayload::WorkoutSession(WorkoutSessionUpdate {
            session_id: session_id.to_string(),
            user_id,
            recorded_at: completed_at,
            change: SessionChange::Finished { total_sets },
        });
        self.manager.enqueue(payload, Priority::High).await?;

        let session = {
            let mut session = self
                .sessions
                .get_mut(session_id)
                .ok_or_else(|| SyncError::SessionNotFound(session_id.to_string()))?;
            session.completed_at = Some(completed_at);
            session.clone()
        };
        self.persist();
        tracing::info!(
            "[SESSION] completed offline session {} ({} sets)",
            session.id,
            total_sets
        );
        Ok(session)
    }

    pub fn get(&self, session_id: &str) -> Result<OfflineWorkoutSession> {
        Ok(self.lookup(session_id)?.clone())
    }

    /// All sessions, oldest first.
    pub fn list(&self) -> Vec<OfflineWorkoutSession> {
        let mut sessions: Vec<_> = self.sessions.iter().map(|s| s.value().clone()).collect();
        sessions.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)));
        sessions
    }

    /// Forget a session locally. Mutations it already queued stay queued.
    pub fn remove(&self, session_id: &str) -> Result<OfflineWorkoutSession> {
        let (_, session) = self
            .sessions
            .remove(session_id)
            .ok_or_else(|| SyncError::SessionNotFound(session_id.to_string()))?;
        self.persist();
        Ok(session)
    }

    fn lookup(
        &self,
        session_id: &str,
    ) -> Result<dashmap::mapref::one::Ref<'_, SessionId, OfflineWorkoutSession>> {
        self.sessions
            .get(session_id)
            .ok_or_else(|| SyncError::SessionNotFound(session_id.to_string()))
    }

    fn persist(&self) {
        let _guard = self.persist_lock.lock().unwrap_or_else(|e| e.into_inner());
        let sessions = self.list();
        let blob = match serde_json::to_string(&sessions) {
            Ok(blob) => blob,
            Err(e) => {
                tracing::error!("[SESSION] failed to serialize sessions: {}", e);
                return;
            }
        };
        if let Err(e) = self.kv.put(SESSIONS_KEY, &blob) {
            tracing::error!(
                "[SESSION] failed to persist {} sessions: {}",
                sessions.len(),
                e
            );
        }
    }
}

fn load_sessions(kv: &dyn KeyValueStore) -> Vec<OfflineWorkoutSession> {
    let raw = match kv.get(SESSIONS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!("[SESSION] failed to read sessions: {}, starting empty", e);
            return Vec::new();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!("[SESSION] unreadable sessions blob: {}, starting empty", e);
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::ManagerConfig;
    use crate::network::NetworkMonitor;
    use crate::remote::RemoteSyncAdapter;
    use crate::store::{MemoryKeyValueStore, QueueStore, DEFAULT_QUEUE_KEY};
    use crate::types::MutationKind;
    use async_trait::async_trait;

    struct NeverCalled;

    #[async_trait]
    impl RemoteSyncAdapter for NeverCalled {
        async fn sync_item(&self, _item: &SyncQueueItem) -> Result<()> {
            panic!("offline tests must not reach the remote");
        }
    }

    fn offline_store(kv: Arc<MemoryKeyValueStore>) -> (Arc<SyncQueueManager>, OfflineSessionStore) {
        let manager = SyncQueueManager::new(
            QueueStore::new(kv.clone(), DEFAULT_QUEUE_KEY),
            NetworkMonitor::new(false),
            Arc::new(NeverCalled),
            ManagerConfig::default(),
            tracing::Span::none(),
        );
        let sessions = OfflineSessionStore::open(kv, manager.clone());
        (manager, sessions)
    }

    fn squat(set_index: u32) -> SetEntry {
        SetEntry {
            exercise_id: "back_squat".to_string(),
            set_index,
            reps: Some(5),
            weight_kg: Some(100.0),
            duration_secs: None,
            completed: true,
        }
    }

    #[tokio::test]
    async fn test_sets_and_completion_are_queued() {
        let (manager, store) = offline_store(Arc::new(MemoryKeyValueStore::new()));
        let session = store.start("u1", "Leg day", Some("plan-7".to_string())).unwrap();
        assert!(session.offline);

        let first = store.record_set(&session.id, squat(0)).await.unwrap();
        store.record_set(&session.id, squat(1)).await.unwrap();
        assert_eq!(first.kind(), MutationKind::WorkoutSession);
        assert_eq!(first.priority, Priority::Normal);

        let done = store.complete(&session.id).await.unwrap();
        assert!(done.is_completed());
        assert_eq!(done.sets.len(), 2);

        let pending = manager.pending().await;
        assert_eq!(pending.len(), 3);
        assert_eq!(pending[0].priority, Priority::High, "completion drains first");
        match &pending[0].payload {
            MutationPayload::WorkoutSession(update) => {
                assert_eq!(update.change, SessionChange::Finished { total_sets: 2 });
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_twice_is_noop() {
        let (manager, store) = offline_store(Arc::new(MemoryKeyValueStore::new()));
        let session = store.start("u1", "Push", None).unwrap();

        let first = store.complete(&session.id).await.unwrap();
        let second = store.complete(&session.id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(manager.status().await.queue_length, 1);

        let err = store.record_set(&session.id, squat(0)).await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let (_, store) = offline_store(Arc::new(MemoryKeyValueStore::new()));
        assert!(matches!(
            store.get("missing"),
            Err(SyncError::SessionNotFound(_))
        ));
        assert!(matches!(
            store.complete("missing").await,
            Err(SyncError::SessionNotFound(_))
        ));
        assert!(matches!(
            store.remove("missing"),
            Err(SyncError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sessions_survive_reopen() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let session_id = {
            let (_, store) = offline_store(kv.clone());
            let session = store.start("u1", "Pull", None).unwrap();
            store.record_set(&session.id, squat(0)).await.unwrap();
            session.id
        };

        let (manager, store) = offline_store(kv);
        let restored = store.get(&session_id).unwrap();
        assert_eq!(restored.sets, vec![squat(0)]);
        assert_eq!(manager.status().await.queue_length, 1);

        store.remove(&session_id).unwrap();
        assert!(store.list().is_empty());
        assert_eq!(manager.status().await.queue_length, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sets_all_persisted() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let (_, store) = offline_store(kv.clone());
        let store = Arc::new(store);

        let mut tasks = Vec::new();
        for n in 0..8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                let session = store.start("u1", &format!("Session {}", n), None).unwrap();
                for i in 0..5 {
                    store.record_set(&session.id, squat(i)).await.unwrap();
                }
                session.id
            }));
        }
        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap());
        }

        let (_, reopened) = offline_store(kv);
        for id in ids {
            assert_eq!(reopened.get(&id).unwrap().sets.len(), 5, "session {}", id);
        }
    }
}
