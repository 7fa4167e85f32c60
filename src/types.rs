use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SyncError};

/// Queue item identifier, a UUID v4 string assigned at enqueue time.
pub type ItemId = String;
/// Offline workout session identifier.
pub type SessionId = String;

/// Drain priority band.
///
/// The derived ordering is the drain ordering: `High < Normal < Low`, so an
/// ascending sort puts high-priority items first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "normal" => Ok(Priority::Normal),
            "low" => Ok(Priority::Low),
            other => Err(SyncError::InvalidPayload(format!(
                "unknown priority '{}', expected high, normal or low",
                other
            ))),
        }
    }
}

/// Tag identifying which remote write a queued mutation maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum MutationKind {
    WorkoutSession,
    ProgressUpdate,
    UserPreference,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::WorkoutSession => "workout_session",
            MutationKind::ProgressUpdate => "progress_update",
            MutationKind::UserPreference => "user_preference",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logged set inside a workout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SetEntry {
    pub exercise_id: String,
    pub set_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
    #[serde(default)]
    pub completed: bool,
}

/// What changed in a workout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum SessionChange {
    Set(SetEntry),
    Finished { total_sets: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WorkoutSessionUpdate {
    pub session_id: SessionId,
    pub user_id: String,
    pub recorded_at: DateTime<Utc>,
    pub change: SessionChange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProgressUpdate {
    pub user_id: String,
    /// Measured quantity, e.g. `"body_weight"` or `"resting_heart_rate"`.
    pub metric: String,
    pub value: f64,
    pub unit: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserPreference {
    pub user_id: String,
    pub key: String,
    pub value: serde_json::Value,
}

/// Payload of a queued mutation, keyed by its `type` tag.
///
/// Serialized adjacently as `{"type": "...", "data": {...}}`; the remote
/// adapter receives exactly this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum MutationPayload {
    WorkoutSession(WorkoutSessionUpdate),
    ProgressUpdate(ProgressUpdate),
    UserPreference(UserPreference),
}

impl MutationPayload {
    pub fn kind(&self) -> MutationKind {
        match self {
            MutationPayload::WorkoutSession(_) => MutationKind::WorkoutSession,
            MutationPayload::ProgressUpdate(_) => MutationKind::ProgressUpdate,
            MutationPayload::UserPreference(_) => MutationKind::UserPreference,
        }
    }

    /// Parse a payload from its wire parts, as received from an HTTP caller.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidPayload`] if `data` does not match the
    /// shape registered for `kind`.
    pub fn from_parts(kind: &str, data: serde_json::Value) -> Result<Self> {
        serde_json::from_value(serde_json::json!({ "type": kind, "data": data }))
            .map_err(|e| SyncError::InvalidPayload(format!("{} payload: {}", kind, e)))
    }

    /// Check the payload before it is accepted into the queue.
    pub fn validate(&self) -> Result<()> {
        match self {
            MutationPayload::WorkoutSession(update) => {
                require_non_empty("session_id", &update.session_id)?;
                require_non_empty("user_id", &update.user_id)?;
                if let SessionChange::Set(set) = &update.change {
                    require_non_empty("exercise_id", &set.exercise_id)?;
                    if let Some(w) = set.weight_kg {
                        require_non_negative("weight_kg", w)?;
                    }
                    if set.completed
                        && set.reps.is_none()
                        && set.weight_kg.is_none()
                        && set.duration_secs.is_none()
                    {
                        return Err(SyncError::InvalidPayload(
                            "completed set needs reps, weight_kg or duration_secs".to_string(),
                        ));
                    }
                }
                Ok(())
            }
            MutationPayload::ProgressUpdate(update) => {
                require_non_empty("user_id", &update.user_id)?;
                require_non_empty("metric", &update.metric)?;
                require_non_empty("unit", &update.unit)?;
                require_non_negative("value", update.value)
            }
            MutationPayload::UserPreference(pref) => {
                require_non_empty("user_id", &pref.user_id)?;
                require_non_empty("key", &pref.key)
            }
        }
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SyncError::InvalidPayload(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(SyncError::InvalidPayload(format!(
            "{} must be a finite, non-negative number, got {}",
            field, value
        )));
    }
    Ok(())
}

/// A pending mutation waiting to be replayed against the backend.
///
/// Persisted (and sent) with camelCase keys:
/// `id`, `type`, `data`, `timestamp`, `retryCount`, `priority`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SyncQueueItem {
    pub id: ItemId,
    #[serde(flatten)]
    pub payload: MutationPayload,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub priority: Priority,
}

impl SyncQueueItem {
    pub fn new(payload: MutationPayload, priority: Priority) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            payload,
            timestamp: Utc::now(),
            retry_count: 0,
            priority,
        }
    }

    pub fn kind(&self) -> MutationKind {
        self.payload.kind()
    }

    pub fn drain_key(&self) -> (Priority, DateTime<Utc>) {
        (self.priority, self.timestamp)
    }
}

/// Sort items into drain order: priority band first, then oldest first.
///
/// The sort is stable, so items sharing a `(priority, timestamp)` key keep
/// their queue order.
pub fn sort_for_drain(items: &mut [SyncQueueItem]) {
    items.sort_by_key(|item| item.drain_key());
}

/// Snapshot returned by `getSyncStatus`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SyncStatus {
    pub queue_length: usize,
    pub is_online: bool,
    pub sync_in_progress: bool,
    pub dropped_total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_at: Option<DateTime<Utc>>,
}

/// Per-item notifications broadcast by the queue manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum SyncEvent {
    Enqueued {
        id: ItemId,
        kind: MutationKind,
        priority: Priority,
    },
    Synced {
        id: ItemId,
        kind: MutationKind,
    },
    Retrying {
        id: ItemId,
        kind: MutationKind,
        retry_count: u32,
    },
    Dropped {
        id: ItemId,
        kind: MutationKind,
        retry_count: u32,
    },
}
