use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::KeyValueStore;
use crate::error::{Result, SyncError};
use crate::types::SyncQueueItem;

/// Key the queue blob lives under unless configured otherwise.
pub const DEFAULT_QUEUE_KEY: &str = "sync_queue";

/// Current layout of the persisted queue envelope.
///
/// - `0`: bare JSON array of items, timestamps as epoch milliseconds.
/// - `1`: `{"version": 1, "items": [...]}`, timestamps as RFC 3339 strings.
pub const QUEUE_SCHEMA_VERSION: u64 = 1;

#[derive(Serialize)]
struct Envelope<'a> {
    version: u64,
    items: &'a [SyncQueueItem],
}

/// Durable mirror of the pending mutation queue.
///
/// Both directions fail soft: an unreadable blob loads as an empty queue and
/// a failed write is logged and dropped. Neither ever reaches the caller.
#[derive(Clone)]
pub struct QueueStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl QueueStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn load(&self) -> Vec<SyncQueueItem> {
        let raw = match self.kv.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("[STORE] failed to read '{}': {}, starting empty", self.key, e);
                return Vec::new();
            }
        };

        match decode_queue(&raw) {
            Ok(items) => {
                tracing::debug!("[STORE] loaded {} queued items", items.len());
                items
            }
            Err(e) => {
                tracing::warn!(
                    "[STORE] unreadable queue blob '{}': {}, starting empty",
                    self.key,
                    e
                );
                Vec::new()
            }
        }
    }

    pub fn save(&self, items: &[SyncQueueItem]) {
        let envelope = Envelope {
            version: QUEUE_SCHEMA_VERSION,
            items,
        };
        let blob = match serde_json::to_string(&envelope) {
            Ok(blob) => blob,
            Err(e) => {
                tracing::error!("[STORE] failed to serialize queue: {}", e);
                return;
            }
        };
        if let Err(e) = self.kv.put(&self.key, &blob) {
            tracing::error!(
                "[STORE] failed to persist {} queued items: {}",
                items.len(),
                e
            );
        }
    }
}

/// Parse any supported envelope version into current-layout items.
///
/// Items that do not parse are skipped individually so one bad record does
/// not cost the rest of the queue.
pub(crate) fn decode_queue(raw: &str) -> Result<Vec<SyncQueueItem>> {
    let (version, raw_items) = match serde_json::from_str::<Value>(raw)? {
        Value::Array(items) => (0, items),
        Value::Object(mut obj) => {
            let version = obj
                .get("version")
                .and_then(Value::as_u64)
                .ok_or_else(|| SyncError::Json("queue envelope has no version".to_string()))?;
            match obj.remove("items") {
                Some(Value::Array(items)) => (version, items),
                _ => {
                    return Err(SyncError::Json(
                        "queue envelope has no items array".to_string(),
                    ))
                }
            }
        }
        other => {
            return Err(SyncError::Json(format!(
                "expected queue array or envelope, got {}",
                json_type_name(&other)
            )))
        }
    };

    if version > QUEUE_SCHEMA_VERSION {
        return Err(SyncError::Json(format!(
            "queue schema version {} is newer than supported {}",
            version, QUEUE_SCHEMA_VERSION
        )));
    }

    let mut items = Vec::with_capacity(raw_items.len());
    for raw_item in raw_items {
        let raw_item = if version == 0 {
            migrate_v0_item(raw_item)
        } else {
            raw_item
        };
        match serde_json::from_value::<SyncQueueItem>(raw_item) {
            Ok(item) => items.push(item),
            Err(e) => tracing::warn!("[STORE] skipping unreadable queue item: {}", e),
        }
    }

    if version < QUEUE_SCHEMA_VERSION {
        tracing::info!(
            "[STORE] migrated {} items from schema v{} to v{}",
            items.len(),
            version,
            QUEUE_SCHEMA_VERSION
        );
    }
    Ok(items)
}

/// v0 stored `timestamp` as epoch milliseconds.
fn migrate_v0_item(mut item: Value) -> Value {
    if let Some(obj) = item.as_object_mut() {
        let millis = obj.get("timestamp").and_then(Value::as_i64);
        if let Some(ts) = millis.and_then(chrono::DateTime::from_timestamp_millis) {
            obj.insert("timestamp".to_string(), Value::String(ts.to_rfc3339()));
        }
    }
    item
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
