use std::path::PathBuf;
use std::time::Duration;

use crate::retry::MAX_RETRIES;
use crate::store::DEFAULT_QUEUE_KEY;

/// Runtime configuration for the sync queue, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Directory holding the queue blob, offline sessions and `remote.json`.
    pub data_dir: PathBuf,
    /// Store key the queue is persisted under.
    pub queue_key: String,
    /// Failed attempts before an item is dropped.
    pub max_retries: u32,
    /// Period of the background drain trigger (seconds).
    pub drain_interval_secs: u64,
    /// Connectivity assumed at startup, before any network event arrives.
    pub start_online: bool,
    /// Period of the remote health probe (seconds); 0 disables it.
    pub probe_interval_secs: u64,
}

impl SyncConfig {
    /// Load config from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self {
            data_dir: PathBuf::from(
                std::env::var("FITSYNC_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            ),
            queue_key: std::env::var("FITSYNC_QUEUE_KEY")
                .ok()
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| DEFAULT_QUEUE_KEY.to_string()),
            max_retries: std::env::var("FITSYNC_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(MAX_RETRIES),
            drain_interval_secs: std::env::var("FITSYNC_DRAIN_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(30),
            start_online: std::env::var("FITSYNC_START_ONLINE")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            probe_interval_secs: std::env::var("FITSYNC_PROBE_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        }
    }

    pub fn drain_interval(&self) -> Duration {
        Duration::from_secs(self.drain_interval_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            queue_key: DEFAULT_QUEUE_KEY.to_string(),
            max_retries: MAX_RETRIES,
            drain_interval_secs: 30,
            start_online: true,
            probe_interval_secs: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 6] = [
        "FITSYNC_DATA_DIR",
        "FITSYNC_QUEUE_KEY",
        "FITSYNC_MAX_RETRIES",
        "FITSYNC_DRAIN_INTERVAL_SECS",
        "FITSYNC_START_ONLINE",
        "FITSYNC_PROBE_INTERVAL_SECS",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = SyncConfig::from_env();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.queue_key, "sync_queue");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.drain_interval(), Duration::from_secs(30));
        assert!(config.start_online);
        assert_eq!(config.probe_interval_secs, 0);
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        std::env::set_var("FITSYNC_DATA_DIR", "/tmp/fitsync-test");
        std::env::set_var("FITSYNC_MAX_RETRIES", "5");
        std::env::set_var("FITSYNC_DRAIN_INTERVAL_SECS", "0");
        std::env::set_var("FITSYNC_START_ONLINE", "false");

        let config = SyncConfig::from_env();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/fitsync-test"));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.drain_interval_secs, 30, "zero interval falls back");
        assert!(!config.start_online);

        clear_env();
    }
}
