use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String, // e.g., "https://api.example.com/v1"
    pub device_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl RemoteConfig {
    /// Load remote configuration from {data_dir}/remote.json or fall back to
    /// `FITSYNC_REMOTE_*` environment variables.
    pub fn load_or_default(data_dir: &Path) -> Self {
        let remote_json = data_dir.join("remote.json");

        if remote_json.exists() {
            match std::fs::read_to_string(&remote_json) {
                Ok(content) => match serde_json::from_str::<RemoteConfig>(&content) {
                    Ok(config) => {
                        tracing::info!(
                            "[REMOTE] loaded remote config: base_url={}, device_id={}",
                            config.base_url,
                            config.device_id
                        );
                        return config;
                    }
                    Err(e) => {
                        tracing::error!("[REMOTE] failed to parse remote.json: {}, using env", e);
                    }
                },
                Err(e) => {
                    tracing::error!("[REMOTE] failed to read remote.json: {}, using env", e);
                }
            }
        }

        let config = Self::from_env();
        tracing::info!(
            "[REMOTE] no remote.json, using base_url={} device_id={}",
            config.base_url,
            config.device_id
        );
        config
    }

    pub fn from_env() -> Self {
        let device_id = std::env::var("FITSYNC_DEVICE_ID").unwrap_or_else(|_| {
            hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "unknown".to_string())
        });

        RemoteConfig {
            base_url: std::env::var("FITSYNC_REMOTE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            device_id,
            auth_token: std::env::var("FITSYNC_REMOTE_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            timeout_secs: std::env::var("FITSYNC_REMOTE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        for var in [
            "FITSYNC_REMOTE_URL",
            "FITSYNC_DEVICE_ID",
            "FITSYNC_REMOTE_TOKEN",
            "FITSYNC_REMOTE_TIMEOUT_SECS",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_load_or_default_no_file() {
        clear_env();
        let temp_dir = tempfile::tempdir().unwrap();
        let config = RemoteConfig::load_or_default(temp_dir.path());

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.auth_token.is_none());
        assert!(!config.device_id.is_empty());
    }

    #[test]
    #[serial]
    fn test_load_or_default_valid_file() {
        clear_env();
        let temp_dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(temp_dir.path().join("remote.json")).unwrap();
        file.write_all(
            br#"{
                "base_url": "https://api.fit.test",
                "device_id": "phone-7",
                "auth_token": "secret"
            }"#,
        )
        .unwrap();

        let config = RemoteConfig::load_or_default(temp_dir.path());

        assert_eq!(config.base_url, "https://api.fit.test");
        assert_eq!(config.device_id, "phone-7");
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    #[serial]
    fn test_invalid_file_falls_back_to_env() {
        clear_env();
        std::env::set_var("FITSYNC_REMOTE_URL", "http://backend:9000");
        std::env::set_var("FITSYNC_DEVICE_ID", "tablet-2");
        std::env::set_var("FITSYNC_REMOTE_TIMEOUT_SECS", "3");

        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("remote.json"), "invalid json").unwrap();

        let config = RemoteConfig::load_or_default(temp_dir.path());
        assert_eq!(config.base_url, "http://backend:9000");
        assert_eq!(config.device_id, "tablet-2");
        assert_eq!(config.timeout_secs, 3);

        clear_env();
    }
}
