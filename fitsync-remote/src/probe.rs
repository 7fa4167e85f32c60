use super::client::RemoteClient;
use fitsync::NetworkMonitor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Feeds [`NetworkMonitor`] from periodic `GET /health` calls against the
/// backend, for hosts with no platform connectivity signal of their own.
pub struct ConnectivityProbe {
    client: Arc<RemoteClient>,
    network: Arc<NetworkMonitor>,
    interval: Duration,
    shutdown: Notify,
}

impl ConnectivityProbe {
    pub fn new(
        client: Arc<RemoteClient>,
        network: Arc<NetworkMonitor>,
        interval: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            client,
            network,
            interval,
            shutdown: Notify::new(),
        })
    }

    /// Probe once and record the result. Returns the observed state.
    pub async fn check_once(&self) -> bool {
        let online = self.client.check_health().await;
        self.network.set_online(online);
        online
    }

    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(
            "[NET] probing {}/health every {}s",
            self.client.base_url(),
            self.interval.as_secs_f64()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_once().await;
                }
                _ = self.shutdown.notified() => {
                    tracing::info!("[NET] connectivity probe stopped");
                    break;
                }
            }
        }
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemoteConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: String) -> Arc<RemoteClient> {
        Arc::new(RemoteClient::new(&RemoteConfig {
            base_url,
            device_id: "probe-test".to_string(),
            auth_token: None,
            timeout_secs: 2,
        }))
    }

    #[tokio::test]
    async fn test_probe_flips_network_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let network = NetworkMonitor::new(false);
        let probe = ConnectivityProbe::new(
            client(server.uri()),
            network.clone(),
            Duration::from_secs(60),
        );
        assert!(probe.check_once().await);
        assert!(network.is_online());

        server.reset().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        assert!(!probe.check_once().await);
        assert!(!network.is_online());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let network = NetworkMonitor::new(true);
        let probe = ConnectivityProbe::new(
            client("http://127.0.0.1:1".to_string()),
            network.clone(),
            Duration::from_millis(20),
        );

        let handle = tokio::spawn(probe.clone().run());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!network.is_online());

        probe.shutdown();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("probe exits on shutdown")
            .unwrap();
    }
}
