//! Server configuration.

use std::time::Duration;

use locus_settings::LocusSettings;
use serde::{Deserialize, Serialize};

/// Configuration for the Locus server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Allowed CORS origin, `*` for any.
    pub client_url: String,
    /// Maximum concurrent WebSocket connections.
    pub max_connections: usize,
    /// Heartbeat interval in seconds.
    pub heartbeat_interval_secs: u64,
    /// Close a connection after this many seconds without any inbound frame.
    pub heartbeat_timeout_secs: u64,
    /// Outbound queue depth per connection.
    pub send_queue_capacity: usize,
    /// Max WebSocket message size in bytes.
    pub max_message_size: usize,
    /// Directory served for unmatched GET requests.
    pub static_dir: String,
    /// Routing key exposed through `/api/config`.
    pub openroute_api_key: Option<String>,
    /// Deployment environment name, logged at startup.
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            client_url: "*".into(),
            max_connections: 1000,
            heartbeat_interval_secs: 25,
            heartbeat_timeout_secs: 60,
            send_queue_capacity: 256,
            max_message_size: 64 * 1024,
            static_dir: "public".into(),
            openroute_api_key: None,
            environment: "development".into(),
        }
    }
}

impl ServerConfig {
    /// Derive the server configuration from loaded settings.
    pub fn from_settings(settings: &LocusSettings) -> Self {
        let server = &settings.server;
        Self {
            host: server.host.clone(),
            port: server.port,
            client_url: server.client_url.clone(),
            max_connections: server.max_connections,
            heartbeat_interval_secs: server.heartbeat_interval_secs,
            heartbeat_timeout_secs: server.heartbeat_timeout_secs,
            send_queue_capacity: server.send_queue_capacity,
            max_message_size: server.max_message_size,
            static_dir: server.static_dir.clone(),
            openroute_api_key: settings.routing.api_key.clone(),
            environment: settings.environment.clone(),
        }
    }

    /// Heartbeat interval as a `Duration`.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }

    /// Heartbeat timeout as a `Duration`.
    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_timeout_secs)
    }

    /// `host:port` bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_loopback_on_random_port() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.bind_addr(), "127.0.0.1:0");
    }

    #[test]
    fn from_settings_copies_fields() {
        let mut settings = LocusSettings::default();
        settings.server.port = 3000;
        settings.server.client_url = "https://example.com".into();
        settings.routing.api_key = Some("k".into());
        settings.environment = "production".into();

        let cfg = ServerConfig::from_settings(&settings);
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.client_url, "https://example.com");
        assert_eq!(cfg.openroute_api_key.as_deref(), Some("k"));
        assert_eq!(cfg.environment, "production");
    }

    #[test]
    fn heartbeat_durations() {
        let cfg = ServerConfig {
            heartbeat_interval_secs: 0,
            heartbeat_timeout_secs: 45,
            ..ServerConfig::default()
        };
        assert_eq!(cfg.heartbeat_interval(), Duration::from_secs(1));
        assert_eq!(cfg.heartbeat_timeout(), Duration::from_secs(45));
    }
}
