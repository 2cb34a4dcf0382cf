//! Settings types and their compiled defaults.

use serde::{Deserialize, Serialize};

/// Root settings object.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocusSettings {
    /// Deployment environment (`development`, `production`, ...).
    pub environment: String,
    /// Server network and connection settings.
    pub server: ServerSettings,
    /// External routing service.
    pub routing: RoutingSettings,
    /// Map client behaviour.
    pub client: ClientSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

impl Default for LocusSettings {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerSettings::default(),
            routing: RoutingSettings::default(),
            client: ClientSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl LocusSettings {
    /// Whether this is a production deployment.
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

/// Server network and connection settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Allowed CORS origin; `*` allows any origin.
    pub client_url: String,
    /// Maximum concurrent WebSocket connections.
    pub max_connections: usize,
    /// Seconds between server Ping frames.
    pub heartbeat_interval_secs: u64,
    /// Seconds of silence after which a connection is closed.
    pub heartbeat_timeout_secs: u64,
    /// Outbound frames buffered per connection before drops begin.
    pub send_queue_capacity: usize,
    /// Largest accepted inbound frame in bytes.
    pub max_message_size: usize,
    /// Directory served as a static-file fallback.
    pub static_dir: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            client_url: "*".to_string(),
            max_connections: 1000,
            heartbeat_interval_secs: 25,
            heartbeat_timeout_secs: 60,
            send_queue_capacity: 256,
            max_message_size: 64 * 1024,
            static_dir: "public".to_string(),
        }
    }
}

/// External routing service.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoutingSettings {
    /// API key; absent means straight-line routes only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Service base URL.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openrouteservice.org".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Map client behaviour.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    /// Quiet period before routes are recomputed after an update.
    pub debounce_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self { debounce_ms: 1000 }
    }
}

/// Log output.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
