//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`LocusSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over the defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Validate cross-field constraints

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::LocusSettings;

/// Env var naming an explicit settings file.
pub const SETTINGS_PATH_VAR: &str = "LOCUS_SETTINGS";

/// Resolve the settings file path: `$LOCUS_SETTINGS` or `./locus.json`.
pub fn settings_path() -> PathBuf {
    std::env::var(SETTINGS_PATH_VAR)
        .ok()
        .filter(|v| !v.is_empty())
        .map_or_else(|| PathBuf::from("locus.json"), PathBuf::from)
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<LocusSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults. Invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<LocusSettings> {
    load_with_env(path, |name| std::env::var(name).ok())
}

/// Load settings from `path`, resolving environment variables through `env`.
pub fn load_with_env<F>(path: &Path, env: F) -> Result<LocusSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = serde_json::to_value(LocusSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: LocusSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings, env);
    validate(&settings)?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// Objects merge per key; arrays and primitives from `source` replace
/// `target`; nulls in `source` are skipped.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment overrides. Invalid values are ignored with a warning.
pub fn apply_env_overrides<F>(settings: &mut LocusSettings, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let string = |name: &str| env(name).filter(|v| !v.is_empty());

    if let Some(v) = string("PORT") {
        match parse_u16_range(&v, 1, 65535) {
            Some(port) => settings.server.port = port,
            None => warn!(key = "PORT", value = %v, "invalid port, ignoring"),
        }
    }
    if let Some(v) = string("HOST") {
        settings.server.host = v;
    }
    if let Some(v) = string("CLIENT_URL") {
        settings.server.client_url = v;
    }
    if let Some(v) = string("OPENROUTE_API_KEY") {
        settings.routing.api_key = Some(v);
    }
    if let Some(v) = string("NODE_ENV") {
        settings.environment = v;
    }
    if let Some(v) = string("LOCUS_HEARTBEAT_INTERVAL") {
        match parse_u64_range(&v, 1, 3600) {
            Some(secs) => settings.server.heartbeat_interval_secs = secs,
            None => warn!(key = "LOCUS_HEARTBEAT_INTERVAL", value = %v, "invalid u64 env var, ignoring"),
        }
    }
    if let Some(v) = string("LOCUS_HEARTBEAT_TIMEOUT") {
        match parse_u64_range(&v, 1, 86_400) {
            Some(secs) => settings.server.heartbeat_timeout_secs = secs,
            None => warn!(key = "LOCUS_HEARTBEAT_TIMEOUT", value = %v, "invalid u64 env var, ignoring"),
        }
    }
    if let Some(v) = string("LOCUS_MAX_CONNECTIONS") {
        match parse_usize_range(&v, 1, 1_000_000) {
            Some(n) => settings.server.max_connections = n,
            None => warn!(key = "LOCUS_MAX_CONNECTIONS", value = %v, "invalid usize env var, ignoring"),
        }
    }
    if let Some(v) = string("LOCUS_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

/// Reject combinations that would make the server misbehave.
pub fn validate(settings: &LocusSettings) -> Result<()> {
    let server = &settings.server;
    if server.heartbeat_interval_secs == 0 {
        return Err(SettingsError::InvalidValue(
            "heartbeatIntervalSecs must be positive".into(),
        ));
    }
    if server.heartbeat_timeout_secs < server.heartbeat_interval_secs {
        return Err(SettingsError::InvalidValue(format!(
            "heartbeatTimeoutSecs ({}) is shorter than heartbeatIntervalSecs ({})",
            server.heartbeat_timeout_secs, server.heartbeat_interval_secs
        )));
    }
    if server.send_queue_capacity == 0 {
        return Err(SettingsError::InvalidValue(
            "sendQueueCapacity must be positive".into(),
        ));
    }
    Ok(())
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}
