//! # locus-logging
//!
//! Global `tracing` subscriber setup.
//!
//! Development builds log compact human-readable lines to stderr;
//! production logs one JSON object per line so log shippers can index the
//! structured fields (`conn_id`, `recipients`, ...). `RUST_LOG` always wins
//! over the configured level.

#![deny(unsafe_code)]

use tracing_subscriber::EnvFilter;

/// Output format of the stderr log layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line human-readable output.
    Compact,
    /// Newline-delimited JSON.
    Json,
}

impl LogFormat {
    /// JSON for `production`, compact otherwise.
    pub fn for_environment(environment: &str) -> Self {
        if environment.eq_ignore_ascii_case("production") {
            Self::Json
        } else {
            Self::Compact
        }
    }
}

/// Build the filter: `RUST_LOG` if set and valid, else `level`.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber.
///
/// Call once at startup; later calls are no-ops.
pub fn init_subscriber(level: &str, format: LogFormat) {
    let filter = env_filter(level);

    let result = match format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .json()
            .with_current_span(true)
            .try_init(),
    };

    // set_global_default fails if a subscriber is already installed
    if result.is_err() {
        tracing::debug!("tracing subscriber already initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_uses_json() {
        assert_eq!(LogFormat::for_environment("production"), LogFormat::Json);
        assert_eq!(LogFormat::for_environment("PRODUCTION"), LogFormat::Json);
    }

    #[test]
    fn other_environments_use_compact() {
        assert_eq!(LogFormat::for_environment("development"), LogFormat::Compact);
        assert_eq!(LogFormat::for_environment(""), LogFormat::Compact);
    }

    #[test]
    fn bad_level_falls_back() {
        // Must not panic on a garbage directive.
        let _filter = env_filter("=[not a directive");
    }

    #[test]
    fn init_subscriber_does_not_panic() {
        init_subscriber("warn", LogFormat::Compact);
        init_subscriber("debug", LogFormat::Json);
    }
}
