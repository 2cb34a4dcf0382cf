//! Server error types.

use thiserror::Error;

/// Errors surfaced by server startup.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding the listen socket failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Other socket I/O failure.
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The relay task has stopped and can no longer accept commands.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("broadcast relay is no longer running")]
pub struct RelayClosed;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_error_mentions_address() {
        let err = ServerError::Bind {
            addr: "0.0.0.0:80".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("0.0.0.0:80"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn relay_closed_display() {
        assert_eq!(RelayClosed.to_string(), "broadcast relay is no longer running");
    }
}
