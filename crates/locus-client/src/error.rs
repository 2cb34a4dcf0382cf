//! Client error types.

use thiserror::Error;

/// Failure to obtain a route from the routing service.
///
/// Never fatal: callers fall back to a straight line.
#[derive(Debug, Error)]
pub enum RouteError {
    /// No API key is configured.
    #[error("no routing API key configured")]
    MissingApiKey,
    /// The request did not complete.
    #[error("routing request failed: {0}")]
    Network(#[source] reqwest::Error),
    /// The request exceeded the client timeout.
    #[error("routing request timed out")]
    Timeout,
    /// The service answered with a non-success status.
    #[error("routing service returned status {0}")]
    Status(u16),
    /// The body did not contain a usable geometry.
    #[error("malformed routing response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for RouteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Network(err)
        }
    }
}

/// Failures of the real-time connection.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server URL could not be turned into a WebSocket URL.
    #[error("invalid server url: {0}")]
    InvalidUrl(String),
    /// The WebSocket handshake failed.
    #[error("failed to connect: {0}")]
    Connect(#[source] Box<tokio_tungstenite::tungstenite::Error>),
    /// Reading or writing the socket failed.
    #[error("transport error: {0}")]
    Transport(#[source] Box<tokio_tungstenite::tungstenite::Error>),
    /// An outbound frame could not be encoded.
    #[error(transparent)]
    Encode(#[from] locus_core::CoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display() {
        assert_eq!(
            RouteError::Status(403).to_string(),
            "routing service returned status 403"
        );
    }

    #[test]
    fn invalid_url_display() {
        let err = ClientError::InvalidUrl("ftp://x".into());
        assert!(err.to_string().contains("ftp://x"));
    }
}
