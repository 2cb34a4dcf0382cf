//! Wire-level error types.

use thiserror::Error;

/// Errors raised while encoding or decoding channel frames.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The frame was not valid JSON or did not match any known event.
    #[error("malformed event frame: {0}")]
    Decode(#[source] serde_json::Error),
    /// The event could not be serialized.
    #[error("failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),
}
