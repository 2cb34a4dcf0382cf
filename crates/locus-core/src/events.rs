//! Real-time channel frames.
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`:
//!
//! | Direction | Event | Payload |
//! |---|---|---|
//! | client → server | `send-location` | `{latitude, longitude}` |
//! | server → new client | `connection-established` | `{id}` |
//! | server → all | `receive-location` | `{id, latitude, longitude}` |
//! | server → all | `user-disconnected` | `"<id>"` |

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::ids::ConnectionId;
use crate::location::Coordinate;

/// Frames sent by clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// The sender's current position.
    SendLocation(Coordinate),
}

/// A peer's position as relayed to every client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeerLocation {
    /// Connection that reported the position.
    pub id: ConnectionId,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl PeerLocation {
    /// Combine an id and a coordinate.
    pub fn new(id: ConnectionId, coordinate: Coordinate) -> Self {
        Self {
            id,
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        }
    }

    /// The position without the id.
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Frames sent by the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Sent once to a new connection, carrying its own id.
    ConnectionEstablished {
        /// The id assigned to the receiving connection.
        id: ConnectionId,
    },
    /// A connection reported a position.
    ReceiveLocation(PeerLocation),
    /// A connection went away.
    UserDisconnected(ConnectionId),
}

impl ServerEvent {
    /// Short name used in logs and metrics labels.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConnectionEstablished { .. } => "connection-established",
            Self::ReceiveLocation(_) => "receive-location",
            Self::UserDisconnected(_) => "user-disconnected",
        }
    }

    /// Serialize to a text frame.
    pub fn encode(&self) -> Result<String, CoreError> {
        serde_json::to_string(self).map_err(CoreError::Encode)
    }

    /// Parse a text frame.
    pub fn decode(text: &str) -> Result<Self, CoreError> {
        serde_json::from_str(text).map_err(CoreError::Decode)
    }
}

impl ClientEvent {
    /// Serialize to a text frame.
    pub fn encode(&self) -> Result<String, CoreError> {
        serde_json::to_string(self).map_err(CoreError::Encode)
    }

    /// Parse a text frame.
    pub fn decode(text: &str) -> Result<Self, CoreError> {
        serde_json::from_str(text).map_err(CoreError::Decode)
    }
}
