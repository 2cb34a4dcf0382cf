use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const PREFIX: &str = "conn";

/// Identity assigned to a connection when its channel is established.
///
/// Generated ids look like `conn_<uuid v7>`; ids received from the wire are
/// taken verbatim via [`ConnectionId::from_raw`].
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Allocate a fresh id.
    pub fn new() -> Self {
        Self(format!("{PREFIX}_{}", Uuid::now_v7()))
    }

    /// Wrap an existing id string.
    pub fn from_raw(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `len` characters, for display labels.
    pub fn short(&self, len: usize) -> &str {
        match self.0.char_indices().nth(len) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ConnectionId {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_owned()))
    }
}

impl AsRef<str> for ConnectionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_has_prefix() {
        let id = ConnectionId::new();
        assert!(id.as_str().starts_with("conn_"), "got: {id}");
    }

    #[test]
    fn ids_are_unique() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ConnectionId::from_raw("abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc\"");
    }

    #[test]
    fn from_raw_preserves_value() {
        let id = ConnectionId::from_raw("socket-123");
        assert_eq!(id.as_str(), "socket-123");
    }

    #[test]
    fn short_truncates_on_char_boundary() {
        let id = ConnectionId::from_raw("conn_0123456789");
        assert_eq!(id.short(8), "conn_012");
        let tiny = ConnectionId::from_raw("ab");
        assert_eq!(tiny.short(8), "ab");
    }

    #[test]
    fn parse_from_str() {
        let id: ConnectionId = "conn_x".parse().unwrap();
        assert_eq!(id, ConnectionId::from_raw("conn_x"));
    }
}
