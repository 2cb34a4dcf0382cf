//! HTTP response bodies shared by the server and the client.

use serde::{Deserialize, Serialize};

use crate::ids::ConnectionId;

/// `GET /api/users`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersResponse {
    /// Number of connections with a known location.
    pub active_users: usize,
    /// Their ids.
    pub users: Vec<ConnectionId>,
}

impl UsersResponse {
    /// Build from a registry snapshot.
    pub fn from_ids(users: Vec<ConnectionId>) -> Self {
        Self {
            active_users: users.len(),
            users,
        }
    }
}

/// `GET /api/config`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    /// Routing service key handed to browser clients; `null` when unset.
    #[serde(default)]
    pub open_route_api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn users_response_counts_ids() {
        let resp = UsersResponse::from_ids(vec![
            ConnectionId::from_raw("a"),
            ConnectionId::from_raw("b"),
        ]);
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["activeUsers"], 2);
        assert_eq!(v["users"][1], "b");
    }

    #[test]
    fn config_response_missing_key_is_null() {
        let v = serde_json::to_value(ConfigResponse::default()).unwrap();
        assert!(v["openRouteApiKey"].is_null());
    }

    #[test]
    fn config_response_tolerates_absent_field() {
        let parsed: ConfigResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.open_route_api_key.is_none());
    }
}
