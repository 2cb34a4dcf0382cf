//! Routing key discovery from the server.

use locus_core::api::ConfigResponse;
use tracing::{info, warn};

/// Fetch the routing API key from `{server}/api/config`.
///
/// Any failure, or an empty key, yields `None`.
pub async fn fetch_api_key(client: &reqwest::Client, server: &str) -> Option<String> {
    let url = format!("{}/api/config", server.trim_end_matches('/'));
    let resp = match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => resp,
        Ok(resp) => {
            warn!(status = resp.status().as_u16(), "config endpoint returned an error");
            return None;
        }
        Err(e) => {
            warn!(error = %e, "failed to fetch client config");
            return None;
        }
    };
    match resp.json::<ConfigResponse>().await {
        Ok(config) => {
            let key = config.open_route_api_key.filter(|k| !k.is_empty());
            info!(has_key = key.is_some(), "loaded client config");
            key
        }
        Err(e) => {
            warn!(error = %e, "malformed client config");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/config"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn returns_key() {
        let server =
            serve(ResponseTemplate::new(200).set_body_json(json!({"openRouteApiKey": "abc"}))).await;
        let key = fetch_api_key(&reqwest::Client::new(), &server.uri()).await;
        assert_eq!(key.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn null_or_empty_key_is_none() {
        for body in [json!({"openRouteApiKey": null}), json!({"openRouteApiKey": ""}), json!({})] {
            let server = serve(ResponseTemplate::new(200).set_body_json(body)).await;
            assert!(fetch_api_key(&reqwest::Client::new(), &server.uri()).await.is_none());
        }
    }

    #[tokio::test]
    async fn server_error_is_none() {
        let server = serve(ResponseTemplate::new(500)).await;
        assert!(fetch_api_key(&reqwest::Client::new(), &server.uri()).await.is_none());
    }

    #[tokio::test]
    async fn unreachable_is_none() {
        assert!(
            fetch_api_key(&reqwest::Client::new(), "http://127.0.0.1:1")
                .await
                .is_none()
        );
    }
}
