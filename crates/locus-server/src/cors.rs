//! CORS policy derived from the configured client origin.

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

/// Build the CORS layer for `client_url`.
///
/// `*` allows any origin without credentials. Anything else is treated as a
/// single origin and allowed with credentials. An origin that is not a valid
/// header value falls back to `*`.
pub fn cors_layer(client_url: &str) -> CorsLayer {
    let base = CorsLayer::new().allow_methods([Method::GET, Method::POST]);
    let origin = client_url.trim();
    if origin == "*" || origin.is_empty() {
        return base.allow_origin(AllowOrigin::any());
    }
    match HeaderValue::from_str(origin) {
        Ok(value) => base
            .allow_origin(AllowOrigin::exact(value))
            .allow_credentials(true),
        Err(e) => {
            warn!(origin, error = %e, "invalid CLIENT_URL, allowing any origin");
            base.allow_origin(AllowOrigin::any())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, header};
    use axum::routing::get;
    use tower::ServiceExt;

    async fn preflight(client_url: &str, origin: &str) -> axum::http::Response<Body> {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(cors_layer(client_url));
        let req = Request::builder()
            .method(Method::GET)
            .uri("/")
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .unwrap();
        app.oneshot(req).await.unwrap()
    }

    #[tokio::test]
    async fn wildcard_allows_any_origin() {
        let resp = preflight("*", "https://anywhere.example").await;
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
        assert!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .is_none()
        );
    }

    #[tokio::test]
    async fn explicit_origin_with_credentials() {
        let resp = preflight("https://app.example", "https://app.example").await;
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://app.example"
        );
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn other_origin_never_echoed() {
        let resp = preflight("https://app.example", "https://evil.example").await;
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://app.example"
        );
    }
}
