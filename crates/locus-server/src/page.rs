//! Embedded map page served at `/`.

use axum::response::Html;

/// The browser client: Leaflet map, WebSocket protocol, routes and distances.
pub const INDEX_HTML: &str = include_str!("../assets/index.html");

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
