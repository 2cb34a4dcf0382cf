//! `LocusServer`: Axum HTTP + WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use locus_core::api::{ConfigResponse, UsersResponse};
use metrics::counter;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::cors::cors_layer;
use crate::error::ServerError;
use crate::health::{self, HealthResponse};
use crate::metrics::WS_CONNECTIONS_REJECTED_TOTAL;
use crate::page;
use crate::relay::{Relay, RelayHandle};
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::session::{SessionSettings, run_ws_session};

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Sender side of the broadcast relay.
    pub relay: RelayHandle,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
    /// Open WebSocket connections.
    pub active: Arc<AtomicUsize>,
    /// Prometheus handle for `/metrics`, if a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

/// The Locus server.
pub struct LocusServer {
    state: AppState,
}

impl LocusServer {
    /// Create a server and spawn its relay task. Must run inside a Tokio
    /// runtime.
    pub fn new(config: ServerConfig) -> Self {
        let shutdown = Arc::new(ShutdownCoordinator::new());
        let (relay, handle) = Relay::new();
        shutdown.track(relay.spawn(shutdown.token()));
        Self {
            state: AppState {
                relay: handle,
                config: Arc::new(config),
                shutdown,
                start_time: Instant::now(),
                active: Arc::new(AtomicUsize::new(0)),
                metrics: None,
            },
        }
    }

    /// Serve `/metrics` from `handle`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.state.metrics = Some(handle);
        self
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let config = &self.state.config;
        Router::new()
            .route("/", get(page::index))
            .route("/health", get(health_handler))
            .route("/ws", get(ws_handler))
            .route("/api/users", get(users_handler))
            .route("/api/config", get(config_handler))
            .route("/metrics", get(metrics_handler))
            .fallback_service(ServeDir::new(&config.static_dir))
            .layer(cors_layer(&config.client_url))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind the configured address and serve until shutdown.
    ///
    /// Returns the bound address (useful with port `0`). The serve task is
    /// tracked by the shutdown coordinator.
    pub async fn listen(&self) -> Result<SocketAddr, ServerError> {
        let addr = self.state.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local = listener.local_addr()?;
        info!(
            addr = %local,
            environment = %self.state.config.environment,
            "locus server listening"
        );

        let app = self.router();
        let token = self.state.shutdown.token();
        self.state.shutdown.track(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(token.cancelled_owned())
                .await
            {
                error!(error = %e, "server error");
            }
        }));
        Ok(local)
    }

    /// Cancel every task and wait for the serve task and the relay to finish.
    pub async fn stop(&self, timeout: Option<Duration>) {
        self.state.shutdown.graceful_shutdown(timeout).await;
    }

    /// The relay handle.
    pub fn relay(&self) -> &RelayHandle {
        &self.state.relay
    }

    /// The shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.state.shutdown
    }
}

/// Decrements the active connection count when the session ends.
struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        let _ = self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connections = state.active.load(Ordering::Relaxed);
    Json(health::health_check(state.start_time, connections))
}

/// GET /ws
async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let max = state.config.max_connections;
    let previous = state.active.fetch_add(1, Ordering::SeqCst);
    let guard = ActiveGuard(Arc::clone(&state.active));
    if previous >= max {
        counter!(WS_CONNECTIONS_REJECTED_TOTAL).increment(1);
        warn!(max, "connection limit reached, rejecting upgrade");
        return (StatusCode::SERVICE_UNAVAILABLE, "connection limit reached").into_response();
    }

    let settings = SessionSettings {
        send_queue_capacity: state.config.send_queue_capacity,
        heartbeat_interval: state.config.heartbeat_interval(),
        heartbeat_timeout: state.config.heartbeat_timeout(),
    };
    let relay = state.relay.clone();
    let cancel = state.shutdown.token();
    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| async move {
            let _guard = guard;
            run_ws_session(socket, relay, settings, cancel).await;
        })
}

/// GET /api/users
async fn users_handler(State(state): State<AppState>) -> Response {
    match state.relay.snapshot().await {
        Ok(ids) => Json(UsersResponse::from_ids(ids)).into_response(),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response(),
    }
}

/// GET /api/config
async fn config_handler(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        open_route_api_key: state.config.openroute_api_key.clone(),
    })
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}
