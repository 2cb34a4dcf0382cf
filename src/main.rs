//! # locus
//!
//! Live location sharing. `locus serve` runs the HTTP/WebSocket server;
//! `locus watch` is a headless map client that logs markers, routes and
//! distances.

#![deny(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use locus_client::planner::RoutePlanner;
use locus_client::transport::{run_client, ws_url};
use locus_client::{MapClient, OpenRouteService, TracingSurface};
use locus_core::Coordinate;
use locus_logging::{LogFormat, init_subscriber};
use locus_server::{LocusServer, ServerConfig};
use locus_settings::LocusSettings;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Live location sharing server and client.
#[derive(Parser, Debug)]
#[command(name = "locus", version, about = "Live location sharing")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the server.
    Serve {
        /// Host to bind (overrides settings).
        #[arg(long)]
        host: Option<String>,
        /// Port to bind, 0 for auto-assign (overrides settings).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Connect to a server and log what the map would show.
    Watch {
        /// Server base URL.
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        server: String,
        /// Latitude to report on connect.
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Longitude to report on connect.
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = locus_settings::load_settings().context("failed to load settings")?;
    init_subscriber(
        &settings.logging.level,
        LogFormat::for_environment(&settings.environment),
    );

    match cli.command {
        Command::Serve { host, port } => serve(settings, host, port).await,
        Command::Watch { server, lat, lon } => {
            let initial = lat.zip(lon).map(|(lat, lon)| Coordinate::new(lat, lon));
            watch(&settings, &server, initial).await
        }
    }
}

async fn serve(settings: LocusSettings, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = ServerConfig::from_settings(&settings);
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    let mut server = LocusServer::new(config);
    match locus_server::metrics::install_recorder() {
        Ok(handle) => server = server.with_metrics(handle),
        Err(e) => warn!(error = %e, "metrics recorder not installed"),
    }

    let addr = server.listen().await.context("failed to start server")?;
    info!(%addr, environment = %settings.environment, "server ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("shutting down");
    server.stop(Some(Duration::from_secs(10))).await;
    Ok(())
}

async fn watch(settings: &LocusSettings, server: &str, initial: Option<Coordinate>) -> Result<()> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.routing.timeout_secs))
        .build()
        .context("failed to build HTTP client")?;
    let api_key = locus_client::config::fetch_api_key(&http, server)
        .await
        .or_else(|| settings.routing.api_key.clone());

    let provider = OpenRouteService::with_base_url(
        settings.routing.base_url.clone(),
        api_key,
        Duration::from_secs(settings.routing.timeout_secs),
    )
    .context("failed to build routing client")?;
    if !provider.has_api_key() {
        warn!("no routing API key, routes will be straight lines");
    }
    let client = MapClient::new(
        RoutePlanner::new(Arc::new(provider)),
        Arc::new(TracingSurface),
        Duration::from_millis(settings.client.debounce_ms),
    );

    let url = ws_url(server)?;
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    drop(tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    }));

    run_client(&url, &client, initial, cancel)
        .await
        .with_context(|| format!("connection to {url} failed"))?;
    client.cancel_pending();
    Ok(())
}
