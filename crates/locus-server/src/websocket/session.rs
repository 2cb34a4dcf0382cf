//! WebSocket session lifecycle: one connected client from upgrade through
//! disconnect.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use locus_core::{ClientEvent, ConnectionId};
use metrics::{counter, gauge, histogram};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::metrics::{
    MALFORMED_FRAMES_TOTAL, WS_CONNECTION_DURATION_SECONDS, WS_CONNECTIONS_ACTIVE,
    WS_CONNECTIONS_TOTAL, WS_DISCONNECTIONS_TOTAL,
};
use crate::relay::RelayHandle;

use super::connection::ClientConnection;

/// Per-session knobs taken from the server configuration.
#[derive(Clone, Copy, Debug)]
pub struct SessionSettings {
    /// Outbound queue depth.
    pub send_queue_capacity: usize,
    /// Interval between server Ping frames.
    pub heartbeat_interval: Duration,
    /// Close after this long without any inbound frame.
    pub heartbeat_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            send_queue_capacity: 256,
            heartbeat_interval: Duration::from_secs(25),
            heartbeat_timeout: Duration::from_secs(60),
        }
    }
}

/// Whether a heartbeat tick should close the connection.
///
/// Consumes the alive flag: a client is dead once it has been silent for a
/// whole tick and idle longer than `timeout`.
pub fn heartbeat_expired(connection: &ClientConnection, timeout: Duration) -> bool {
    !connection.check_alive() && connection.idle_for() > timeout
}

/// Why the inbound loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EndReason {
    ClientClosed,
    WriterStopped,
    Shutdown,
}

/// Run a WebSocket session for a freshly upgraded client.
///
/// 1. Allocates a [`ConnectionId`] and registers with the relay, which
///    queues the `connection-established` greeting
/// 2. Decodes `send-location` frames and forwards them to the relay
/// 3. Drains the outbound queue and sends periodic Ping frames
/// 4. Reports the disconnect to the relay exactly once
pub async fn run_ws_session(
    ws: WebSocket,
    relay: RelayHandle,
    settings: SessionSettings,
    cancel: CancellationToken,
) {
    let id = ConnectionId::new();
    run_session_with_id(ws, id, relay, settings, cancel).await;
}

#[instrument(skip_all, fields(conn_id = %id))]
async fn run_session_with_id(
    ws: WebSocket,
    id: ConnectionId,
    relay: RelayHandle,
    settings: SessionSettings,
    cancel: CancellationToken,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();

    let (send_tx, mut send_rx) = mpsc::channel::<Arc<str>>(settings.send_queue_capacity.max(1));
    let connection = Arc::new(ClientConnection::new(id.clone(), send_tx));

    if relay.connect(Arc::clone(&connection)).await.is_err() {
        warn!("relay unavailable, dropping connection");
        let _ = ws_tx.send(Message::Close(None)).await;
        return;
    }
    info!("client connected");
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).increment(1.0);

    let writer_conn = Arc::clone(&connection);
    let timeout = settings.heartbeat_timeout;
    let mut writer = tokio::spawn(async move {
        let mut ping = tokio::time::interval(settings.heartbeat_interval);
        // First tick fires immediately.
        let _ = ping.tick().await;

        loop {
            tokio::select! {
                frame = send_rx.recv() => {
                    let Some(frame) = frame else { break };
                    if ws_tx.send(Message::Text(frame.to_string().into())).await.is_err() {
                        break;
                    }
                }
                _ = ping.tick() => {
                    if heartbeat_expired(&writer_conn, timeout) {
                        warn!(idle = ?writer_conn.idle_for(), "client unresponsive, disconnecting");
                        break;
                    }
                    if ws_tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
        let _ = ws_tx.send(Message::Close(None)).await;
    });

    let reason = loop {
        let frame = tokio::select! {
            frame = ws_rx.next() => frame,
            _ = &mut writer => break EndReason::WriterStopped,
            () = cancel.cancelled() => break EndReason::Shutdown,
        };
        let msg = match frame {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                debug!(error = %e, "websocket read error");
                break EndReason::ClientClosed;
            }
            None => break EndReason::ClientClosed,
        };
        connection.mark_alive();

        let text = match msg {
            Message::Text(ref t) => t.as_str(),
            Message::Binary(ref data) => match std::str::from_utf8(data) {
                Ok(s) => s,
                Err(_) => {
                    counter!(MALFORMED_FRAMES_TOTAL).increment(1);
                    warn!(len = data.len(), "ignoring non-UTF8 binary frame");
                    continue;
                }
            },
            Message::Close(_) => {
                debug!("client sent close frame");
                break EndReason::ClientClosed;
            }
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        match ClientEvent::decode(text) {
            Ok(ClientEvent::SendLocation(coordinate)) => {
                if relay.location(id.clone(), coordinate).await.is_err() {
                    warn!("relay unavailable, closing session");
                    break EndReason::Shutdown;
                }
            }
            Err(e) => {
                counter!(MALFORMED_FRAMES_TOTAL).increment(1);
                warn!(error = %e, "ignoring malformed frame");
            }
        }
    };

    writer.abort();
    info!(?reason, dropped = connection.drop_count(), "client disconnected");
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    gauge!(WS_CONNECTIONS_ACTIVE).decrement(1.0);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(connection.age().as_secs_f64());
    let _ = relay.disconnect(id).await;
}
