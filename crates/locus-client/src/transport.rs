//! WebSocket connection to a Locus server.

use futures::{SinkExt, StreamExt};
use locus_core::{ClientEvent, Coordinate, ServerEvent};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::MapClient;
use crate::error::ClientError;

/// Turn a server base URL into its WebSocket endpoint.
///
/// `http` maps to `ws` and `https` to `wss`; `/ws` is appended unless the
/// URL already ends with it.
pub fn ws_url(server: &str) -> Result<String, ClientError> {
    let server = server.trim().trim_end_matches('/');
    let endpoint = if let Some(rest) = server.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if let Some(rest) = server.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if server.starts_with("ws://") || server.starts_with("wss://") {
        server.to_owned()
    } else {
        return Err(ClientError::InvalidUrl(server.to_owned()));
    };
    if endpoint.ends_with("/ws") {
        Ok(endpoint)
    } else {
        Ok(format!("{endpoint}/ws"))
    }
}

/// Connect to `url`, optionally report `initial`, and feed every server event
/// to `client` until the socket closes or `cancel` fires.
pub async fn run_client(
    url: &str,
    client: &MapClient,
    initial: Option<Coordinate>,
    cancel: CancellationToken,
) -> Result<(), ClientError> {
    let (ws, _) = connect_async(url)
        .await
        .map_err(|e| ClientError::Connect(Box::new(e)))?;
    info!(%url, "connected");
    let (mut tx, mut rx) = ws.split();

    if let Some(coordinate) = initial {
        let frame = ClientEvent::SendLocation(coordinate).encode()?;
        tx.send(Message::text(frame))
            .await
            .map_err(|e| ClientError::Transport(Box::new(e)))?;
    }

    loop {
        let msg = tokio::select! {
            msg = rx.next() => msg,
            () = cancel.cancelled() => {
                debug!("cancelled, closing socket");
                let _ = tx.send(Message::Close(None)).await;
                return Ok(());
            }
        };
        let msg = match msg {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => return Err(ClientError::Transport(Box::new(e))),
            None => break,
        };
        let text = match &msg {
            Message::Text(text) => text.as_str(),
            Message::Binary(data) => match std::str::from_utf8(data) {
                Ok(text) => text,
                Err(_) => {
                    warn!(len = data.len(), "ignoring non-UTF8 binary frame");
                    continue;
                }
            },
            Message::Close(_) => break,
            _ => continue,
        };
        match ServerEvent::decode(text) {
            Ok(event) => client.handle_event(event),
            Err(e) => warn!(error = %e, "ignoring malformed server frame"),
        }
    }
    info!("server closed the connection");
    Ok(())
}
