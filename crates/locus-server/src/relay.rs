//! Broadcast relay: full-mesh fan-out of location updates and removals.
//!
//! One relay task owns the [`SessionRegistry`] and the set of connected
//! clients. Session tasks talk to it through a [`RelayHandle`]; every
//! command is handled to completion (registry mutation, then fan-out) before
//! the next one is read. Fan-out never waits on a client: frames are pushed
//! into each connection's bounded queue with `try_send`, and a full queue
//! drops the frame for that client only.
//!
//! Commands from one connection travel over the same channel in order, so a
//! client's updates are relayed in the order they were received.

use std::collections::HashMap;
use std::sync::Arc;

use locus_core::{ConnectionId, Coordinate, Location, PeerLocation, ServerEvent};
use metrics::{counter, gauge};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::RelayClosed;
use crate::metrics::{LOCATION_UPDATES_TOTAL, REGISTRY_SIZE, WS_BROADCAST_DROPS_TOTAL};
use crate::registry::SessionRegistry;
use crate::websocket::connection::ClientConnection;

/// Depth of the command queue feeding the relay task.
pub const COMMAND_QUEUE_CAPACITY: usize = 1024;

/// Work items for the relay task.
pub enum RelayCommand {
    /// A client finished its WebSocket upgrade.
    Connect(Arc<ClientConnection>),
    /// A client reported its position.
    Location {
        /// Reporting connection.
        id: ConnectionId,
        /// Reported position.
        coordinate: Coordinate,
    },
    /// A client went away.
    Disconnect(ConnectionId),
    /// Ids currently in the registry.
    Snapshot(oneshot::Sender<Vec<ConnectionId>>),
}

/// Cloneable sender side of the relay.
#[derive(Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<RelayCommand>,
}

impl RelayHandle {
    /// Register a connection so it receives broadcasts.
    pub async fn connect(&self, connection: Arc<ClientConnection>) -> Result<(), RelayClosed> {
        self.send(RelayCommand::Connect(connection)).await
    }

    /// Forward a location update.
    pub async fn location(&self, id: ConnectionId, coordinate: Coordinate) -> Result<(), RelayClosed> {
        self.send(RelayCommand::Location { id, coordinate }).await
    }

    /// Forward a disconnect.
    pub async fn disconnect(&self, id: ConnectionId) -> Result<(), RelayClosed> {
        self.send(RelayCommand::Disconnect(id)).await
    }

    /// Ids with a known location.
    pub async fn snapshot(&self) -> Result<Vec<ConnectionId>, RelayClosed> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RelayCommand::Snapshot(reply_tx)).await?;
        reply_rx.await.map_err(|_| RelayClosed)
    }

    async fn send(&self, command: RelayCommand) -> Result<(), RelayClosed> {
        self.tx.send(command).await.map_err(|_| RelayClosed)
    }
}

/// The relay state machine. Owned by exactly one task.
pub struct Relay {
    registry: SessionRegistry,
    connections: HashMap<ConnectionId, Arc<ClientConnection>>,
    rx: mpsc::Receiver<RelayCommand>,
}

impl Relay {
    /// Create a relay and the handle used to feed it.
    pub fn new() -> (Self, RelayHandle) {
        Self::with_capacity(COMMAND_QUEUE_CAPACITY)
    }

    /// Create a relay with an explicit command queue depth.
    pub fn with_capacity(capacity: usize) -> (Self, RelayHandle) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let relay = Self {
            registry: SessionRegistry::new(),
            connections: HashMap::new(),
            rx,
        };
        (relay, RelayHandle { tx })
    }

    /// Spawn [`Relay::run`] onto the current runtime.
    pub fn spawn(self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Process commands until every handle is dropped or `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("broadcast relay started");
        loop {
            tokio::select! {
                command = self.rx.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                () = cancel.cancelled() => break,
            }
        }
        info!(
            connections = self.connection_count(),
            "broadcast relay stopped"
        );
    }

    /// Apply one command.
    pub fn handle(&mut self, command: RelayCommand) {
        match command {
            RelayCommand::Connect(connection) => self.on_connect(connection),
            RelayCommand::Location { id, coordinate } => self.on_location(id, coordinate),
            RelayCommand::Disconnect(id) => self.on_disconnect(&id),
            RelayCommand::Snapshot(reply) => {
                let _ = reply.send(self.registry.snapshot());
            }
        }
    }

    /// Number of connected clients, with or without a location.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    fn on_connect(&mut self, connection: Arc<ClientConnection>) {
        let id = connection.id.clone();
        let greeting = ServerEvent::ConnectionEstablished { id: id.clone() };
        match greeting.encode() {
            Ok(frame) => {
                if !connection.send(Arc::from(frame)) {
                    warn!(conn_id = %id, "failed to enqueue greeting");
                }
            }
            Err(e) => warn!(conn_id = %id, error = %e, "failed to encode greeting"),
        }
        let _ = self.connections.insert(id.clone(), connection);
        debug!(conn_id = %id, connections = self.connections.len(), "connection registered");
    }

    fn on_location(&mut self, id: ConnectionId, coordinate: Coordinate) {
        self.registry.upsert(id.clone(), Location::now(coordinate));
        counter!(LOCATION_UPDATES_TOTAL).increment(1);
        self.record_registry_size();

        let event = ServerEvent::ReceiveLocation(PeerLocation::new(id, coordinate));
        let _ = self.broadcast_all(&event);
    }

    fn on_disconnect(&mut self, id: &ConnectionId) {
        let had_location = self.registry.remove(id).is_some();
        let _ = self.connections.remove(id);
        self.record_registry_size();
        debug!(conn_id = %id, had_location, "connection removed");

        let event = ServerEvent::UserDisconnected(id.clone());
        let _ = self.broadcast_all(&event);
    }

    #[allow(clippy::cast_precision_loss)]
    fn record_registry_size(&self) {
        gauge!(REGISTRY_SIZE).set(self.registry.len() as f64);
    }

    /// Send `event` to every connected client. Returns how many accepted it.
    pub fn broadcast_all(&self, event: &ServerEvent) -> usize {
        let frame: Arc<str> = match event.encode() {
            Ok(json) => Arc::from(json),
            Err(e) => {
                warn!(event = event.name(), error = %e, "failed to serialize event");
                return 0;
            }
        };
        let recipients = self.connections.len();
        let mut delivered = 0;
        for conn in self.connections.values() {
            if conn.send(Arc::clone(&frame)) {
                delivered += 1;
            } else {
                counter!(WS_BROADCAST_DROPS_TOTAL).increment(1);
                warn!(conn_id = %conn.id, event = event.name(), "failed to send event to client");
            }
        }
        debug!(event = event.name(), recipients, delivered, "broadcast event to all");
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(id: &str) -> (Arc<ClientConnection>, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(32);
        (
            Arc::new(ClientConnection::new(ConnectionId::from_raw(id), tx)),
            rx,
        )
    }

    fn drain(rx: &mut mpsc::Receiver<Arc<str>>) -> Vec<ServerEvent> {
        let mut out = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            out.push(ServerEvent::decode(&frame).unwrap());
        }
        out
    }

    fn connected(relay: &mut Relay, id: &str) -> mpsc::Receiver<Arc<str>> {
        let (conn, mut rx) = connection(id);
        relay.handle(RelayCommand::Connect(conn));
        let greeting = drain(&mut rx);
        assert_eq!(
            greeting,
            vec![ServerEvent::ConnectionEstablished {
                id: ConnectionId::from_raw(id)
            }]
        );
        rx
    }

    fn location(id: &str, lat: f64, lon: f64) -> RelayCommand {
        RelayCommand::Location {
            id: ConnectionId::from_raw(id),
            coordinate: Coordinate::new(lat, lon),
        }
    }

    #[test]
    fn connect_does_not_touch_registry() {
        let (mut relay, _handle) = Relay::new();
        let _rx = connected(&mut relay, "a");
        assert_eq!(relay.connection_count(), 1);
        assert!(relay.registry.is_empty());
    }

    #[test]
    fn update_fans_out_to_everyone_including_sender() {
        let (mut relay, _handle) = Relay::new();
        let mut rx_a = connected(&mut relay, "A");
        let mut rx_b = connected(&mut relay, "B");
        let mut rx_c = connected(&mut relay, "C");

        relay.handle(location("A", 10.0, 20.0));

        let expected = ServerEvent::ReceiveLocation(PeerLocation {
            id: ConnectionId::from_raw("A"),
            latitude: 10.0,
            longitude: 20.0,
        });
        for rx in [&mut rx_a, &mut rx_b, &mut rx_c] {
            assert_eq!(drain(rx), vec![expected.clone()]);
        }
    }

    #[test]
    fn identical_updates_are_not_deduplicated() {
        let (mut relay, _handle) = Relay::new();
        let mut rx = connected(&mut relay, "A");
        relay.handle(location("A", 1.0, 1.0));
        relay.handle(location("A", 1.0, 1.0));
        assert_eq!(drain(&mut rx).len(), 2);
    }

    #[test]
    fn registry_holds_last_update() {
        let (mut relay, _handle) = Relay::new();
        let _rx = connected(&mut relay, "A");
        relay.handle(location("A", 1.0, 2.0));
        relay.handle(location("A", 3.0, 4.0));
        let loc = relay.registry.get(&ConnectionId::from_raw("A")).unwrap();
        assert_eq!(loc.coordinate, Coordinate::new(3.0, 4.0));
    }

    #[test]
    fn updates_relayed_in_receive_order() {
        let (mut relay, _handle) = Relay::new();
        let mut rx = connected(&mut relay, "A");
        for i in 0..10 {
            relay.handle(location("A", f64::from(i), 0.0));
        }
        let lats: Vec<f64> = drain(&mut rx)
            .into_iter()
            .map(|ev| match ev {
                ServerEvent::ReceiveLocation(p) => p.latitude,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(lats, (0..10).map(f64::from).collect::<Vec<_>>());
    }

    #[test]
    fn disconnect_removes_and_notifies_remaining() {
        let (mut relay, _handle) = Relay::new();
        let mut rx_a = connected(&mut relay, "A");
        let mut rx_b = connected(&mut relay, "B");
        relay.handle(location("B", 5.0, 5.0));
        let _ = drain(&mut rx_a);
        let _ = drain(&mut rx_b);

        relay.handle(RelayCommand::Disconnect(ConnectionId::from_raw("B")));

        assert_eq!(
            drain(&mut rx_a),
            vec![ServerEvent::UserDisconnected(ConnectionId::from_raw("B"))]
        );
        assert!(drain(&mut rx_b).is_empty());
        assert!(relay.registry.get(&ConnectionId::from_raw("B")).is_none());
        assert_eq!(relay.connection_count(), 1);
    }

    #[test]
    fn disconnect_without_location_still_notifies() {
        let (mut relay, _handle) = Relay::new();
        let mut rx_a = connected(&mut relay, "A");
        let _rx_b = connected(&mut relay, "B");
        relay.handle(RelayCommand::Disconnect(ConnectionId::from_raw("B")));
        assert_eq!(
            drain(&mut rx_a),
            vec![ServerEvent::UserDisconnected(ConnectionId::from_raw("B"))]
        );
    }

    #[test]
    fn full_queue_drops_only_for_that_client() {
        let (mut relay, _handle) = Relay::new();
        let mut rx_a = connected(&mut relay, "A");
        let (tx, _rx_slow) = mpsc::channel(1);
        let slow = Arc::new(ClientConnection::new(ConnectionId::from_raw("slow"), tx));
        // The greeting fills the single slot.
        relay.handle(RelayCommand::Connect(Arc::clone(&slow)));

        relay.handle(location("A", 0.0, 0.0));

        assert_eq!(drain(&mut rx_a).len(), 1);
        assert_eq!(slow.drop_count(), 1);
    }

    #[test]
    fn broadcast_to_empty_relay() {
        let (relay, _handle) = Relay::new();
        let delivered =
            relay.broadcast_all(&ServerEvent::UserDisconnected(ConnectionId::from_raw("x")));
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn handle_round_trip_through_task() {
        let (relay, handle) = Relay::new();
        let cancel = CancellationToken::new();
        let task = relay.spawn(cancel.clone());

        let (conn, mut rx) = connection("A");
        handle.connect(conn).await.unwrap();
        handle
            .location(ConnectionId::from_raw("A"), Coordinate::new(1.0, 2.0))
            .await
            .unwrap();

        let ids = handle.snapshot().await.unwrap();
        assert_eq!(ids, vec![ConnectionId::from_raw("A")]);

        handle.disconnect(ConnectionId::from_raw("A")).await.unwrap();
        assert!(handle.snapshot().await.unwrap().is_empty());

        // greeting + location
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_some());

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn handle_errors_after_shutdown() {
        let (relay, handle) = Relay::new();
        let cancel = CancellationToken::new();
        let task = relay.spawn(cancel.clone());
        cancel.cancel();
        task.await.unwrap();

        assert_eq!(handle.snapshot().await, Err(RelayClosed));
        assert_eq!(
            handle.disconnect(ConnectionId::new()).await,
            Err(RelayClosed)
        );
    }
}
