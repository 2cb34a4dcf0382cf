//! `MapClient`: applies server events to the peer mirror and the map.

use std::sync::Arc;
use std::time::Duration;

use locus_core::{ConnectionId, Coordinate, ServerEvent};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::debounce::Debouncer;
use crate::mirror::{PeerMarker, PeerMirror};
use crate::planner::RoutePlanner;
use crate::surface::{Bounds, FIT_PADDING, INITIAL_ZOOM, MapSurface};

struct Inner {
    mirror: Mutex<PeerMirror>,
    own_id: Mutex<Option<ConnectionId>>,
    planner: RoutePlanner,
    surface: Arc<dyn MapSurface>,
    debouncer: Debouncer,
    redraw: tokio::sync::Mutex<()>,
}

/// Event-driven map state. Cheap to clone.
#[derive(Clone)]
pub struct MapClient {
    inner: Arc<Inner>,
}

impl MapClient {
    /// Create a client drawing onto `surface`, recomputing routes at most
    /// once per `debounce` window.
    pub fn new(planner: RoutePlanner, surface: Arc<dyn MapSurface>, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                mirror: Mutex::new(PeerMirror::new()),
                own_id: Mutex::new(None),
                planner,
                surface,
                debouncer: Debouncer::new(debounce),
                redraw: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Id the server assigned to this client, once known.
    pub fn own_id(&self) -> Option<ConnectionId> {
        self.inner.own_id.lock().clone()
    }

    /// Known peers in first-seen order.
    pub fn peers(&self) -> Vec<(ConnectionId, Coordinate)> {
        self.inner.mirror.lock().peers()
    }

    /// Marker for `id`.
    pub fn marker(&self, id: &ConnectionId) -> Option<PeerMarker> {
        self.inner.mirror.lock().get(id).cloned()
    }

    /// Apply one server event.
    ///
    /// Never waits on routing: recomputes run on their own tasks, so the
    /// caller can keep reading the socket while a slow provider answers.
    pub fn handle_event(&self, event: ServerEvent) {
        match event {
            ServerEvent::ConnectionEstablished { id } => {
                info!(own_id = %id, "connected to server");
                *self.inner.own_id.lock() = Some(id);
            }
            ServerEvent::ReceiveLocation(peer) => {
                let coordinate = peer.coordinate();
                let (marker, is_new, alone) = {
                    let mut mirror = self.inner.mirror.lock();
                    let (marker, is_new) = mirror.upsert(peer.id, coordinate);
                    (marker, is_new, mirror.len() == 1)
                };
                if is_new {
                    debug!(peer = %marker.id, number = marker.number, "new peer");
                }
                self.inner.surface.upsert_marker(&marker);

                // A lone peer is followed; with company the fit takes over.
                if alone {
                    self.inner.surface.center_on(coordinate, INITIAL_ZOOM);
                }
                self.schedule_recompute();
            }
            ServerEvent::UserDisconnected(id) => {
                let removed = self.inner.mirror.lock().remove(&id);
                if removed.is_some() {
                    self.inner.surface.remove_marker(&id);
                    self.spawn_recompute();
                } else {
                    debug!(peer = %id, "disconnect for unknown peer");
                }
            }
        }
    }

    /// Recompute routes now, on a separate task.
    pub fn spawn_recompute(&self) {
        let this = self.clone();
        drop(tokio::spawn(async move { this.recompute().await }));
    }

    /// Recompute routes after the debounce window.
    pub fn schedule_recompute(&self) {
        let this = self.clone();
        self.inner
            .debouncer
            .schedule(async move { this.recompute().await });
    }

    /// Clear routes, plan every pair, draw them and fit the view.
    pub async fn recompute(&self) {
        let _redraw = self.inner.redraw.lock().await;
        self.inner.surface.replace_routes(&[]);

        let peers = self.peers();
        let legs = self.inner.planner.plan(&peers).await;
        self.inner.surface.replace_routes(&legs);

        if peers.len() >= 2 {
            let points = peers.iter().map(|(_, c)| *c).chain(
                legs.iter()
                    .flat_map(|leg| leg.path.iter().map(|[lat, lon]| Coordinate::new(*lat, *lon))),
            );
            if let Some(bounds) = Bounds::from_points(points) {
                self.inner.surface.fit_to(bounds.pad(FIT_PADDING));
            }
        }
    }

    /// Drop any pending debounced recompute.
    pub fn cancel_pending(&self) {
        self.inner.debouncer.cancel();
    }
}
