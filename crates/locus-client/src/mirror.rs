//! Client-side view of every peer the server has reported.

use std::collections::HashMap;

use locus_core::{ConnectionId, Coordinate};

/// A peer's marker on the map.
#[derive(Clone, Debug, PartialEq)]
pub struct PeerMarker {
    /// Peer connection id.
    pub id: ConnectionId,
    /// Label number, fixed when the peer is first seen.
    pub number: usize,
    /// Last reported position.
    pub coordinate: Coordinate,
}

impl PeerMarker {
    /// Marker label, e.g. `User 2`.
    pub fn label(&self) -> String {
        format!("User {}", self.number)
    }
}

/// Insertion-ordered map of peers.
#[derive(Debug, Default)]
pub struct PeerMirror {
    order: Vec<ConnectionId>,
    markers: HashMap<ConnectionId, PeerMarker>,
}

impl PeerMirror {
    /// Create an empty mirror.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a position. Returns the marker and whether the peer is new.
    ///
    /// A new peer is numbered `len + 1`, so a peer joining after a removal
    /// can share a number with an existing one.
    pub fn upsert(&mut self, id: ConnectionId, coordinate: Coordinate) -> (PeerMarker, bool) {
        if let Some(marker) = self.markers.get_mut(&id) {
            marker.coordinate = coordinate;
            return (marker.clone(), false);
        }
        let marker = PeerMarker {
            id: id.clone(),
            number: self.order.len() + 1,
            coordinate,
        };
        self.order.push(id.clone());
        let _ = self.markers.insert(id, marker.clone());
        (marker, true)
    }

    /// Forget a peer.
    pub fn remove(&mut self, id: &ConnectionId) -> Option<PeerMarker> {
        let marker = self.markers.remove(id)?;
        self.order.retain(|known| known != id);
        Some(marker)
    }

    /// Marker for `id`.
    pub fn get(&self, id: &ConnectionId) -> Option<&PeerMarker> {
        self.markers.get(id)
    }

    /// Markers in first-seen order.
    pub fn markers(&self) -> impl Iterator<Item = &PeerMarker> {
        self.order.iter().filter_map(|id| self.markers.get(id))
    }

    /// `(id, coordinate)` pairs in first-seen order.
    pub fn peers(&self) -> Vec<(ConnectionId, Coordinate)> {
        self.markers()
            .map(|m| (m.id.clone(), m.coordinate))
            .collect()
    }

    /// Number of known peers.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no peer is known.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
