//! Session registry: connection id → last known location.
//!
//! A connection is present iff it has sent at least one location and has
//! not disconnected. The table is owned by the relay task, so it carries no
//! locking of its own.

use std::collections::HashMap;

use locus_core::{ConnectionId, Location};

/// In-memory, unbounded map of connections to their last location.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    entries: HashMap<ConnectionId, Location>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or wholesale-replace the location for `id`.
    pub fn upsert(&mut self, id: ConnectionId, location: Location) {
        let _ = self.entries.insert(id, location);
    }

    /// Drop the entry for `id`, returning it if present.
    pub fn remove(&mut self, id: &ConnectionId) -> Option<Location> {
        self.entries.remove(id)
    }

    /// Ids currently tracked, in no particular order.
    pub fn snapshot(&self) -> Vec<ConnectionId> {
        self.entries.keys().cloned().collect()
    }

    /// Last location reported by `id`.
    pub fn get(&self, id: &ConnectionId) -> Option<&Location> {
        self.entries.get(id)
    }

    /// Number of tracked connections.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no connection has a location.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use locus_core::Coordinate;

    fn loc(lat: f64, lon: f64) -> Location {
        Location::now(Coordinate::new(lat, lon))
    }

    #[test]
    fn upsert_inserts() {
        let mut reg = SessionRegistry::new();
        let id = ConnectionId::new();
        reg.upsert(id.clone(), loc(1.0, 2.0));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(&id).unwrap().coordinate, Coordinate::new(1.0, 2.0));
    }

    #[test]
    fn last_update_wins() {
        let mut reg = SessionRegistry::new();
        let id = ConnectionId::new();
        let updates = [(1.0, 2.0), (3.0, 4.0), (-5.5, 170.25)];
        for (lat, lon) in updates {
            reg.upsert(id.clone(), loc(lat, lon));
        }
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(&id).unwrap().coordinate, Coordinate::new(-5.5, 170.25));
    }

    #[test]
    fn upsert_replaces_timestamp() {
        let mut reg = SessionRegistry::new();
        let id = ConnectionId::new();
        let early = chrono::DateTime::from_timestamp(0, 0).unwrap();
        reg.upsert(id.clone(), Location::at(Coordinate::new(0.0, 0.0), early));
        reg.upsert(id.clone(), loc(0.0, 0.0));
        assert!(reg.get(&id).unwrap().last_seen > early);
    }

    #[test]
    fn remove_present_and_absent() {
        let mut reg = SessionRegistry::new();
        let id = ConnectionId::new();
        reg.upsert(id.clone(), loc(1.0, 1.0));
        assert!(reg.remove(&id).is_some());
        assert!(reg.remove(&id).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn snapshot_lists_ids() {
        let mut reg = SessionRegistry::new();
        let a = ConnectionId::from_raw("a");
        let b = ConnectionId::from_raw("b");
        reg.upsert(a.clone(), loc(0.0, 0.0));
        reg.upsert(b.clone(), loc(0.0, 0.0));
        let mut ids = reg.snapshot();
        ids.sort();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn accepts_out_of_range_coordinates() {
        let mut reg = SessionRegistry::new();
        let id = ConnectionId::new();
        reg.upsert(id.clone(), loc(500.0, -720.0));
        assert_eq!(reg.get(&id).unwrap().coordinate.latitude, 500.0);
    }
}
