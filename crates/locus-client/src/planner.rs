//! Route legs between every pair of peers.

use std::sync::Arc;

use locus_core::geo::{haversine_km, midpoint, unordered_pairs};
use locus_core::{ConnectionId, Coordinate};
use tracing::debug;

use crate::route::{RouteProvider, route_or_straight_line};

/// One drawn route between two peers.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteLeg {
    /// First peer.
    pub from: ConnectionId,
    /// Second peer.
    pub to: ConnectionId,
    /// Route vertices in display order `[lat, lon]`.
    pub path: Vec<[f64; 2]>,
    /// Great-circle distance between the peers.
    pub distance_km: f64,
    /// Where the distance label goes.
    pub label_position: Coordinate,
}

impl RouteLeg {
    /// Distance label, e.g. `12.3 km`.
    pub fn label(&self) -> String {
        format!("{:.1} km", self.distance_km)
    }
}

/// Computes route legs with a [`RouteProvider`].
#[derive(Clone)]
pub struct RoutePlanner {
    provider: Arc<dyn RouteProvider>,
}

impl RoutePlanner {
    /// Create a planner.
    pub fn new(provider: Arc<dyn RouteProvider>) -> Self {
        Self { provider }
    }

    /// Route and measure one pair.
    pub async fn leg(
        &self,
        (from, a): (&ConnectionId, Coordinate),
        (to, b): (&ConnectionId, Coordinate),
    ) -> RouteLeg {
        let geometry = route_or_straight_line(self.provider.as_ref(), a, b).await;
        RouteLeg {
            from: from.clone(),
            to: to.clone(),
            path: geometry.to_display(),
            distance_km: haversine_km(a, b),
            label_position: midpoint(a, b),
        }
    }

    /// One leg per unordered pair, routed one request at a time.
    pub async fn plan(&self, peers: &[(ConnectionId, Coordinate)]) -> Vec<RouteLeg> {
        let mut legs = Vec::new();
        for ((from, a), (to, b)) in unordered_pairs(peers) {
            legs.push(self.leg((from, *a), (to, *b)).await);
        }
        debug!(peers = peers.len(), legs = legs.len(), "planned routes");
        legs
    }
}
