//! Rendering seam between the map client and whatever draws the map.

use locus_core::{ConnectionId, Coordinate};
use tracing::info;

use crate::mirror::PeerMarker;
use crate::planner::RouteLeg;

/// Zoom level used when centring on the first known location.
pub const INITIAL_ZOOM: u8 = 16;

/// Padding ratio applied when fitting the view.
pub const FIT_PADDING: f64 = 0.1;

/// Axis-aligned lat/lon box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Minimum latitude and longitude.
    pub south_west: Coordinate,
    /// Maximum latitude and longitude.
    pub north_east: Coordinate,
}

impl Bounds {
    /// Smallest box containing every point, or `None` for no points.
    pub fn from_points(points: impl IntoIterator<Item = Coordinate>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self {
            south_west: first,
            north_east: first,
        };
        for p in iter {
            bounds.south_west.latitude = bounds.south_west.latitude.min(p.latitude);
            bounds.south_west.longitude = bounds.south_west.longitude.min(p.longitude);
            bounds.north_east.latitude = bounds.north_east.latitude.max(p.latitude);
            bounds.north_east.longitude = bounds.north_east.longitude.max(p.longitude);
        }
        Some(bounds)
    }

    /// Grow each side by `ratio` of the box's extent.
    #[must_use]
    pub fn pad(self, ratio: f64) -> Self {
        let lat_buf = (self.north_east.latitude - self.south_west.latitude).abs() * ratio;
        let lon_buf = (self.north_east.longitude - self.south_west.longitude).abs() * ratio;
        Self {
            south_west: Coordinate::new(
                self.south_west.latitude - lat_buf,
                self.south_west.longitude - lon_buf,
            ),
            north_east: Coordinate::new(
                self.north_east.latitude + lat_buf,
                self.north_east.longitude + lon_buf,
            ),
        }
    }

    /// Whether `p` lies inside the box.
    pub fn contains(&self, p: Coordinate) -> bool {
        (self.south_west.latitude..=self.north_east.latitude).contains(&p.latitude)
            && (self.south_west.longitude..=self.north_east.longitude).contains(&p.longitude)
    }
}

/// Something that can draw markers and routes.
pub trait MapSurface: Send + Sync {
    /// Add or move a peer marker.
    fn upsert_marker(&self, marker: &PeerMarker);
    /// Remove a peer marker.
    fn remove_marker(&self, id: &ConnectionId);
    /// Replace every drawn route and distance label with `legs`.
    fn replace_routes(&self, legs: &[RouteLeg]);
    /// Centre the view.
    fn center_on(&self, at: Coordinate, zoom: u8);
    /// Fit the view to `bounds`.
    fn fit_to(&self, bounds: Bounds);
}

/// Surface that logs what would be drawn.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSurface;

impl MapSurface for TracingSurface {
    fn upsert_marker(&self, marker: &PeerMarker) {
        info!(
            peer = %marker.id,
            label = %marker.label(),
            lat = marker.coordinate.latitude,
            lon = marker.coordinate.longitude,
            "marker"
        );
    }

    fn remove_marker(&self, id: &ConnectionId) {
        info!(peer = %id, "marker removed");
    }

    fn replace_routes(&self, legs: &[RouteLeg]) {
        for leg in legs {
            info!(
                from = %leg.from.short(13),
                to = %leg.to.short(13),
                distance = %leg.label(),
                vertices = leg.path.len(),
                "route"
            );
        }
    }

    fn center_on(&self, at: Coordinate, zoom: u8) {
        info!(lat = at.latitude, lon = at.longitude, zoom, "centre view");
    }

    fn fit_to(&self, bounds: Bounds) {
        info!(
            south = bounds.south_west.latitude,
            west = bounds.south_west.longitude,
            north = bounds.north_east.latitude,
            east = bounds.north_east.longitude,
            "fit view"
        );
    }
}
