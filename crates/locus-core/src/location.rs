//! Coordinates and timestamped locations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in degrees. Ranges are not validated.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// `[longitude, latitude]`, the order routing services use.
    pub const fn lon_lat(self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    /// `[latitude, longitude]`, the order map displays use.
    pub const fn lat_lon(self) -> [f64; 2] {
        [self.latitude, self.longitude]
    }
}

/// Last known position of a connection.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Reported position.
    #[serde(flatten)]
    pub coordinate: Coordinate,
    /// When the server received the update.
    pub last_seen: DateTime<Utc>,
}

impl Location {
    /// A location stamped with the current time.
    pub fn now(coordinate: Coordinate) -> Self {
        Self::at(coordinate, Utc::now())
    }

    /// A location stamped with an explicit time.
    pub fn at(coordinate: Coordinate, last_seen: DateTime<Utc>) -> Self {
        Self {
            coordinate,
            last_seen,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_orders() {
        let c = Coordinate::new(10.0, 20.0);
        assert_eq!(c.lon_lat(), [20.0, 10.0]);
        assert_eq!(c.lat_lon(), [10.0, 20.0]);
    }

    #[test]
    fn out_of_range_values_accepted() {
        let c: Coordinate =
            serde_json::from_str(r#"{"latitude":123.5,"longitude":-999.0}"#).unwrap();
        assert!((c.latitude - 123.5).abs() < f64::EPSILON);
        assert!((c.longitude + 999.0).abs() < f64::EPSILON);
    }

    #[test]
    fn location_serializes_flat() {
        let loc = Location::now(Coordinate::new(1.0, 2.0));
        let v = serde_json::to_value(&loc).unwrap();
        assert_eq!(v["latitude"], 1.0);
        assert_eq!(v["longitude"], 2.0);
        assert!(v["lastSeen"].is_string());
    }
}
