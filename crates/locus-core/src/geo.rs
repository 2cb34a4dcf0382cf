//! Great-circle geometry.

use crate::location::Coordinate;

/// Mean Earth radius used by the haversine formula, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometres.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Arithmetic midpoint of two coordinates. Used to place distance labels.
pub fn midpoint(a: Coordinate, b: Coordinate) -> Coordinate {
    Coordinate::new(
        (a.latitude + b.latitude) / 2.0,
        (a.longitude + b.longitude) / 2.0,
    )
}

/// Every unordered pair `(items[i], items[j])` with `i < j`, in index order.
pub fn unordered_pairs<T>(items: &[T]) -> impl Iterator<Item = (&T, &T)> {
    items
        .iter()
        .enumerate()
        .flat_map(move |(i, a)| items[i + 1..].iter().map(move |b| (a, b)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_is_zero() {
        let p = Coordinate::new(48.8566, 2.3522);
        assert!(haversine_km(p, p).abs() < f64::EPSILON);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinate::new(40.7128, -74.0060);
        let b = Coordinate::new(34.0522, -118.2437);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
    }

    #[test]
    fn one_degree_latitude_at_equator() {
        let d = haversine_km(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
        assert!((d - 111.0).abs() / 111.0 < 0.01, "got {d}");
    }

    #[test]
    fn known_city_pair() {
        // London to Paris is roughly 344 km.
        let london = Coordinate::new(51.5074, -0.1278);
        let paris = Coordinate::new(48.8566, 2.3522);
        let d = haversine_km(london, paris);
        assert!((d - 344.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn antipodes_are_half_circumference() {
        let d = haversine_km(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn midpoint_is_mean() {
        let m = midpoint(Coordinate::new(10.0, 20.0), Coordinate::new(20.0, 40.0));
        assert_eq!(m, Coordinate::new(15.0, 30.0));
    }

    #[test]
    fn pairs_of_three() {
        let pairs: Vec<(i32, i32)> = unordered_pairs(&[1, 2, 3]).map(|(a, b)| (*a, *b)).collect();
        assert_eq!(pairs, vec![(1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn pairs_of_fewer_than_two() {
        assert_eq!(unordered_pairs::<u8>(&[]).count(), 0);
        assert_eq!(unordered_pairs(&[1]).count(), 0);
    }

    #[test]
    fn pair_count_is_n_choose_two() {
        let items: Vec<usize> = (0..6).collect();
        assert_eq!(unordered_pairs(&items).count(), 15);
    }
}
