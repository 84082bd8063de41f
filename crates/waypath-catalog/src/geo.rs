//! Great-circle distance between coordinates.

use waypath_types::Coordinate;

/// Mean Earth radius in km.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points, in km.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0)
        .sin()
        .mul_add((dlat / 2.0).sin(), lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2));
    let c = 2.0 * h.sqrt().clamp(0.0, 1.0).asin();
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_is_zero() {
        let p = Coordinate::new(31.2304, 121.4737);
        assert!(haversine_km(p, p).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(1.0, 0.0);
        // 2 * pi * 6371 / 360
        assert!((haversine_km(a, b) - 111.195).abs() < 0.01);
    }

    #[test]
    fn symmetric() {
        let a = Coordinate::new(31.2304, 121.4737);
        let b = Coordinate::new(31.2397, 121.4998);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
    }
}
