//! Great-circle distance between two GPS coordinates.

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters.
///
/// Pure numeric function: callers validate coordinate ranges before calling.
/// The result keeps full precision; rounding happens only at storage and
/// response boundaries (see [`round2`]).
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Round a distance to 2 decimal places for persistence and API payloads.
pub fn round2(meters: f64) -> f64 {
    (meters * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_identical_points() {
        assert_eq!(distance_meters(-33.45, -70.66, -33.45, -70.66), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            ((0.0, 0.0), (0.0, 1.0)),
            ((-33.4489, -70.6693), (-33.0472, -71.6127)),
            ((89.9, 179.9), (-89.9, -179.9)),
        ];
        for ((lat1, lon1), (lat2, lon2)) in pairs {
            let ab = distance_meters(lat1, lon1, lat2, lon2);
            let ba = distance_meters(lat2, lon2, lat1, lon1);
            assert!((ab - ba).abs() < 1e-6, "asymmetric: {ab} vs {ba}");
        }
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let d = distance_meters(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111_195.0).abs() < 50.0, "got {d}");
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round2(123.456_789), 123.46);
        assert_eq!(round2(0.004), 0.0);
    }
}
