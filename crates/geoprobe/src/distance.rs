//! Great-circle distance on a spherical Earth.

/// Meridional Earth radius in km, the default for [`distance_km`].
pub const EQUATORIAL_RADIUS_KM: f64 = 6367.445;

/// Haversine distance in km between two coordinates given in degrees.
///
/// Bit-identical points return exactly `0.0`. NaN and infinite inputs are not
/// checked and propagate into the result.
pub fn great_circle_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64, radius_km: f64) -> f64 {
    if lat1.to_bits() == lat2.to_bits() && lon1.to_bits() == lon2.to_bits() {
        return 0.0;
    }
    let dlon = (lon1 - lon2).to_radians();
    let dlat = (lat1 - lat2).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let angle = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    radius_km * angle
}

/// [`great_circle_distance`] with [`EQUATORIAL_RADIUS_KM`].
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    great_circle_distance(lat1, lon1, lat2, lon2, EQUATORIAL_RADIUS_KM)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POINTS: [(f64, f64); 6] = [
        (51.5007, -0.1246),
        (48.8584, 2.2945),
        (-33.8568, 151.2153),
        (40.6892, -74.0445),
        (0.0, 179.9),
        (-89.5, 0.0),
    ];

    #[test]
    fn test_coincident_points_are_zero() {
        for (lat, lon) in POINTS {
            assert_eq!(distance_km(lat, lon, lat, lon), 0.0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        for (lat1, lon1) in POINTS {
            for (lat2, lon2) in POINTS {
                let there = distance_km(lat1, lon1, lat2, lon2);
                let back = distance_km(lat2, lon2, lat1, lon1);
                assert!((there - back).abs() < 1e-9, "{there} != {back}");
            }
        }
    }

    #[test]
    fn test_known_distance_london_paris() {
        // Big Ben to the Eiffel Tower is roughly 340 km
        let d = distance_km(51.5007, -0.1246, 48.8584, 2.2945);
        assert!((d - 340.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn test_antipodal_is_half_circumference() {
        let d = distance_km(0.0, 0.0, 0.0, 180.0);
        let half = std::f64::consts::PI * EQUATORIAL_RADIUS_KM;
        assert!((d - half).abs() < 1e-6);
    }

    #[test]
    fn test_custom_radius_scales_linearly() {
        let a = great_circle_distance(10.0, 10.0, 20.0, 20.0, 1.0);
        let b = great_circle_distance(10.0, 10.0, 20.0, 20.0, 2.0);
        assert!((b - 2.0 * a).abs() < 1e-12);
    }

    #[test]
    fn test_nan_propagates() {
        assert!(distance_km(f64::NAN, 0.0, 1.0, 1.0).is_nan());
    }
}
