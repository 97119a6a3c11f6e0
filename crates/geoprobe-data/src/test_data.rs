use std::f64::consts::PI;

use polars::prelude::*;
use tracing::info;

use crate::{GeoColumns, Result, table::with_geohash_column};

const KM_PER_DEGREE: f64 = 111.32;

/// Configuration for synthetic point tables
#[derive(Debug, Clone)]
pub struct SyntheticPointsConfig {
    /// Cluster centers as (latitude, longitude)
    pub centers: Vec<(f64, f64)>,
    /// Number of points laid around each center
    pub points_per_center: usize,
    /// Radius in km of the disc each cluster fills
    pub spread_km: f64,
    /// Every n-th point gets status `inactive`, the rest `active`
    pub inactive_every: usize,
}

impl Default for SyntheticPointsConfig {
    fn default() -> Self {
        Self::sample()
    }
}

impl SyntheticPointsConfig {
    /// A single small cluster for unit tests
    pub fn minimal() -> Self {
        Self {
            centers: vec![(51.5074, -0.1278)],
            points_per_center: 5,
            spread_km: 1.0,
            inactive_every: 3,
        }
    }

    /// Several dense city clusters for integration tests
    pub fn sample() -> Self {
        Self {
            centers: vec![
                (51.5074, -0.1278),
                (48.8566, 2.3522),
                (40.7128, -74.0060),
                (35.6762, 139.6503),
                (-33.8688, 151.2093),
            ],
            points_per_center: 200,
            spread_km: 5.0,
            inactive_every: 4,
        }
    }
}

/// Create a deterministic point table keyed by geohash.
///
/// Points sit on a golden-angle spiral around each center, so the table is
/// dense near the centers and identical on every run. Columns: `id`, `name`,
/// `status`, `latitude`, `longitude`, `geohash`.
pub fn create_test_points(config: &SyntheticPointsConfig) -> Result<DataFrame> {
    info!("Creating synthetic points with config: {:?}", config);

    let golden_angle = PI * (3.0 - 5f64.sqrt());
    let capacity = config.centers.len() * config.points_per_center;
    let mut ids = Vec::with_capacity(capacity);
    let mut names = Vec::with_capacity(capacity);
    let mut statuses = Vec::with_capacity(capacity);
    let mut latitudes = Vec::with_capacity(capacity);
    let mut longitudes = Vec::with_capacity(capacity);

    for (cluster, &(center_lat, center_lon)) in config.centers.iter().enumerate() {
        for i in 0..config.points_per_center {
            let radius_km =
                config.spread_km * (i as f64 / config.points_per_center.max(1) as f64).sqrt();
            let theta = i as f64 * golden_angle;
            let dlat = radius_km * theta.sin() / KM_PER_DEGREE;
            let dlon = radius_km * theta.cos() / (KM_PER_DEGREE * center_lat.to_radians().cos());

            let id = ids.len() as u32 + 1;
            ids.push(id);
            names.push(format!("point-{cluster}-{i}"));
            statuses.push(if config.inactive_every > 0 && i % config.inactive_every == 0 {
                "inactive"
            } else {
                "active"
            });
            latitudes.push(center_lat + dlat);
            longitudes.push(center_lon + dlon);
        }
    }

    let df = df!(
        "id" => ids,
        "name" => names,
        "status" => statuses,
        "latitude" => latitudes,
        "longitude" => longitudes,
    )?;
    with_geohash_column(df, &GeoColumns::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_utils::*;

    #[test]
    fn test_minimal_points() {
        let df = create_test_points(&SyntheticPointsConfig::minimal()).unwrap();
        assert_eq!(df.height(), 5);
        assert_has_columns(&df, &["id", "name", "status", "latitude", "longitude", "geohash"]);
        assert_column_type(&df, "geohash", &DataType::UInt64);
        assert_no_nulls_in_column(&df, "geohash");
    }

    #[test]
    fn test_points_are_deterministic() {
        let config = SyntheticPointsConfig::sample();
        let a = create_test_points(&config).unwrap();
        let b = create_test_points(&config).unwrap();
        assert!(a.equals(&b));
    }

    #[test]
    fn test_points_stay_within_spread() {
        let config = SyntheticPointsConfig::minimal();
        let (center_lat, center_lon) = config.centers[0];
        let df = create_test_points(&config).unwrap();
        let lats = df.column("latitude").unwrap().f64().unwrap();
        let lons = df.column("longitude").unwrap().f64().unwrap();
        for (lat, lon) in lats.into_iter().zip(lons) {
            let (lat, lon) = (lat.unwrap(), lon.unwrap());
            assert!((lat - center_lat).abs() < 0.01);
            assert!((lon - center_lon).abs() < 0.02);
        }
    }

    #[test]
    fn test_inactive_ratio() {
        let df = create_test_points(&SyntheticPointsConfig::minimal()).unwrap();
        let inactive = df
            .column("status")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .filter(|s| *s == Some("inactive"))
            .count();
        // indices 0 and 3 of 5
        assert_eq!(inactive, 2);
    }
}
