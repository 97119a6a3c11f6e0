use crate::{distance::EQUATORIAL_RADIUS_KM, error::GeoprobeError};

/// Tuning for the adaptive precision search.
///
/// Use [`ProbeConfigBuilder`] for an ergonomic way to adjust the defaults.
///
/// # Examples
///
/// ```rust
/// use geoprobe::ProbeConfig;
///
/// let config = ProbeConfig::builder()
///     .max_query_budget(5)
///     .distance_column("distance_km")
///     .build()?;
/// assert_eq!(config.max_query_budget, 5);
/// # Ok::<(), geoprobe::error::GeoprobeError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProbeConfig {
    /// Geohash precision (significant bits) of the first probe
    pub starting_precision: u8,
    /// Maximum number of count queries before giving up
    pub max_query_budget: u32,
    /// Lower bound on the candidate count the search aims for
    pub min_result_cap: usize,
    /// Sphere radius used for distance scoring
    pub earth_radius_km: f64,
    /// When set, returned pages carry the computed distance under this name
    pub distance_column: Option<String>,
}

impl ProbeConfig {
    pub fn builder() -> ProbeConfigBuilder {
        ProbeConfigBuilder::default()
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            starting_precision: 50,
            max_query_budget: 20,
            min_result_cap: 20,
            earth_radius_km: EQUATORIAL_RADIUS_KM,
            distance_column: None,
        }
    }
}

/// Builder for creating probe configurations with ergonomic defaults
#[derive(Debug, Clone, Default)]
pub struct ProbeConfigBuilder {
    config: ProbeConfig,
}

impl ProbeConfigBuilder {
    /// Create a new builder with the default tuning
    pub fn new() -> Self {
        Self {
            config: ProbeConfig::default(),
        }
    }

    /// More probes and a larger candidate pool, for sparse tables
    pub fn thorough() -> Self {
        let mut builder = Self::new();
        builder.config.max_query_budget = 40;
        builder.config.min_result_cap = 50;
        builder
    }

    /// Few probes from a coarser start, for latency-sensitive callers
    pub fn quick() -> Self {
        let mut builder = Self::new();
        builder.config.starting_precision = 40;
        builder.config.max_query_budget = 6;
        builder
    }

    /// Set the starting precision, clamped to 0..=64
    pub fn starting_precision(mut self, precision: u8) -> Self {
        self.config.starting_precision = precision.min(geoprobe_data::MAX_PRECISION);
        self
    }

    /// Set the maximum number of count queries (at least one)
    pub fn max_query_budget(mut self, budget: u32) -> Self {
        self.config.max_query_budget = budget.max(1);
        self
    }

    /// Set the minimum candidate count the search aims for
    pub fn min_result_cap(mut self, cap: usize) -> Self {
        self.config.min_result_cap = cap;
        self
    }

    /// Set the sphere radius used for distances
    pub fn earth_radius_km(mut self, radius_km: f64) -> Self {
        self.config.earth_radius_km = radius_km;
        self
    }

    /// Attach the computed distance to returned rows under `name`
    pub fn distance_column(mut self, name: impl Into<String>) -> Self {
        self.config.distance_column = Some(name.into());
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Result<ProbeConfig, GeoprobeError> {
        let radius = self.config.earth_radius_km;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(GeoprobeError::ConfigError(format!(
                "Earth radius must be a positive finite number of km, got {radius}"
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_builder() {
        let config = ProbeConfigBuilder::new().build().unwrap();
        assert_eq!(config, ProbeConfig::default());
        assert_eq!(config.starting_precision, 50);
        assert_eq!(config.max_query_budget, 20);
        assert_eq!(config.min_result_cap, 20);
        assert!(config.distance_column.is_none());
    }

    #[test]
    fn test_presets() {
        let thorough = ProbeConfigBuilder::thorough().build().unwrap();
        assert_eq!(thorough.max_query_budget, 40);
        assert_eq!(thorough.min_result_cap, 50);

        let quick = ProbeConfigBuilder::quick().build().unwrap();
        assert_eq!(quick.starting_precision, 40);
        assert_eq!(quick.max_query_budget, 6);
    }

    #[test]
    fn test_override_presets() {
        let config = ProbeConfigBuilder::quick()
            .max_query_budget(9)
            .build()
            .unwrap();
        assert_eq!(config.max_query_budget, 9);
        assert_eq!(config.starting_precision, 40);
    }

    #[test]
    fn test_clamping() {
        let config = ProbeConfig::builder()
            .starting_precision(200)
            .max_query_budget(0)
            .build()
            .unwrap();
        assert_eq!(config.starting_precision, 64);
        assert_eq!(config.max_query_budget, 1);
    }

    #[test]
    fn test_radius_validation() {
        assert!(ProbeConfig::builder().earth_radius_km(0.0).build().is_err());
        assert!(
            ProbeConfig::builder()
                .earth_radius_km(f64::NAN)
                .build()
                .is_err()
        );
        let config = ProbeConfig::builder().earth_radius_km(6371.0).build().unwrap();
        assert_eq!(config.earth_radius_km, 6371.0);
    }

    #[test]
    fn test_distance_column() {
        let config = ProbeConfig::builder()
            .distance_column("distance_km")
            .build()
            .unwrap();
        assert_eq!(config.distance_column.as_deref(), Some("distance_km"));
    }
}
