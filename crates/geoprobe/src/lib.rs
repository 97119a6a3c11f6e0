//! geoprobe - Adaptive Geohash Nearby Search
//!
//! geoprobe finds the rows nearest to a point in a table that has no spatial
//! index, only a precomputed 64-bit geohash column. It probes row counts
//! inside a ring of geohash ranges around the center, widening the ring
//! until enough candidates fall inside it, then fetches those candidates and
//! orders them by great-circle distance.
//!
//! # Quick Start
//!
//! ```rust
//! use geoprobe::{
//!     LazyFrameBackend, NearbyResults, SearchRequest, adaptive_nearby_search,
//!     data_processing::{SyntheticPointsConfig, create_test_points},
//! };
//!
//! // Any table with id, latitude, longitude and geohash columns
//! let points = create_test_points(&SyntheticPointsConfig::sample())?;
//! let backend = LazyFrameBackend::from_df(points);
//!
//! // Ten nearest active points to central London
//! let request = SearchRequest::new(51.5074, -0.1278)
//!     .limit(10)
//!     .select(["id", "name"])
//!     .extra_filter(" AND status = 'active'");
//!
//! match adaptive_nearby_search(&request, &backend)? {
//!     NearbyResults::Found(page) => println!("{page}"),
//!     NearbyResults::Fallback(reason) => println!("Falling back: {reason:?}"),
//! }
//! # Ok::<(), geoprobe::error::GeoprobeError>(())
//! ```
//!
//! # Features
//!
//! - **Bounded cost**: at most `max_query_budget` count queries per search
//! - **Explicit fallback**: when the ring cannot be narrowed the caller is
//!   told why, instead of receiving a partial answer
//! - **Pluggable storage**: implement [`QueryBackend`] for any row store
//! - **Pluggable keys**: implement [`SpatialKeyCodec`] for another key scheme
//! - **Batch search**: [`NearbySearcher::search_bulk`] runs requests in parallel
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod backend;
mod codec;
mod config;
mod core;
pub mod distance;
pub mod error;
mod predicate;
pub mod search;

pub use crate::core::{NearbyResults, NearbySearcher, adaptive_nearby_search};

pub use backend::{LazyFrameBackend, QueryBackend};
pub use codec::SpatialKeyCodec;
pub use config::{ProbeConfig, ProbeConfigBuilder};
pub use distance::{EQUATORIAL_RADIUS_KM, distance_km, great_circle_distance};
pub use geoprobe_data as data_processing;
pub use geoprobe_data::{BoundRange, Geohash64};
pub use polars;
pub use predicate::{GeohashPredicate, SearchFilter, build_predicate};
pub use search::{AcceptedProbe, ColumnMap, FallbackReason, ProbeOutcome, SearchRequest};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for the geoprobe library.
///
/// Installs a `tracing` fmt subscriber filtered by `RUST_LOG` when set, or
/// by `level` otherwise. Only the first call has any effect.
///
/// # Examples
///
/// ```rust
/// use geoprobe::init_logging;
/// use tracing::Level;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), geoprobe::error::GeoprobeError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), error::GeoprobeError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("polars=warn".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_processing::{SyntheticPointsConfig, create_test_points};

    fn setup_test_env() {
        let _ = init_logging(tracing::Level::WARN);
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        setup_test_env();
        assert!(init_logging(tracing::Level::DEBUG).is_ok());
    }

    #[test]
    fn test_dense_table_returns_full_page() {
        setup_test_env();

        let points = create_test_points(&SyntheticPointsConfig::sample()).unwrap();
        let backend = LazyFrameBackend::from_df(points);
        let request = SearchRequest::new(51.5074, -0.1278).limit(10).select(["id"]);

        let page = adaptive_nearby_search(&request, &backend)
            .unwrap()
            .into_frame()
            .expect("dense cluster should converge");
        assert_eq!(page.height(), 10);
    }

    #[test]
    fn test_empty_table_falls_back() {
        setup_test_env();

        let points = create_test_points(&SyntheticPointsConfig::minimal())
            .unwrap()
            .head(Some(0));
        let results = adaptive_nearby_search(
            &SearchRequest::new(10.0, 10.0),
            LazyFrameBackend::from_df(points),
        )
        .unwrap();
        assert!(results.is_fallback());
    }
}
