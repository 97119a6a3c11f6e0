//! Core nearby search functionality for the geoprobe library.
//!
//! This module provides the main [`NearbySearcher`] interface. It validates a
//! [`SearchRequest`], runs the adaptive geohash probe against a
//! [`QueryBackend`] and materializes the accepted ring into a page of rows
//! ordered by distance.
//!
//! # Quick Start
//!
//! ```rust
//! use geoprobe::{
//!     LazyFrameBackend, NearbyResults, NearbySearcher, SearchRequest,
//!     data_processing::{SyntheticPointsConfig, create_test_points},
//! };
//!
//! let points = create_test_points(&SyntheticPointsConfig::sample())?;
//! let searcher = NearbySearcher::new(LazyFrameBackend::from_df(points));
//!
//! let request = SearchRequest::new(51.5074, -0.1278).limit(5).select(["id", "name"]);
//! match searcher.search(&request)? {
//!     NearbyResults::Found(page) => println!("{page}"),
//!     NearbyResults::Fallback(reason) => println!("use another strategy: {reason:?}"),
//! }
//! # Ok::<(), geoprobe::error::GeoprobeError>(())
//! ```

use geoprobe_data::Geohash64;
use polars::prelude::DataFrame;
use rayon::prelude::*;
use tracing::{info, instrument};

use crate::{
    backend::QueryBackend,
    codec::SpatialKeyCodec,
    config::ProbeConfig,
    error::Result,
    search::{FallbackReason, ProbeOutcome, SearchRequest, materialize_inner, probe_inner},
};

/// The result of one nearby search.
#[derive(Debug, Clone)]
pub enum NearbyResults {
    /// The requested page, ordered by distance from the center
    Found(DataFrame),
    /// The geohash search could not narrow the table; use another strategy
    Fallback(FallbackReason),
}

impl NearbyResults {
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    /// The page of rows, or `None` on fallback.
    pub fn into_frame(self) -> Option<DataFrame> {
        match self {
            Self::Found(df) => Some(df),
            Self::Fallback(_) => None,
        }
    }
}

/// Runs nearby searches against one backend.
///
/// The searcher holds no per-search state: every call builds its own probe
/// state, so one searcher can serve many threads.
///
/// # Examples
///
/// With custom configuration:
/// ```rust
/// use geoprobe::{LazyFrameBackend, NearbySearcher, ProbeConfig, SearchRequest, polars::prelude::*};
///
/// let backend = LazyFrameBackend::new(LazyFrame::default());
/// let config = ProbeConfig::builder().max_query_budget(8).build()?;
/// let searcher = NearbySearcher::new(backend).with_config(config);
/// assert!(searcher.search(&SearchRequest::new(95.0, 0.0)).is_err());
/// # Ok::<(), geoprobe::error::GeoprobeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct NearbySearcher<B, C = Geohash64> {
    backend: B,
    codec: C,
    config: ProbeConfig,
}

impl<B: QueryBackend> NearbySearcher<B> {
    /// A searcher with the 64-bit geohash codec and default tuning.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            codec: Geohash64,
            config: ProbeConfig::default(),
        }
    }
}

impl<B: QueryBackend, C: SpatialKeyCodec> NearbySearcher<B, C> {
    /// Swap the spatial key codec; the backend's geohash column must have
    /// been encoded with the same scheme.
    pub fn with_codec<D: SpatialKeyCodec>(self, codec: D) -> NearbySearcher<B, D> {
        NearbySearcher {
            backend: self.backend,
            codec,
            config: self.config,
        }
    }

    pub fn with_config(mut self, config: ProbeConfig) -> Self {
        self.config = config;
        self
    }

    pub const fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Find the page of rows nearest to the request center.
    ///
    /// Invalid requests fail before any query is issued. A fallback is not an
    /// error and carries the reason the probe gave up.
    #[instrument(name = "Nearby search", level = "info", skip_all)]
    pub fn search(&self, request: &SearchRequest) -> Result<NearbyResults> {
        let t_search = std::time::Instant::now();
        let results = match self.probe(request)? {
            ProbeOutcome::Converged(accepted) => NearbyResults::Found(materialize_inner(
                request,
                &accepted.filter,
                &self.backend,
                &self.config,
            )?),
            ProbeOutcome::Fallback(reason) => NearbyResults::Fallback(reason),
        };
        info!(
            elapsed_seconds = ?t_search.elapsed(),
            fallback = results.is_fallback(),
            "Nearby search complete"
        );
        Ok(results)
    }

    /// Run only the adaptive probe, without fetching any rows.
    pub fn probe(&self, request: &SearchRequest) -> Result<ProbeOutcome> {
        request.validate()?;
        probe_inner(request, &self.backend, &self.codec, &self.config)
    }

    /// Search many requests in parallel; results keep the input order.
    ///
    /// The first error aborts the batch.
    #[instrument(name = "Bulk nearby search", level = "info", skip_all, fields(requests = requests.len()))]
    pub fn search_bulk(&self, requests: &[SearchRequest]) -> Result<Vec<NearbyResults>> {
        requests
            .par_iter()
            .map(|request| self.search(request))
            .collect()
    }
}

/// One nearby search with the default codec and configuration.
pub fn adaptive_nearby_search<B: QueryBackend>(
    request: &SearchRequest,
    backend: B,
) -> Result<NearbyResults> {
    NearbySearcher::new(backend).search(request)
}
