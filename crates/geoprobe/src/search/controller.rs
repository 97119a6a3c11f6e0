//! The adaptive precision loop.
//!
//! Starting from a fine geohash precision, each iteration expands the center
//! key into a ring of bounding ranges, counts the rows inside it and, if
//! there are too few, coarsens the precision by an amount that depends on how
//! far short the count fell. The loop ends when enough candidates are found,
//! when the count shrinks (the coarser ring overshot and the previous one is
//! kept), or with a fallback when the ring cannot be built or the query
//! budget runs out.

use geoprobe_data::MAX_PRECISION;
use tracing::{debug, info, instrument, warn};

use super::SearchRequest;
use crate::{
    backend::QueryBackend,
    codec::SpatialKeyCodec,
    config::ProbeConfig,
    error::Result,
    predicate::{SearchFilter, build_predicate},
};

/// A filter the probe accepted, with the count it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedProbe {
    pub filter: SearchFilter,
    /// Row count observed for `filter`
    pub count: u64,
    /// Precision `filter` was built at
    pub precision: u8,
    /// Count queries issued, including any that were discarded
    pub iterations: u32,
}

/// Why the adaptive search gave up. Never an error: the caller is expected
/// to switch to another search strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The codec produced no bounding range at this precision
    NoNarrowing { precision: u8, iterations: u32 },
    /// Every allowed count query ran without reaching the result cap
    BudgetExhausted {
        iterations: u32,
        last_count: u64,
        result_cap: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Converged(AcceptedProbe),
    Fallback(FallbackReason),
}

/// How much of the result cap a probe returned. Each band maps to a
/// precision step; bands are checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YieldBand {
    /// Nothing found and the cap is above 20
    EmptyWideCap,
    /// Nothing found and the cap is 20 or below
    EmptyNarrowCap,
    /// At most 5% of the cap
    Trace,
    /// Under 25%
    Sparse,
    /// Under 50%
    Partial,
    /// Half the cap or more
    Majority,
}

impl YieldBand {
    pub fn classify(count: u64, result_cap: u64) -> Self {
        let cap = result_cap.max(1) as f64;
        let ratio = count as f64 / cap;
        match count {
            0 if 1.0 / cap < 0.05 => Self::EmptyWideCap,
            0 => Self::EmptyNarrowCap,
            _ if ratio <= 0.05 => Self::Trace,
            _ if ratio < 0.25 => Self::Sparse,
            _ if ratio < 0.5 => Self::Partial,
            _ => Self::Majority,
        }
    }

    /// The precision of the next probe.
    ///
    /// Large steps stop at a floor of 4 (3 for `Partial`); at or below it the
    /// precision drops one bit at a time, never under 0.
    pub fn next_precision(self, precision: u8) -> u8 {
        let precision = i32::from(precision);
        let next = match self {
            Self::EmptyWideCap => coarsen(precision, 4, 8, 4),
            Self::EmptyNarrowCap => coarsen(precision, 4, 7, 4),
            Self::Trace => coarsen(precision, 4, 6, 4),
            Self::Sparse => coarsen(precision, 4, 4, 4),
            Self::Partial => coarsen(precision, 3, 2, 3),
            Self::Majority => precision - 1,
        };
        next.clamp(0, i32::from(MAX_PRECISION)) as u8
    }
}

fn coarsen(precision: i32, linear_from: i32, step: i32, floor: i32) -> i32 {
    if precision <= linear_from {
        precision - 1
    } else {
        (precision - step).max(floor)
    }
}

struct Baseline {
    filter: SearchFilter,
    count: u64,
    precision: u8,
}

/// Per-invocation loop state; never shared between searches.
struct SearchState {
    precision: u8,
    loop_count: u32,
    baseline: Option<Baseline>,
}

impl SearchState {
    const fn new(precision: u8) -> Self {
        Self {
            precision,
            loop_count: 0,
            baseline: None,
        }
    }

    fn previous_count(&self) -> u64 {
        self.baseline.as_ref().map_or(0, |baseline| baseline.count)
    }
}

/// Runs the adaptive precision loop for one request.
///
/// Issues at most `config.max_query_budget` count queries, one at a time,
/// and never a fetch. Backend and codec errors are returned as-is.
#[instrument(
    name = "Adaptive geohash probe",
    level = "debug",
    skip_all,
    fields(latitude = request.latitude, longitude = request.longitude)
)]
pub fn probe_inner<B, C>(
    request: &SearchRequest,
    backend: &B,
    codec: &C,
    config: &ProbeConfig,
) -> Result<ProbeOutcome>
where
    B: QueryBackend + ?Sized,
    C: SpatialKeyCodec + ?Sized,
{
    let result_cap = request.result_cap(config.min_result_cap) as u64;
    let center = codec.encode(request.latitude, request.longitude)?;
    let mut state = SearchState::new(config.starting_precision);

    loop {
        let ranges = codec.expand(center, state.precision);
        let Some(ring) = build_predicate(&ranges, &request.columns.geohash) else {
            info!(
                precision = state.precision,
                iterations = state.loop_count,
                "No geohash ranges at this precision, falling back"
            );
            return Ok(ProbeOutcome::Fallback(FallbackReason::NoNarrowing {
                precision: state.precision,
                iterations: state.loop_count,
            }));
        };

        let filter = SearchFilter::new(ring, request.extra_filter.as_str());
        let count = backend.count_matching(&filter, &request.columns.count)?;
        state.loop_count += 1;
        debug!(
            iteration = state.loop_count,
            precision = state.precision,
            count,
            result_cap,
            "Probed candidate count"
        );

        let regressed = count < state.previous_count();
        if regressed {
            debug!(
                previous = state.previous_count(),
                count, "Candidate count shrank, keeping the previous filter"
            );
        } else {
            state.baseline = Some(Baseline {
                filter,
                count,
                precision: state.precision,
            });
        }

        if count < result_cap && state.loop_count >= config.max_query_budget {
            warn!(
                iterations = state.loop_count,
                last_count = count,
                result_cap,
                "Query budget exhausted before reaching the result cap"
            );
            return Ok(ProbeOutcome::Fallback(FallbackReason::BudgetExhausted {
                iterations: state.loop_count,
                last_count: count,
                result_cap,
            }));
        }

        if (regressed || count >= result_cap)
            && let Some(baseline) = state.baseline.take()
        {
            info!(
                precision = baseline.precision,
                count = baseline.count,
                iterations = state.loop_count,
                "Geohash probe converged"
            );
            return Ok(ProbeOutcome::Converged(AcceptedProbe {
                filter: baseline.filter,
                count: baseline.count,
                precision: baseline.precision,
                iterations: state.loop_count,
            }));
        }

        let band = YieldBand::classify(count, result_cap);
        state.precision = band.next_precision(state.precision);
        debug!(?band, next_precision = state.precision, "Coarsening search ring");
    }
}
