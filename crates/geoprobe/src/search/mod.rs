//! Adaptive nearby search.
//!
//! The controller widens a geohash ring until it holds enough candidates,
//! and the materializer turns the accepted ring into a page of rows ordered
//! by distance.

mod controller;
mod materialize;
mod request;

pub use controller::{AcceptedProbe, FallbackReason, ProbeOutcome, YieldBand, probe_inner};
pub use materialize::materialize_inner;
pub use request::{ColumnMap, SearchRequest};
