use std::cmp::Ordering;

use itertools::izip;
use polars::prelude::*;
use tracing::{debug, instrument};

use super::SearchRequest;
use crate::{
    backend::QueryBackend, config::ProbeConfig, distance::great_circle_distance, error::Result,
    predicate::SearchFilter,
};

/// Fetches the rows matching an accepted filter, orders them by distance from
/// the request center and returns the requested page.
///
/// The page is `[lower_cut, upper_cut)` of the sorted rows, clipped to what
/// was fetched. Rows with a missing coordinate get a NaN distance and sort
/// after every real one; ties keep the backend's order.
#[instrument(
    name = "Materialize nearby rows",
    level = "debug",
    skip_all,
    fields(lower_cut = request.lower_cut, upper_cut = request.upper_cut)
)]
pub fn materialize_inner<B>(
    request: &SearchRequest,
    filter: &SearchFilter,
    backend: &B,
    config: &ProbeConfig,
) -> Result<DataFrame>
where
    B: QueryBackend + ?Sized,
{
    let rows = backend.fetch_matching(filter, &request.fetch_columns())?;

    let latitudes = rows
        .column(&request.columns.latitude)?
        .cast(&DataType::Float64)?;
    let longitudes = rows
        .column(&request.columns.longitude)?
        .cast(&DataType::Float64)?;

    let distances: Vec<f64> = izip!(latitudes.f64()?, longitudes.f64()?)
        .map(|(lat, lon)| match (lat, lon) {
            (Some(lat), Some(lon)) => great_circle_distance(
                request.latitude,
                request.longitude,
                lat,
                lon,
                config.earth_radius_km,
            ),
            _ => f64::NAN,
        })
        .collect();

    let mut order: Vec<usize> = (0..distances.len()).collect();
    order.sort_by(|&a, &b| nan_last(distances[a], distances[b]));

    let page: Vec<usize> = order
        .into_iter()
        .skip(request.lower_cut)
        .take(request.page_len())
        .collect();
    debug!(
        fetched = rows.height(),
        returned = page.len(),
        "Sorted candidates by distance"
    );

    let indices = IdxCa::from_vec(
        "idx".into(),
        page.iter().map(|&i| i as IdxSize).collect(),
    );
    let mut result = rows.take(&indices)?;

    if let Some(name) = &config.distance_column {
        let page_distances: Vec<f64> = page.iter().map(|&i| distances[i]).collect();
        result.with_column(Column::new(name.as_str().into(), page_distances))?;
    }

    Ok(result)
}

fn nan_last(a: f64, b: f64) -> Ordering {
    a.is_nan().cmp(&b.is_nan()).then_with(|| a.total_cmp(&b))
}
