//! Point tables: geohash column computation and parquet persistence.

use std::{
    fs::File,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use itertools::izip;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{DataError, Geohash64, Result};

/// Names of the coordinate and geohash columns of a point table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoColumns {
    pub latitude: String,
    pub longitude: String,
    pub geohash: String,
}

impl Default for GeoColumns {
    fn default() -> Self {
        Self {
            latitude: "latitude".to_string(),
            longitude: "longitude".to_string(),
            geohash: "geohash".to_string(),
        }
    }
}

/// Sidecar written next to every saved point table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointTableMetadata {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub rows: usize,
    pub columns: GeoColumns,
}

/// Adds (or replaces) the geohash column computed from the coordinate columns.
///
/// Rows with a null or out-of-range coordinate get a null key, which no
/// bounding range will ever match.
pub fn with_geohash_column(mut df: DataFrame, columns: &GeoColumns) -> Result<DataFrame> {
    let latitudes = df.column(&columns.latitude)?.cast(&DataType::Float64)?;
    let longitudes = df.column(&columns.longitude)?.cast(&DataType::Float64)?;

    let keys: Vec<Option<u64>> = izip!(latitudes.f64()?, longitudes.f64()?)
        .map(|(latitude, longitude)| match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Geohash64.encode(latitude, longitude).ok(),
            _ => None,
        })
        .collect();

    let unkeyed = keys.iter().filter(|key| key.is_none()).count();
    if unkeyed > 0 {
        debug!(unkeyed, "Rows without a valid coordinate were left unkeyed");
    }

    df.with_column(Column::new(columns.geohash.as_str().into(), keys))?;
    Ok(df)
}

fn table_paths(dir: &Path, name: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{name}.parquet")),
        dir.join(format!("{name}.metadata.json")),
    )
}

/// Writes `<name>.parquet` and `<name>.metadata.json` into `dir`.
#[instrument(skip(df, columns), level = "info")]
pub fn save_point_table(
    df: &mut DataFrame,
    dir: &Path,
    name: &str,
    columns: &GeoColumns,
) -> Result<PathBuf> {
    let sink_time = std::time::Instant::now();
    std::fs::create_dir_all(dir)?;
    let (parquet_path, metadata_path) = table_paths(dir, name);

    let mut file = File::create(&parquet_path)?;
    ParquetWriter::new(&mut file).finish(df)?;

    let metadata = PointTableMetadata {
        version: env!("CARGO_PKG_VERSION").to_string(),
        generated_at: Utc::now(),
        rows: df.height(),
        columns: columns.clone(),
    };
    serde_json::to_writer_pretty(File::create(&metadata_path)?, &metadata)?;

    info!(
        path = ?parquet_path.file_stem(),
        rows = metadata.rows,
        sink_time = ?sink_time.elapsed(),
        "Saved point table"
    );
    Ok(parquet_path)
}

/// Loads a table written by [`save_point_table`].
#[instrument(level = "info")]
pub fn load_point_table(dir: &Path, name: &str) -> Result<(LazyFrame, PointTableMetadata)> {
    let (parquet_path, metadata_path) = table_paths(dir, name);
    if !metadata_path.exists() {
        return Err(DataError::MetadataFileNotFound(metadata_path));
    }
    let metadata: PointTableMetadata = serde_json::from_reader(File::open(&metadata_path)?)?;
    let lf = LazyFrame::scan_parquet(&parquet_path, Default::default())?;
    info!(rows = metadata.rows, "Loaded point table");
    Ok((lf, metadata))
}

/// Reads a CSV of points with a header row and keys it with a geohash column.
#[instrument(skip(columns), level = "info")]
pub fn scan_csv_points(path: &Path, columns: &GeoColumns) -> Result<LazyFrame> {
    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .finish()?
        .collect()?;
    Ok(with_geohash_column(df, columns)?.lazy())
}
