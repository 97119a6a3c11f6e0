//! Geohash codec and point-table preparation for `geoprobe`.
//!
//! This crate owns everything that touches the stored data rather than the
//! search loop itself: the 64-bit geohash codec used to key rows, helpers
//! that compute a geohash column for a table of points, parquet persistence
//! with a small JSON metadata sidecar, and deterministic synthetic point
//! tables used by tests and demos.

pub mod geohash;
pub mod table;
pub mod test_data;

mod error {
    use polars::prelude::PolarsError;
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum DataError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),
        #[error("Polars error: {0}")]
        Polars(#[from] PolarsError),
        #[error("Serialization error: {0}")]
        Serde(#[from] serde_json::Error),
        #[error("Coordinate out of range: latitude={latitude}, longitude={longitude}")]
        InvalidCoordinate { latitude: f64, longitude: f64 },
        #[error("Metadata file not found: {0}")]
        MetadataFileNotFound(std::path::PathBuf),
    }

    pub type Result<T> = std::result::Result<T, DataError>;
}

pub use error::{DataError, Result};
pub use geohash::{BoundRange, Geohash64, MAX_PRECISION};
pub use table::{
    GeoColumns, PointTableMetadata, load_point_table, save_point_table, scan_csv_points,
    with_geohash_column,
};
pub use test_data::{SyntheticPointsConfig, create_test_points};

#[cfg(test)]
pub(crate) mod tests_utils {
    use polars::prelude::*;

    pub fn assert_has_columns(df: &DataFrame, expected_columns: &[&str]) {
        let actual_columns: Vec<_> = df.get_column_names().iter().map(|s| s.as_str()).collect();
        for expected_col in expected_columns {
            assert!(
                actual_columns.contains(expected_col),
                "Missing column: {expected_col}. Available columns: {actual_columns:?}"
            );
        }
    }

    pub fn assert_column_type(df: &DataFrame, column: &str, expected_type: &DataType) {
        let actual_type = df
            .column(column)
            .unwrap_or_else(|_| panic!("Column '{column}' not found"))
            .dtype();
        assert_eq!(
            actual_type, expected_type,
            "Column '{column}' has wrong type. Expected: {expected_type:?}, Got: {actual_type:?}"
        );
    }

    pub fn assert_no_nulls_in_column(df: &DataFrame, column: &str) {
        let null_count = df
            .column(column)
            .unwrap_or_else(|_| panic!("Column '{column}' not found"))
            .null_count();
        assert_eq!(
            null_count, 0,
            "Column '{column}' contains {null_count} null values"
        );
    }
}
