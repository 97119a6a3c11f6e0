use std::str::FromStr;

use crate::error::{GeoprobeError, Result};

/// Column names the search reads from the row store.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnMap {
    /// Column counted by the probe queries; a primary key works best
    pub count: String,
    pub latitude: String,
    pub longitude: String,
    /// Precomputed 64-bit geohash of each row
    pub geohash: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            count: "id".to_string(),
            latitude: "latitude".to_string(),
            longitude: "longitude".to_string(),
            geohash: "geohash".to_string(),
        }
    }
}

/// A nearby search: a center point, the page of results wanted and what to
/// select.
///
/// Results are ordered by distance from the center and sliced to
/// `[lower_cut, upper_cut)`, the same rule as slicing a list.
///
/// # Examples
///
/// ```rust
/// use geoprobe::SearchRequest;
///
/// let request = SearchRequest::new(51.5074, -0.1278)
///     .page(0, 10)
///     .select(["id", "name"])
///     .extra_filter(" AND status = 'active'");
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub lower_cut: usize,
    pub upper_cut: usize,
    /// SQL fragment appended after the geohash predicate. Must be sanitised
    /// by the caller and lead with its own connector, e.g. `" AND x = 1"`.
    pub extra_filter: String,
    /// Columns to return; latitude and longitude are always added
    pub projection: Vec<String>,
    pub columns: ColumnMap,
}

impl SearchRequest {
    /// The ten nearest rows to a point, all default column names.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            lower_cut: 0,
            upper_cut: 10,
            extra_filter: String::new(),
            projection: Vec::new(),
            columns: ColumnMap::default(),
        }
    }

    /// Parse a request from raw string parameters, e.g. from a query string.
    ///
    /// Coordinates must be numbers and the cuts non-negative integers;
    /// anything else is an [`GeoprobeError::InvalidParameter`].
    pub fn from_params(
        latitude: &str,
        longitude: &str,
        lower_cut: &str,
        upper_cut: &str,
    ) -> Result<Self> {
        let request = Self::new(
            parse_param("latitude", latitude)?,
            parse_param("longitude", longitude)?,
        )
        .page(
            parse_param("lower_cut", lower_cut)?,
            parse_param("upper_cut", upper_cut)?,
        );
        request.validate()?;
        Ok(request)
    }

    pub fn page(mut self, lower_cut: usize, upper_cut: usize) -> Self {
        self.lower_cut = lower_cut;
        self.upper_cut = upper_cut;
        self
    }

    /// Shorthand for `page(0, k)`
    pub fn limit(self, k: usize) -> Self {
        self.page(0, k)
    }

    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn extra_filter(mut self, fragment: impl Into<String>) -> Self {
        self.extra_filter = fragment.into();
        self
    }

    pub fn columns(mut self, columns: ColumnMap) -> Self {
        self.columns = columns;
        self
    }

    /// Checks the request before any query is issued.
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !(-90.0..90.0).contains(&self.latitude) {
            return Err(GeoprobeError::InvalidParameter(format!(
                "latitude must be a finite number in [-90, 90), got {}",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() {
            return Err(GeoprobeError::InvalidParameter(format!(
                "longitude must be a finite number, got {}",
                self.longitude
            )));
        }
        if self.lower_cut > self.upper_cut {
            return Err(GeoprobeError::InvalidParameter(format!(
                "lower_cut ({}) must not exceed upper_cut ({})",
                self.lower_cut, self.upper_cut
            )));
        }
        if !self.extra_filter.trim().is_empty() && !leads_with_connector(&self.extra_filter) {
            return Err(GeoprobeError::InvalidParameter(format!(
                "extra filter must start with AND or OR, got {:?}",
                self.extra_filter
            )));
        }
        Ok(())
    }

    /// Candidate count the probe aims for: the page end, but never below
    /// `min_result_cap` since ring coverage is coarse for small pages.
    pub fn result_cap(&self, min_result_cap: usize) -> usize {
        self.upper_cut.max(min_result_cap)
    }

    pub const fn page_len(&self) -> usize {
        self.upper_cut.saturating_sub(self.lower_cut)
    }

    /// The projection with the coordinate columns appended when missing.
    pub fn fetch_columns(&self) -> Vec<String> {
        let mut columns = self.projection.clone();
        for required in [&self.columns.latitude, &self.columns.longitude] {
            if !columns.contains(required) {
                columns.push(required.clone());
            }
        }
        columns
    }
}

fn parse_param<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        GeoprobeError::InvalidParameter(format!("{name} is not a valid number: {raw:?}"))
    })
}

fn leads_with_connector(fragment: &str) -> bool {
    let head = fragment.trim_start();
    ["AND", "OR"].iter().any(|keyword| {
        head.get(..keyword.len())
            .is_some_and(|word| word.eq_ignore_ascii_case(keyword))
            && head[keyword.len()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_whitespace() || c == '(')
    })
}
