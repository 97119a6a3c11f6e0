//! Bounding-range predicates over the geohash column.
//!
//! A [`GeohashPredicate`] is the disjunction of the non-degenerate bounding
//! ranges of one ring expansion. It renders to SQL text for backends that
//! speak SQL and to a polars [`Expr`] for native evaluation. A
//! [`SearchFilter`] pairs it with the caller's extra SQL fragment, which is
//! appended verbatim and never inspected here.

use std::fmt;

use geoprobe_data::BoundRange;
use polars::prelude::*;

/// Disjunction of bounding ranges on one column. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeohashPredicate {
    column: String,
    ranges: Vec<BoundRange>,
}

/// Builds the predicate for `ranges` on `column`.
///
/// Ranges with neither bound are dropped. `None` means no range produced a
/// clause: nothing can be narrowed at this precision, and callers must not
/// read it as "match everything".
pub fn build_predicate(ranges: &[BoundRange], column: &str) -> Option<GeohashPredicate> {
    let ranges: Vec<BoundRange> = ranges
        .iter()
        .filter(|range| !range.is_unbounded())
        .copied()
        .collect();
    (!ranges.is_empty()).then(|| GeohashPredicate {
        column: column.to_string(),
        ranges,
    })
}

impl GeohashPredicate {
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn ranges(&self) -> &[BoundRange] {
        &self.ranges
    }

    /// `((col>=a AND col<b) OR (col>=c) OR ...)`
    pub fn to_sql(&self) -> String {
        let column = &self.column;
        let clauses: Vec<String> = self
            .ranges
            .iter()
            .filter_map(|range| match (range.lower, range.upper) {
                (Some(lower), Some(upper)) => {
                    Some(format!("({column}>={lower} AND {column}<{upper})"))
                }
                (Some(lower), None) => Some(format!("({column}>={lower})")),
                (None, Some(upper)) => Some(format!("({column}<{upper})")),
                (None, None) => None,
            })
            .collect();
        format!("({})", clauses.join(" OR "))
    }

    /// The same predicate as a polars expression.
    ///
    /// The column is cast to `UInt64` so bounds above `i64::MAX` compare
    /// exactly instead of going through a float supertype.
    pub fn to_expr(&self) -> Expr {
        let key = col(self.column.as_str()).cast(DataType::UInt64);
        self.ranges
            .iter()
            .filter_map(|range| match (range.lower, range.upper) {
                (Some(lower), Some(upper)) => Some(
                    key.clone()
                        .gt_eq(lit(lower))
                        .and(key.clone().lt(lit(upper))),
                ),
                (Some(lower), None) => Some(key.clone().gt_eq(lit(lower))),
                (None, Some(upper)) => Some(key.clone().lt(lit(upper))),
                (None, None) => None,
            })
            .reduce(|acc, clause| acc.or(clause))
            .unwrap_or_else(|| lit(false))
    }
}

impl fmt::Display for GeohashPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// The filter handed to a backend: geohash ring plus the caller's fragment.
///
/// The fragment must already lead with its own connector (`" AND ..."`), so
/// the SQL form is the plain concatenation of the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    ring: GeohashPredicate,
    extra: String,
}

impl SearchFilter {
    pub fn new(ring: GeohashPredicate, extra: impl Into<String>) -> Self {
        Self {
            ring,
            extra: extra.into(),
        }
    }

    pub const fn ring(&self) -> &GeohashPredicate {
        &self.ring
    }

    pub fn extra(&self) -> &str {
        &self.extra
    }

    pub fn to_sql(&self) -> String {
        format!("{}{}", self.ring.to_sql(), self.extra)
    }
}

impl fmt::Display for SearchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
