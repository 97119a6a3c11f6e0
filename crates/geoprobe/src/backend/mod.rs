//! Query backends: where count and fetch queries are executed.
//!
//! The search core never touches storage directly. It hands a
//! [`SearchFilter`] to a [`QueryBackend`] and gets back a row count or a
//! [`DataFrame`] of rows. [`LazyFrameBackend`] runs both against a polars
//! [`LazyFrame`] using polars SQL, so the caller's extra filter can be any
//! SQL fragment polars understands.

use itertools::Itertools;
use polars::{prelude::*, sql::SQLContext};
use tracing::{instrument, trace};

use crate::{error::Result, predicate::SearchFilter};

/// Executes count and fetch queries for the search core.
///
/// Implementations must be safe to call from several searches at once; each
/// call is independent and blocking. Errors are passed through to the caller
/// untouched, so any retry or timeout policy belongs here.
pub trait QueryBackend: Send + Sync {
    /// Number of rows matching `filter`, counted over `count_column`.
    fn count_matching(&self, filter: &SearchFilter, count_column: &str) -> Result<u64>;

    /// Rows matching `filter`, projected onto `columns`.
    fn fetch_matching(&self, filter: &SearchFilter, columns: &[String]) -> Result<DataFrame>;
}

impl<B: QueryBackend + ?Sized> QueryBackend for &B {
    fn count_matching(&self, filter: &SearchFilter, count_column: &str) -> Result<u64> {
        (**self).count_matching(filter, count_column)
    }

    fn fetch_matching(&self, filter: &SearchFilter, columns: &[String]) -> Result<DataFrame> {
        (**self).fetch_matching(filter, columns)
    }
}

const TABLE_NAME: &str = "points";
const RING_COLUMN: &str = "__geoprobe_ring";
const COUNT_ALIAS: &str = "n";

/// A [`QueryBackend`] over an in-memory or scanned polars [`LazyFrame`].
///
/// The geohash ring is evaluated natively into a boolean helper column, then
/// the query runs through polars SQL as
/// `SELECT ... FROM points WHERE "<ring>" = true<extra>`, which keeps the
/// extra fragment's connector and precedence exactly as written.
#[derive(Clone)]
pub struct LazyFrameBackend {
    frame: LazyFrame,
}

impl LazyFrameBackend {
    pub fn new(frame: LazyFrame) -> Self {
        Self { frame }
    }

    pub fn from_df(df: DataFrame) -> Self {
        Self::new(df.lazy())
    }

    fn query(&self, filter: &SearchFilter, projection: &str) -> Result<DataFrame> {
        let mut ctx = SQLContext::new();
        ctx.register(
            TABLE_NAME,
            self.frame
                .clone()
                .with_column(filter.ring().to_expr().alias(RING_COLUMN)),
        );
        let sql = format!(
            "SELECT {projection} FROM {TABLE_NAME} WHERE {} = true{}",
            quote_ident(RING_COLUMN),
            filter.extra()
        );
        trace!(%sql, "Executing SQL");
        Ok(ctx.execute(&sql)?.collect()?)
    }
}

impl std::fmt::Debug for LazyFrameBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyFrameBackend").finish_non_exhaustive()
    }
}

impl QueryBackend for LazyFrameBackend {
    #[instrument(skip(self, filter), level = "trace")]
    fn count_matching(&self, filter: &SearchFilter, count_column: &str) -> Result<u64> {
        let counted = self.query(
            filter,
            &format!("COUNT({}) AS {COUNT_ALIAS}", quote_ident(count_column)),
        )?;
        let count = counted
            .column(COUNT_ALIAS)?
            .cast(&DataType::UInt64)?
            .u64()?
            .get(0)
            .unwrap_or(0);
        Ok(count)
    }

    #[instrument(skip(self, filter), level = "trace")]
    fn fetch_matching(&self, filter: &SearchFilter, columns: &[String]) -> Result<DataFrame> {
        if columns.is_empty() {
            return Ok(self.query(filter, "*")?.drop(RING_COLUMN)?);
        }
        let projection = columns.iter().map(|c| quote_ident(c)).join(", ");
        self.query(filter, &projection)
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
