//! Grouped comparisons over tables.
//!
//! Two comparisons are offered:
//!
//! - [`StateComparison`] averages a metric for two categories of one table,
//!   optionally within a single year.
//! - [`DatasetComparison`] sums a metric per category in two tables and
//!   joins the totals on the category key.
//!
//! Aggregation runs in DataFusion. Each query gets a fresh `SessionContext`
//! with the inputs registered as in-memory tables, so comparisons share no
//! state. Outcomes with nothing to show are reported as
//! [`Comparison::Empty`] with a reason rather than as errors.
//!
//! # Example
//!
//! ```rust
//! use datalens::compare::{Comparison, StateComparison};
//! use datalens::table::{Table, Value};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let table = Table::from_rows(
//!     vec!["state".into(), "year".into(), "rainfall_mm".into()],
//!     vec![
//!         vec![Value::from("Maharashtra"), Value::Int(2022), Value::Float(800.0)],
//!         vec![Value::from("Karnataka"), Value::Int(2022), Value::Float(650.0)],
//!         vec![Value::from("Maharashtra"), Value::Int(2021), Value::Float(900.0)],
//!     ],
//! )
//! .unwrap();
//!
//! let outcome = StateComparison::new()
//!     .compare(&table, "Maharashtra", "Karnataka", None)
//!     .await
//!     .unwrap();
//!
//! let rows = outcome.rows().unwrap();
//! assert_eq!(rows.value(0, "average_rainfall_mm"), Some(&Value::Float(850.0)));
//! # })
//! ```

mod datasets;
mod states;

use std::fmt;
use std::sync::Arc;

use datafusion::datasource::MemTable;
use datafusion::prelude::SessionContext;
use serde::Serialize;
use tracing::debug;

use crate::error::{ErrorContext, LensError, Result};
use crate::table::{Table, Value};

pub use datasets::{compare_datasets, DatasetComparison};
pub use states::{compare_states, StateComparison};

/// Why a comparison produced no rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EmptyReason {
    /// The input table has no rows or no columns
    EmptyInput,
    /// A column the comparison needs is not in the table
    MissingColumn { column: String },
    /// Filtering left nothing to aggregate
    NoMatchingRows,
    /// No column could serve as the metric
    NoMetricColumn,
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyReason::EmptyInput => f.write_str("the input table is empty"),
            EmptyReason::MissingColumn { column } => {
                write!(f, "the table has no '{column}' column")
            }
            EmptyReason::NoMatchingRows => f.write_str("no rows matched the selection"),
            EmptyReason::NoMetricColumn => f.write_str("no column can serve as the metric"),
        }
    }
}

/// Outcome of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    /// The grouped result
    Rows(Table),
    /// Nothing to compare, and why
    Empty(EmptyReason),
}

impl Comparison {
    /// The result table, when there is one.
    pub fn rows(&self) -> Option<&Table> {
        match self {
            Comparison::Rows(table) => Some(table),
            Comparison::Empty(_) => None,
        }
    }

    pub fn into_rows(self) -> Option<Table> {
        match self {
            Comparison::Rows(table) => Some(table),
            Comparison::Empty(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Comparison::Empty(_))
    }

    pub fn empty_reason(&self) -> Option<&EmptyReason> {
        match self {
            Comparison::Empty(reason) => Some(reason),
            Comparison::Rows(_) => None,
        }
    }
}

/// Percent change from `baseline` to `current`.
///
/// A zero baseline divides by one instead, so growth from nothing reads as
/// the raw difference times 100.
///
/// ```rust
/// use datalens::compare::percent_change;
///
/// assert_eq!(percent_change(200.0, 250.0), 25.0);
/// assert_eq!(percent_change(0.0, 5.0), 500.0);
/// ```
pub fn percent_change(baseline: f64, current: f64) -> f64 {
    let divisor = if baseline == 0.0 { 1.0 } else { baseline };
    (current - baseline) / divisor * 100.0
}

/// Builds a two- or three-column input table for SQL aggregation.
///
/// The category becomes its string form so grouping matches the keys used
/// elsewhere. The metric and the optional year (as `period`) are coerced to
/// numbers, unparseable values becoming missing.
pub(crate) fn project_for_query(
    table: &Table,
    category: &str,
    metric: &str,
    year: Option<&str>,
) -> Result<Table> {
    let mut columns = vec!["category".to_string(), "metric".to_string()];
    let mut indices = vec![
        table
            .column_index(category)
            .ok_or_else(|| LensError::column_not_found(category))?,
        table
            .column_index(metric)
            .ok_or_else(|| LensError::column_not_found(metric))?,
    ];
    if let Some(year) = year {
        columns.push("period".to_string());
        indices.push(
            table
                .column_index(year)
                .ok_or_else(|| LensError::column_not_found(year))?,
        );
    }

    let rows = table
        .rows()
        .map(|row| {
            indices
                .iter()
                .enumerate()
                .map(|(position, idx)| {
                    let value = &row[*idx];
                    if position == 0 {
                        value.key().map_or(Value::Missing, Value::Text)
                    } else {
                        value.to_numeric()
                    }
                })
                .collect()
        })
        .collect();

    Table::from_rows(columns, rows)
}

/// Runs a query against freshly registered in-memory tables.
pub(crate) async fn run_query(inputs: &[(&str, &Table)], sql: &str) -> Result<Table> {
    let ctx = SessionContext::new();

    for (name, table) in inputs {
        let batch = table.to_record_batch()?;
        let mem_table = MemTable::try_new(batch.schema(), vec![vec![batch]])
            .with_context(|| format!("Failed to create in-memory table '{name}'"))?;
        ctx.register_table(*name, Arc::new(mem_table))
            .with_context(|| format!("Failed to register table '{name}'"))?;
    }

    debug!(sql = %sql, "Executing comparison query");

    let df = ctx
        .sql(sql)
        .await
        .with_context(|| format!("Failed to plan comparison query: {sql}"))?;
    let schema = df.schema().as_arrow().clone();
    let batches = df
        .collect()
        .await
        .context("Failed to execute comparison query")?;

    Table::from_record_batches(&schema, &batches)
}
