use tracing::{info, instrument, warn};

use super::{project_for_query, run_query, Comparison, EmptyReason};
use crate::error::Result;
use crate::security::SqlSecurity;
use crate::table::{Table, Value};

/// Averages a metric for two categories of one table.
///
/// Defaults to the rainfall layout: `state`, `year` and `rainfall_mm`. The
/// result has the category column and `average_<metric>`, with at most one
/// row per requested category, the first category's row first.
#[derive(Debug, Clone)]
pub struct StateComparison {
    category_column: String,
    metric_column: String,
    year_column: String,
}

impl Default for StateComparison {
    fn default() -> Self {
        Self {
            category_column: "state".to_string(),
            metric_column: "rainfall_mm".to_string(),
            year_column: "year".to_string(),
        }
    }
}

impl StateComparison {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category_column(mut self, column: impl Into<String>) -> Self {
        self.category_column = column.into();
        self
    }

    pub fn with_metric_column(mut self, column: impl Into<String>) -> Self {
        self.metric_column = column.into();
        self
    }

    pub fn with_year_column(mut self, column: impl Into<String>) -> Self {
        self.year_column = column.into();
        self
    }

    /// Name of the averaged output column.
    pub fn output_column(&self) -> String {
        format!("average_{}", self.metric_column)
    }

    /// Compares the average metric of `state_a` and `state_b`.
    ///
    /// With a year, only rows whose year column equals it exactly take part,
    /// so `2022.7` is not year 2022. Metric values that are not numbers are ignored by the average.
    #[instrument(skip(self, table), fields(rows = table.num_rows()))]
    pub async fn compare(
        &self,
        table: &Table,
        state_a: &str,
        state_b: &str,
        year: Option<i64>,
    ) -> Result<Comparison> {
        if table.is_empty() || table.num_columns() == 0 {
            warn!("Cannot compare states of an empty table");
            return Ok(Comparison::Empty(EmptyReason::EmptyInput));
        }

        let year_column = year.map(|_| self.year_column.as_str());
        let required = [
            Some(self.category_column.as_str()),
            Some(self.metric_column.as_str()),
            year_column,
        ];
        if let Some(missing) = required
            .into_iter()
            .flatten()
            .find(|column| !table.has_column(column))
        {
            warn!(column = %missing, "Table lacks a column needed for state comparison");
            return Ok(Comparison::Empty(EmptyReason::MissingColumn {
                column: missing.to_string(),
            }));
        }

        let input = project_for_query(
            table,
            &self.category_column,
            &self.metric_column,
            year_column,
        )?;

        let mut sql = format!(
            "SELECT category AS {category}, AVG(TRY_CAST(metric AS DOUBLE)) AS {average} \
             FROM state_input WHERE category IN ({a}, {b})",
            category = SqlSecurity::quote_identifier(&self.category_column)?,
            average = SqlSecurity::quote_identifier(&self.output_column())?,
            a = SqlSecurity::quote_literal(state_a),
            b = SqlSecurity::quote_literal(state_b),
        );
        if let Some(year) = year {
            sql.push_str(&format!(" AND TRY_CAST(period AS DOUBLE) = CAST({year} AS DOUBLE)"));
        }
        sql.push_str(" GROUP BY category");

        let mut result = run_query(&[("state_input", &input)], &sql).await?;

        if result.is_empty() {
            warn!(state_a, state_b, ?year, "No data found for the selected states");
            return Ok(Comparison::Empty(EmptyReason::NoMatchingRows));
        }

        let rank = |row: &Vec<Value>| match row[0].as_str() {
            Some(state) if state == state_a => 0,
            _ => 1,
        };
        result.sort_rows_by(|left, right| rank(left).cmp(&rank(right)));

        info!(rows = result.num_rows(), "Compared states");
        Ok(Comparison::Rows(result))
    }
}

/// Compares average rainfall of two states with the default column layout.
pub async fn compare_states(
    table: &Table,
    state_a: &str,
    state_b: &str,
    year: Option<i64>,
) -> Result<Comparison> {
    StateComparison::new()
        .compare(table, state_a, state_b, year)
        .await
}
