use tracing::{info, instrument, warn};

use super::{percent_change, project_for_query, run_query, Comparison, EmptyReason};
use crate::analyzers::profiler::ColumnProfiler;
use crate::error::{LensError, Result};
use crate::table::{Table, Value};

const TOTALS_SQL: &str = "\
WITH left_totals AS (
    SELECT category, SUM(TRY_CAST(metric AS DOUBLE)) AS total
    FROM left_input WHERE category IS NOT NULL GROUP BY category
), right_totals AS (
    SELECT category, SUM(TRY_CAST(metric AS DOUBLE)) AS total
    FROM right_input WHERE category IS NOT NULL GROUP BY category
)
SELECT COALESCE(l.category, r.category) AS category,
       COALESCE(l.total, 0.0) AS metric_a,
       COALESCE(r.total, 0.0) AS metric_b
FROM left_totals l FULL OUTER JOIN right_totals r ON l.category = r.category";

/// Sums a metric per category in two tables and joins the totals.
///
/// The category defaults to the first column of the first table. The metric
/// defaults to the first numeric column of the first table, or its second
/// column when none is numeric. Both columns must exist in both tables.
///
/// The result has the columns `<category>, metric_a, metric_b, difference,
/// pct_change`, one row per category key found in either table, ordered by
/// key. A key present on one side only reports zero for the other side.
#[derive(Debug, Clone, Default)]
pub struct DatasetComparison {
    category_column: Option<String>,
    metric_column: Option<String>,
}

impl DatasetComparison {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category_column(mut self, column: impl Into<String>) -> Self {
        self.category_column = Some(column.into());
        self
    }

    pub fn with_metric_column(mut self, column: impl Into<String>) -> Self {
        self.metric_column = Some(column.into());
        self
    }

    /// Compares the metric totals of `first` and `second`.
    ///
    /// Returns [`LensError::SchemaMismatch`] when the category or metric
    /// column is missing from either table.
    #[instrument(skip_all, fields(first_rows = first.num_rows(), second_rows = second.num_rows()))]
    pub async fn compare(&self, first: &Table, second: &Table) -> Result<Comparison> {
        if first.num_columns() == 0 || (first.is_empty() && second.is_empty()) {
            warn!("Cannot compare datasets without data");
            return Ok(Comparison::Empty(EmptyReason::EmptyInput));
        }

        let category = match &self.category_column {
            Some(column) => column.clone(),
            None => first.columns()[0].clone(),
        };
        let Some(metric) = self.resolve_metric(first) else {
            warn!("No metric column available for dataset comparison");
            return Ok(Comparison::Empty(EmptyReason::NoMetricColumn));
        };

        for (table, dataset) in [(first, "first"), (second, "second")] {
            for column in [&category, &metric] {
                if !table.has_column(column) {
                    return Err(LensError::schema_mismatch(column.as_str(), dataset));
                }
            }
        }

        let left = project_for_query(first, &category, &metric, None)?;
        let right = project_for_query(second, &category, &metric, None)?;
        let totals = run_query(&[("left_input", &left), ("right_input", &right)], TOTALS_SQL).await?;

        if totals.is_empty() {
            warn!(category = %category, "No category values to compare");
            return Ok(Comparison::Empty(EmptyReason::NoMatchingRows));
        }

        let mut rows: Vec<Vec<Value>> = totals
            .rows()
            .map(|row| {
                let metric_a = row[1].as_f64().unwrap_or(0.0);
                let metric_b = row[2].as_f64().unwrap_or(0.0);
                vec![
                    row[0].clone(),
                    Value::Float(metric_a),
                    Value::Float(metric_b),
                    Value::Float(metric_b - metric_a),
                    Value::Float(percent_change(metric_a, metric_b)),
                ]
            })
            .collect();
        rows.sort_by(|left, right| left[0].key().cmp(&right[0].key()));

        let result = Table::from_rows(
            vec![
                category.clone(),
                "metric_a".to_string(),
                "metric_b".to_string(),
                "difference".to_string(),
                "pct_change".to_string(),
            ],
            rows,
        )?;

        info!(
            category = %category,
            metric = %metric,
            rows = result.num_rows(),
            "Compared datasets"
        );
        Ok(Comparison::Rows(result))
    }

    fn resolve_metric(&self, first: &Table) -> Option<String> {
        if let Some(column) = &self.metric_column {
            return Some(column.clone());
        }
        let profile = ColumnProfiler::new().profile(first);
        profile
            .first_numeric()
            .map(|p| p.column_name.clone())
            .or_else(|| first.columns().get(1).cloned())
    }
}

/// Compares two datasets, choosing default columns where none are given.
pub async fn compare_datasets(
    first: &Table,
    second: &Table,
    category_column: Option<&str>,
    metric_column: Option<&str>,
) -> Result<Comparison> {
    let mut comparison = DatasetComparison::new();
    if let Some(column) = category_column {
        comparison = comparison.with_category_column(column);
    }
    if let Some(column) = metric_column {
        comparison = comparison.with_metric_column(column);
    }
    comparison.compare(first, second).await
}
