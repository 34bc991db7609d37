//! Filter control suggestions derived from column profiles.
//!
//! Each profiled column gets the control that fits its [`ColumnKind`]:
//! numeric columns a range slider bounded by the observed minimum and maximum,
//! categorical columns a multi-select over their distinct values, and text
//! columns a substring search box. Columns with no values get nothing.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::analyzers::filters::ManualFilter;
use crate::analyzers::profiler::{ColumnKind, TableProfile};
use crate::table::Table;

/// The input control suggested for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum FilterControl {
    Range { column: String, min: f64, max: f64 },
    Multiselect { column: String, options: Vec<String> },
    Contains { column: String },
}

impl FilterControl {
    pub fn column(&self) -> &str {
        match self {
            FilterControl::Range { column, .. }
            | FilterControl::Multiselect { column, .. }
            | FilterControl::Contains { column } => column,
        }
    }

    /// The filter this control produces before the user narrows it.
    ///
    /// Range and multiselect start fully open, so applying the default keeps
    /// every non-missing row. A search box starts empty.
    pub fn default_filter(&self) -> ManualFilter {
        match self {
            FilterControl::Range { column, min, max } => {
                ManualFilter::between(column.clone(), *min, *max)
            }
            FilterControl::Multiselect { column, options } => {
                ManualFilter::one_of(column.clone(), options.iter().cloned())
            }
            FilterControl::Contains { column } => ManualFilter::contains(column.clone(), ""),
        }
    }
}

/// Suggests one control per column, in table column order.
#[instrument(skip_all, fields(columns = profile.len()))]
pub fn suggest_filters(table: &Table, profile: &TableProfile) -> Vec<FilterControl> {
    let mut controls = Vec::new();

    for column in profile.columns() {
        if column.missing_count == column.row_count {
            debug!(column = %column.column_name, "Skipping column without values");
            continue;
        }

        let control = match column.kind {
            ColumnKind::Numeric => match column.numeric_range {
                Some(range) => FilterControl::Range {
                    column: column.column_name.clone(),
                    min: range.min,
                    max: range.max,
                },
                None => continue,
            },
            ColumnKind::Categorical => {
                let Some(values) = table.distinct_values(&column.column_name) else {
                    continue;
                };
                let mut options: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                options.sort();
                FilterControl::Multiselect {
                    column: column.column_name.clone(),
                    options,
                }
            }
            ColumnKind::Text => FilterControl::Contains {
                column: column.column_name.clone(),
            },
        };
        controls.push(control);
    }

    controls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::filters::apply_filters;
    use crate::analyzers::profiler::ColumnProfiler;
    use crate::table::Value;
    use crate::test_fixtures::rainfall_table;

    #[test]
    fn test_controls_follow_column_kind() {
        let table = rainfall_table();
        let profile = ColumnProfiler::new().profile(&table);
        let controls = suggest_filters(&table, &profile);

        assert_eq!(controls.len(), 3);
        assert_eq!(
            controls[0],
            FilterControl::Multiselect {
                column: "state".to_string(),
                options: vec![
                    "Karnataka".to_string(),
                    "Kerala".to_string(),
                    "Maharashtra".to_string()
                ],
            }
        );
        assert_eq!(
            controls[1],
            FilterControl::Range {
                column: "year".to_string(),
                min: 2021.0,
                max: 2022.0
            }
        );
        assert_eq!(controls[2].column(), "rainfall_mm");
    }

    #[test]
    fn test_text_and_empty_columns() {
        let table = Table::from_rows(
            vec!["remarks".to_string(), "blank".to_string()],
            vec![
                vec![Value::from("heavy showers"), Value::Missing],
                vec![Value::from("dry spell"), Value::Missing],
            ],
        )
        .unwrap();
        let profile = ColumnProfiler::builder()
            .categorical_threshold(1)
            .build()
            .profile(&table);

        let controls = suggest_filters(&table, &profile);
        assert_eq!(
            controls,
            vec![FilterControl::Contains {
                column: "remarks".to_string()
            }]
        );
    }

    #[test]
    fn test_default_filters_keep_present_rows() {
        let table = rainfall_table();
        let profile = ColumnProfiler::new().profile(&table);
        let filters: Vec<_> = suggest_filters(&table, &profile)
            .iter()
            .map(FilterControl::default_filter)
            .collect();

        // Only the row with a missing rainfall value drops out.
        assert_eq!(apply_filters(&table, &filters).unwrap().num_rows(), 5);
    }

    #[test]
    fn test_control_serializes_with_tag() {
        let json = serde_json::to_value(FilterControl::Contains {
            column: "remarks".to_string(),
        })
        .unwrap();
        assert_eq!(json["control"], "contains");
        assert_eq!(json["column"], "remarks");
    }
}
