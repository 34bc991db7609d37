//! Column profiling.
//!
//! The profiler makes one pass over each column and records:
//!
//! - the declared type observed in the values (`Integer`, `Double`, `String`,
//!   `Mixed`, or `Unknown` when nothing but missing values were seen)
//! - a [`ColumnKind`] tag (`Numeric`, `Categorical`, `Text`) that downstream
//!   code dispatches on instead of re-inspecting values
//! - distinct and missing counts
//! - up to `max_samples` distinct sample values, in first-seen order
//! - the numeric range, for numeric columns
//!
//! Mixed-type columns never fail: their values are compared on their string
//! form for counting and sampling.
//!
//! # Example
//!
//! ```rust
//! use datalens::analyzers::profiler::{ColumnKind, ColumnProfiler};
//! use datalens::table::{Table, Value};
//!
//! let table = Table::from_rows(
//!     vec!["state".to_string(), "rainfall_mm".to_string()],
//!     vec![
//!         vec![Value::from("Kerala"), Value::Float(3055.0)],
//!         vec![Value::from("Goa"), Value::Missing],
//!     ],
//! )
//! .unwrap();
//!
//! let profile = ColumnProfiler::new().profile(&table);
//! let rainfall = profile.get("rainfall_mm").unwrap();
//! assert_eq!(rainfall.kind, ColumnKind::Numeric);
//! assert_eq!(rainfall.missing_count, 1);
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{LensError, Result};
use crate::table::{Table, Value};

/// Configuration for the profiler
#[derive(Debug, Clone)]
pub struct ProfilerConfig {
    /// Maximum distinct count for a string column to count as categorical
    pub categorical_threshold: usize,
    /// Maximum number of sample values kept per column
    pub max_samples: usize,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            categorical_threshold: 100,
            max_samples: 10,
        }
    }
}

/// Detected data type for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectedDataType {
    /// Integer numbers only
    Integer,
    /// Floating point numbers, possibly mixed with integers
    Double,
    /// String values only
    String,
    /// Strings mixed with numbers
    Mixed,
    /// No non-missing values to judge from
    Unknown,
}

/// How a column is treated by filtering and comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Numbers; filtered by range, usable as a metric
    Numeric,
    /// Few distinct values; filtered by picking values
    Categorical,
    /// Free text; filtered by substring search
    Text,
}

/// Inclusive numeric bounds of a column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

/// Profile of a single column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub column_name: String,
    pub data_type: DetectedDataType,
    pub kind: ColumnKind,
    pub row_count: usize,
    pub distinct_count: usize,
    pub missing_count: usize,
    pub sample_values: Vec<Value>,
    pub numeric_range: Option<NumericRange>,
}

impl ColumnProfile {
    /// Fraction of rows with a missing value; 0 for an empty column.
    pub fn missing_ratio(&self) -> f64 {
        if self.row_count == 0 {
            0.0
        } else {
            self.missing_count as f64 / self.row_count as f64
        }
    }
}

/// Profiles of every column of a table, in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableProfile {
    pub row_count: usize,
    columns: Vec<ColumnProfile>,
}

impl TableProfile {
    /// The profile of a column by name.
    pub fn get(&self, column: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|p| p.column_name == column)
    }

    /// All column profiles, in table column order.
    pub fn columns(&self) -> &[ColumnProfile] {
        &self.columns
    }

    /// The first column whose kind is numeric.
    pub fn first_numeric(&self) -> Option<&ColumnProfile> {
        self.columns.iter().find(|p| p.kind == ColumnKind::Numeric)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Builder for ColumnProfiler
pub struct ColumnProfilerBuilder {
    config: ProfilerConfig,
}

impl ColumnProfilerBuilder {
    /// Set the distinct-count ceiling for categorical columns
    pub fn categorical_threshold(mut self, threshold: usize) -> Self {
        self.config.categorical_threshold = threshold;
        self
    }

    /// Set how many sample values to keep per column
    pub fn max_samples(mut self, max_samples: usize) -> Self {
        self.config.max_samples = max_samples;
        self
    }

    /// Build the ColumnProfiler
    pub fn build(self) -> ColumnProfiler {
        ColumnProfiler {
            config: self.config,
        }
    }
}

/// Computes column profiles for tables.
#[derive(Debug, Clone)]
pub struct ColumnProfiler {
    config: ProfilerConfig,
}

impl Default for ColumnProfiler {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnProfiler {
    /// Create a new builder for ColumnProfiler
    pub fn builder() -> ColumnProfilerBuilder {
        ColumnProfilerBuilder {
            config: ProfilerConfig::default(),
        }
    }

    /// Create a ColumnProfiler with default configuration
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    /// Profile every column of a table. A table without columns yields an
    /// empty profile.
    #[instrument(skip_all, fields(rows = table.num_rows(), columns = table.num_columns()))]
    pub fn profile(&self, table: &Table) -> TableProfile {
        let columns: Vec<ColumnProfile> = (0..table.num_columns())
            .map(|idx| self.profile_index(table, idx))
            .collect();

        info!(
            numeric = columns.iter().filter(|p| p.kind == ColumnKind::Numeric).count(),
            categorical = columns
                .iter()
                .filter(|p| p.kind == ColumnKind::Categorical)
                .count(),
            "Completed table profiling"
        );

        TableProfile {
            row_count: table.num_rows(),
            columns,
        }
    }

    /// Profile a single column by name.
    pub fn profile_column(&self, table: &Table, column: &str) -> Result<ColumnProfile> {
        let idx = table
            .column_index(column)
            .ok_or_else(|| LensError::column_not_found(column))?;
        Ok(self.profile_index(table, idx))
    }

    fn profile_index(&self, table: &Table, idx: usize) -> ColumnProfile {
        let column_name = table.columns()[idx].clone();
        let mut stats = ColumnStats::default();

        for value in table.column_at(idx) {
            stats.observe(value, self.config.max_samples);
        }

        let data_type = stats.data_type();
        let kind = match data_type {
            DetectedDataType::Integer | DetectedDataType::Double => ColumnKind::Numeric,
            DetectedDataType::Unknown => ColumnKind::Text,
            DetectedDataType::String | DetectedDataType::Mixed => {
                if stats.distinct.len() <= self.config.categorical_threshold {
                    ColumnKind::Categorical
                } else {
                    ColumnKind::Text
                }
            }
        };
        let numeric_range = match (kind, stats.min, stats.max) {
            (ColumnKind::Numeric, Some(min), Some(max)) => Some(NumericRange { min, max }),
            _ => None,
        };

        debug!(
            column = %column_name,
            ?data_type,
            ?kind,
            distinct = stats.distinct.len(),
            missing = stats.missing,
            "Profiled column"
        );

        ColumnProfile {
            column_name,
            data_type,
            kind,
            row_count: table.num_rows(),
            distinct_count: stats.distinct.len(),
            missing_count: stats.missing,
            sample_values: stats.samples,
            numeric_range,
        }
    }
}

/// Running statistics for one column.
#[derive(Default)]
struct ColumnStats {
    missing: usize,
    saw_int: bool,
    saw_float: bool,
    saw_text: bool,
    distinct: HashSet<String>,
    samples: Vec<Value>,
    min: Option<f64>,
    max: Option<f64>,
}

impl ColumnStats {
    fn observe(&mut self, value: &Value, max_samples: usize) {
        let Some(key) = value.key() else {
            self.missing += 1;
            return;
        };

        match value {
            Value::Int(_) => self.saw_int = true,
            Value::Float(_) => self.saw_float = true,
            _ => self.saw_text = true,
        }

        if let Some(n) = value.as_f64() {
            self.min = Some(self.min.map_or(n, |m| m.min(n)));
            self.max = Some(self.max.map_or(n, |m| m.max(n)));
        }

        if self.distinct.insert(key) && self.samples.len() < max_samples {
            self.samples.push(value.clone());
        }
    }

    fn data_type(&self) -> DetectedDataType {
        match (self.saw_int, self.saw_float, self.saw_text) {
            (false, false, false) => DetectedDataType::Unknown,
            (_, _, true) if self.saw_int || self.saw_float => DetectedDataType::Mixed,
            (_, _, true) => DetectedDataType::String,
            (_, true, false) => DetectedDataType::Double,
            (true, false, false) => DetectedDataType::Integer,
        }
    }
}
