//! In-memory tabular data.
//!
//! A [`Table`] is an ordered list of rows over a fixed list of named columns.
//! Each cell holds a [`Value`]: a string, an integer, a float, or missing.
//! Tables are built from the upstream JSON `records` array, converted to Arrow
//! record batches when an aggregation needs DataFusion, and converted back
//! from the query results.
//!
//! ```rust
//! use datalens::table::{Table, Value};
//!
//! let mut table = Table::new(vec!["state".to_string(), "rainfall_mm".to_string()]);
//! table.push_row(vec![Value::from("Kerala"), Value::Float(3055.0)]).unwrap();
//!
//! assert_eq!(table.num_rows(), 1);
//! assert_eq!(table.value(0, "state"), Some(&Value::from("Kerala")));
//! ```

mod arrow_bridge;
mod export;

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::error::{LensError, Result};

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// No value (JSON null, absent key, or NaN)
    Missing,
    /// Integer number
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Free text
    Text(String),
}

impl Value {
    /// Converts a JSON value from an upstream record.
    ///
    /// Booleans, arrays and objects have no column type of their own and are
    /// kept as their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Missing,
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map_or(Value::Missing, Value::Float),
            },
            serde_json::Value::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }

    /// Parses a string as a number, preferring integers.
    ///
    /// Returns `None` for anything that is not a finite number.
    pub fn parse_number(text: &str) -> Option<Value> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Some(Value::Int(i));
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => Some(Value::Float(f)),
            _ => None,
        }
    }

    /// Returns true for missing values, including NaN floats.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Returns true for integers and non-NaN floats.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_)) || matches!(self, Value::Float(f) if !f.is_nan())
    }

    /// The numeric value, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) if !f.is_nan() => Some(*f),
            _ => None,
        }
    }

    /// The text, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Coerces to a number, turning unparseable text into a missing value.
    pub fn to_numeric(&self) -> Value {
        match self {
            Value::Int(_) => self.clone(),
            Value::Float(f) if !f.is_nan() => self.clone(),
            Value::Text(s) => Value::parse_number(s).unwrap_or(Value::Missing),
            _ => Value::Missing,
        }
    }

    /// The string form used for grouping, distinct counting and matching.
    ///
    /// Missing values have no key, and `-0.0` shares the key of `0.0`.
    pub fn key(&self) -> Option<String> {
        match self {
            _ if self.is_missing() => None,
            Value::Float(f) if *f == 0.0 => Some("0".to_string()),
            _ => Some(self.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) if v.is_nan() => Ok(()),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Missing, Into::into)
    }
}

/// An ordered collection of rows over named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Creates a table with the given columns and no rows.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Creates a table with no columns and no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a table from columns and rows, checking that they line up.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(LensError::InvalidTable(format!(
                    "duplicate column '{column}'"
                )));
            }
        }

        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Builds a table from JSON objects.
    ///
    /// Columns appear in the order their keys are first seen; a record without
    /// a key holds a missing value for that column.
    pub fn from_json_records(records: &[serde_json::Map<String, serde_json::Value>]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for record in records {
            for key in record.keys() {
                if seen.insert(key.as_str()) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| record.get(column).map_or(Value::Missing, Value::from_json))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Appends a row. The row must have one value per column.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(LensError::InvalidTable(format!(
                "row has {} values but the table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Column names in display order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// All rows, in order.
    pub fn rows(&self) -> impl Iterator<Item = &[Value]> + '_ {
        self.rows.iter().map(Vec::as_slice)
    }

    /// The values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Some(self.column_at(idx))
    }

    pub(crate) fn column_at(&self, idx: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// The value at a row and column, if both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Distinct non-missing values of a column in first-seen order.
    ///
    /// Values are compared on their string form, so `Int(1)` and `Text("1")`
    /// count as the same value.
    pub fn distinct_values(&self, column: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(column)?;
        Some(self.distinct_at(idx))
    }

    pub(crate) fn distinct_at(&self, idx: usize) -> Vec<&Value> {
        let mut seen = HashSet::new();
        self.column_at(idx)
            .filter(|value| match value.key() {
                Some(key) => seen.insert(key),
                None => false,
            })
            .collect()
    }

    /// A new table holding the rows for which `keep` returns true.
    pub fn retain_rows<F>(&self, keep: F) -> Table
    where
        F: Fn(&[Value]) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| keep(row.as_slice()))
                .cloned()
                .collect(),
        }
    }

    /// Renames every column through `rename`.
    ///
    /// A name that collides with an earlier column gets a numeric suffix.
    pub fn rename_columns<F>(&mut self, rename: F)
    where
        F: Fn(&str) -> String,
    {
        let mut seen = HashSet::new();
        for column in &mut self.columns {
            let base = rename(column);
            let mut candidate = base.clone();
            let mut suffix = 2;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{base}_{suffix}");
                suffix += 1;
            }
            *column = candidate;
        }
    }

    /// Replaces every value of a column with `f(value)`.
    ///
    /// Returns `false` and leaves the table untouched when the column does
    /// not exist.
    pub fn map_column_if_present<F>(&mut self, column: &str, f: F) -> bool
    where
        F: Fn(&Value) -> Value,
    {
        let Some(idx) = self.column_index(column) else {
            return false;
        };
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
        true
    }

    /// Keeps at most the first `len` rows.
    pub fn truncate(&mut self, len: usize) {
        self.rows.truncate(len);
    }

    /// Sorts rows in place with a comparator over whole rows.
    pub fn sort_rows_by<F>(&mut self, compare: F)
    where
        F: FnMut(&Vec<Value>, &Vec<Value>) -> std::cmp::Ordering,
    {
        self.rows.sort_by(compare);
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pretty() {
            Ok(rendered) => f.write_str(&rendered),
            Err(e) => write!(f, "<unprintable table: {e}>"),
        }
    }
}
