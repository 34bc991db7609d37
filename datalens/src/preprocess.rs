//! Normalization applied to fetched tables before analysis.
//!
//! Upstream datasets arrive with display-style headers (`"Rainfall (mm)"`),
//! numbers encoded as strings and inconsistent casing of names. [`preprocess`]
//! turns them into tables the profiler and comparison engine can work with:
//!
//! - every dataset: column names become `snake_case` identifiers and text
//!   columns that hold only numbers become numeric
//! - rainfall datasets: `state` is trimmed and title-cased, `year` becomes an
//!   integer and `rainfall_mm` a number, with unparseable values missing

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::sources::DatasetKind;
use crate::table::{Table, Value};

static NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"[^a-z0-9]+").expect("Hard-coded regex pattern should be valid")
});

/// Normalizes a table according to its dataset kind.
#[instrument(skip(table), fields(rows = table.num_rows(), columns = table.num_columns()))]
pub fn preprocess(mut table: Table, kind: DatasetKind) -> Table {
    if table.is_empty() {
        warn!("Empty table passed to preprocessing");
        return table;
    }

    table.rename_columns(normalize_column_name);
    infer_numeric_columns(&mut table);

    if kind == DatasetKind::Rainfall {
        table.map_column_if_present("state", |v| match v {
            Value::Text(s) => Value::Text(title_case(s.trim())),
            other => other.clone(),
        });
        table.map_column_if_present("year", to_integer);
        table.map_column_if_present("rainfall_mm", Value::to_numeric);
    }

    debug!(columns = ?table.columns(), "Preprocessed table");
    table
}

/// Lower-cases a header and joins its words with `_`.
///
/// ```rust
/// use datalens::preprocess::normalize_column_name;
///
/// assert_eq!(normalize_column_name(" Rainfall (mm) "), "rainfall_mm");
/// assert_eq!(normalize_column_name("State Name"), "state_name");
/// ```
pub fn normalize_column_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    NON_ALPHANUMERIC
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}

/// Upper-cases the first letter of every word and lower-cases the rest.
///
/// A word starts after any character that is not a letter, so
/// `"jammu-kashmir"` becomes `"Jammu-Kashmir"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

fn to_integer(value: &Value) -> Value {
    match value.to_numeric() {
        Value::Float(f) => Value::Int(f.trunc() as i64),
        other => other,
    }
}

fn infer_numeric_columns(table: &mut Table) {
    let numeric: Vec<String> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(idx, _)| {
            let mut saw_text = false;
            let all_numbers = table.column_at(*idx).all(|value| match value {
                Value::Text(s) => {
                    saw_text = true;
                    Value::parse_number(s).is_some()
                }
                _ => true,
            });
            saw_text && all_numbers
        })
        .map(|(_, column)| column.clone())
        .collect();

    for column in numeric {
        debug!(column = %column, "Converting text column to numbers");
        table.map_column_if_present(&column, Value::to_numeric);
    }
}
