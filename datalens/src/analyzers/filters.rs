//! Keyword filter extraction and manual row filters.
//!
//! [`extract_filters`] turns a free-text question such as
//! `"rainfall in kerala 2010"` into equality filters by looking for column
//! values inside the query. Values of two characters or fewer are never
//! matched: short codes like `"UP"` would otherwise hit unrelated words.
//!
//! [`ManualFilter`] covers the explicit controls: pick values, pick a numeric
//! range, or search text.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::analyzers::profiler::{ColumnKind, ColumnProfiler, TableProfile};
use crate::error::{LensError, Result};
use crate::table::{Table, Value};

/// Candidates must be longer than this many characters to match.
pub const MIN_MATCH_LENGTH: usize = 2;

/// Equality filters extracted from a query, in table column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterMatch {
    matches: Vec<(String, Value)>,
}

impl FilterMatch {
    /// The matched value for a column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.matches
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.matches.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// An empty match means "apply no filter", not "no results".
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Keeps rows equal to every matched value, compared on string form.
    pub fn apply(&self, table: &Table) -> Table {
        let conditions: Vec<(usize, String)> = self
            .matches
            .iter()
            .filter_map(|(column, value)| Some((table.column_index(column)?, value.key()?)))
            .collect();

        table.retain_rows(|row| {
            conditions
                .iter()
                .all(|(idx, expected)| row[*idx].key().as_deref() == Some(expected.as_str()))
        })
    }
}

/// Finds columns whose values appear in a free-text query.
///
/// Profiles the table first; see [`extract_filters_with_profile`] to reuse a
/// profile that is already at hand.
///
/// ```rust
/// use datalens::analyzers::filters::extract_filters;
/// use datalens::table::{Table, Value};
///
/// let table = Table::from_rows(
///     vec!["state".to_string()],
///     vec![vec![Value::from("Kerala")], vec![Value::from("UP")]],
/// )
/// .unwrap();
///
/// let filters = extract_filters("rainfall in kerala 2010", &table);
/// assert_eq!(filters.get("state"), Some(&Value::from("Kerala")));
/// assert!(extract_filters("setup", &table).is_empty());
/// ```
pub fn extract_filters(query: &str, table: &Table) -> FilterMatch {
    let profile = ColumnProfiler::new().profile(table);
    extract_filters_with_profile(query, table, &profile)
}

/// Finds columns whose values appear in a free-text query, using the
/// column kinds of `profile`.
///
/// For each column in table order, the distinct values are tried in
/// first-seen order; a value matches when its string form is longer than
/// [`MIN_MATCH_LENGTH`] characters and occurs inside the lower-cased query.
/// Numeric columns match on the number as written, other columns match
/// ignoring case. The first match wins for that column. Every matching
/// column is kept.
#[instrument(skip(table, profile), fields(columns = table.num_columns()))]
pub fn extract_filters_with_profile(
    query: &str,
    table: &Table,
    profile: &TableProfile,
) -> FilterMatch {
    let query = query.to_lowercase();
    let mut matches = Vec::new();

    for (idx, column) in table.columns().iter().enumerate() {
        let kind = profile
            .get(column)
            .map_or(ColumnKind::Text, |column_profile| column_profile.kind);
        let candidate = |value: &Value| -> Option<String> {
            let key = value.key()?;
            match kind {
                ColumnKind::Numeric => Some(key),
                ColumnKind::Categorical | ColumnKind::Text => Some(key.to_lowercase()),
            }
        };

        let found = table.distinct_at(idx).into_iter().find(|value| {
            candidate(*value).is_some_and(|text| {
                text.chars().count() > MIN_MATCH_LENGTH && query.contains(&text)
            })
        });

        if let Some(value) = found {
            debug!(column = %column, value = %value, ?kind, "Query matched column value");
            matches.push((column.clone(), value.clone()));
        }
    }

    FilterMatch { matches }
}

/// Condition applied by a manual filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Predicate {
    /// Value is one of these, compared on string form
    OneOf(Vec<String>),
    /// Numeric value within the inclusive range
    Between(f64, f64),
    /// String form contains the needle, ignoring case
    Contains(String),
}

impl Predicate {
    fn matches(&self, value: &Value) -> bool {
        match self {
            Predicate::OneOf(allowed) => value
                .key()
                .is_some_and(|key| allowed.iter().any(|a| *a == key)),
            Predicate::Between(min, max) => value
                .as_f64()
                .is_some_and(|n| *min <= n && n <= *max),
            Predicate::Contains(needle) => value
                .key()
                .is_some_and(|key| key.to_lowercase().contains(&needle.to_lowercase())),
        }
    }
}

/// A user-chosen filter on one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManualFilter {
    pub column: String,
    pub predicate: Predicate,
}

impl ManualFilter {
    pub fn one_of<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column: column.into(),
            predicate: Predicate::OneOf(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn between(column: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            column: column.into(),
            predicate: Predicate::Between(min, max),
        }
    }

    pub fn contains(column: impl Into<String>, needle: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            predicate: Predicate::Contains(needle.into()),
        }
    }
}

/// Keeps rows that satisfy every filter.
pub fn apply_filters(table: &Table, filters: &[ManualFilter]) -> Result<Table> {
    let resolved = filters
        .iter()
        .map(|filter| {
            table
                .column_index(&filter.column)
                .map(|idx| (idx, &filter.predicate))
                .ok_or_else(|| LensError::column_not_found(&filter.column))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(table.retain_rows(|row| {
        resolved
            .iter()
            .all(|(idx, predicate)| predicate.matches(&row[*idx]))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::rainfall_table;

    fn states_table() -> Table {
        Table::from_rows(
            vec![
                "state".to_string(),
                "district".to_string(),
                "year".to_string(),
            ],
            vec![
                vec![Value::from("UP"), Value::from("Agra"), Value::Int(2010)],
                vec![Value::from("Kerala"), Value::from("Kollam"), Value::Int(2011)],
                vec![Value::from("Kerala"), Value::from("Idukki"), Value::Int(2010)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_profile_kinds_drive_matching() {
        let table = states_table();
        let profile = ColumnProfiler::new().profile(&table);
        assert_eq!(profile.get("year").unwrap().kind, ColumnKind::Numeric);

        let filters = extract_filters_with_profile("kerala in 2011", &table, &profile);
        assert_eq!(filters.get("state"), Some(&Value::from("Kerala")));
        assert_eq!(filters.get("year"), Some(&Value::Int(2011)));
        assert_eq!(filters, extract_filters("kerala in 2011", &table));

        // A profile without the column falls back to text matching.
        let empty = ColumnProfiler::new().profile(&Table::empty());
        let filters = extract_filters_with_profile("IDUKKI", &table, &empty);
        assert_eq!(filters.get("district"), Some(&Value::from("Idukki")));
    }

    #[test]
    fn test_case_insensitive_match() {
        let filters = extract_filters("Rainfall in KERALA", &states_table());
        assert_eq!(filters.len(), 1);
        assert_eq!(filters.get("state"), Some(&Value::from("Kerala")));
    }

    #[test]
    fn test_short_values_never_match() {
        // "up" is inside "groundwater update" but is only two characters.
        let filters = extract_filters("groundwater update", &states_table());
        assert!(filters.get("state").is_none());
    }

    #[test]
    fn test_multiple_columns_all_kept() {
        let filters = extract_filters("kerala idukki rainfall 2010", &states_table());
        assert_eq!(filters.get("state"), Some(&Value::from("Kerala")));
        assert_eq!(filters.get("district"), Some(&Value::from("Idukki")));
        assert_eq!(filters.get("year"), Some(&Value::Int(2010)));

        let columns: Vec<&str> = filters.iter().map(|(c, _)| c).collect();
        assert_eq!(columns, vec!["state", "district", "year"]);
    }

    #[test]
    fn test_first_match_wins_per_column() {
        let table = Table::from_rows(
            vec!["crop".to_string()],
            vec![vec![Value::from("Rice")], vec![Value::from("Wheat")]],
        )
        .unwrap();
        let filters = extract_filters("wheat and rice output", &table);
        assert_eq!(filters.get("crop"), Some(&Value::from("Rice")));
    }

    #[test]
    fn test_apply_match() {
        let table = states_table();
        let filters = extract_filters("kerala in 2010", &table);
        let filtered = filters.apply(&table);
        assert_eq!(filtered.num_rows(), 1);
        assert_eq!(filtered.value(0, "district"), Some(&Value::from("Idukki")));

        let nothing = extract_filters("no overlap", &table);
        assert_eq!(nothing.apply(&table), table);
    }

    #[test]
    fn test_manual_filters() {
        let table = rainfall_table();
        let filtered = apply_filters(
            &table,
            &[
                ManualFilter::one_of("state", ["Maharashtra", "Karnataka"]),
                ManualFilter::between("rainfall_mm", 700.0, 1000.0),
            ],
        )
        .unwrap();
        assert_eq!(filtered.num_rows(), 2);
        assert!(filtered
            .column("state")
            .unwrap()
            .all(|v| *v == Value::from("Maharashtra")));

        let searched =
            apply_filters(&table, &[ManualFilter::contains("state", "KAR")]).unwrap();
        assert_eq!(searched.num_rows(), 2);
    }

    #[test]
    fn test_manual_filter_unknown_column() {
        let err = apply_filters(&rainfall_table(), &[ManualFilter::contains("crop", "x")])
            .unwrap_err();
        assert!(matches!(err, LensError::ColumnNotFound { .. }));
    }

    #[test]
    fn test_between_skips_missing() {
        let filtered = apply_filters(
            &rainfall_table(),
            &[ManualFilter::between("rainfall_mm", f64::MIN, f64::MAX)],
        )
        .unwrap();
        assert_eq!(filtered.num_rows(), 5);
    }
}
