//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::Path;

use datalens::table::{Table, Value};
use serde_json::{json, Value as Json};

/// The state/year/rainfall rows used across the comparison tests.
pub fn rainfall_rows() -> Vec<Json> {
    vec![
        json!({"State": "Maharashtra", "Year": "2022", "Rainfall (mm)": "800"}),
        json!({"State": "Karnataka", "Year": "2022", "Rainfall (mm)": "650"}),
        json!({"State": "MAHARASHTRA ", "Year": "2021", "Rainfall (mm)": "900"}),
        json!({"State": "kerala", "Year": "2021", "Rainfall (mm)": "NA"}),
    ]
}

/// Wraps records in the upstream response envelope.
pub fn envelope(records: Vec<Json>) -> String {
    json!({
        "status": "ok",
        "total": records.len(),
        "records": records,
    })
    .to_string()
}

/// Writes an envelope as `<dir>/<resource_id>.json`.
pub fn write_resource(dir: &Path, resource_id: &str, records: Vec<Json>) {
    std::fs::write(dir.join(format!("{resource_id}.json")), envelope(records)).unwrap();
}

/// A state/year/rainfall table with typed values.
pub fn rainfall_table(rows: &[(&str, i64, Option<f64>)]) -> Table {
    Table::from_rows(
        vec!["state".into(), "year".into(), "rainfall_mm".into()],
        rows.iter()
            .map(|(state, year, rainfall)| {
                vec![Value::from(*state), Value::Int(*year), Value::from(*rainfall)]
            })
            .collect(),
    )
    .unwrap()
}

/// A crop/production table.
pub fn crop_table(rows: &[(&str, f64)]) -> Table {
    Table::from_rows(
        vec!["crop".into(), "production".into()],
        rows.iter()
            .map(|(crop, production)| vec![Value::from(*crop), Value::Float(*production)])
            .collect(),
    )
    .unwrap()
}
