//! Small tables shared by unit tests.

use serde_json::json;

use crate::table::{Table, Value};

/// Six state/year/rainfall rows over three states, with one missing reading.
///
/// | state       | year | rainfall_mm |
/// |-------------|------|-------------|
/// | Maharashtra | 2022 | 800.0       |
/// | Karnataka   | 2022 | 650.0       |
/// | Maharashtra | 2021 | 900.0       |
/// | Kerala      | 2022 | 3000.5      |
/// | Karnataka   | 2021 | (missing)   |
/// | Kerala      | 2021 | 2800.0      |
pub fn rainfall_table() -> Table {
    let rows = [
        ("Maharashtra", 2022, Some(800.0)),
        ("Karnataka", 2022, Some(650.0)),
        ("Maharashtra", 2021, Some(900.0)),
        ("Kerala", 2022, Some(3000.5)),
        ("Karnataka", 2021, None),
        ("Kerala", 2021, Some(2800.0)),
    ];

    Table::from_rows(
        vec![
            "state".to_string(),
            "year".to_string(),
            "rainfall_mm".to_string(),
        ],
        rows.iter()
            .map(|(state, year, rainfall)| {
                vec![Value::from(*state), Value::Int(*year), Value::from(*rainfall)]
            })
            .collect(),
    )
    .expect("rainfall fixture is well formed")
}

/// A two-column crop table from `(crop, production)` pairs.
pub fn crop_table(rows: &[(&str, f64)]) -> Table {
    Table::from_rows(
        vec!["crop".to_string(), "production".to_string()],
        rows.iter()
            .map(|(crop, production)| vec![Value::from(*crop), Value::Float(*production)])
            .collect(),
    )
    .expect("crop fixture is well formed")
}

/// An API response body as the upstream service sends it: raw headers, string
/// numbers and a sentinel for a missing reading.
pub fn raw_rainfall_body() -> String {
    json!({
        "status": "ok",
        "total": 3,
        "records": [
            {"State": " MAHARASHTRA ", "Year": "2022", "Rainfall (mm)": "800"},
            {"State": "karnataka", "Year": "2022", "Rainfall (mm)": "650.5"},
            {"State": "kerala", "Year": "2021", "Rainfall (mm)": "NA"}
        ]
    })
    .to_string()
}
