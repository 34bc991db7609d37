//! End-to-end tests: offline sources, sessions, filters and comparisons.

mod common;

use std::sync::Arc;

use datalens::prelude::*;
use serde_json::json;
use tempfile::TempDir;

fn offline_session(dir: &TempDir) -> Session {
    Session::new(Arc::new(JsonFileSource::new(dir.path())), 1000)
}

#[tokio::test]
async fn test_rainfall_comparison_from_offline_file() {
    let dir = TempDir::new().unwrap();
    common::write_resource(dir.path(), "rain", common::rainfall_rows());

    let mut session = offline_session(&dir);
    let entry = DatasetEntry::new("rainfall", "rain").with_kind(DatasetKind::Rainfall);
    assert!(session.select_dataset(&entry).await.is_loaded());

    let all_years = compare_states(session.current_table(), "Maharashtra", "Karnataka", None)
        .await
        .unwrap();
    let table = all_years.rows().unwrap();
    assert_eq!(table.num_rows(), 2);
    assert_eq!(table.value(0, "average_rainfall_mm"), Some(&Value::Float(850.0)));
    assert_eq!(table.value(1, "average_rainfall_mm"), Some(&Value::Float(650.0)));

    let kerala = compare_states(session.current_table(), "Kerala", "Goa", None)
        .await
        .unwrap();
    // Kerala has a row but its only reading is missing.
    assert_eq!(kerala.rows().unwrap().value(0, "average_rainfall_mm"), Some(&Value::Missing));
}

#[tokio::test]
async fn test_documented_single_year_example() {
    let table = common::rainfall_table(&[
        ("Maharashtra", 2022, Some(800.0)),
        ("Karnataka", 2022, Some(650.0)),
        ("Maharashtra", 2021, Some(900.0)),
    ]);

    let outcome = compare_states(&table, "Maharashtra", "Karnataka", Some(2022))
        .await
        .unwrap();
    let result = outcome.rows().unwrap();

    assert_eq!(result.columns(), &["state", "average_rainfall_mm"]);
    assert_eq!(result.value(0, "state"), Some(&Value::from("Maharashtra")));
    assert_eq!(result.value(0, "average_rainfall_mm"), Some(&Value::Float(800.0)));
    assert_eq!(result.value(1, "state"), Some(&Value::from("Karnataka")));
    assert_eq!(result.value(1, "average_rainfall_mm"), Some(&Value::Float(650.0)));
}

#[tokio::test]
async fn test_empty_table_comparison_does_not_fail() {
    let outcome = compare_states(&Table::empty(), "A", "B", None).await.unwrap();
    assert_eq!(outcome, Comparison::Empty(EmptyReason::EmptyInput));
}

#[tokio::test]
async fn test_dataset_comparison_from_catalog() {
    let dir = TempDir::new().unwrap();
    common::write_resource(
        dir.path(),
        "crops-2021",
        vec![
            json!({"Crop": "Rice", "Production (tonnes)": "100"}),
            json!({"Crop": "Wheat", "Production (tonnes)": "40"}),
        ],
    );
    common::write_resource(
        dir.path(),
        "crops-2022",
        vec![
            json!({"Crop": "Rice", "Production (tonnes)": "130"}),
            json!({"Crop": "Maize", "Production (tonnes)": "5"}),
        ],
    );
    let catalog = DatasetCatalog::from_json_str(
        r#"[
            {"name": "crops_2021", "resource_id": "crops-2021"},
            {"name": "crops_2022", "resource_id": "crops-2022"}
        ]"#,
    )
    .unwrap();

    let mut session = offline_session(&dir);
    session
        .select_dataset(catalog.get("crops_2021").unwrap())
        .await;
    let first = session.current_table().clone();
    session
        .select_dataset(catalog.get("crops_2022").unwrap())
        .await;
    let second = session.current_table().clone();

    let outcome = compare_datasets(&first, &second, None, None).await.unwrap();
    let result = outcome.rows().unwrap();

    assert_eq!(
        result.columns(),
        &["crop", "metric_a", "metric_b", "difference", "pct_change"]
    );
    let crops: Vec<String> = result
        .column("crop")
        .unwrap()
        .map(|v| v.to_string())
        .collect();
    assert_eq!(crops, vec!["Maize", "Rice", "Wheat"]);
    assert_eq!(result.value(0, "pct_change"), Some(&Value::Float(500.0)));
    assert_eq!(result.value(1, "difference"), Some(&Value::Float(30.0)));
    assert_eq!(result.value(2, "metric_b"), Some(&Value::Float(0.0)));

    let err = compare_datasets(&first, &second, None, Some("area"))
        .await
        .unwrap_err();
    assert!(err.is_user_facing());
    assert_eq!(
        err.to_string(),
        "Column 'area' is missing from the first dataset"
    );
}

#[tokio::test]
async fn test_missing_offline_file_is_recoverable() {
    let dir = TempDir::new().unwrap();
    let mut session = offline_session(&dir);

    let report = session
        .select_dataset(&DatasetEntry::new("ghost", "ghost"))
        .await;
    assert!(matches!(report, LoadReport::Failed(_)));
    assert!(session.current_table().is_empty());
}

#[tokio::test]
async fn test_query_filter_and_csv_export() {
    let dir = TempDir::new().unwrap();
    common::write_resource(dir.path(), "rain", common::rainfall_rows());

    let mut session = offline_session(&dir);
    let entry = DatasetEntry::new("rainfall", "rain").with_kind(DatasetKind::Rainfall);
    session.select_dataset(&entry).await;

    let (filters, filtered) = session.query("rainfall in maharashtra during 2021");
    assert_eq!(filters.get("state"), Some(&Value::from("Maharashtra")));
    assert_eq!(filters.get("year"), Some(&Value::Int(2021)));
    assert_eq!(filtered.num_rows(), 1);

    let path = dir.path().join("filtered.csv");
    filtered
        .write_csv(std::fs::File::create(&path).unwrap())
        .unwrap();
    let csv = std::fs::read_to_string(&path).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("state,year,rainfall_mm"));
    assert_eq!(lines.next(), Some("Maharashtra,2021,900"));
    assert_eq!(lines.next(), None);
}

#[tokio::test]
async fn test_suggested_filters_drive_manual_filtering() {
    let table = common::rainfall_table(&[
        ("Goa", 2020, Some(2900.0)),
        ("Assam", 2020, Some(2300.0)),
        ("Goa", 2021, None),
    ]);
    let profile = ColumnProfiler::new().profile(&table);
    let controls = suggest_filters(&table, &profile);
    assert_eq!(controls.len(), 3);

    let filtered = apply_filters(
        &table,
        &[
            ManualFilter::one_of("state", ["Goa"]),
            ManualFilter::between("year", 2020.0, 2020.0),
        ],
    )
    .unwrap();
    assert_eq!(filtered.num_rows(), 1);
    assert_eq!(filtered.value(0, "rainfall_mm"), Some(&Value::Float(2900.0)));
}
