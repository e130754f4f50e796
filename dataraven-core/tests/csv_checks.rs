//! CSV checks read from files on disk.

#![allow(clippy::unwrap_used)]
#![allow(clippy::float_cmp)]

use dataraven_core::{
    CsvTable, DataRavenError,
    quality::{CheckSuite, CsvCheck, NoopLogger, TestResult},
};
use proptest::prelude::*;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

const CONTACTS: &str = "\
first_name,last_name,email,country
Ada,Lovelace,ada@example.com,UK
Alan,Turing,,UK
Grace,Hopper,grace@example.com,US
Ada,Lovelace,ada@example.com,UK
";

fn write_csv(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn test_csv_null_check_from_file() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "contacts.csv", CONTACTS);

    let check = CsvCheck::null(&path, 0.25, ["email", "country"]).unwrap();
    let results = check.run(&NoopLogger).unwrap();

    assert_eq!(results.get("email").unwrap().measure, Some(0.25));
    assert_eq!(results.get("email").unwrap().result, TestResult::Pass);
    assert_eq!(results.get("country").unwrap().measure, Some(0.0));
}

#[test]
fn test_csv_duplicate_and_set_duplicate() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "contacts.csv", CONTACTS);

    let check = CsvCheck::duplicate(&path, 0.0, ["country"]).unwrap();
    let results = check.run(&NoopLogger).unwrap();
    assert_eq!(results.get("country").unwrap().measure, Some(0.5));
    assert_eq!(results.get("country").unwrap().result, TestResult::Fail);

    let check = CsvCheck::set_duplicate(&path, 0.25, ["first_name", "last_name"]).unwrap();
    let results = check.run(&NoopLogger).unwrap();
    let outcome = results.get("first_name,last_name").unwrap();
    assert_eq!(outcome.measure, Some(0.25));
    assert_eq!(outcome.result, TestResult::Pass);
}

#[test]
fn test_csv_header_only_file_fails() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "empty.csv", "first_name,last_name\n");

    let check = CsvCheck::null(&path, 1.0, ["first_name"]).unwrap();
    let results = check.run(&NoopLogger).unwrap();

    let outcome = results.get("first_name").unwrap();
    assert_eq!(outcome.measure, None);
    assert_eq!(outcome.result, TestResult::Fail);
}

#[test]
fn test_csv_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let check = CsvCheck::null(dir.path().join("absent.csv"), 0.1, ["a"]).unwrap();

    let err = check.run(&NoopLogger).unwrap_err();
    assert!(matches!(err, DataRavenError::Io { .. }));
}

#[test]
fn test_csv_raise_on_fail() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "contacts.csv", CONTACTS);

    let check = CsvCheck::duplicate(&path, 0.0, ["first_name", "country"])
        .unwrap()
        .raise_on_fail(true);
    let err = check.run(&NoopLogger).unwrap_err();

    let failures = err.failures().unwrap();
    assert_eq!(failures.len(), 2);
    assert!(err.to_string().contains("country"));
}

#[tokio::test]
async fn test_csv_suite_runs_without_database() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "contacts.csv", CONTACTS);

    let json = serde_json::json!({
        "checks": [
            {"type": "csv_null", "path": path, "columns": ["first_name"], "threshold": 0},
            {"type": "csv_set_duplicate", "path": path,
             "columns": ["first_name", "last_name", "email"], "threshold": {"first_name,last_name,email": 0.3}}
        ]
    });
    let checks = CheckSuite::from_json(&json.to_string())
        .unwrap()
        .build()
        .unwrap();

    for check in &checks {
        assert!(!check.needs_sql_source());
        let results = check.run(None, &NoopLogger).await.unwrap();
        assert!(results.all_passed());
    }
}

// =============================================================================
// Measure bounds
// =============================================================================

fn table_strategy() -> impl Strategy<Value = Vec<(Option<String>, Option<String>)>> {
    let field = prop::option::of("[a-c]{1,2}");
    prop::collection::vec((field.clone(), field), 0..40)
}

fn to_csv(rows: &[(Option<String>, Option<String>)]) -> String {
    let mut text = String::from("a,b\n");
    for (a, b) in rows {
        text.push_str(&format!(
            "{},{}\n",
            a.as_deref().unwrap_or(""),
            b.as_deref().unwrap_or("")
        ));
    }
    text
}

proptest! {
    #[test]
    fn prop_measures_are_bounded(rows in table_strategy()) {
        let table = CsvTable::from_reader(to_csv(&rows).as_bytes()).unwrap();
        prop_assert_eq!(table.len(), rows.len());

        let measures = [
            table.null_proportion("a").unwrap(),
            table.duplicate_proportion("b").unwrap(),
            table.set_duplication(&["a", "b"]).unwrap(),
        ];

        for measure in measures {
            match measure {
                Some(value) => prop_assert!((0.0..=1.0).contains(&value), "{} out of bounds", value),
                None => prop_assert!(rows.is_empty()),
            }
        }
    }

    #[test]
    fn prop_null_proportion_counts_empty_fields(rows in table_strategy()) {
        prop_assume!(!rows.is_empty());
        let table = CsvTable::from_reader(to_csv(&rows).as_bytes()).unwrap();

        let nulls = rows.iter().filter(|(a, _)| a.is_none()).count();
        let expected = nulls as f64 / rows.len() as f64;
        let measure = table.null_proportion("a").unwrap().unwrap();
        prop_assert!((measure - expected).abs() < 1e-9);
    }
}
