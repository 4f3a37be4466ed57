use std::path::Path;

use droidcov::error::DroidcovError;
use droidcov::model::CoverageRecord;
use droidcov::report;

#[test]
fn parse_full_jacoco_report() {
    let input = include_bytes!("fixtures/jacoco_report.xml");
    let record = report::parse_counters(input).unwrap();

    // Report-level totals, not the last class or package.
    assert!(record.valid);
    assert_eq!(record.line, 70.59);
    assert_eq!(record.branch, 62.5);
    assert_eq!(record.method, 66.67);
    assert_eq!(record.class, 50.0);
    assert_eq!(record.columns(), ["70.59", "62.50", "66.67", "50.00"]);
}

#[test]
fn read_report_from_disk() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/jacoco_report.xml");
    let record = report::read_report(&path);
    assert!(record.valid);
    assert_eq!(record.line, 70.59);
}

#[test]
fn mismatched_report_is_invalid() {
    let input = include_bytes!("fixtures/mismatched_report.xml");
    let err = report::parse_counters(input).unwrap_err();
    assert!(
        err.to_string().contains("position"),
        "Error should contain position info: {err}",
    );

    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/mismatched_report.xml");
    let record = report::read_report(&path);
    assert!(!record.valid);
    assert_eq!(record.line, 0.0);
    assert_eq!(record.branch, 0.0);
}

#[test]
fn truncated_report_is_invalid() {
    // Cut off inside <package>: the last counters seen are package totals.
    let input = include_bytes!("fixtures/truncated_report.xml");
    let err = report::parse_counters(input).unwrap_err();
    assert!(matches!(err, DroidcovError::Parse(_)), "{err}");

    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/truncated_report.xml");
    let record = report::read_report(&path);
    assert!(!record.valid);
    assert_eq!(record, CoverageRecord::invalid());
}

#[test]
fn missing_report_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let record = report::read_report(&dir.path().join("coverage_report.xml"));
    assert!(!record.valid);
}
