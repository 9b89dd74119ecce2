//! CSV Replay Integration Tests
//!
//! Writes historian-style CSV exports to temp files, loads them through the
//! acquisition layer and evaluates the result end to end.

use std::fmt::Write as _;
use std::io::Write;

use cascade_tuner::acquisition::read_csv_samples;
use cascade_tuner::config::ColumnNames;
use cascade_tuner::{
    CascadeGains, EvaluateError, GainSet, IssueKind, SourceError, TuningEngine, NO_GOOD_DATA,
};

const HEADER: &str =
    "time,setpointPrimary,measureValuePrimary,measureValueSecondary,controlvalveSecondary";

fn write_csv(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// `rows` samples at 10 s, measured from `measured(i)`.
fn export(rows: usize, measured: impl Fn(usize) -> String) -> String {
    let mut text = format!("{HEADER}\n");
    for i in 0..rows {
        let _ = writeln!(
            text,
            "2025-06-01 09:{:02}:{:02},500,{},80.0,50.0",
            i / 6,
            (i % 6) * 10,
            measured(i)
        );
    }
    text
}

fn gains() -> CascadeGains {
    CascadeGains::new(GainSet::new(1.0, 0.5, 0.2), GainSet::new(0.8, 0.4, 0.1))
}

#[test]
fn test_no_good_cells_load_as_sentinel() {
    let file = write_csv(&export(12, |i| match i {
        3 => "No Good Data".to_string(),
        4 => String::new(),
        _ => "500.0".to_string(),
    }));

    let samples = read_csv_samples(file.path(), &ColumnNames::default()).unwrap();
    assert_eq!(samples.len(), 12);
    assert_eq!(samples[3].measure_primary, NO_GOOD_DATA);
    assert_eq!(samples[4].measure_primary, NO_GOOD_DATA);
    assert_eq!(samples[5].measure_primary, 500.0);
    assert_eq!(samples[0].setpoint_secondary, None);
}

#[test]
fn test_malformed_rows_are_skipped() {
    let mut text = export(10, |_| "500.0".to_string());
    text.push_str("not-a-time,500,500,80,50\n");
    text.push_str("2025-06-01 09:59:00,500,500\n");
    text.push('\n');

    let file = write_csv(&text);
    let samples = read_csv_samples(file.path(), &ColumnNames::default()).unwrap();
    assert_eq!(samples.len(), 10);
}

#[test]
fn test_custom_header_names_and_column_order() {
    let text = "\u{feff}Valve,Stamp,SP,PV,Inner,InnerSP\n\
                48.0,2025-06-01T09:00:00,540,541.5,80,82\n\
                49.0,2025-06-01T09:00:10,540,539.5,81,82\n";
    let names = ColumnNames {
        time: "Stamp".to_string(),
        setpoint_primary: "SP".to_string(),
        measure_primary: "PV".to_string(),
        measure_secondary: "Inner".to_string(),
        setpoint_secondary: "InnerSP".to_string(),
        control_valve_secondary: "Valve".to_string(),
    };

    let file = write_csv(text);
    let samples = read_csv_samples(file.path(), &names).unwrap();
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[1].measure_primary, 539.5);
    assert_eq!(samples[1].control_valve_secondary, 49.0);
    assert_eq!(samples[0].setpoint_secondary, Some(82.0));
}

#[test]
fn test_missing_column_is_reported() {
    let file = write_csv("time,setpointPrimary,measureValuePrimary\n2025-06-01 09:00:00,1,2\n");
    let err = read_csv_samples(file.path(), &ColumnNames::default()).unwrap_err();
    assert!(matches!(err, SourceError::MissingColumn(_, ref c) if c == "measureValueSecondary"));

    let as_eval: EvaluateError = err.into();
    assert!(matches!(as_eval, EvaluateError::InsufficientData(_)));
}

#[test]
fn test_header_only_file_has_no_rows() {
    let file = write_csv(&format!("{HEADER}\n"));
    let err = read_csv_samples(file.path(), &ColumnNames::default()).unwrap_err();
    assert!(matches!(err, SourceError::NoRows(_)));

    let empty = write_csv("");
    let err = read_csv_samples(empty.path(), &ColumnNames::default()).unwrap_err();
    assert!(matches!(err, SourceError::EmptyFile(_)));
}

#[test]
fn test_replayed_offset_window_reports_settling() {
    let file = write_csv(&export(120, |i| {
        if i == 60 {
            "No Good".to_string()
        } else {
            "530.0".to_string()
        }
    }));

    let samples = read_csv_samples(file.path(), &ColumnNames::default()).unwrap();
    let report = TuningEngine::default().evaluate_samples(samples, &gains()).unwrap();

    assert_eq!(report.issue, Some(IssueKind::Settling));
    // The bad sample is neither flagged nor charted.
    assert!((report.issue_percentages.settling - 119.0 / 120.0 * 100.0).abs() < 1e-9);
    assert!(report.series.measured_output[60].is_none());
    assert!(report.series.issue_points.unwrap()[60].is_none());
}
