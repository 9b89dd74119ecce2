//! Loop sample ingestion from already-resampled CSV exports
//!
//! Expected layout: one header row, then one row per resample interval.
//! Columns are located by the header names in `[columns]`, so column order
//! and extra columns do not matter.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{info, warn};

use super::reading::{parse_reading, parse_timestamp};
use crate::config::ColumnNames;
use crate::error::SourceError;
use crate::types::Sample;

/// Positions of the logical columns within a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnIndex {
    time: usize,
    setpoint_primary: usize,
    measure_primary: usize,
    measure_secondary: usize,
    setpoint_secondary: Option<usize>,
    control_valve_secondary: usize,
}

impl ColumnIndex {
    fn locate(header: &[&str], names: &ColumnNames, path: &Path) -> Result<Self, SourceError> {
        let find = |name: &str| header.iter().position(|h| h.eq_ignore_ascii_case(name));
        let require = |name: &str| {
            find(name).ok_or_else(|| SourceError::MissingColumn(path.to_path_buf(), name.to_string()))
        };

        Ok(Self {
            time: require(names.time.as_str())?,
            setpoint_primary: require(names.setpoint_primary.as_str())?,
            measure_primary: require(names.measure_primary.as_str())?,
            measure_secondary: require(names.measure_secondary.as_str())?,
            setpoint_secondary: find(names.setpoint_secondary.as_str()),
            control_valve_secondary: require(names.control_valve_secondary.as_str())?,
        })
    }
}

fn split_fields(line: &str) -> Vec<&str> {
    line.split(',')
        .map(|f| f.trim().trim_matches('"').trim())
        .collect()
}

/// Read loop samples from a CSV file.
///
/// Rows with a bad timestamp or too few fields are skipped with a warning.
/// Unreadable value cells become the no-good-data sentinel.
pub fn read_csv_samples(path: &Path, names: &ColumnNames) -> Result<Vec<Sample>, SourceError> {
    let file = File::open(path).map_err(|e| SourceError::Io(path.to_path_buf(), e))?;
    let mut lines = BufReader::new(file).lines();

    let header_line = loop {
        match lines.next() {
            Some(Ok(line)) if line.trim().is_empty() => continue,
            Some(Ok(line)) => break line,
            Some(Err(e)) => return Err(SourceError::Io(path.to_path_buf(), e)),
            None => return Err(SourceError::EmptyFile(path.to_path_buf())),
        }
    };
    let header = split_fields(header_line.trim_start_matches('\u{feff}'));
    let index = ColumnIndex::locate(&header, names, path)?;
    let width = header.len();

    let mut samples = Vec::new();
    let mut skipped = 0usize;

    for (offset, line_result) in lines.enumerate() {
        let line_num = offset + 2;
        let line = match line_result {
            Ok(l) => l,
            Err(e) => {
                warn!(line = line_num, error = %e, "Error reading CSV line");
                skipped += 1;
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_row(&line, &index, width) {
            Ok(sample) => samples.push(sample),
            Err(e) => {
                warn!(line = line_num, error = %e, "Skipping malformed CSV row");
                skipped += 1;
            }
        }
    }

    if samples.is_empty() {
        return Err(SourceError::NoRows(path.to_path_buf()));
    }

    info!(
        count = samples.len(),
        skipped,
        path = %path.display(),
        "Loaded loop samples from CSV"
    );
    Ok(samples)
}

fn parse_row(line: &str, index: &ColumnIndex, width: usize) -> Result<Sample, String> {
    let fields = split_fields(line);
    if fields.len() != width {
        return Err(format!("expected {width} fields, got {}", fields.len()));
    }

    Ok(Sample {
        timestamp: parse_timestamp(fields[index.time])?,
        setpoint_primary: parse_reading(fields[index.setpoint_primary]),
        measure_primary: parse_reading(fields[index.measure_primary]),
        measure_secondary: parse_reading(fields[index.measure_secondary]),
        setpoint_secondary: index.setpoint_secondary.map(|i| parse_reading(fields[i])),
        control_valve_secondary: parse_reading(fields[index.control_valve_secondary]),
    })
}
