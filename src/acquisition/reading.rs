//! Reading normalization shared by the CSV reader and JSON deserialization
//!
//! Historian exports carry bad-quality values as text ("No Good Data",
//! "No Good"), empty cells or `null`. All of them become [`NO_GOOD_DATA`].

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer};

use crate::types::{normalize_reading, NO_GOOD_DATA, TIMESTAMP_FORMAT};

/// Naive timestamp formats accepted on input, tried in order.
const NAIVE_FORMATS: [&str; 2] = [TIMESTAMP_FORMAT, "%Y-%m-%dT%H:%M:%S"];

/// Parse one reading cell. Anything that is not a finite number is the sentinel.
pub fn parse_reading(text: &str) -> f64 {
    let trimmed = text.trim().trim_matches('"').trim();
    if trimmed.is_empty() || trimmed.to_ascii_lowercase().contains("no good") {
        return NO_GOOD_DATA;
    }
    trimmed.parse::<f64>().map_or(NO_GOOD_DATA, normalize_reading)
}

/// Parse a timestamp in one of the accepted formats.
///
/// RFC 3339 values keep their wall-clock time and drop the offset.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime, String> {
    let s = text.trim().trim_matches('"').trim();
    for format in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(ts);
        }
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.naive_local())
        .map_err(|e| format!("Cannot parse timestamp '{s}': {e}"))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawReading {
    Number(f64),
    Text(String),
}

impl RawReading {
    fn value(self) -> f64 {
        match self {
            Self::Number(v) => normalize_reading(v),
            Self::Text(s) => parse_reading(&s),
        }
    }
}

/// Deserialize a number, numeric string, text marker or `null` into a reading.
pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawReading>::deserialize(deserializer)?;
    Ok(raw.map_or(NO_GOOD_DATA, RawReading::value))
}

/// As [`deserialize`], but `null` means "not recorded".
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawReading>::deserialize(deserializer)?;
    Ok(raw.map(RawReading::value))
}

/// Serde adapter for sample timestamps.
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::types::TIMESTAMP_FORMAT;

    pub fn serialize<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        super::parse_timestamp(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sample;

    #[test]
    fn test_parse_reading_markers() {
        assert_eq!(parse_reading("512.5"), 512.5);
        assert_eq!(parse_reading(" \"48.0\" "), 48.0);
        assert_eq!(parse_reading("No Good Data"), NO_GOOD_DATA);
        assert_eq!(parse_reading("no good"), NO_GOOD_DATA);
        assert_eq!(parse_reading(""), NO_GOOD_DATA);
        assert_eq!(parse_reading("Bad Input"), NO_GOOD_DATA);
        assert_eq!(parse_reading("NaN"), NO_GOOD_DATA);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let a = parse_timestamp("2025-03-01 10:00:00").unwrap();
        let b = parse_timestamp("2025-03-01T10:00:00").unwrap();
        let c = parse_timestamp("2025-03-01T10:00:00+05:30").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert!(parse_timestamp("01/03/2025 10:00").is_err());
    }

    #[test]
    fn test_sample_json_normalization() {
        let json = r#"{
            "time": "2025-03-01 10:00:00",
            "setpointPrimary": "500",
            "measurePrimary": "No Good Data",
            "measureSecondary": null,
            "controlValveSecondary": 42.5
        }"#;
        let sample: Sample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.setpoint_primary, 500.0);
        assert_eq!(sample.measure_primary, NO_GOOD_DATA);
        assert_eq!(sample.measure_secondary, NO_GOOD_DATA);
        assert_eq!(sample.setpoint_secondary, None);
        assert_eq!(sample.control_valve_secondary, 42.5);
    }

    #[test]
    fn test_sample_json_requires_core_fields() {
        let json = r#"{"time": "2025-03-01 10:00:00", "setpointPrimary": 500}"#;
        assert!(serde_json::from_str::<Sample>(json).is_err());
    }

    #[test]
    fn test_sample_serializes_with_report_timestamp_format() {
        let json = r#"{
            "time": "2025-03-01T10:00:05",
            "setpointPrimary": 500,
            "measurePrimary": 501,
            "measureSecondary": 80,
            "controlValveSecondary": 50
        }"#;
        let sample: Sample = serde_json::from_str(json).unwrap();
        let out = serde_json::to_value(&sample).unwrap();
        assert_eq!(out["time"], "2025-03-01 10:00:05");
        assert!(out.get("setpointSecondary").is_none());
    }
}
