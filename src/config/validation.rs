//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use serde::Serialize;
use std::collections::HashSet;

use super::TunerConfig;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone, Serialize)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for TunerConfig.
///
/// Maintained by hand to match the struct hierarchy in tuner_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [plant]
        "plant",
        "plant.name",
        "plant.units",
        // [detection]
        "detection",
        "detection.settling_tolerance",
        "detection.oscillation_window",
        "detection.oscillation_percentile",
        // [aggregation]
        "aggregation",
        "aggregation.no_issue_floor_percent",
        // [simulation]
        "simulation",
        "simulation.dt",
        "simulation.process_gain",
        "simulation.integral_limit",
        // [mapping]
        "mapping",
        "mapping.secondary_setpoint",
        // [columns]
        "columns",
        "columns.time",
        "columns.setpoint_primary",
        "columns.measure_primary",
        "columns.measure_secondary",
        "columns.setpoint_secondary",
        "columns.control_valve_secondary",
        // [server]
        "server",
        "server.addr",
        "server.max_body_bytes",
    ];
    keys.iter().copied().collect()
}

/// Recursively collect dotted key paths from a TOML value.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Edit distance between two strings, counted in chars.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the lexicographically smaller key so output is stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// Never fails on unknown keys, only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Validate ranges on a parsed TunerConfig.
///
/// Returns (errors, warnings). Errors are values the detectors or simulator
/// cannot work with; warnings are legal but unusual.
pub fn validate_ranges(config: &TunerConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let d = &config.detection;
    if !(d.settling_tolerance > 0.0 && d.settling_tolerance < 1.0) {
        errors.push(format!(
            "detection.settling_tolerance = {} must be in (0, 1)",
            d.settling_tolerance
        ));
    } else if d.settling_tolerance > 0.2 {
        warnings.push(ValidationWarning {
            field: "detection.settling_tolerance".to_string(),
            message: format!(
                "detection.settling_tolerance = {:.3} is a very wide band (over ±20 %)",
                d.settling_tolerance
            ),
            suggestion: None,
        });
    }

    if d.oscillation_window < 2 {
        errors.push(format!(
            "detection.oscillation_window = {} must be >= 2",
            d.oscillation_window
        ));
    }

    if !(d.oscillation_percentile > 0.0 && d.oscillation_percentile < 1.0) {
        errors.push(format!(
            "detection.oscillation_percentile = {} must be in (0, 1)",
            d.oscillation_percentile
        ));
    }

    let floor = config.aggregation.no_issue_floor_percent;
    if !(0.0..100.0).contains(&floor) {
        errors.push(format!(
            "aggregation.no_issue_floor_percent = {floor} must be in [0, 100)"
        ));
    }

    let s = &config.simulation;
    if !s.dt.is_finite() {
        errors.push(format!("simulation.dt = {} must be finite", s.dt));
    } else if s.dt <= 0.0 {
        warnings.push(ValidationWarning {
            field: "simulation.dt".to_string(),
            message: format!(
                "simulation.dt = {} disables the derivative term in previews",
                s.dt
            ),
            suggestion: None,
        });
    }
    if !s.process_gain.is_finite() {
        errors.push(format!(
            "simulation.process_gain = {} must be finite",
            s.process_gain
        ));
    }
    if !(s.integral_limit.is_finite() && s.integral_limit > 0.0) {
        errors.push(format!(
            "simulation.integral_limit = {} must be a finite value > 0",
            s.integral_limit
        ));
    }

    let mut seen = HashSet::new();
    for (key, header) in config.columns.entries() {
        if header.trim().is_empty() {
            errors.push(format!("{key} must not be empty"));
        } else if !seen.insert(header) {
            errors.push(format!("{key} = '{header}' duplicates another column"));
        }
    }

    if config.server.max_body_bytes == 0 {
        errors.push("server.max_body_bytes must be > 0".to_string());
    }

    if config.plant.units.trim().is_empty() {
        warnings.push(ValidationWarning {
            field: "plant.units".to_string(),
            message: "plant.units is empty; rationale text will show bare numbers".to_string(),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================
