//! Error types for evaluation and data acquisition

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ControllerId;

// ============================================================================
// Evaluation Errors
// ============================================================================

/// Fatal failures of `Evaluate`.
///
/// Detector preconditions (short or sentinel-only series) and issues without
/// a tuning rule are recovered inside the engine and never surface here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluateError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Timestamps decrease at sample {index}: {current} follows {previous}")]
    UnorderedSeries {
        index: usize,
        previous: String,
        current: String,
    },

    #[error("Invalid {controller} gains: {field} = {value} (must be finite and non-negative)")]
    InvalidGains {
        controller: ControllerId,
        field: &'static str,
        value: f64,
    },
}

// ============================================================================
// Acquisition Errors
// ============================================================================

/// Failures while reading loop samples from a file source.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read {}: {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("{} has no header row", .0.display())]
    EmptyFile(PathBuf),

    #[error("{} is missing required column '{1}'", .0.display())]
    MissingColumn(PathBuf, String),

    #[error("{} contains no usable rows", .0.display())]
    NoRows(PathBuf),
}

impl From<SourceError> for EvaluateError {
    fn from(err: SourceError) -> Self {
        Self::InsufficientData(err.to_string())
    }
}
