//! Loop telemetry: Sample, SampleSeries, ValveBand

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use super::ControllerId;
use crate::acquisition::reading;
use crate::error::EvaluateError;

/// Normalized "no good data" marker.
///
/// Every bad-quality reading from the source (historian text markers, empty
/// cells, NaN) is mapped onto this value before it reaches a detector.
pub const NO_GOOD_DATA: f64 = -1000.0;

/// Single rendering format for timestamps in reports and CSV files.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// True when a reading carries real data.
pub fn is_good(value: f64) -> bool {
    value.is_finite() && value != NO_GOOD_DATA
}

/// Map non-finite numbers onto the sentinel.
pub fn normalize_reading(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        NO_GOOD_DATA
    }
}

// ============================================================================
// Sample
// ============================================================================

/// One resampled row of cascade loop telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// Sample time (plant-local, no zone)
    #[serde(rename = "time", with = "reading::timestamp")]
    pub timestamp: NaiveDateTime,

    // === Outer (master) loop ===
    /// Outer loop setpoint
    #[serde(deserialize_with = "reading::deserialize")]
    pub setpoint_primary: f64,
    /// Outer loop measured value
    #[serde(deserialize_with = "reading::deserialize")]
    pub measure_primary: f64,

    // === Inner (slave) loop ===
    /// Inner loop measured value
    #[serde(deserialize_with = "reading::deserialize")]
    pub measure_secondary: f64,
    /// Inner loop setpoint, when the source records it
    #[serde(
        default,
        deserialize_with = "reading::deserialize_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub setpoint_secondary: Option<f64>,
    /// Inner loop control valve position (0-100 %)
    #[serde(deserialize_with = "reading::deserialize")]
    pub control_valve_secondary: f64,
}

/// Logical columns of a [`SampleSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    SetpointPrimary,
    MeasurePrimary,
    MeasureSecondary,
    SetpointSecondary,
    ControlValveSecondary,
}

impl Sample {
    /// Value of a logical column; an unrecorded inner setpoint reads as the sentinel.
    pub fn value(&self, column: Column) -> f64 {
        match column {
            Column::SetpointPrimary => self.setpoint_primary,
            Column::MeasurePrimary => self.measure_primary,
            Column::MeasureSecondary => self.measure_secondary,
            Column::SetpointSecondary => self.setpoint_secondary.unwrap_or(NO_GOOD_DATA),
            Column::ControlValveSecondary => self.control_valve_secondary,
        }
    }

    /// Replace non-finite values with the sentinel.
    pub fn normalized(mut self) -> Self {
        self.setpoint_primary = normalize_reading(self.setpoint_primary);
        self.measure_primary = normalize_reading(self.measure_primary);
        self.measure_secondary = normalize_reading(self.measure_secondary);
        self.setpoint_secondary = self.setpoint_secondary.map(normalize_reading);
        self.control_valve_secondary = normalize_reading(self.control_valve_secondary);
        self
    }
}

// ============================================================================
// SampleSeries
// ============================================================================

/// Ordered, non-empty window of loop samples.
///
/// Construction rejects empty input and decreasing timestamps. A fixed
/// sample interval is assumed but not checked.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSeries {
    samples: Vec<Sample>,
}

impl SampleSeries {
    pub fn new(samples: Vec<Sample>) -> Result<Self, EvaluateError> {
        if samples.is_empty() {
            return Err(EvaluateError::InsufficientData(
                "series contains no samples".to_string(),
            ));
        }

        if let Some(index) = samples
            .windows(2)
            .position(|pair| pair[1].timestamp < pair[0].timestamp)
        {
            return Err(EvaluateError::UnorderedSeries {
                index: index + 1,
                previous: samples[index].timestamp.format(TIMESTAMP_FORMAT).to_string(),
                current: samples[index + 1]
                    .timestamp
                    .format(TIMESTAMP_FORMAT)
                    .to_string(),
            });
        }

        Ok(Self {
            samples: samples.into_iter().map(Sample::normalized).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a constructed series; kept for slice-like ergonomics.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Extract one logical column.
    pub fn column(&self, column: Column) -> Vec<f64> {
        self.samples.iter().map(|s| s.value(column)).collect()
    }

    /// Whether any sample carries an inner-loop setpoint.
    pub fn has_secondary_setpoint(&self) -> bool {
        self.samples.iter().any(|s| s.setpoint_secondary.is_some())
    }

    /// Timestamps rendered with [`TIMESTAMP_FORMAT`].
    pub fn formatted_timestamps(&self) -> Vec<String> {
        self.samples
            .iter()
            .map(|s| s.timestamp.format(TIMESTAMP_FORMAT).to_string())
            .collect()
    }

    /// Last valid outer setpoint in the window.
    pub fn last_setpoint(&self) -> Option<f64> {
        self.samples
            .iter()
            .rev()
            .map(|s| s.setpoint_primary)
            .find(|v| is_good(*v))
    }

    /// Valve regime band derived from this window's valve column.
    pub fn valve_band(&self) -> Option<ValveBand> {
        ValveBand::from_positions(&self.column(Column::ControlValveSecondary))
    }

    /// Setpoint/measured column pair feeding one controller.
    ///
    /// The inner setpoint comes from `inner_setpoint`; the outer loop always
    /// reads the primary columns.
    pub fn loop_columns(&self, controller: ControllerId, inner_setpoint: Column) -> LoopData {
        let (setpoint, measured) = match controller {
            ControllerId::Outer => (Column::SetpointPrimary, Column::MeasurePrimary),
            ControllerId::Inner => (inner_setpoint, Column::MeasureSecondary),
        };
        LoopData {
            controller,
            setpoint: self.column(setpoint),
            measured: self.column(measured),
            valve: self.column(Column::ControlValveSecondary),
        }
    }
}

/// Owned column data for one loop of the cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopData {
    pub controller: ControllerId,
    pub setpoint: Vec<f64>,
    pub measured: Vec<f64>,
    pub valve: Vec<f64>,
}

// ============================================================================
// Valve Regime Band
// ============================================================================

/// `mean ± stddev` band of the inner control valve over one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValveBand {
    /// `cv_low`: below this the valve is biased toward closed
    pub low: f64,
    /// `cv_high`: above this the valve is biased toward open
    pub high: f64,
}

impl ValveBand {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Band from raw valve positions; sentinels are excluded.
    ///
    /// Uses the sample standard deviation (n - 1). A single valid value gives
    /// a zero-width band; no valid value gives `None`.
    pub fn from_positions(positions: &[f64]) -> Option<Self> {
        let good: Vec<f64> = positions.iter().copied().filter(|v| is_good(*v)).collect();
        if good.is_empty() {
            return None;
        }
        let mean = good.iter().mean();
        let std_dev = if good.len() > 1 { good.iter().std_dev() } else { 0.0 };
        Some(Self::new(mean - std_dev, mean + std_dev))
    }

    pub fn is_high(&self, position: f64) -> bool {
        is_good(position) && position > self.high
    }

    pub fn is_low(&self, position: f64) -> bool {
        is_good(position) && position < self.low
    }
}
