//! Detector output: IssueKind, IssueRecord, IssuePercentages

use serde::{Deserialize, Serialize};
use std::fmt;

/// The five control-quality problems the detectors look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Oscillation,
    Overshoot,
    Undershoot,
    Settling,
    Sluggish,
}

impl IssueKind {
    /// Categories that compete for the dominant issue, in tie-break priority order.
    pub const COMPETING: [Self; 4] = [
        Self::Oscillation,
        Self::Overshoot,
        Self::Undershoot,
        Self::Settling,
    ];

    /// Report title for a window dominated by this issue.
    pub fn title(self) -> &'static str {
        match self {
            Self::Oscillation => "PID1 Oscillations",
            Self::Overshoot => "PID1 overshoot",
            Self::Undershoot => "PID1 undershoot",
            Self::Settling => "PID1 settling time",
            Self::Sluggish => "PID2 Sluggish Response",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Oscillation => write!(f, "oscillation"),
            Self::Overshoot => write!(f, "overshoot"),
            Self::Undershoot => write!(f, "undershoot"),
            Self::Settling => write!(f, "settling"),
            Self::Sluggish => write!(f, "sluggish"),
        }
    }
}

/// One sample flagged by a detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedSample {
    /// Position in the SampleSeries
    pub index: usize,
    /// Measured value at the flagged sample
    pub measured: f64,
    /// Signed deviation (overshoot: measured - setpoint, undershoot: setpoint - measured)
    pub amount: f64,
    /// Valve above `cv_high`
    pub valve_high: bool,
    /// Valve below `cv_low`
    pub valve_low: bool,
}

/// Samples flagged by one detector. Built once, then read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueRecord {
    pub kind: IssueKind,
    pub points: Vec<FlaggedSample>,
}

impl IssueRecord {
    pub fn new(kind: IssueKind, points: Vec<FlaggedSample>) -> Self {
        Self { kind, points }
    }

    pub fn empty(kind: IssueKind) -> Self {
        Self::new(kind, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.points.iter().map(|p| p.index)
    }

    /// Mean signed deviation over the flagged samples.
    pub fn mean_amount(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        let total: f64 = self.points.iter().map(|p| p.amount).sum();
        Some(total / self.points.len() as f64)
    }

    pub fn any_valve_low(&self) -> bool {
        self.points.iter().any(|p| p.valve_low)
    }

    pub fn any_valve_high(&self) -> bool {
        self.points.iter().any(|p| p.valve_high)
    }
}

/// Share of the window flagged by each detector, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePercentages {
    pub oscillation: f64,
    pub overshoot: f64,
    pub undershoot: f64,
    pub settling: f64,
    /// Reported only; never competes for the dominant issue
    pub sluggish: f64,
}

impl IssuePercentages {
    pub fn get(&self, kind: IssueKind) -> f64 {
        match kind {
            IssueKind::Oscillation => self.oscillation,
            IssueKind::Overshoot => self.overshoot,
            IssueKind::Undershoot => self.undershoot,
            IssueKind::Settling => self.settling,
            IssueKind::Sluggish => self.sluggish,
        }
    }

    pub fn set(&mut self, kind: IssueKind, value: f64) {
        match kind {
            IssueKind::Oscillation => self.oscillation = value,
            IssueKind::Overshoot => self.overshoot = value,
            IssueKind::Undershoot => self.undershoot = value,
            IssueKind::Settling => self.settling = value,
            IssueKind::Sluggish => self.sluggish = value,
        }
    }
}
