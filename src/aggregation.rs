//! Severity aggregation: flagged share per category and dominant issue selection

use serde::Serialize;
use tracing::debug;

use crate::config::AggregationConfig;
use crate::detection::DetectionSet;
use crate::types::{IssueKind, IssuePercentages};

/// Outcome of dominant-issue selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    /// No competing category above the floor
    Normal,
    Issue { kind: IssueKind, percentage: f64 },
}

impl Verdict {
    pub fn issue(&self) -> Option<IssueKind> {
        match self {
            Self::Normal => None,
            Self::Issue { kind, .. } => Some(*kind),
        }
    }
}

/// Converts detector output into percentages and picks the dominant issue.
#[derive(Debug, Clone, Copy)]
pub struct SeverityAggregator {
    no_issue_floor_percent: f64,
}

impl SeverityAggregator {
    pub fn new(no_issue_floor_percent: f64) -> Self {
        Self {
            no_issue_floor_percent,
        }
    }

    pub fn from_config(config: &AggregationConfig) -> Self {
        Self::new(config.no_issue_floor_percent)
    }

    /// `|record| / total × 100` for every category, sluggish included.
    pub fn percentages(&self, detections: &DetectionSet, total_samples: usize) -> IssuePercentages {
        let mut pct = IssuePercentages::default();
        if total_samples == 0 {
            return pct;
        }
        for kind in IssueKind::COMPETING.into_iter().chain([IssueKind::Sluggish]) {
            let share = detections.get(kind).len() as f64 / total_samples as f64 * 100.0;
            pct.set(kind, share);
        }
        pct
    }

    /// Largest competing share wins; ties go to the earlier category in
    /// [`IssueKind::COMPETING`]. At or below the floor the window is normal.
    pub fn select(&self, percentages: &IssuePercentages) -> Verdict {
        let mut best: Option<(IssueKind, f64)> = None;
        for kind in IssueKind::COMPETING {
            let value = percentages.get(kind);
            if best.map_or(true, |(_, best_value)| value > best_value) {
                best = Some((kind, value));
            }
        }

        match best {
            Some((kind, percentage)) if percentage > self.no_issue_floor_percent => {
                debug!(issue = %kind, percentage, "Dominant issue selected");
                Verdict::Issue { kind, percentage }
            }
            _ => Verdict::Normal,
        }
    }

    pub fn evaluate(&self, detections: &DetectionSet, total_samples: usize) -> (IssuePercentages, Verdict) {
        let pct = self.percentages(detections, total_samples);
        let verdict = self.select(&pct);
        (pct, verdict)
    }
}

impl Default for SeverityAggregator {
    fn default() -> Self {
        Self::from_config(&AggregationConfig::default())
    }
}
