//! Evaluate result contract

use serde::{Deserialize, Serialize};

use super::{CascadeGains, IssueKind, IssuePercentages, TuningRecommendation};

/// Status string of a window without an active issue.
pub const STATUS_NORMAL: &str = "normal";

/// Numeric chart series, one value per timestamp (`None` = no good data).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSeries {
    pub setpoint: Vec<Option<f64>>,
    /// `setpoint × (1 + tolerance)`
    pub upper_limit: Vec<Option<f64>>,
    /// `setpoint × (1 - tolerance)`
    pub lower_limit: Vec<Option<f64>>,
    pub measured_output: Vec<Option<f64>>,
    /// Predicted measured output under the adjusted gains
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulated_preview: Option<Vec<Option<f64>>>,
    /// Measured value at each flagged sample, null elsewhere
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_points: Option<Vec<Option<f64>>>,
}

/// Full result of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// "normal" or the dominant issue's title
    pub status: String,
    pub title: String,
    /// Dominant issue, absent for a normal window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<IssueKind>,
    pub timestamps: Vec<String>,
    pub series: ReportSeries,
    /// Gains supplied by the caller
    pub parameters: CascadeGains,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_parameters: Option<CascadeGains>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<TuningRecommendation>,
    pub recommendation_message: String,
    pub last_setpoint: Option<f64>,
    pub issue_percentages: IssuePercentages,
}

impl Report {
    pub fn is_normal(&self) -> bool {
        self.status == STATUS_NORMAL
    }
}
