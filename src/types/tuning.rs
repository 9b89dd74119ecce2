//! Tuning labels and recommendations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ControllerId, GainSet};

/// Issue label understood by the rule table.
///
/// Detector-driven labels combine the issue with the valve regime; the
/// steady-state, saturated-valve and sluggish labels only arrive through the
/// request-driven `recommend` flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueLabel {
    #[serde(rename = "Oscillations", alias = "Oscillation")]
    Oscillation,
    #[serde(rename = "High Settling Time")]
    HighSettlingTime,
    #[serde(rename = "Overshoot and control_valve_low")]
    OvershootValveLow,
    #[serde(rename = "Overshoot and control_valve_high")]
    OvershootValveHigh,
    #[serde(rename = "Undershoot and control_valve_high")]
    UndershootValveHigh,
    #[serde(rename = "Undershoot and control_valve_low")]
    UndershootValveLow,
    /// Overshoot with no valve bias in either direction
    #[serde(rename = "Overshoot")]
    Overshoot,
    /// Undershoot with no valve bias in either direction
    #[serde(rename = "Undershoot")]
    Undershoot,
    #[serde(rename = "Steady-State Error")]
    SteadyStateError,
    #[serde(rename = "Valve Fully Open But Outlet Temp Low")]
    ValveSaturatedLowOutput,
    #[serde(rename = "Sluggish")]
    Sluggish,
}

impl IssueLabel {
    pub const ALL: [Self; 11] = [
        Self::Oscillation,
        Self::HighSettlingTime,
        Self::OvershootValveLow,
        Self::OvershootValveHigh,
        Self::UndershootValveHigh,
        Self::UndershootValveLow,
        Self::Overshoot,
        Self::Undershoot,
        Self::SteadyStateError,
        Self::ValveSaturatedLowOutput,
        Self::Sluggish,
    ];

    /// Controller a label implicates.
    pub fn controller(self) -> ControllerId {
        match self {
            Self::OvershootValveLow
            | Self::UndershootValveLow
            | Self::ValveSaturatedLowOutput
            | Self::Sluggish => ControllerId::Inner,
            Self::Oscillation
            | Self::HighSettlingTime
            | Self::OvershootValveHigh
            | Self::UndershootValveHigh
            | Self::Overshoot
            | Self::Undershoot
            | Self::SteadyStateError => ControllerId::Outer,
        }
    }

    /// Wire name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Oscillation => "Oscillations",
            Self::HighSettlingTime => "High Settling Time",
            Self::OvershootValveLow => "Overshoot and control_valve_low",
            Self::OvershootValveHigh => "Overshoot and control_valve_high",
            Self::UndershootValveHigh => "Undershoot and control_valve_high",
            Self::UndershootValveLow => "Undershoot and control_valve_low",
            Self::Overshoot => "Overshoot",
            Self::Undershoot => "Undershoot",
            Self::SteadyStateError => "Steady-State Error",
            Self::ValveSaturatedLowOutput => "Valve Fully Open But Outlet Temp Low",
            Self::Sluggish => "Sluggish",
        }
    }

    /// Short kebab-case name used on the command line.
    pub fn cli_name(self) -> &'static str {
        match self {
            Self::Oscillation => "oscillation",
            Self::HighSettlingTime => "high-settling-time",
            Self::OvershootValveLow => "overshoot-valve-low",
            Self::OvershootValveHigh => "overshoot-valve-high",
            Self::UndershootValveHigh => "undershoot-valve-high",
            Self::UndershootValveLow => "undershoot-valve-low",
            Self::Overshoot => "overshoot",
            Self::Undershoot => "undershoot",
            Self::SteadyStateError => "steady-state-error",
            Self::ValveSaturatedLowOutput => "valve-saturated-low-output",
            Self::Sluggish => "sluggish",
        }
    }
}

impl fmt::Display for IssueLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts either the wire name or the CLI name, case-insensitively.
impl FromStr for IssueLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|label| {
                label.as_str().eq_ignore_ascii_case(wanted)
                    || label.cli_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|l| l.cli_name()).collect();
                format!("unknown issue '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// Gain adjustment for one controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TuningRecommendation {
    pub controller_id: ControllerId,
    pub issue_label: IssueLabel,
    pub current_gains: GainSet,
    pub adjusted_gains: GainSet,
    /// Human-readable explanation
    pub rationale: String,
    /// False when the label has no rule and gains passed through unchanged
    pub changed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_wire_names_round_trip_through_from_str() {
        for label in IssueLabel::ALL {
            assert_eq!(label.as_str().parse::<IssueLabel>().unwrap(), label);
            assert_eq!(label.cli_name().parse::<IssueLabel>().unwrap(), label);
            let json = serde_json::to_value(label).unwrap();
            assert_eq!(json, label.as_str());
        }
    }

    #[test]
    fn test_unknown_label_lists_choices() {
        let err = "wobble".parse::<IssueLabel>().unwrap_err();
        assert!(err.contains("high-settling-time"));
    }

    #[test]
    fn test_inner_loop_labels() {
        assert_eq!(IssueLabel::Sluggish.controller(), ControllerId::Inner);
        assert_eq!(IssueLabel::OvershootValveLow.controller(), ControllerId::Inner);
        assert_eq!(IssueLabel::OvershootValveHigh.controller(), ControllerId::Outer);
    }
}
