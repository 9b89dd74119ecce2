//! Tuning Rules
//!
//! Deterministic table mapping an issue label to a multiplicative gain
//! adjustment on the implicated controller. Adjusted gains are rounded to
//! three decimals; labels without a rule pass the current gains through
//! untouched.

use tracing::{info, warn};

use crate::config::PlantInfo;
use crate::types::{
    CascadeGains, IssueKind, IssueLabel, IssueRecord, TuningRecommendation,
};

// ============================================================================
// Rule Table
// ============================================================================

/// Fractional change applied to each gain (`-0.2` = reduce by 20 %).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainDelta {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl GainDelta {
    const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }
}

/// Rule for a label, `None` when the label has no gain adjustment.
pub fn rule_for(label: IssueLabel) -> Option<GainDelta> {
    match label {
        IssueLabel::Oscillation | IssueLabel::OvershootValveHigh => {
            Some(GainDelta::new(-0.20, 0.0, 0.15))
        }
        IssueLabel::HighSettlingTime => Some(GainDelta::new(0.15, 0.10, 0.0)),
        IssueLabel::OvershootValveLow
        | IssueLabel::UndershootValveHigh
        | IssueLabel::SteadyStateError => Some(GainDelta::new(0.20, 0.15, 0.0)),
        IssueLabel::UndershootValveLow => Some(GainDelta::new(-0.20, 0.0, 0.0)),
        IssueLabel::ValveSaturatedLowOutput => Some(GainDelta::new(0.20, 0.10, 0.0)),
        IssueLabel::Overshoot | IssueLabel::Undershoot | IssueLabel::Sluggish => None,
    }
}

/// Refine a detected issue into a rule label using the valve regime of its
/// flagged samples. Valve-low anywhere in the record takes priority.
pub fn classify(kind: IssueKind, record: &IssueRecord) -> IssueLabel {
    match kind {
        IssueKind::Oscillation => IssueLabel::Oscillation,
        IssueKind::Settling => IssueLabel::HighSettlingTime,
        IssueKind::Sluggish => IssueLabel::Sluggish,
        IssueKind::Overshoot => {
            if record.any_valve_low() {
                IssueLabel::OvershootValveLow
            } else if record.any_valve_high() {
                IssueLabel::OvershootValveHigh
            } else {
                IssueLabel::Overshoot
            }
        }
        IssueKind::Undershoot => {
            if record.any_valve_low() {
                IssueLabel::UndershootValveLow
            } else if record.any_valve_high() {
                IssueLabel::UndershootValveHigh
            } else {
                IssueLabel::Undershoot
            }
        }
    }
}

// ============================================================================
// TuningRules
// ============================================================================

/// Applies the rule table and writes the rationale in the plant's unit.
#[derive(Debug, Clone)]
pub struct TuningRules {
    units: String,
}

impl TuningRules {
    pub fn new(units: impl Into<String>) -> Self {
        Self {
            units: units.into(),
        }
    }

    pub fn from_config(plant: &PlantInfo) -> Self {
        Self::new(plant.units.clone())
    }

    /// Request-driven recommendation for an explicit label.
    pub fn recommend(&self, label: IssueLabel, current: &CascadeGains) -> TuningRecommendation {
        self.build(label, current, None)
    }

    /// Detector-driven recommendation for the dominant issue.
    ///
    /// Overshoot and undershoot rationales quote the mean deviation of the
    /// flagged samples.
    pub fn recommend_for_issue(
        &self,
        kind: IssueKind,
        record: &IssueRecord,
        current: &CascadeGains,
    ) -> TuningRecommendation {
        let label = classify(kind, record);
        let deviation = match kind {
            IssueKind::Overshoot | IssueKind::Undershoot => record.mean_amount(),
            _ => None,
        };
        self.build(label, current, deviation)
    }

    fn build(
        &self,
        label: IssueLabel,
        current: &CascadeGains,
        deviation: Option<f64>,
    ) -> TuningRecommendation {
        let controller = label.controller();
        let current_gains = current.get(controller);
        let headline = self.headline(label, deviation);

        match rule_for(label) {
            Some(delta) => {
                let adjusted_gains = current_gains.scaled(delta.kp, delta.ki, delta.kd);
                info!(
                    issue = %label,
                    controller = %controller,
                    current = %current_gains,
                    adjusted = %adjusted_gains,
                    "Tuning rule applied"
                );
                TuningRecommendation {
                    controller_id: controller,
                    issue_label: label,
                    current_gains,
                    adjusted_gains,
                    rationale: format!("{headline}: {}", action(label)),
                    changed: true,
                }
            }
            None => {
                warn!(issue = %label, controller = %controller, "No tuning rule for issue, gains unchanged");
                TuningRecommendation {
                    controller_id: controller,
                    issue_label: label,
                    current_gains,
                    adjusted_gains: current_gains,
                    rationale: format!(
                        "{headline}: {} No gain change was made to {controller}.",
                        action(label)
                    ),
                    changed: false,
                }
            }
        }
    }

    fn headline(&self, label: IssueLabel, deviation: Option<f64>) -> String {
        let base = match label {
            IssueLabel::Oscillation => "Oscillations detected",
            IssueLabel::HighSettlingTime => "Long settling time detected",
            IssueLabel::OvershootValveLow
            | IssueLabel::OvershootValveHigh
            | IssueLabel::Overshoot => "Overshoot detected",
            IssueLabel::UndershootValveHigh
            | IssueLabel::UndershootValveLow
            | IssueLabel::Undershoot => "Undershoot detected",
            IssueLabel::SteadyStateError => "Steady-state error reported",
            IssueLabel::ValveSaturatedLowOutput => "Valve fully open but output low",
            IssueLabel::Sluggish => "Sluggish response detected",
        };
        match deviation {
            Some(value) if self.units.trim().is_empty() => format!("{base} ({value:.2})"),
            Some(value) => format!("{base} ({value:.2} {})", self.units.trim()),
            None => base.to_string(),
        }
    }
}

impl Default for TuningRules {
    fn default() -> Self {
        Self::from_config(&PlantInfo::default())
    }
}

/// Operator-facing action sentence for a label.
fn action(label: IssueLabel) -> &'static str {
    match label {
        IssueLabel::Oscillation => "Reduce Kp of PID1 and increase Kd to dampen oscillations.",
        IssueLabel::HighSettlingTime => {
            "Increase Kp and Ki of PID1 for better steady-state tracking."
        }
        IssueLabel::OvershootValveLow => {
            "Increase Kp and Ki of PID2 so the inner loop opens the valve sooner."
        }
        IssueLabel::OvershootValveHigh => {
            "Reduce Kp of PID1 and increase Kd to prevent excessive correction."
        }
        IssueLabel::UndershootValveHigh => {
            "Increase Kp and Ki of PID1 to improve the outer loop response."
        }
        IssueLabel::UndershootValveLow => "Reduce Kp of PID2 to avoid delayed correction.",
        IssueLabel::SteadyStateError => "Increase Kp and Ki of PID1 to remove the offset.",
        IssueLabel::ValveSaturatedLowOutput => {
            "Increase Kp and Ki of PID2 to recover from valve saturation."
        }
        IssueLabel::Overshoot | IssueLabel::Undershoot => {
            "The valve shows no bias toward open or closed, so no rule applies."
        }
        IssueLabel::Sluggish => "No tuning rule is defined for a sluggish inner loop.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ControllerId, FlaggedSample, GainSet};

    fn gains() -> CascadeGains {
        CascadeGains::new(GainSet::new(1.2, 2.5, 0.345), GainSet::new(0.8, 0.4, 0.1))
    }

    fn record(kind: IssueKind, valve_high: &[bool], valve_low: &[bool]) -> IssueRecord {
        let points = valve_high
            .iter()
            .zip(valve_low)
            .enumerate()
            .map(|(i, (&valve_high, &valve_low))| FlaggedSample {
                index: i + 1,
                measured: 510.0,
                amount: 10.0 * (i + 1) as f64,
                valve_high,
                valve_low,
            })
            .collect();
        IssueRecord::new(kind, points)
    }

    #[test]
    fn test_oscillation_rule() {
        let rec = TuningRules::default().recommend(IssueLabel::Oscillation, &gains());
        assert_eq!(rec.controller_id, ControllerId::Outer);
        assert_eq!(rec.adjusted_gains, GainSet::new(0.96, 2.5, 0.397));
        assert!(rec.changed);
    }

    #[test]
    fn test_settling_rule() {
        let rec = TuningRules::default().recommend(IssueLabel::HighSettlingTime, &gains());
        assert_eq!(rec.adjusted_gains, GainSet::new(1.38, 2.75, 0.345));
    }

    #[test]
    fn test_inner_loop_rules_touch_pid2() {
        let rules = TuningRules::default();
        let rec = rules.recommend(IssueLabel::UndershootValveLow, &gains());
        assert_eq!(rec.controller_id, ControllerId::Inner);
        assert_eq!(rec.current_gains, GainSet::new(0.8, 0.4, 0.1));
        assert_eq!(rec.adjusted_gains, GainSet::new(0.64, 0.4, 0.1));

        let rec = rules.recommend(IssueLabel::ValveSaturatedLowOutput, &gains());
        assert_eq!(rec.adjusted_gains, GainSet::new(0.96, 0.44, 0.1));
    }

    #[test]
    fn test_no_rule_passes_through_bit_for_bit() {
        let odd = CascadeGains::new(
            GainSet::new(0.123_456_789, 1e-9, 7.777_777),
            GainSet::new(0.333_333_3, 0.1, 0.0),
        );
        let rules = TuningRules::default();
        for label in [IssueLabel::Sluggish, IssueLabel::Overshoot, IssueLabel::Undershoot] {
            let rec = rules.recommend(label, &odd);
            assert!(!rec.changed);
            assert_eq!(rec.adjusted_gains, rec.current_gains);
            assert_eq!(rec.adjusted_gains.kp.to_bits(), rec.current_gains.kp.to_bits());
            assert!(rec.rationale.contains("No gain change"));
        }
    }

    #[test]
    fn test_every_rule_rounds_to_three_decimals() {
        let odd = CascadeGains::new(
            GainSet::new(1.234_567, 2.345_678, 0.456_789),
            GainSet::new(0.987_654, 0.876_543, 0.765_432),
        );
        let rules = TuningRules::default();
        for label in IssueLabel::ALL {
            let rec = rules.recommend(label, &odd);
            if rec.changed {
                for v in [rec.adjusted_gains.kp, rec.adjusted_gains.ki, rec.adjusted_gains.kd] {
                    assert!(((v * 1000.0).round() - v * 1000.0).abs() < 1e-6, "{label}: {v}");
                }
            }
        }
    }

    #[test]
    fn test_valve_low_takes_priority() {
        let rec = record(IssueKind::Overshoot, &[true, false], &[false, true]);
        assert_eq!(classify(IssueKind::Overshoot, &rec), IssueLabel::OvershootValveLow);

        let rec = record(IssueKind::Undershoot, &[true, false], &[false, true]);
        assert_eq!(classify(IssueKind::Undershoot, &rec), IssueLabel::UndershootValveLow);

        let rec = record(IssueKind::Undershoot, &[true], &[false]);
        assert_eq!(classify(IssueKind::Undershoot, &rec), IssueLabel::UndershootValveHigh);

        let rec = record(IssueKind::Overshoot, &[false], &[false]);
        assert_eq!(classify(IssueKind::Overshoot, &rec), IssueLabel::Overshoot);
    }

    #[test]
    fn test_rationale_quotes_mean_deviation_with_units() {
        let rules = TuningRules::new("°C");
        let rec = record(IssueKind::Overshoot, &[true, true], &[false, false]);
        let out = rules.recommend_for_issue(IssueKind::Overshoot, &rec, &gains());
        assert_eq!(out.issue_label, IssueLabel::OvershootValveHigh);
        assert!(out.rationale.starts_with("Overshoot detected (15.00 °C)"), "{}", out.rationale);
    }
}
