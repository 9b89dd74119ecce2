//! Report assembly: packages detector output, verdict, recommendation and
//! simulated preview into the [`Report`] contract

use crate::types::{
    is_good, CascadeGains, IssueKind, IssuePercentages, IssueRecord, LoopData, Report,
    ReportSeries, SampleSeries, TuningRecommendation, STATUS_NORMAL,
};

/// Title and message of a window without an active issue.
pub const NORMAL_TITLE: &str = "No issue detected";
pub const NORMAL_MESSAGE: &str = "No issue detected in the evaluated window; current gains retained.";

/// Sentinels and non-finite values become `None` (JSON null).
pub fn nullable(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().map(|&v| is_good(v).then_some(v)).collect()
}

/// Builds reports for one series and tolerance band.
#[derive(Debug, Clone, Copy)]
pub struct ReportAssembler<'a> {
    series: &'a SampleSeries,
    outer: &'a LoopData,
    tolerance: f64,
}

impl<'a> ReportAssembler<'a> {
    /// `outer` must be the outer-loop columns of `series`.
    pub fn new(series: &'a SampleSeries, outer: &'a LoopData, tolerance: f64) -> Self {
        Self {
            series,
            outer,
            tolerance,
        }
    }

    fn base_series(&self) -> ReportSeries {
        let band = |factor: f64| -> Vec<Option<f64>> {
            self.outer
                .setpoint
                .iter()
                .map(|&sp| is_good(sp).then_some(sp * factor))
                .collect()
        };
        ReportSeries {
            setpoint: nullable(&self.outer.setpoint),
            upper_limit: band(1.0 + self.tolerance),
            lower_limit: band(1.0 - self.tolerance),
            measured_output: nullable(&self.outer.measured),
            simulated_preview: None,
            issue_points: None,
        }
    }

    /// Measured value at each flagged index, `None` elsewhere.
    fn issue_points(&self, record: &IssueRecord) -> Vec<Option<f64>> {
        let mut points = vec![None; self.series.len()];
        for p in &record.points {
            if let Some(slot) = points.get_mut(p.index) {
                *slot = is_good(p.measured).then_some(p.measured);
            }
        }
        points
    }

    pub fn normal(&self, gains: CascadeGains, percentages: IssuePercentages) -> Report {
        Report {
            status: STATUS_NORMAL.to_string(),
            title: NORMAL_TITLE.to_string(),
            issue: None,
            timestamps: self.series.formatted_timestamps(),
            series: self.base_series(),
            parameters: gains,
            suggested_parameters: None,
            recommendation: None,
            recommendation_message: NORMAL_MESSAGE.to_string(),
            last_setpoint: self.series.last_setpoint(),
            issue_percentages: percentages,
        }
    }

    pub fn issue(
        &self,
        kind: IssueKind,
        record: &IssueRecord,
        gains: CascadeGains,
        recommendation: TuningRecommendation,
        simulated: &[f64],
        percentages: IssuePercentages,
    ) -> Report {
        let mut series = self.base_series();
        series.simulated_preview = Some(nullable(simulated));
        if !record.is_empty() {
            series.issue_points = Some(self.issue_points(record));
        }

        let suggested = gains.with(recommendation.controller_id, recommendation.adjusted_gains);
        Report {
            status: kind.title().to_string(),
            title: kind.title().to_string(),
            issue: Some(kind),
            timestamps: self.series.formatted_timestamps(),
            series,
            parameters: gains,
            suggested_parameters: Some(suggested),
            recommendation_message: recommendation.rationale.clone(),
            recommendation: Some(recommendation),
            last_setpoint: self.series.last_setpoint(),
            issue_percentages: percentages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ControllerId, FlaggedSample, GainSet, IssueLabel, Sample, NO_GOOD_DATA,
    };
    use chrono::NaiveDate;

    fn series() -> SampleSeries {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .unwrap();
        let measured = [500.0, 510.0, NO_GOOD_DATA, 500.0];
        let samples = measured
            .iter()
            .enumerate()
            .map(|(i, &m)| Sample {
                timestamp: start + chrono::Duration::seconds(10 * i as i64),
                setpoint_primary: 500.0,
                measure_primary: m,
                measure_secondary: 80.0,
                setpoint_secondary: None,
                control_valve_secondary: 50.0,
            })
            .collect();
        SampleSeries::new(samples).unwrap()
    }

    fn gains() -> CascadeGains {
        CascadeGains::new(GainSet::new(1.0, 1.0, 1.0), GainSet::new(0.5, 0.5, 0.5))
    }

    #[test]
    fn test_normal_report_shape() {
        let s = series();
        let outer = s.loop_columns(ControllerId::Outer, crate::types::Column::SetpointPrimary);
        let report = ReportAssembler::new(&s, &outer, 0.03).normal(gains(), IssuePercentages::default());

        assert_eq!(report.status, "normal");
        assert!(report.suggested_parameters.is_none());
        assert!(report.series.simulated_preview.is_none());
        assert!(report.series.issue_points.is_none());
        assert_eq!(report.timestamps[1], "2025-03-01 08:00:10");
        assert_eq!(report.series.measured_output[2], None);
        assert_eq!(report.series.upper_limit[0], Some(515.0));
        assert_eq!(report.last_setpoint, Some(500.0));
    }

    #[test]
    fn test_issue_points_aligned_by_index() {
        let s = series();
        let outer = s.loop_columns(ControllerId::Outer, crate::types::Column::SetpointPrimary);
        let record = IssueRecord::new(
            IssueKind::Overshoot,
            vec![FlaggedSample {
                index: 1,
                measured: 510.0,
                amount: 10.0,
                valve_high: true,
                valve_low: false,
            }],
        );
        let rec = TuningRecommendation {
            controller_id: ControllerId::Outer,
            issue_label: IssueLabel::OvershootValveHigh,
            current_gains: gains().outer_gains,
            adjusted_gains: GainSet::new(0.8, 1.0, 1.15),
            rationale: "Overshoot detected".to_string(),
            changed: true,
        };
        let report = ReportAssembler::new(&s, &outer, 0.03).issue(
            IssueKind::Overshoot,
            &record,
            gains(),
            rec,
            &[500.0; 4],
            IssuePercentages::default(),
        );

        assert_eq!(report.status, "PID1 overshoot");
        assert_eq!(
            report.series.issue_points,
            Some(vec![None, Some(510.0), None, None])
        );
        let suggested = report.suggested_parameters.unwrap();
        assert_eq!(suggested.outer_gains, GainSet::new(0.8, 1.0, 1.15));
        assert_eq!(suggested.inner_gains, gains().inner_gains);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["series"]["measuredOutput"][2].is_null());
        assert_eq!(json["suggestedParameters"]["outerGains"]["Kp"], 0.8);
    }
}
