//! Tuning Engine - the `Evaluate` entry point
//!
//! SampleSeries → detectors (parallel) → severity aggregation → tuning rule
//! → simulated preview → report. Every call is a pure computation over its
//! inputs and the shared, immutable configuration.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::aggregation::{SeverityAggregator, Verdict};
use crate::config::TunerConfig;
use crate::detection;
use crate::error::EvaluateError;
use crate::report::ReportAssembler;
use crate::simulator::LoopSimulator;
use crate::tuning::TuningRules;
use crate::types::{
    CascadeGains, Column, ControllerId, IssueLabel, Report, Sample, SampleSeries,
    TuningRecommendation,
};

/// Issue detection and tuning recommendation for one cascade loop.
#[derive(Debug, Clone)]
pub struct TuningEngine {
    config: Arc<TunerConfig>,
    aggregator: SeverityAggregator,
    rules: TuningRules,
    simulator: LoopSimulator,
}

impl TuningEngine {
    pub fn new(config: Arc<TunerConfig>) -> Self {
        Self {
            aggregator: SeverityAggregator::from_config(&config.aggregation),
            rules: TuningRules::from_config(&config.plant),
            simulator: LoopSimulator::new(&config.simulation),
            config,
        }
    }

    pub fn config(&self) -> &TunerConfig {
        &self.config
    }

    /// Evaluate raw samples (builds and validates the series first).
    pub fn evaluate_samples(
        &self,
        samples: Vec<Sample>,
        gains: &CascadeGains,
    ) -> Result<Report, EvaluateError> {
        let series = SampleSeries::new(samples)?;
        self.evaluate(&series, gains)
    }

    /// Classify the dominant issue of the window and recommend new gains.
    pub fn evaluate(
        &self,
        series: &SampleSeries,
        gains: &CascadeGains,
    ) -> Result<Report, EvaluateError> {
        gains.validate()?;
        let started = Instant::now();

        let detections = detection::run_all(series, &self.config);
        let (percentages, verdict) = self.aggregator.evaluate(&detections, series.len());

        let outer = series.loop_columns(ControllerId::Outer, Column::SetpointPrimary);
        let assembler =
            ReportAssembler::new(series, &outer, self.config.detection.settling_tolerance);

        let report = match verdict {
            Verdict::Normal => {
                debug!(samples = series.len(), "No dominant issue");
                assembler.normal(*gains, percentages)
            }
            Verdict::Issue { kind, percentage } => {
                let record = detections.get(kind);
                let recommendation = self.rules.recommend_for_issue(kind, record, gains);
                let simulated = self.simulator.simulate(
                    &outer.setpoint,
                    &outer.measured,
                    recommendation.adjusted_gains,
                );
                info!(
                    plant = %self.config.plant.name,
                    issue = %kind,
                    percentage,
                    label = %recommendation.issue_label,
                    controller = %recommendation.controller_id,
                    "Dominant issue"
                );
                assembler.issue(kind, record, *gains, recommendation, &simulated, percentages)
            }
        };

        debug!(
            samples = series.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            status = %report.status,
            "Evaluation complete"
        );
        Ok(report)
    }

    /// Request-driven recommendation for an explicit issue label.
    pub fn recommend(
        &self,
        label: IssueLabel,
        gains: &CascadeGains,
    ) -> Result<TuningRecommendation, EvaluateError> {
        gains.validate()?;
        Ok(self.rules.recommend(label, gains))
    }
}

impl Default for TuningEngine {
    fn default() -> Self {
        Self::new(Arc::new(TunerConfig::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GainSet;
    use chrono::NaiveDate;

    fn samples(measured: &[f64]) -> Vec<Sample> {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        measured
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
            .collect()
    }

    fn gains() -> CascadeGains {
        CascadeGains::new(GainSet::new(1.2, 2.5, 0.345), GainSet::new(0.8, 0.4, 0.1))
    }

    #[test]
    fn test_flat_loop_is_normal() {
        let report = TuningEngine::default()
            .evaluate_samples(samples(&[500.0; 60]), &gains())
            .unwrap();
        assert!(report.is_normal());
        assert!(report.suggested_parameters.is_none());
    }

    #[test]
    fn test_offset_loop_reports_settling() {
        let report = TuningEngine::default()
            .evaluate_samples(samples(&[530.0; 60]), &gains())
            .unwrap();
        assert_eq!(report.issue, Some(crate::types::IssueKind::Settling));
        assert_eq!(report.issue_percentages.settling, 100.0);
        let rec = report.recommendation.unwrap();
        assert_eq!(rec.issue_label, IssueLabel::HighSettlingTime);
        assert_eq!(rec.adjusted_gains, GainSet::new(1.38, 2.75, 0.345));
        assert_eq!(
            report.series.simulated_preview.map(|v| v.len()),
            Some(60)
        );
    }

    #[test]
    fn test_invalid_gains_rejected_before_detection() {
        let bad = CascadeGains::new(GainSet::new(-1.0, 0.0, 0.0), GainSet::zero());
        let err = TuningEngine::default()
            .evaluate_samples(samples(&[500.0; 10]), &bad)
            .unwrap_err();
        assert!(matches!(err, EvaluateError::InvalidGains { .. }));
    }

    #[test]
    fn test_empty_samples_rejected() {
        let err = TuningEngine::default()
            .evaluate_samples(Vec::new(), &gains())
            .unwrap_err();
        assert!(matches!(err, EvaluateError::InsufficientData(_)));
    }

    #[test]
    fn test_recommend_validates_gains() {
        let engine = TuningEngine::default();
        let rec = engine.recommend(IssueLabel::SteadyStateError, &gains()).unwrap();
        assert_eq!(rec.adjusted_gains, GainSet::new(1.44, 2.875, 0.345));

        let bad = CascadeGains::new(GainSet::new(f64::INFINITY, 0.0, 0.0), GainSet::zero());
        assert!(engine.recommend(IssueLabel::Sluggish, &bad).is_err());
    }
}
