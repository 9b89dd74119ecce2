//! Issue Detectors
//!
//! Five independent, stateless scans over one window of loop telemetry:
//!
//! | Detector    | Loop        | Flags                                            |
//! |-------------|-------------|--------------------------------------------------|
//! | oscillation | outer       | windows with unusually many direction reversals  |
//! | overshoot   | outer       | local maxima above setpoint                      |
//! | undershoot  | outer       | local minima below setpoint                      |
//! | settling    | outer       | samples outside `setpoint × (1 ± tolerance)`     |
//! | sluggish    | inner       | below setpoint while the valve sits low          |
//!
//! Detectors never fail. Short or sentinel-only input yields an empty record.

mod extrema;
mod oscillation;
mod tracking;

pub use extrema::{detect_overshoot, detect_undershoot};
pub use oscillation::detect_oscillation;
pub use tracking::{detect_settling, detect_sluggish};

use tracing::{debug, warn};

use crate::config::TunerConfig;
use crate::types::{
    Column, ControllerId, FlaggedSample, IssueKind, IssueRecord, LoopData, SampleSeries,
    ValveBand,
};

// ============================================================================
// Detector Input
// ============================================================================

/// Borrowed column slices of one loop plus the window's valve band.
#[derive(Debug, Clone, Copy)]
pub struct LoopSignals<'a> {
    pub setpoint: &'a [f64],
    pub measured: &'a [f64],
    pub valve: &'a [f64],
    pub band: Option<ValveBand>,
}

impl<'a> LoopSignals<'a> {
    pub fn new(data: &'a LoopData, band: Option<ValveBand>) -> Self {
        Self {
            setpoint: &data.setpoint,
            measured: &data.measured,
            valve: &data.valve,
            band,
        }
    }

    /// Shortest of the three columns; detectors never index past it.
    pub fn len(&self) -> usize {
        self.setpoint
            .len()
            .min(self.measured.len())
            .min(self.valve.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build a flagged sample, tagging the valve regime at `index`.
    pub fn flag(&self, index: usize, amount: f64) -> FlaggedSample {
        let valve = self.valve[index];
        let (valve_high, valve_low) = self
            .band
            .map_or((false, false), |band| (band.is_high(valve), band.is_low(valve)));
        FlaggedSample {
            index,
            measured: self.measured[index],
            amount,
            valve_high,
            valve_low,
        }
    }
}

// ============================================================================
// Detection Set
// ============================================================================

/// Output of all five detectors for one window.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionSet {
    pub oscillation: IssueRecord,
    pub overshoot: IssueRecord,
    pub undershoot: IssueRecord,
    pub settling: IssueRecord,
    pub sluggish: IssueRecord,
    /// Band the regime flags were computed against
    pub valve_band: Option<ValveBand>,
}

impl DetectionSet {
    pub fn get(&self, kind: IssueKind) -> &IssueRecord {
        match kind {
            IssueKind::Oscillation => &self.oscillation,
            IssueKind::Overshoot => &self.overshoot,
            IssueKind::Undershoot => &self.undershoot,
            IssueKind::Settling => &self.settling,
            IssueKind::Sluggish => &self.sluggish,
        }
    }
}

/// Inner setpoint column for this series, falling back to the inner
/// measurement when the configured column was never recorded.
pub fn resolve_inner_setpoint(series: &SampleSeries, config: &TunerConfig) -> Column {
    let wanted = config.inner_setpoint_column();
    if wanted == Column::SetpointSecondary && !series.has_secondary_setpoint() {
        warn!(
            "mapping.secondary_setpoint = setpoint_secondary but no sample carries it, \
             falling back to measure_secondary"
        );
        return Column::MeasureSecondary;
    }
    wanted
}

/// Run every detector over the series concurrently.
pub fn run_all(series: &SampleSeries, config: &TunerConfig) -> DetectionSet {
    let band = series.valve_band();
    if band.is_none() {
        debug!("No valid valve samples; regime flags and sluggish detection disabled");
    }

    let detection = &config.detection;
    if series.len() < detection.oscillation_window {
        debug!(
            samples = series.len(),
            window = detection.oscillation_window,
            "Series shorter than oscillation window"
        );
    }

    let outer_data = series.loop_columns(ControllerId::Outer, Column::SetpointPrimary);
    let inner_data =
        series.loop_columns(ControllerId::Inner, resolve_inner_setpoint(series, config));
    let outer = LoopSignals::new(&outer_data, band);
    let inner = LoopSignals::new(&inner_data, band);

    let ((oscillation, overshoot), ((undershoot, settling), sluggish)) = rayon::join(
        || {
            rayon::join(
                || {
                    detect_oscillation(
                        outer,
                        detection.oscillation_window,
                        detection.oscillation_percentile,
                    )
                },
                || detect_overshoot(outer),
            )
        },
        || {
            rayon::join(
                || {
                    rayon::join(
                        || detect_undershoot(outer),
                        || detect_settling(outer, detection.settling_tolerance),
                    )
                },
                || detect_sluggish(inner),
            )
        },
    );

    debug!(
        oscillation = oscillation.len(),
        overshoot = overshoot.len(),
        undershoot = undershoot.len(),
        settling = settling.len(),
        sluggish = sluggish.len(),
        "Detectors complete"
    );

    DetectionSet {
        oscillation,
        overshoot,
        undershoot,
        settling,
        sluggish,
        valve_band: band,
    }
}
