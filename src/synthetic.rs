//! Synthetic Cascade Loop Data
//!
//! Deterministic (seeded) generator of a resampled cascade loop window for
//! demos and tests. Each pattern shapes the outer-loop measurement so that
//! one issue dominates:
//!
//! | Pattern      | Outer measurement                          | Valve at extrema |
//! |--------------|--------------------------------------------|------------------|
//! | normal       | on setpoint within historian resolution    | nominal          |
//! | oscillation  | ±8 alternation every sample                | nominal          |
//! | overshoot    | 4-sample sawtooth peaking 10 above setpoint | high            |
//! | undershoot   | mirror of overshoot below setpoint         | low              |
//! | offset       | constant +25 offset                        | nominal          |
//!
//! Measurements are rounded to the historian resolution (0.1) after noise is
//! added, so sub-resolution noise leaves a flat trace.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::defaults;
use crate::types::Sample;

// ============================================================================
// Plant Constants
// ============================================================================

/// Outer loop setpoint (°C)
const BASE_SETPOINT: f64 = 540.0;
/// Inner loop measurement (°C)
const BASE_SECONDARY: f64 = 80.0;
/// Nominal valve position (%)
const BASE_VALVE: f64 = 45.0;
/// Valve position at overshoot peaks (%)
const VALVE_OPEN: f64 = 75.0;
/// Valve position at undershoot valleys (%)
const VALVE_CLOSED: f64 = 15.0;

/// Historian resolution of the outer measurement.
const RESOLUTION: f64 = 0.1;

/// Default seed so repeated demo runs produce the same window.
pub const DEFAULT_SEED: u64 = 42;

// ============================================================================
// Pattern
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticPattern {
    Normal,
    Oscillation,
    Overshoot,
    Undershoot,
    Offset,
}

impl fmt::Display for SyntheticPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Oscillation => write!(f, "oscillation"),
            Self::Overshoot => write!(f, "overshoot"),
            Self::Undershoot => write!(f, "undershoot"),
            Self::Offset => write!(f, "offset"),
        }
    }
}

impl SyntheticPattern {
    /// Standard deviation of outer measurement noise.
    fn noise_sigma(self) -> f64 {
        match self {
            Self::Normal => 0.01,
            Self::Oscillation => 0.3,
            Self::Overshoot | Self::Undershoot => 0.05,
            Self::Offset => 0.5,
        }
    }

    /// Noise-free outer deviation from setpoint and valve position at sample `i`.
    fn shape(self, i: usize) -> (f64, Option<f64>) {
        // 4-sample sawtooth: 6, 10, 6, 2 (peak at phase 1, valley at phase 3)
        let saw = [6.0, 10.0, 6.0, 2.0];
        match self {
            Self::Normal => (0.0, None),
            Self::Oscillation => (if i % 2 == 0 { 8.0 } else { -8.0 }, None),
            Self::Overshoot => (saw[i % 4], (i % 4 == 1).then_some(VALVE_OPEN)),
            Self::Undershoot => (-saw[i % 4], (i % 4 == 1).then_some(VALVE_CLOSED)),
            Self::Offset => (25.0, None),
        }
    }
}

// ============================================================================
// Generator
// ============================================================================

/// Seeded synthetic window generator.
#[derive(Debug, Clone)]
pub struct SyntheticLoop {
    pub pattern: SyntheticPattern,
    pub samples: usize,
    pub interval_secs: i64,
    pub seed: u64,
    pub start: NaiveDateTime,
}

impl SyntheticLoop {
    /// 8 h window at 10 s with the default seed.
    pub fn new(pattern: SyntheticPattern) -> Self {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self {
            pattern,
            samples: defaults::SYNTHETIC_SAMPLES,
            interval_secs: defaults::SYNTHETIC_INTERVAL_SECS,
            seed: DEFAULT_SEED,
            start,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    pub fn generate(&self) -> Vec<Sample> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let measure_noise = Normal::new(0.0, self.pattern.noise_sigma()).ok();
        let valve_noise = Normal::new(0.0, 2.0).ok();
        let secondary_noise = Normal::new(0.0, 0.2).ok();

        let draw = |dist: &Option<Normal<f64>>, rng: &mut StdRng| {
            dist.as_ref().map_or(0.0, |d| d.sample(rng))
        };

        (0..self.samples)
            .map(|i| {
                let (deviation, valve_override) = self.pattern.shape(i);
                let raw = BASE_SETPOINT + deviation + draw(&measure_noise, &mut rng);
                let measured = (raw / RESOLUTION).round() * RESOLUTION;
                let valve_jitter = draw(&valve_noise, &mut rng);
                let valve = valve_override
                    .unwrap_or((BASE_VALVE + valve_jitter).clamp(0.0, 100.0));
                let secondary = BASE_SECONDARY + draw(&secondary_noise, &mut rng);

                Sample {
                    timestamp: self.start + Duration::seconds(self.interval_secs * i as i64),
                    setpoint_primary: BASE_SETPOINT,
                    measure_primary: measured,
                    measure_secondary: secondary,
                    setpoint_secondary: None,
                    control_valve_secondary: valve,
                }
            })
            .collect()
    }
}
