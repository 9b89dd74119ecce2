//! Controller gains: ControllerId, GainSet, CascadeGains

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EvaluateError;

/// Which controller of the cascade a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerId {
    /// Outer (master) controller
    #[serde(rename = "PID1")]
    Outer,
    /// Inner (slave) controller
    #[serde(rename = "PID2")]
    Inner,
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outer => write!(f, "PID1"),
            Self::Inner => write!(f, "PID2"),
        }
    }
}

// ============================================================================
// GainSet
// ============================================================================

/// Proportional, integral and derivative gains of one controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GainSet {
    #[serde(rename = "Kp", alias = "kp")]
    pub kp: f64,
    #[serde(rename = "Ki", alias = "ki")]
    pub ki: f64,
    #[serde(rename = "Kd", alias = "kd")]
    pub kd: f64,
}

impl GainSet {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Reject non-finite or negative gains.
    pub fn validate(&self, controller: ControllerId) -> Result<(), EvaluateError> {
        for (field, value) in [("Kp", self.kp), ("Ki", self.ki), ("Kd", self.kd)] {
            if !value.is_finite() || value < 0.0 {
                return Err(EvaluateError::InvalidGains {
                    controller,
                    field,
                    value,
                });
            }
        }
        Ok(())
    }

    /// Multiply each gain by `1 + delta` and round to 3 decimals.
    pub fn scaled(&self, kp_delta: f64, ki_delta: f64, kd_delta: f64) -> Self {
        Self::new(
            round3(self.kp * (1.0 + kp_delta)),
            round3(self.ki * (1.0 + ki_delta)),
            round3(self.kd * (1.0 + kd_delta)),
        )
    }
}

impl fmt::Display for GainSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kp={} Ki={} Kd={}", self.kp, self.ki, self.kd)
    }
}

/// Parses `"kp,ki,kd"` (as given on the command line).
impl FromStr for GainSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(format!("expected KP,KI,KD but got '{s}'"));
        }
        let mut values = [0.0_f64; 3];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| format!("'{part}' is not a number"))?;
        }
        Ok(Self::new(values[0], values[1], values[2]))
    }
}

/// Round half away from zero to 3 decimal places.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

// ============================================================================
// CascadeGains
// ============================================================================

/// Gains of both controllers of the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeGains {
    pub outer_gains: GainSet,
    pub inner_gains: GainSet,
}

impl CascadeGains {
    pub fn new(outer_gains: GainSet, inner_gains: GainSet) -> Self {
        Self {
            outer_gains,
            inner_gains,
        }
    }

    pub fn validate(&self) -> Result<(), EvaluateError> {
        self.outer_gains.validate(ControllerId::Outer)?;
        self.inner_gains.validate(ControllerId::Inner)
    }

    pub fn get(&self, controller: ControllerId) -> GainSet {
        match controller {
            ControllerId::Outer => self.outer_gains,
            ControllerId::Inner => self.inner_gains,
        }
    }

    /// Copy with one controller's gains replaced.
    pub fn with(self, controller: ControllerId, gains: GainSet) -> Self {
        match controller {
            ControllerId::Outer => Self {
                outer_gains: gains,
                ..self
            },
            ControllerId::Inner => Self {
                inner_gains: gains,
                ..self
            },
        }
    }
}
