//! Loop Simulator - discrete-time PID forward simulation
//!
//! Previews how the measured value would track the observed setpoint
//! trajectory under a given gain set. The plant is a pure integrator
//! (`measured += output × process_gain`) with no actuator limits, noise or
//! cascade coupling.

use crate::config::SimulationConfig;
use crate::types::{is_good, GainSet, NO_GOOD_DATA};

/// Controller state carried between steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidState {
    gains: GainSet,
    integral: f64,
    previous_error: f64,
    integral_limit: f64,
}

impl PidState {
    pub fn new(gains: GainSet, integral_limit: f64) -> Self {
        Self {
            gains,
            integral: 0.0,
            previous_error: 0.0,
            integral_limit,
        }
    }

    /// Advance one step and return the controller output.
    pub fn update(&mut self, setpoint: f64, measured: f64, dt: f64) -> f64 {
        let error = setpoint - measured;
        self.integral = (self.integral + error * dt).clamp(-self.integral_limit, self.integral_limit);
        let derivative = if dt > 0.0 {
            (error - self.previous_error) / dt
        } else {
            0.0
        };
        self.previous_error = error;
        self.gains.kp * error + self.gains.ki * self.integral + self.gains.kd * derivative
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }
}

/// Forward simulator configured from `[simulation]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSimulator {
    dt: f64,
    process_gain: f64,
    integral_limit: f64,
}

impl LoopSimulator {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            dt: config.dt,
            process_gain: config.process_gain,
            integral_limit: config.integral_limit,
        }
    }

    /// Simulated measured trajectory, one value per setpoint sample.
    ///
    /// Seeds from the first valid measured value. Steps with a sentinel
    /// setpoint hold both the simulated value and the controller state.
    /// With no valid measurement at all every step is the sentinel.
    pub fn simulate(&self, setpoint: &[f64], measured: &[f64], gains: GainSet) -> Vec<f64> {
        let Some(mut value) = measured.iter().copied().find(|v| is_good(*v)) else {
            return vec![NO_GOOD_DATA; setpoint.len()];
        };

        let mut pid = PidState::new(gains, self.integral_limit);
        setpoint
            .iter()
            .map(|&sp| {
                if is_good(sp) {
                    let output = pid.update(sp, value, self.dt);
                    value += self.process_gain * output;
                }
                value
            })
            .collect()
    }
}

impl Default for LoopSimulator {
    fn default() -> Self {
        Self::new(&SimulationConfig::default())
    }
}
