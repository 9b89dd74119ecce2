//! System-wide default constants.
//!
//! Grouped by subsystem. Config fields default to these values.

// ============================================================================
// Detection
// ============================================================================

/// Settling band half-width as a fraction of the setpoint (±3 %).
pub const SETTLING_TOLERANCE: f64 = 0.03;

/// Samples in the right-aligned oscillation counting window.
pub const OSCILLATION_WINDOW: usize = 10;

/// Percentile of window counts used as the oscillation threshold.
pub const OSCILLATION_PERCENTILE: f64 = 0.90;

// ============================================================================
// Aggregation
// ============================================================================

/// Dominant-issue share at or below which the window is "normal" (percent).
pub const NO_ISSUE_FLOOR_PERCENT: f64 = 3.0;

// ============================================================================
// Simulation
// ============================================================================

/// Simulator step (seconds).
pub const SIMULATION_DT: f64 = 0.1;

/// First-order process response per unit of controller output.
pub const PROCESS_GAIN: f64 = 0.01;

/// Anti-windup clamp on the integral term (±).
pub const INTEGRAL_LIMIT: f64 = 5_000.0;

// ============================================================================
// Synthetic Source
// ============================================================================

/// Samples in a synthetic window. 2 880 = 8 hours at 10 s.
pub const SYNTHETIC_SAMPLES: usize = 2_880;

/// Resample interval of synthetic data (seconds).
pub const SYNTHETIC_INTERVAL_SECS: i64 = 10;

// ============================================================================
// Server
// ============================================================================

/// Default HTTP bind address.
pub const SERVER_ADDR: &str = "0.0.0.0:8080";

/// Request body limit. 8 MiB holds several days of 10 s samples.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;
