//! Tuner Configuration - detector thresholds and plant metadata as TOML values
//!
//! Each struct implements `Default` with the values in [`super::defaults`],
//! so a deployment without a config file behaves identically to the
//! reference plant.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use super::validation::{self, ValidationWarning};
use crate::types::Column;

/// Environment variable holding the config file path.
pub const CONFIG_ENV_VAR: &str = "TUNER_CONFIG";

/// Config file searched for in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "tuner_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one cascade loop deployment.
///
/// Load with `TunerConfig::load()` which searches:
/// 1. `$TUNER_CONFIG` env var
/// 2. `./tuner_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TunerConfig {
    /// Plant identification and engineering unit
    #[serde(default)]
    pub plant: PlantInfo,

    /// Detector thresholds
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Dominant-issue selection
    #[serde(default)]
    pub aggregation: AggregationConfig,

    /// Forward PID simulator constants
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Which column feeds the inner-loop setpoint
    #[serde(default)]
    pub mapping: MappingConfig,

    /// CSV header names for each logical column
    #[serde(default)]
    pub columns: ColumnNames,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

impl TunerConfig {
    /// Load configuration using the standard search order:
    /// 1. `$TUNER_CONFIG` environment variable
    /// 2. `./tuner_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), plant = %config.plant.name, "Loaded tuner config from TUNER_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from TUNER_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "TUNER_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(plant = %config.plant.name, "Loaded tuner config from ./tuner_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./tuner_config.toml, using defaults");
                }
            }
        }

        info!("No tuner_config.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from an explicit path when given (errors are fatal), otherwise search.
    pub fn load_or_search(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                let config = Self::load_from_file(p)?;
                info!(path = %p.display(), plant = %config.plant.name, "Loaded tuner config");
                Ok(config)
            }
            None => Ok(Self::load()),
        }
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let (config, warnings) = Self::from_toml_str(&contents, path)?;
        for w in &warnings {
            warn!("{}", w);
        }
        Ok(config)
    }

    /// Parse and validate TOML text.
    ///
    /// Two passes: unknown keys become warnings (never errors), then serde
    /// deserialization and range validation. `origin` only labels errors.
    pub fn from_toml_str(
        contents: &str,
        origin: &Path,
    ) -> Result<(Self, Vec<ValidationWarning>), ConfigError> {
        let mut warnings = validation::validate_unknown_keys(contents);

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(origin.to_path_buf(), e))?;
        warnings.extend(config.validate()?);
        Ok((config, warnings))
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate ranges. Returns non-fatal warnings on success.
    pub fn validate(&self) -> Result<Vec<ValidationWarning>, ConfigError> {
        let (errors, warnings) = validation::validate_ranges(self);
        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Column supplying the inner-loop setpoint.
    pub fn inner_setpoint_column(&self) -> Column {
        match self.mapping.secondary_setpoint {
            SecondarySetpointSource::MeasureSecondary => Column::MeasureSecondary,
            SecondarySetpointSource::SetpointSecondary => Column::SetpointSecondary,
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            Self::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            Self::Serialize(e) => write!(f, "Config serialization error: {e}"),
            Self::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {e}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Plant Info
// ============================================================================

/// Identification metadata. Appears in logs and rationale text only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantInfo {
    /// Plant / loop identifier
    #[serde(default = "default_plant_name")]
    pub name: String,

    /// Engineering unit of the outer-loop measurement
    #[serde(default = "default_units")]
    pub units: String,
}

fn default_plant_name() -> String {
    "DEFAULT".to_string()
}
fn default_units() -> String {
    "°C".to_string()
}

impl Default for PlantInfo {
    fn default() -> Self {
        Self {
            name: default_plant_name(),
            units: default_units(),
        }
    }
}

// ============================================================================
// Detection
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Settling band half-width as a fraction of the setpoint
    #[serde(default = "default_settling_tolerance")]
    pub settling_tolerance: f64,

    /// Samples per oscillation counting window
    #[serde(default = "default_oscillation_window")]
    pub oscillation_window: usize,

    /// Quantile (0-1) of window counts used as the oscillation threshold
    #[serde(default = "default_oscillation_percentile")]
    pub oscillation_percentile: f64,
}

fn default_settling_tolerance() -> f64 { defaults::SETTLING_TOLERANCE }
fn default_oscillation_window() -> usize { defaults::OSCILLATION_WINDOW }
fn default_oscillation_percentile() -> f64 { defaults::OSCILLATION_PERCENTILE }

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            settling_tolerance: default_settling_tolerance(),
            oscillation_window: default_oscillation_window(),
            oscillation_percentile: default_oscillation_percentile(),
        }
    }
}

// ============================================================================
// Aggregation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Dominant share at or below this percentage reports "normal"
    #[serde(default = "default_no_issue_floor")]
    pub no_issue_floor_percent: f64,
}

fn default_no_issue_floor() -> f64 { defaults::NO_ISSUE_FLOOR_PERCENT }

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            no_issue_floor_percent: default_no_issue_floor(),
        }
    }
}

// ============================================================================
// Simulation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Integration step (s). Zero or negative disables the derivative term.
    #[serde(default = "default_dt")]
    pub dt: f64,

    /// Change in measured value per unit of controller output
    #[serde(default = "default_process_gain")]
    pub process_gain: f64,

    /// Integral term clamp (±)
    #[serde(default = "default_integral_limit")]
    pub integral_limit: f64,
}

fn default_dt() -> f64 { defaults::SIMULATION_DT }
fn default_process_gain() -> f64 { defaults::PROCESS_GAIN }
fn default_integral_limit() -> f64 { defaults::INTEGRAL_LIMIT }

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            process_gain: default_process_gain(),
            integral_limit: default_integral_limit(),
        }
    }
}

// ============================================================================
// Column Mapping
// ============================================================================

/// Source of the inner-loop setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondarySetpointSource {
    /// Inner setpoint equals inner measurement (reference plant wiring)
    #[default]
    MeasureSecondary,
    /// Use the recorded inner setpoint column
    SetpointSecondary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingConfig {
    #[serde(default)]
    pub secondary_setpoint: SecondarySetpointSource,
}

/// CSV header names for each logical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnNames {
    #[serde(default = "default_col_time")]
    pub time: String,
    #[serde(default = "default_col_setpoint_primary")]
    pub setpoint_primary: String,
    #[serde(default = "default_col_measure_primary")]
    pub measure_primary: String,
    #[serde(default = "default_col_measure_secondary")]
    pub measure_secondary: String,
    /// Optional in the data; absence is not an error
    #[serde(default = "default_col_setpoint_secondary")]
    pub setpoint_secondary: String,
    #[serde(default = "default_col_control_valve")]
    pub control_valve_secondary: String,
}

fn default_col_time() -> String { "time".to_string() }
fn default_col_setpoint_primary() -> String { "setpointPrimary".to_string() }
fn default_col_measure_primary() -> String { "measureValuePrimary".to_string() }
fn default_col_measure_secondary() -> String { "measureValueSecondary".to_string() }
fn default_col_setpoint_secondary() -> String { "setpointSecondary".to_string() }
fn default_col_control_valve() -> String { "controlvalveSecondary".to_string() }

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            time: default_col_time(),
            setpoint_primary: default_col_setpoint_primary(),
            measure_primary: default_col_measure_primary(),
            measure_secondary: default_col_measure_secondary(),
            setpoint_secondary: default_col_setpoint_secondary(),
            control_valve_secondary: default_col_control_valve(),
        }
    }
}

impl ColumnNames {
    /// `(dotted key, header)` pairs, used for validation messages.
    pub fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("columns.time", self.time.as_str()),
            ("columns.setpoint_primary", self.setpoint_primary.as_str()),
            ("columns.measure_primary", self.measure_primary.as_str()),
            ("columns.measure_secondary", self.measure_secondary.as_str()),
            ("columns.setpoint_secondary", self.setpoint_secondary.as_str()),
            ("columns.control_valve_secondary", self.control_valve_secondary.as_str()),
        ]
    }
}

// ============================================================================
// Server
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server bind address.
    ///
    /// Can be overridden by `SERVER_ADDR` env var or `--addr` CLI flag.
    #[serde(default = "default_server_addr")]
    pub addr: String,

    /// Maximum accepted request body (bytes)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_server_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}
fn default_max_body_bytes() -> usize {
    defaults::MAX_BODY_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
