//! Tuner Configuration Module
//!
//! Every detector threshold, simulator constant and column name is an
//! operator-tunable TOML value.
//!
//! ## Loading Order
//!
//! 1. `TUNER_CONFIG` environment variable (path to TOML file)
//! 2. `tuner_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Load once at startup and pass it down explicitly:
//!
//! ```ignore
//! let config = Arc::new(TunerConfig::load());
//! let engine = TuningEngine::new(config.clone());
//! ```

mod tuner_config;
pub mod defaults;
pub mod validation;

pub use tuner_config::*;
pub use validation::ValidationWarning;
