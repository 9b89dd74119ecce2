//! cascade-tuner: Cascade PID Loop Tuning Advisor
//!
//! Classifies the dominant control issue in a window of cascade loop data
//! and recommends adjusted gains for the implicated controller.
//!
//! ## Architecture
//!
//! - **Acquisition**: CSV and JSON sample ingestion with bad-data normalization
//! - **Detection**: oscillation, overshoot, undershoot, settling and sluggish detectors
//! - **Aggregation**: percentage-of-window severity and dominant-issue selection
//! - **Tuning**: rule table mapping issue labels to relative gain changes
//! - **Simulator**: forward PID preview of the adjusted gains
//! - **Report**: chart-ready report assembly
//! - **API**: `/api/v2` HTTP surface over the engine

pub mod acquisition;
pub mod aggregation;
pub mod api;
pub mod config;
pub mod detection;
pub mod engine;
pub mod error;
pub mod report;
pub mod simulator;
pub mod synthetic;
pub mod tuning;
pub mod types;

// Re-export configuration
pub use config::TunerConfig;

// Re-export the engine and its errors
pub use engine::TuningEngine;
pub use error::{EvaluateError, SourceError};

// Re-export commonly used types
pub use types::{
    CascadeGains, ControllerId, GainSet, IssueKind, IssueLabel, IssuePercentages, IssueRecord,
    Report, Sample, SampleSeries, TuningRecommendation, NO_GOOD_DATA,
};

// Re-export pipeline stages
pub use aggregation::{SeverityAggregator, Verdict};
pub use simulator::LoopSimulator;
pub use synthetic::{SyntheticLoop, SyntheticPattern};
pub use tuning::TuningRules;
