//! Shared data structures for cascade loop analysis
//!
//! - `series`: SampleSeries (resampled loop telemetry) and the valve regime band
//! - `issue`: IssueKind, IssueRecord and flagged samples produced by detectors
//! - `gains`: GainSet / CascadeGains for the outer (PID1) and inner (PID2) controllers
//! - `tuning`: IssueLabel and TuningRecommendation produced by the rule table
//! - `report`: the Evaluate result contract

mod series;
mod issue;
mod gains;
mod tuning;
mod report;

pub use series::*;
pub use issue::*;
pub use gains::*;
pub use tuning::*;
pub use report::*;
