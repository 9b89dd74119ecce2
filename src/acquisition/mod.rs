//! Loop data acquisition
//!
//! Ingests already-resampled cascade loop samples and normalizes bad-data
//! markers. Historian access and resampling live outside this crate.
//!
//! - `csv`: CSV export reader with configurable header names
//! - `reading`: value/timestamp normalization and serde adapters for JSON samples

pub mod csv;
pub mod reading;

pub use self::csv::read_csv_samples;
