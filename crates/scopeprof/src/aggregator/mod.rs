//! Aggregation of measured samples.
//!
//! This module turns raw measurements into report inputs:
//! - Per-line delta sequences keyed by source location
//! - Summary statistics (mean, median, stdev, IQR, extremes)

pub mod line_samples;
pub mod statistics;

// Re-export main types and functions
pub use line_samples::{LineSampleMap, SourceLocation};
pub use statistics::{compute_statistics, Statistics};
