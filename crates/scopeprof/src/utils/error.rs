//! Error types for the profiling library.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in the CLI.
//!
//! An empty measurement is not an error: it renders as a "no data" notice.

use thiserror::Error;

/// Errors that can occur while configuring a profiler or emitting its report
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Unusable output target: {0}")]
    OutputTarget(String),

    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write CSV report: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to parse configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl ProfileError {
    /// Error raised for a repeat count below one
    pub(crate) fn invalid_repeat(repeat: i64) -> Self {
        Self::InvalidConfiguration(format!("Repeat must be at least 1, got {}", repeat))
    }
}
