//! Configuration and constants for profilers and reports.

use super::error::ProfileError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Number of times a wrapped callable runs per invocation when not configured
pub const DEFAULT_REPEAT: usize = 1;

/// File extension that selects CSV output (compared case-insensitively)
pub const CSV_EXTENSION: &str = "csv";

/// Decimal places used for seconds in console and text reports
pub const TIME_PRECISION: usize = 6;

// Memory units step up once the value exceeds this many of the current unit
pub const MEM_UNIT_STEP: f64 = 2048.0;
pub const MEM_UNITS: &[&str] = &["bytes", "kB", "MB", "GB"];

/// Placeholder for lines whose source text cannot be read
pub const SOURCE_UNAVAILABLE: &str = "<source unavailable>";

// Notices rendered instead of a table when nothing was measured
pub const NO_TIMING_DATA: &str = "No timing data available.";
pub const NO_MEMORY_DATA: &str = "No memory usage data available.";
pub const NO_LINE_DATA: &str = "No line data available.";

// Report titles
pub const TIMING_TITLE: &str = "Timing Report";
pub const MEMORY_TITLE: &str = "Memory Usage Report";
pub const LINE_TIMING_TITLE: &str = "Line Timing Report";
pub const LINE_MEMORY_TITLE: &str = "Line Memory Report";

/// Profiler settings loadable from a TOML file
///
/// ```toml
/// repeat = 5
/// output = "reports/run.csv"
/// label = "parse_all"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilerConfig {
    /// Repeat count; kept signed so that negative values in a file are
    /// reported as configuration errors instead of parse errors
    #[serde(default)]
    pub repeat: Option<i64>,

    /// Report destination; stderr when absent
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Name shown in report titles
    #[serde(default)]
    pub label: Option<String>,
}

impl ProfilerConfig {
    /// Validated repeat count, falling back to [`DEFAULT_REPEAT`]
    pub fn repeat(&self) -> Result<usize, ProfileError> {
        match self.repeat {
            None => Ok(DEFAULT_REPEAT),
            Some(n) => validate_repeat(n),
        }
    }
}

/// Check that a repeat count is at least one
pub fn validate_repeat(repeat: i64) -> Result<usize, ProfileError> {
    if repeat < 1 {
        return Err(ProfileError::invalid_repeat(repeat));
    }
    usize::try_from(repeat).map_err(|_| ProfileError::invalid_repeat(repeat))
}

/// Load profiler settings from a TOML file
///
/// # Errors
/// * `ProfileError::Io` - If the file cannot be read
/// * `ProfileError::ConfigParse` - If the TOML is invalid
/// * `ProfileError::InvalidConfiguration` - If `repeat` is below one
pub fn load_config(path: impl AsRef<Path>) -> Result<ProfilerConfig, ProfileError> {
    let contents = fs::read_to_string(path)?;
    let config: ProfilerConfig = toml::from_str(&contents)?;
    config.repeat()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_validate_repeat() {
        assert_eq!(validate_repeat(1).unwrap(), 1);
        assert_eq!(validate_repeat(10).unwrap(), 10);
        assert!(matches!(
            validate_repeat(0),
            Err(ProfileError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            validate_repeat(-3),
            Err(ProfileError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_load_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "repeat = 3\noutput = \"out/report.csv\"\nlabel = \"work\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.repeat().unwrap(), 3);
        assert_eq!(config.output, Some(PathBuf::from("out/report.csv")));
        assert_eq!(config.label.as_deref(), Some("work"));
    }

    #[test]
    fn test_load_config_defaults() {
        let file = NamedTempFile::new().unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.repeat().unwrap(), DEFAULT_REPEAT);
        assert!(config.output.is_none());
    }

    #[test]
    fn test_load_config_negative_repeat() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "repeat = -2").unwrap();
        assert!(matches!(
            load_config(file.path()),
            Err(ProfileError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_load_config_malformed() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "repeat = \"many\"").unwrap();
        assert!(matches!(
            load_config(file.path()),
            Err(ProfileError::ConfigParse(_))
        ));
    }
}
