use crate::utils::config::ProfilerConfig;
use std::path::PathBuf;

/// Arguments for the stats command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone, Default)]
pub struct StatsArgs {
    /// Samples given on the command line
    pub values: Vec<f64>,

    /// File with samples separated by whitespace or commas
    pub file: Option<PathBuf>,

    /// Print JSON instead of a table
    pub json: bool,
}

/// Arguments for the sleep workload
#[derive(Debug, Clone)]
pub struct SleepArgs {
    /// Sleep duration per run in milliseconds
    pub millis: u64,

    /// Runs per invocation; overrides the config file, validated by the profiler
    pub repeat: Option<i64>,

    /// Report destination; stderr when absent
    pub output: Option<PathBuf>,

    /// Attribute time per source line instead of per run
    pub lines: bool,

    /// Settings loaded from `--config`, applied before the flags above
    pub config: Option<ProfilerConfig>,
}

impl Default for SleepArgs {
    fn default() -> Self {
        Self {
            millis: 100,
            repeat: None,
            output: None,
            lines: false,
            config: None,
        }
    }
}

/// Arguments for the allocation workload
#[derive(Debug, Clone)]
pub struct AllocArgs {
    /// Bytes allocated per run
    pub bytes: usize,

    pub repeat: Option<i64>,

    pub output: Option<PathBuf>,

    pub config: Option<ProfilerConfig>,
}

impl Default for AllocArgs {
    fn default() -> Self {
        Self {
            bytes: 1024 * 1024,
            repeat: None,
            output: None,
            config: None,
        }
    }
}
