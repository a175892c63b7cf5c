//! Scopeprof CLI
//!
//! Summary statistics over samples, and demonstration workloads for the
//! time and memory profilers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::debug;
use std::path::PathBuf;

use scopeprof::commands::{
    display_version, execute_alloc, execute_sleep, execute_stats, AllocArgs, SleepArgs, StatsArgs,
};
use scopeprof::{load_config, TrackingAllocator};

#[global_allocator]
static GLOBAL: TrackingAllocator = TrackingAllocator;

/// Scopeprof - time and memory profiling for Rust code
#[derive(Parser, Debug)]
#[command(name = "scopeprof")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Profiler settings file (TOML: repeat, output, label)
    #[arg(short, long, global = true, env = "SCOPEPROF_CONFIG")]
    config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute summary statistics over samples
    Stats {
        /// Samples
        #[arg(allow_negative_numbers = true)]
        values: Vec<f64>,

        /// Read samples from a file (whitespace or comma separated)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Time a sleeping workload
    Sleep {
        /// Sleep duration per run in milliseconds
        #[arg(long, default_value = "100")]
        ms: u64,

        /// Runs per invocation
        #[arg(short, long, allow_negative_numbers = true)]
        repeat: Option<i64>,

        /// Report path (.csv for CSV, anything else for text); stderr when absent
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Attribute time to source lines
        #[arg(long)]
        lines: bool,
    },

    /// Measure the heap growth of an allocation
    Alloc {
        /// Bytes allocated per run
        #[arg(long, default_value = "1048576")]
        bytes: usize,

        /// Runs per invocation
        #[arg(short, long, allow_negative_numbers = true)]
        repeat: Option<i64>,

        /// Report path (.csv for CSV, anything else for text); stderr when absent
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    run(cli)
}

/// Load the config file, if any, and execute the selected command
fn run(cli: Cli) -> Result<()> {
    let config = cli
        .config
        .as_ref()
        .map(|path| {
            load_config(path).with_context(|| format!("Failed to load config {}", path.display()))
        })
        .transpose()?;
    if let Some(config) = &config {
        debug!("Loaded config: {:?}", config);
    }

    // Execute command
    match cli.command {
        Commands::Stats { values, file, json } => {
            execute_stats(StatsArgs { values, file, json })?;
        }
        Commands::Sleep {
            ms,
            repeat,
            out,
            lines,
        } => {
            execute_sleep(SleepArgs {
                millis: ms,
                repeat,
                output: out,
                lines,
                config,
            })?;
        }
        Commands::Alloc { bytes, repeat, out } => {
            execute_alloc(AllocArgs {
                bytes,
                repeat,
                output: out,
                config,
            })?;
        }
        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_negative_repeat() {
        let cli = Cli::parse_from(["scopeprof", "sleep", "--repeat", "-3"]);
        assert!(matches!(
            cli.command,
            Commands::Sleep {
                repeat: Some(-3),
                ..
            }
        ));
    }

    #[test]
    fn test_config_flag_is_global() {
        let cli = Cli::parse_from(["scopeprof", "alloc", "--config", "profile.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("profile.toml")));
    }

    #[test]
    fn test_sleep_writes_csv_report() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("sleep.csv");
        let cli = Cli::parse_from([
            "scopeprof",
            "sleep",
            "--ms",
            "1",
            "--repeat",
            "2",
            "--out",
            out.to_str().unwrap(),
        ]);

        run(cli).unwrap();

        let contents = fs::read_to_string(&out).unwrap();
        assert!(contents.starts_with("Timing Report for function sleep\n"));
        assert!(contents.contains("Number of runs,2"));
    }

    #[test]
    fn test_alloc_reads_repeat_from_config() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("profile.toml");
        fs::write(&config, "repeat = 3\nlabel = \"nightly\"\n").unwrap();
        let out = dir.path().join("alloc.csv");
        let cli = Cli::parse_from([
            "scopeprof",
            "alloc",
            "--bytes",
            "1024",
            "--out",
            out.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ]);

        run(cli).unwrap();

        let contents = fs::read_to_string(&out).unwrap();
        assert!(contents.starts_with("Memory Usage Report for function nightly\n"));
        assert!(contents.contains("Number of runs,3"));
    }

    #[test]
    fn test_invalid_repeat_fails_without_report() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("never.csv");
        let cli = Cli::parse_from([
            "scopeprof",
            "sleep",
            "--ms",
            "1",
            "--repeat",
            "0",
            "--out",
            out.to_str().unwrap(),
        ]);

        assert!(run(cli).is_err());
        assert!(!out.exists());
    }
}
