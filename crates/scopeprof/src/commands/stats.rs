//! Stats command implementation.
//!
//! Summarises a list of samples given on the command line or read from a
//! file, as a table or as JSON.

use crate::aggregator::{compute_statistics, Statistics};
use crate::commands::models::StatsArgs;
use anyhow::{bail, Context, Result};
use log::{debug, info};
use std::fs;
use std::path::Path;
use tabled::{
    builder::Builder as TableBuilder,
    settings::{style::HorizontalLine, Panel as TablePanel, Style as TableStyle},
};

/// Execute the stats command
///
/// **Public** - main entry point called from main.rs
///
/// # Returns
/// The computed statistics, or `None` when there were no samples (reported as
/// "no data", not as an error)
///
/// # Errors
/// * The samples file cannot be read
/// * A sample is not a number
pub fn execute_stats(args: StatsArgs) -> Result<Option<Statistics>> {
    let mut samples = args.values;
    if let Some(path) = &args.file {
        samples.extend(read_samples(path)?);
    }
    debug!("Computing statistics over {} samples", samples.len());

    let Some(stats) = compute_statistics(&samples) else {
        info!("No samples given");
        println!("No data available.");
        return Ok(None);
    };

    if args.json {
        let json = serde_json::to_string_pretty(&stats).context("Failed to serialize statistics")?;
        println!("{}", json);
    } else {
        println!("{}", statistics_table(&stats));
    }

    Ok(Some(stats))
}

/// Parse samples separated by whitespace or commas
pub fn parse_samples(text: &str) -> Result<Vec<f64>> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<f64>()
                .with_context(|| format!("Invalid sample: {:?}", token))
        })
        .collect()
}

fn read_samples(path: &Path) -> Result<Vec<f64>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read samples from {}", path.display()))?;
    let samples = parse_samples(&text)?;
    if samples.iter().any(|s| !s.is_finite()) {
        bail!("Samples in {} must be finite numbers", path.display());
    }
    Ok(samples)
}

fn statistics_table(stats: &Statistics) -> String {
    let mut builder = TableBuilder::default();
    builder.set_header(["Statistic", "Value"]);
    for (key, value) in stats.to_map() {
        builder.push_record([key.to_string(), value.to_string()]);
    }

    let mut table = builder.build();
    table.with(TablePanel::header(format!("Statistics over {} samples", stats.count)));
    table.with(TableStyle::rounded().horizontals([HorizontalLine::new(
        1,
        TableStyle::modern().get_horizontal(),
    )]));
    table.to_string()
}
