//! Human-readable reports for streams and text files.
//!
//! Reports are rendered as a timestamped block: a one-line message when there
//! are fewer than two run samples, otherwise a table.

use super::report::{Report, ReportData};
use super::source::SourceCache;
use crate::aggregator::{compute_statistics, LineSampleMap};
use crate::metric::MetricKind;
use crate::utils::config::{MEM_UNITS, MEM_UNIT_STEP, TIME_PRECISION};
use colored::Colorize;
use tabled::{
    builder::Builder as TableBuilder,
    settings::{style::HorizontalLine, Panel as TablePanel, Style as TableStyle},
};

/// Render a report as text
///
/// `color` enables ANSI styling and is only set for terminal destinations.
pub fn render_text(report: &Report, color: bool) -> String {
    let body = match &report.data {
        ReportData::Runs(samples) => render_runs(report, samples, color),
        ReportData::Lines { samples, .. } => render_lines(report, samples, color),
    };

    let stamp = format!("[{}]", chrono::Local::now().format("%H:%M:%S"));
    let stamp = if color {
        stamp.dimmed().to_string()
    } else {
        stamp
    };

    if body.contains('\n') {
        format!("{}\n{}\n", stamp, body)
    } else {
        format!("{} {}\n", stamp, body)
    }
}

/// Format seconds with the report precision
pub fn format_seconds(seconds: f64) -> String {
    format!("{:.*} seconds", TIME_PRECISION, seconds)
}

/// Format a byte count in the largest unit that keeps it at most 2048
///
/// ```ignore
/// assert_eq!(format_memory(1024.0), "1024.00 bytes");
/// assert_eq!(format_memory(1_048_576.0), "1024.00 kB");
/// ```
pub fn format_memory(bytes: f64) -> String {
    let mut value = bytes;
    let mut unit = MEM_UNITS[0];
    for &next in &MEM_UNITS[1..] {
        if value.abs() <= MEM_UNIT_STEP {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{:.2} {}", value, unit)
}

fn headline(label: &str, value: String, color: bool) -> String {
    if color {
        format!("{} {}", label.green().bold(), value)
    } else {
        format!("{} {}", label, value)
    }
}

fn notice(message: &str, color: bool) -> String {
    if color {
        message.yellow().bold().to_string()
    } else {
        message.to_string()
    }
}

fn render_runs(report: &Report, samples: &[f64], color: bool) -> String {
    let Some(stats) = compute_statistics(samples) else {
        return notice(report.no_data_notice(), color);
    };

    if stats.count == 1 {
        return match report.kind {
            MetricKind::Time => headline("Elapsed time:", format_seconds(stats.sum), color),
            MetricKind::Memory => headline("Total Memory Used:", format_memory(stats.sum), color),
        };
    }

    let rows: Vec<[String; 2]> = match report.kind {
        MetricKind::Time => vec![
            [
                "Total elapsed time".into(),
                format!("{} over {} runs", format_seconds(stats.sum), stats.count),
            ],
            ["Average time per run".into(), format_seconds(stats.mean)],
            ["Standard deviation".into(), format_seconds(stats.stdev)],
            ["Median time".into(), format_seconds(stats.median)],
            ["Interquartile range (IQR)".into(), format_seconds(stats.iqr)],
            ["Minimum time".into(), format_seconds(stats.min)],
            ["Maximum time".into(), format_seconds(stats.max)],
        ],
        MetricKind::Memory => vec![
            [
                "Total memory used".into(),
                format!("{} over {} runs", format_memory(stats.sum), stats.count),
            ],
            ["Average memory per run".into(), format_memory(stats.mean)],
            ["Standard deviation".into(), format_memory(stats.stdev)],
            ["Median memory".into(), format_memory(stats.median)],
            ["Interquartile range (IQR)".into(), format_memory(stats.iqr)],
            ["Minimum memory".into(), format_memory(stats.min)],
            ["Maximum memory".into(), format_memory(stats.max)],
        ],
    };

    let mut builder = TableBuilder::default();
    builder.set_header(["Metric", "Value"]);
    for row in rows {
        builder.push_record(row);
    }
    finish_table(builder, &report.title())
}

fn render_lines(report: &Report, samples: &LineSampleMap, color: bool) -> String {
    if samples.is_empty() {
        return notice(report.no_data_notice(), color);
    }

    let (total_header, avg_header) = match report.kind {
        MetricKind::Time => ("Total Time (s)", "Avg Time (s)"),
        MetricKind::Memory => ("Total Memory", "Avg Memory"),
    };

    let entries = samples.sorted();
    let mut sources = SourceCache::new();
    let snippets = sources.snippets(entries.iter().map(|(loc, _)| (loc.file, loc.line)));

    let mut builder = TableBuilder::default();
    builder.set_header(["Line No.", "Code", total_header, avg_header, "Count"]);

    for ((location, deltas), code) in entries.iter().zip(snippets) {
        let Some(stats) = compute_statistics(deltas) else {
            continue;
        };
        let (total, average) = match report.kind {
            MetricKind::Time => (
                format!("{:.*}", TIME_PRECISION, stats.sum),
                format!("{:.*}", TIME_PRECISION, stats.mean),
            ),
            MetricKind::Memory => (format_memory(stats.sum), format_memory(stats.mean)),
        };
        builder.push_record([
            location.line.to_string(),
            code,
            total,
            average,
            stats.count.to_string(),
        ]);
    }

    finish_table(builder, &report.title())
}

fn finish_table(builder: TableBuilder, title: &str) -> String {
    let mut table = builder.build();
    table.with(TablePanel::header(title));
    table.with(TableStyle::rounded().horizontals([HorizontalLine::new(
        1,
        TableStyle::modern().get_horizontal(),
    )]));
    table.to_string()
}
