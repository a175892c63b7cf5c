//! CSV reports.
//!
//! Layout: the report title, a blank line, then a header row and one record
//! per metric (run reports) or per source line (line reports). Values are raw
//! numbers: seconds or bytes, without units. An empty report carries the
//! no-data notice in place of the header and records.

use super::report::{Report, ReportData};
use super::source::SourceCache;
use crate::aggregator::{compute_statistics, LineSampleMap};
use crate::metric::MetricKind;
use crate::utils::error::ProfileError;
use std::io::Write;

/// Render a report as CSV text
pub fn render_csv(report: &Report) -> Result<String, ProfileError> {
    let mut buf = Vec::new();
    writeln!(buf, "{}", report.title())?;
    writeln!(buf)?;

    if report.is_empty() {
        writeln!(buf, "{}", report.no_data_notice())?;
        return String::from_utf8(buf).map_err(|e| {
            ProfileError::OutputTarget(format!("CSV output is not UTF-8: {}", e))
        });
    }

    let mut writer = csv::Writer::from_writer(buf);
    match &report.data {
        ReportData::Runs(samples) => write_runs(&mut writer, report.kind, samples)?,
        ReportData::Lines { samples, .. } => write_lines(&mut writer, report.kind, samples)?,
    }

    let buf = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(buf)
        .map_err(|e| ProfileError::OutputTarget(format!("CSV output is not UTF-8: {}", e)))
}

fn write_runs<W: Write>(
    writer: &mut csv::Writer<W>,
    kind: MetricKind,
    samples: &[f64],
) -> Result<(), ProfileError> {
    match kind {
        MetricKind::Time => writer.write_record(["Metric", "Value"])?,
        MetricKind::Memory => writer.write_record(["Metric", "Memory Usage (bytes)"])?,
    }

    let Some(stats) = compute_statistics(samples) else {
        return Ok(());
    };

    let count = stats.count.to_string();
    let rows: Vec<(&str, String)> = match kind {
        MetricKind::Time => vec![
            ("Total elapsed time", stats.sum.to_string()),
            ("Number of runs", count),
            ("Average time", stats.mean.to_string()),
            ("Standard deviation", stats.stdev.to_string()),
            ("Median time", stats.median.to_string()),
            ("Interquartile range (IQR)", stats.iqr.to_string()),
            ("Minimum time", stats.min.to_string()),
            ("Maximum time", stats.max.to_string()),
        ],
        MetricKind::Memory => vec![
            ("Number of runs", count),
            ("Average memory", stats.mean.to_string()),
            ("Standard deviation", stats.stdev.to_string()),
            ("Median memory", stats.median.to_string()),
            ("Interquartile range (IQR)", stats.iqr.to_string()),
            ("Minimum memory", stats.min.to_string()),
            ("Maximum memory", stats.max.to_string()),
        ],
    };

    for (metric, value) in rows {
        writer.write_record([metric, value.as_str()])?;
    }
    Ok(())
}

fn write_lines<W: Write>(
    writer: &mut csv::Writer<W>,
    kind: MetricKind,
    samples: &LineSampleMap,
) -> Result<(), ProfileError> {
    let (total_header, avg_header) = match kind {
        MetricKind::Time => ("Total Time (s)", "Avg Time (s)"),
        MetricKind::Memory => ("Total Memory (bytes)", "Avg Memory (bytes)"),
    };
    writer.write_record(["Line No.", "Code", total_header, avg_header, "Count"])?;

    let entries = samples.sorted();
    let mut sources = SourceCache::new();
    let snippets = sources.snippets(entries.iter().map(|(loc, _)| (loc.file, loc.line)));

    for ((location, deltas), code) in entries.iter().zip(snippets) {
        let Some(stats) = compute_statistics(deltas) else {
            continue;
        };
        writer.write_record([
            location.line.to_string(),
            code,
            stats.sum.to_string(),
            stats.mean.to_string(),
            stats.count.to_string(),
        ])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::SourceLocation;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_time_runs_csv() {
        let report = Report::runs(MetricKind::Time, None, vec![1.0, 3.0]);
        let csv = render_csv(&report).unwrap();
        assert_eq!(
            csv,
            "Timing Report\n\
             \n\
             Metric,Value\n\
             Total elapsed time,4\n\
             Number of runs,2\n\
             Average time,2\n\
             Standard deviation,1.4142135623730951\n\
             Median time,3\n\
             Interquartile range (IQR),2\n\
             Minimum time,1\n\
             Maximum time,3\n"
        );
    }

    #[test]
    fn test_memory_runs_csv() {
        let report = Report::runs(MetricKind::Memory, Some("load".into()), vec![1024.0]);
        let csv = render_csv(&report).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Memory Usage Report for function load");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "Metric,Memory Usage (bytes)");
        assert_eq!(lines[3], "Number of runs,1");
        assert_eq!(lines[4], "Average memory,1024");
        assert_eq!(lines.len(), 10);
    }

    #[test]
    fn test_empty_runs_csv_has_notice() {
        let report = Report::runs(MetricKind::Time, None, vec![]);
        assert_eq!(
            render_csv(&report).unwrap(),
            "Timing Report\n\nNo timing data available.\n"
        );

        let report = Report::runs(MetricKind::Memory, Some("load".into()), vec![]);
        assert_eq!(
            render_csv(&report).unwrap(),
            "Memory Usage Report for function load\n\nNo memory usage data available.\n"
        );
    }

    #[test]
    fn test_empty_lines_csv_has_notice() {
        let report = Report::lines(MetricKind::Time, None, "x.rs", LineSampleMap::new());
        assert_eq!(
            render_csv(&report).unwrap(),
            "Line Timing Report for code in file 'x.rs'\n\nNo line data available.\n"
        );
    }

    #[test]
    fn test_lines_csv() {
        let mut samples = LineSampleMap::new();
        samples.record(SourceLocation::new("gone.rs", 7), 0.5);
        samples.record(SourceLocation::new("gone.rs", 7), 1.5);
        samples.record(SourceLocation::new("gone.rs", 2), -64.0);

        let report = Report::lines(MetricKind::Memory, None, "gone.rs", samples);
        let csv = render_csv(&report).unwrap();
        assert_eq!(
            csv,
            "Line Memory Report for code in file 'gone.rs'\n\
             \n\
             Line No.,Code,Total Memory (bytes),Avg Memory (bytes),Count\n\
             2,<source unavailable>,-64,-64,1\n\
             7,<source unavailable>,2,1,2\n"
        );
    }
}
