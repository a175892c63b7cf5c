//! Report payloads handed from profilers to sinks.

use crate::aggregator::LineSampleMap;
use crate::metric::MetricKind;
use crate::utils::config::{
    LINE_MEMORY_TITLE, LINE_TIMING_TITLE, MEMORY_TITLE, NO_LINE_DATA, NO_MEMORY_DATA,
    NO_TIMING_DATA, TIMING_TITLE,
};

/// Per-repeat totals of a whole-run measurement, in repeat order
pub type RunSamples = Vec<f64>;

/// Measured data carried by a [`Report`]
#[derive(Debug, Clone, PartialEq)]
pub enum ReportData {
    /// One total per repeat
    Runs(RunSamples),
    /// Per-line deltas attributed within `root_file`
    Lines {
        root_file: String,
        samples: LineSampleMap,
    },
}

/// One finished measurement, ready for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub kind: MetricKind,
    /// Name of the measured unit, when one was given
    pub label: Option<String>,
    pub data: ReportData,
}

impl Report {
    pub fn runs(kind: MetricKind, label: Option<String>, samples: RunSamples) -> Self {
        Self {
            kind,
            label,
            data: ReportData::Runs(samples),
        }
    }

    pub fn lines(
        kind: MetricKind,
        label: Option<String>,
        root_file: impl Into<String>,
        samples: LineSampleMap,
    ) -> Self {
        Self {
            kind,
            label,
            data: ReportData::Lines {
                root_file: root_file.into(),
                samples,
            },
        }
    }

    /// Whether the measurement produced no samples at all
    pub fn is_empty(&self) -> bool {
        match &self.data {
            ReportData::Runs(samples) => samples.is_empty(),
            ReportData::Lines { samples, .. } => samples.is_empty(),
        }
    }

    /// Notice rendered in place of a table when [`is_empty`](Self::is_empty)
    pub fn no_data_notice(&self) -> &'static str {
        match (&self.data, self.kind) {
            (ReportData::Runs(_), MetricKind::Time) => NO_TIMING_DATA,
            (ReportData::Runs(_), MetricKind::Memory) => NO_MEMORY_DATA,
            (ReportData::Lines { .. }, _) => NO_LINE_DATA,
        }
    }

    /// Run samples, if this is a whole-run report
    pub fn run_samples(&self) -> Option<&[f64]> {
        match &self.data {
            ReportData::Runs(samples) => Some(samples),
            ReportData::Lines { .. } => None,
        }
    }

    /// Line samples, if this is a line report
    pub fn line_samples(&self) -> Option<&LineSampleMap> {
        match &self.data {
            ReportData::Runs(_) => None,
            ReportData::Lines { samples, .. } => Some(samples),
        }
    }

    /// Heading shown above tables and as the first CSV line
    pub fn title(&self) -> String {
        match (&self.data, self.kind) {
            (ReportData::Runs(_), kind) => {
                let title = match kind {
                    MetricKind::Time => TIMING_TITLE,
                    MetricKind::Memory => MEMORY_TITLE,
                };
                match &self.label {
                    Some(label) => format!("{} for function {}", title, label),
                    None => title.to_string(),
                }
            }
            (ReportData::Lines { root_file, .. }, MetricKind::Time) => {
                format!("{} for code in file '{}'", LINE_TIMING_TITLE, root_file)
            }
            (ReportData::Lines { root_file, .. }, MetricKind::Memory) => {
                format!("{} for code in file '{}'", LINE_MEMORY_TITLE, root_file)
            }
        }
    }
}
