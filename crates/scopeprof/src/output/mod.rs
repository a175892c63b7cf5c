//! Report rendering and destinations.
//!
//! This module turns finished measurements into reports:
//! - Timestamped tables and messages for streams and text files
//! - CSV files, selected by the `.csv` extension
//! - In-memory collection for programmatic consumers

pub mod console;
pub mod csv;
pub mod report;
pub mod source;
pub mod writer;

// Re-export main types and functions
pub use console::{format_memory, format_seconds, render_text};
pub use self::csv::render_csv;
pub use report::{Report, ReportData, RunSamples};
pub use writer::write_report;

use crate::utils::config::CSV_EXTENSION;
use crate::utils::error::ProfileError;
use std::fmt;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Receiver of finished reports
///
/// Profilers hand every report to their sink exactly once, when the
/// measured unit finishes.
pub trait ReportSink: Send + Sync {
    fn emit(&self, report: &Report) -> Result<(), ProfileError>;
}

/// Shared handle to a caller-provided stream
pub type SharedWriter = Arc<Mutex<dyn Write + Send>>;

/// Where a rendered report goes
#[derive(Clone, Default)]
pub enum Output {
    /// Standard error (the default)
    #[default]
    Stderr,
    Stdout,
    /// Any stream; receives the text rendering
    Writer(SharedWriter),
    /// A file; CSV when the extension is `csv`, formatted text otherwise
    File(PathBuf),
}

impl Output {
    /// Destination for a path
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Output::File(path.into())
    }

    /// Destination writing into a shared stream the caller keeps a handle to
    ///
    /// ```ignore
    /// let buffer = Arc::new(Mutex::new(Vec::new()));
    /// let timer = Timer::builder().output(Output::shared(buffer.clone())).build()?;
    /// ```
    pub fn shared<W: Write + Send + 'static>(writer: Arc<Mutex<W>>) -> Self {
        Output::Writer(writer)
    }

    /// Destination owning `writer`
    pub fn writer(writer: impl Write + Send + 'static) -> Self {
        Output::Writer(Arc::new(Mutex::new(writer)))
    }

    pub fn format(&self) -> Format {
        match self {
            Output::File(path) => Format::from_path(path),
            _ => Format::Console,
        }
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Stderr => write!(f, "Stderr"),
            Output::Stdout => write!(f, "Stdout"),
            Output::Writer(_) => write!(f, "Writer(..)"),
            Output::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

impl From<PathBuf> for Output {
    fn from(path: PathBuf) -> Self {
        Output::File(path)
    }
}

impl From<&Path> for Output {
    fn from(path: &Path) -> Self {
        Output::File(path.to_path_buf())
    }
}

impl From<&str> for Output {
    fn from(path: &str) -> Self {
        Output::File(PathBuf::from(path))
    }
}

impl ReportSink for Output {
    fn emit(&self, report: &Report) -> Result<(), ProfileError> {
        match self {
            Output::Stderr => {
                let stderr = io::stderr();
                let text = render_text(report, stderr.is_terminal());
                stderr.lock().write_all(text.as_bytes())?;
            }
            Output::Stdout => {
                let stdout = io::stdout();
                let text = render_text(report, stdout.is_terminal());
                let mut handle = stdout.lock();
                handle.write_all(text.as_bytes())?;
                handle.flush()?;
            }
            Output::Writer(writer) => {
                let text = render_text(report, false);
                let mut writer = writer.lock().unwrap_or_else(|e| e.into_inner());
                writer.write_all(text.as_bytes())?;
                writer.flush()?;
            }
            Output::File(path) => write_report(report, path)?,
        }
        Ok(())
    }
}

/// Rendering selected for a destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Timestamped text for streams
    Console,
    Csv,
    /// Timestamped text written to a file
    Text,
}

impl Format {
    /// Format for a file path, by extension (case-insensitive)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case(CSV_EXTENSION) => Format::Csv,
            _ => Format::Text,
        }
    }
}

/// Sink that keeps reports in memory
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    reports: Arc<Mutex<Vec<Report>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of every report received so far
    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return every report received so far
    pub fn take(&self) -> Vec<Report> {
        std::mem::take(&mut *self.reports.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl ReportSink for CollectingSink {
    fn emit(&self, report: &Report) -> Result<(), ProfileError> {
        self.reports
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(report.clone());
        Ok(())
    }
}

/// Common path validation for output files
pub fn validate_path(path: &Path) -> Result<(), ProfileError> {
    if path.as_os_str().is_empty() {
        return Err(ProfileError::OutputTarget("Path is empty".to_string()));
    }

    if path.exists() && path.is_dir() {
        return Err(ProfileError::OutputTarget(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}
