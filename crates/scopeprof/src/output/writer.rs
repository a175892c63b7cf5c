//! Report file writer.
//!
//! Writes rendered reports to disk as CSV or formatted text, chosen by the
//! file extension.

use super::console::render_text;
use super::csv::render_csv;
use super::report::Report;
use super::{validate_path, Format};
use crate::utils::error::ProfileError;
use log::{debug, info, warn};
use std::fs;
use std::path::Path;

/// Write a report to a file
///
/// **Public** - used by [`Output::File`](super::Output::File)
///
/// The report is rendered completely before the file is touched, so a
/// rendering failure never leaves a partial file behind. An existing file is
/// overwritten after a warning.
///
/// # Errors
/// * `ProfileError::OutputTarget` - Path is empty, a directory, or its parent cannot be created
/// * `ProfileError::Io` - I/O error during write
/// * `ProfileError::Csv` - CSV encoding error
pub fn write_report(report: &Report, output_path: impl AsRef<Path>) -> Result<(), ProfileError> {
    let output_path = output_path.as_ref();

    validate_path(output_path)?;

    let format = Format::from_path(output_path);
    let contents = match format {
        Format::Csv => render_csv(report)?,
        Format::Text | Format::Console => render_text(report, false),
    };

    // Create parent directories if needed
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            debug!("Creating parent directories: {}", parent.display());
            fs::create_dir_all(parent).map_err(|e| {
                ProfileError::OutputTarget(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    if output_path.exists() {
        warn!(
            "Output file {} already exists. It will be overwritten.",
            output_path.display()
        );
    }

    fs::write(output_path, contents.as_bytes())?;

    info!(
        "{:?} report written to {} ({} bytes)",
        format,
        output_path.display(),
        contents.len()
    );

    Ok(())
}
