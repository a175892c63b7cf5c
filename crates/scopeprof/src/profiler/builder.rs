//! Configured construction of profilers.

use crate::output::{Output, ReportSink};
use crate::utils::config::{validate_repeat, ProfilerConfig, DEFAULT_REPEAT};
use crate::utils::error::ProfileError;
use std::marker::PhantomData;
use std::sync::Arc;

/// Settings shared by every profiler kind
#[derive(Clone)]
pub struct Settings {
    pub(crate) repeat: i64,
    pub(crate) sink: Arc<dyn ReportSink>,
    pub(crate) label: Option<String>,
    pub(crate) root_file: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repeat: DEFAULT_REPEAT as i64,
            sink: Arc::new(Output::default()),
            label: None,
            root_file: None,
        }
    }
}

/// Validated settings, as stored by a profiler
#[derive(Clone)]
pub(crate) struct Resolved {
    pub(crate) repeat: usize,
    pub(crate) sink: Arc<dyn ReportSink>,
    pub(crate) label: Option<String>,
    pub(crate) root_file: Option<String>,
}

impl Settings {
    pub(crate) fn resolve(self) -> Result<Resolved, ProfileError> {
        Ok(Resolved {
            repeat: validate_repeat(self.repeat)?,
            sink: self.sink,
            label: self.label,
            root_file: self.root_file,
        })
    }
}

impl Default for Resolved {
    fn default() -> Self {
        Self {
            repeat: DEFAULT_REPEAT,
            sink: Arc::new(Output::default()),
            label: None,
            root_file: None,
        }
    }
}

/// Profilers buildable by [`ProfilerBuilder`]
pub trait FromSettings: Sized {
    fn from_settings(settings: Settings) -> Result<Self, ProfileError>;
}

/// Builder for [`Profiler`](super::Profiler) and
/// [`LineProfiler`](super::LineProfiler)
///
/// ```ignore
/// let timer = Timer::builder()
///     .repeat(5)
///     .output("reports/parse.csv")
///     .label("parse")
///     .build()?;
/// ```
pub struct ProfilerBuilder<P> {
    settings: Settings,
    _profiler: PhantomData<fn() -> P>,
}

impl<P: FromSettings> ProfilerBuilder<P> {
    pub(crate) fn new() -> Self {
        Self {
            settings: Settings::default(),
            _profiler: PhantomData,
        }
    }

    /// Number of runs per invocation of a wrapped callable
    ///
    /// Checked by [`build`](Self::build): values below one are rejected.
    pub fn repeat(mut self, repeat: i64) -> Self {
        self.settings.repeat = repeat;
        self
    }

    /// Render reports to `output`
    pub fn output(mut self, output: impl Into<Output>) -> Self {
        self.settings.sink = Arc::new(output.into());
        self
    }

    /// Hand reports to a custom sink instead of rendering them
    pub fn sink(mut self, sink: impl ReportSink + 'static) -> Self {
        self.settings.sink = Arc::new(sink);
        self
    }

    /// Name shown in report titles
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.settings.label = Some(label.into());
        self
    }

    /// Apply the values present in a loaded configuration file
    pub fn config(mut self, config: &ProfilerConfig) -> Self {
        if let Some(repeat) = config.repeat {
            self.settings.repeat = repeat;
        }
        if let Some(path) = &config.output {
            self.settings.sink = Arc::new(Output::File(path.clone()));
        }
        if let Some(label) = &config.label {
            self.settings.label = Some(label.clone());
        }
        self
    }

    /// Validate the settings and create the profiler
    ///
    /// # Errors
    /// * `ProfileError::InvalidConfiguration` - If the repeat count is below one
    pub fn build(self) -> Result<P, ProfileError> {
        P::from_settings(self.settings)
    }
}

impl<M: crate::metric::Metric> ProfilerBuilder<super::LineProfiler<M>> {
    /// File whose lines are attributed
    ///
    /// Defaults to the file that calls `wrap`, `scope` or `run`.
    pub fn root_file(mut self, file: impl Into<String>) -> Self {
        self.settings.root_file = Some(file.into());
        self
    }
}
