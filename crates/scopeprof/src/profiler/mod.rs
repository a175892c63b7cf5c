//! Public entry points: wrapped callables and measured blocks.
//!
//! Two profiler families share one builder and one report path:
//! - [`Profiler`] measures the whole run of a callable or block
//! - [`LineProfiler`] attributes the metric to individual source lines
//!
//! Both are generic over a [`Metric`](crate::metric::Metric); the aliases
//! below name the four combinations.

pub mod builder;
pub mod guard;
pub mod lines;
pub mod run;

pub use builder::{FromSettings, ProfilerBuilder, Settings};
pub use guard::{is_running, Phase, UnitId};
pub use lines::{LineProfiled, LineProfiler, LineScope};
pub use run::{Profiled, Profiler, RunScope};

use crate::metric::{HeapUsage, WallClock};
use crate::output::{Report, ReportSink};
use crate::utils::error::ProfileError;
use log::error;
use std::any::type_name;

/// Elapsed time of whole runs
pub type Timer = Profiler<WallClock>;
/// Peak heap growth of whole runs
pub type MemTracer = Profiler<HeapUsage>;
/// Elapsed time per source line
pub type LineTimer = LineProfiler<WallClock>;
/// Heap growth per source line
pub type LineMemTracer = LineProfiler<HeapUsage>;

/// Zero-config [`Timer`]: one run, report to stderr
pub fn timer() -> Timer {
    Timer::new()
}

/// Zero-config [`MemTracer`]
pub fn mem() -> MemTracer {
    MemTracer::new()
}

/// Zero-config [`LineTimer`]
pub fn ltimer() -> LineTimer {
    LineTimer::new()
}

/// Zero-config [`LineMemTracer`]
pub fn lmem() -> LineMemTracer {
    LineMemTracer::new()
}

fn log_emit_error(e: &ProfileError) {
    error!("Failed to emit profiling report: {}", e);
}

/// Hand a report to its sink, logging instead of returning failures
///
/// Used where the measured unit's own result must not be disturbed.
fn emit_isolated(sink: &dyn ReportSink, report: &Report) {
    if let Err(e) = sink.emit(report) {
        log_emit_error(&e);
    }
}

/// Readable name of a callable type, used as the default report label
///
/// `app::parse::tokenize` becomes `tokenize`, a closure defined inside it
/// becomes `closure in tokenize`. Function pointers and trait objects carry
/// no name.
pub(crate) fn callable_name<F>() -> Option<String> {
    let full = type_name::<F>().trim_start_matches('&');
    let path = full.split('<').next().unwrap_or(full);
    if path.contains(|c: char| c == '(' || c == ' ') {
        return None;
    }

    let mut segments: Vec<&str> = path.split("::").collect();
    let mut closure = false;
    while matches!(segments.last(), Some(segment) if segment.starts_with("{{")) {
        segments.pop();
        closure = true;
    }
    let name = segments.last().filter(|name| !name.is_empty())?;
    Some(if closure {
        format!("closure in {}", name)
    } else {
        name.to_string()
    })
}
