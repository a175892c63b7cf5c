//! Scopeprof library
//!
//! Lightweight execution profiling: wall-clock time and heap growth of a
//! callable, a block, or each source line executed inside one.
//!
//! ```ignore
//! use scopeprof::{ltimer, timer, traced};
//!
//! #[traced]
//! fn fib(n: u64) -> u64 {
//!     if n < 2 {
//!         return n;
//!     }
//!     fib(n - 1) + fib(n - 2)
//! }
//!
//! let total = timer().wrap(|n| fib(n)).call(25);
//! let lines = ltimer().run(|| fib(20));
//! ```

// Lets step calls expanded inside this crate name it by its public path
extern crate self as scopeprof;

pub mod aggregator;
pub mod commands;
pub mod metric;
pub mod output;
pub mod profiler;
pub mod trace;
pub mod utils;

pub use aggregator::{compute_statistics, LineSampleMap, SourceLocation, Statistics};
pub use metric::{HeapUsage, Metric, MetricKind, TrackingAllocator, WallClock};
pub use output::{CollectingSink, Format, Output, Report, ReportData, ReportSink, RunSamples};
pub use profiler::{
    lmem, ltimer, mem, timer, LineMemTracer, LineProfiled, LineProfiler, LineScope, LineTimer,
    MemTracer, Profiled, Profiler, ProfilerBuilder, RunScope, Timer,
};
pub use scopeprof_macros::{trace_lines, traced};
pub use trace::ExecutionTracer;
pub use utils::{load_config, ProfileError, ProfilerConfig};
