//! Metric sampling strategies.
//!
//! Every profiler is generic over a [`Metric`]: the same tracer and the same
//! controllers measure either elapsed time or heap growth depending on the
//! strategy they are instantiated with.

pub mod allocator;
pub mod clock;
pub mod heap;

pub use allocator::{HeapSnapshot, TrackingAllocator};
pub use clock::WallClock;
pub use heap::HeapUsage;

use serde::Serialize;
use std::fmt;

/// What a profiler measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MetricKind {
    /// Elapsed wall-clock seconds
    Time,
    /// Heap bytes
    Memory,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Time => write!(f, "time"),
            MetricKind::Memory => write!(f, "memory"),
        }
    }
}

/// A measurable quantity
pub trait Metric: Default + Send + Sync + 'static {
    /// Token returned by [`Metric::mark`] and consumed by [`Metric::measure`]
    type Mark;

    const KIND: MetricKind;

    /// Current reading, used for per-line deltas
    fn sample(&self) -> f64;

    /// Begin a whole-region measurement
    fn mark(&self) -> Self::Mark;

    /// Total for the region opened by `mark`
    fn measure(&self, mark: Self::Mark) -> f64;
}
