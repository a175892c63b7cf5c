//! Heap usage metric backed by [`TrackingAllocator`](super::TrackingAllocator).

use super::allocator::{self, PeakWindow};
use super::{Metric, MetricKind};
use log::warn;
use std::sync::Once;

static MISSING_ALLOCATOR: Once = Once::new();

fn warn_if_not_installed() {
    if !allocator::is_installed() {
        MISSING_ALLOCATOR.call_once(|| {
            warn!(
                "Memory profiling enabled but no allocation has gone through TrackingAllocator; \
                 set it as #[global_allocator] or every memory reading will be zero"
            );
        });
    }
}

/// Heap bytes of the current thread
///
/// Line deltas are live-byte differences and go negative when memory is
/// freed. Whole-region measurements report the peak growth above the live
/// value at the start of the region.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapUsage;

impl Metric for HeapUsage {
    type Mark = PeakWindow;

    const KIND: MetricKind = MetricKind::Memory;

    fn sample(&self) -> f64 {
        allocator::live_bytes() as f64
    }

    fn mark(&self) -> PeakWindow {
        warn_if_not_installed();
        allocator::open_peak_window()
    }

    fn measure(&self, mark: PeakWindow) -> f64 {
        mark.close() as f64
    }
}
