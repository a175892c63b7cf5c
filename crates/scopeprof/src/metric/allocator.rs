//! Counting global allocator.
//!
//! Install it in the binary (or test binary) that should report memory:
//!
//! ```ignore
//! use scopeprof::TrackingAllocator;
//!
//! #[global_allocator]
//! static GLOBAL: TrackingAllocator = TrackingAllocator;
//! ```
//!
//! Counters are kept per thread, so a measurement only sees allocations made
//! by the thread that opened it. Memory handed to another thread and freed
//! there lowers that thread's live count instead; the live counters are signed
//! for that reason.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

/// Global allocator that forwards to [`System`] and counts heap usage
#[derive(Debug, Default, Clone, Copy)]
pub struct TrackingAllocator;

static INSTALLED: AtomicBool = AtomicBool::new(false);
static PROCESS_LIVE: AtomicI64 = AtomicI64::new(0);

// Const-initialised cells: no lazy initialisation and no destructor, so they
// are safe to touch from inside the allocator.
thread_local! {
    static LIVE: Cell<i64> = const { Cell::new(0) };
    static PEAK: Cell<i64> = const { Cell::new(0) };
    static ALLOC_COUNT: Cell<u64> = const { Cell::new(0) };
    static ALLOC_BYTES: Cell<u64> = const { Cell::new(0) };
    static SUSPENDED: Cell<u32> = const { Cell::new(0) };
}

/// Point-in-time view of the current thread's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeapSnapshot {
    /// Bytes currently live (allocated minus freed on this thread)
    pub live: i64,
    /// Highest `live` value since the innermost open peak window
    pub peak: i64,
    /// Number of allocations performed
    pub allocations: u64,
    /// Total bytes requested across all allocations
    pub allocated: u64,
    /// Bytes currently live across every thread of the process
    pub process_live: i64,
}

fn is_suspended() -> bool {
    SUSPENDED.try_with(|s| s.get() > 0).unwrap_or(true)
}

fn on_alloc(size: usize) {
    INSTALLED.store(true, Ordering::Relaxed);
    if is_suspended() {
        return;
    }
    let size = size as i64;
    PROCESS_LIVE.fetch_add(size, Ordering::Relaxed);
    let _ = LIVE.try_with(|live| {
        let now = live.get() + size;
        live.set(now);
        let _ = PEAK.try_with(|peak| {
            if now > peak.get() {
                peak.set(now);
            }
        });
    });
    let _ = ALLOC_COUNT.try_with(|c| c.set(c.get() + 1));
    let _ = ALLOC_BYTES.try_with(|b| b.set(b.get() + size as u64));
}

fn on_dealloc(size: usize) {
    if is_suspended() {
        return;
    }
    let size = size as i64;
    PROCESS_LIVE.fetch_sub(size, Ordering::Relaxed);
    let _ = LIVE.try_with(|live| live.set(live.get() - size));
}

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            on_alloc(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            on_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        on_dealloc(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            on_dealloc(layout.size());
            on_alloc(new_size);
        }
        new_ptr
    }
}

/// Whether [`TrackingAllocator`] has served at least one allocation
pub fn is_installed() -> bool {
    INSTALLED.load(Ordering::Relaxed)
}

/// Counters of the current thread, plus the process-wide live total
pub fn snapshot() -> HeapSnapshot {
    HeapSnapshot {
        live: LIVE.with(Cell::get),
        peak: PEAK.with(Cell::get),
        allocations: ALLOC_COUNT.with(Cell::get),
        allocated: ALLOC_BYTES.with(Cell::get),
        process_live: PROCESS_LIVE.load(Ordering::Relaxed),
    }
}

/// Bytes currently live on the current thread
pub fn live_bytes() -> i64 {
    LIVE.with(Cell::get)
}

/// An open peak-tracking window
///
/// Windows nest: closing an inner window folds its peak back into the
/// enclosing one.
#[derive(Debug)]
pub struct PeakWindow {
    baseline: i64,
    enclosing_peak: i64,
}

/// Start tracking the peak from the current live value
pub fn open_peak_window() -> PeakWindow {
    let baseline = live_bytes();
    let enclosing_peak = PEAK.with(|peak| peak.replace(baseline));
    PeakWindow {
        baseline,
        enclosing_peak,
    }
}

impl PeakWindow {
    /// Highest growth above the baseline seen while the window was open
    pub fn close(self) -> i64 {
        let peak = PEAK.with(|p| p.get());
        PEAK.with(|p| p.set(peak.max(self.enclosing_peak)));
        peak - self.baseline
    }
}

/// Run `f` without counting its allocations
///
/// Profiler bookkeeping runs here so that it never shows up in a memory
/// measurement. Memory allocated inside and freed inside is invisible;
/// callers keep both sides of such bookkeeping within untracked sections.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    struct Resume;
    impl Drop for Resume {
        fn drop(&mut self) {
            let _ = SUSPENDED.try_with(|s| s.set(s.get() - 1));
        }
    }

    SUSPENDED.with(|s| s.set(s.get() + 1));
    let _resume = Resume;
    f()
}
