//! Per-thread bookkeeping for measured units.
//!
//! A unit marks itself as running on the current thread while it is being
//! measured. A nested invocation of the same unit on the same thread (direct
//! or mutual recursion) sees the mark and runs unmeasured. Other threads keep
//! their own marks and measure independently.

use crate::metric::allocator::untracked;
use log::trace;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_UNIT: AtomicU64 = AtomicU64::new(1);

/// Identity of one wrapped unit, shared by its clones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(u64);

impl UnitId {
    pub(crate) fn next() -> Self {
        UnitId(NEXT_UNIT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

thread_local! {
    static RUNNING: RefCell<HashSet<UnitId>> = RefCell::new(HashSet::new());
}

/// Whether `unit` is being measured on the current thread
pub fn is_running(unit: UnitId) -> bool {
    RUNNING
        .try_with(|running| running.borrow().contains(&unit))
        .unwrap_or(false)
}

/// Running mark held for the duration of one measured invocation
#[derive(Debug)]
pub(crate) struct RunningGuard {
    unit: UnitId,
}

impl RunningGuard {
    /// Mark `unit` as running, or `None` if it already is
    pub(crate) fn enter(unit: UnitId) -> Option<Self> {
        let inserted = untracked(|| RUNNING.with(|running| running.borrow_mut().insert(unit)));
        if inserted {
            Some(RunningGuard { unit })
        } else {
            trace!("{} re-entered, running unmeasured", unit);
            None
        }
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        untracked(|| {
            let _ = RUNNING.try_with(|running| running.borrow_mut().remove(&self.unit));
        });
    }
}

/// Lifecycle of one measured invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Measurement set up for the next repeat or block
    Armed,
    /// Measured code is executing
    Accumulating,
    /// Closing the measurement and handing over samples
    Finalizing,
}

/// Phase of one invocation, logging every transition
#[derive(Debug)]
pub(crate) struct PhaseTracker {
    unit: UnitId,
    phase: Phase,
}

impl PhaseTracker {
    pub(crate) fn new(unit: UnitId) -> Self {
        Self {
            unit,
            phase: Phase::Idle,
        }
    }

    pub(crate) fn advance(&mut self, next: Phase) {
        trace!("{}: {:?} -> {:?}", self.unit, self.phase, next);
        self.phase = next;
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }
}

impl Drop for PhaseTracker {
    fn drop(&mut self) {
        if self.phase() != Phase::Idle {
            self.advance(Phase::Idle);
        }
    }
}
