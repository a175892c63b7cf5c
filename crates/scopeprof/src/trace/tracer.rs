//! Per-line delta attribution.
//!
//! Each line event inside the root file closes the measurement of the line
//! before it: the metric difference since the previous event is appended to
//! the previous location. Events from other files are ignored, which folds
//! the cost of foreign code into the root-file line that called it.

use super::{enter_session, exit_session, SessionExit, SessionId, StepHook};
use crate::aggregator::{LineSampleMap, SourceLocation};
use crate::metric::allocator::untracked;
use crate::metric::Metric;
use log::{debug, warn};
use std::cell::RefCell;
use std::rc::Rc;

/// Mutable state of one trace session
#[derive(Debug)]
struct TraceState<M> {
    metric: M,
    root_file: String,
    previous: Option<(SourceLocation, f64)>,
    samples: LineSampleMap,
    foreign_steps: u64,
}

impl<M: Metric> TraceState<M> {
    fn observe(&mut self, location: SourceLocation, now: f64) {
        if let Some((previous, baseline)) = self.previous {
            self.samples.record(previous, now - baseline);
        }
        self.previous = Some((location, now));
    }

    /// Close the last pending measurement
    fn flush(&mut self, now: f64) {
        if let Some((previous, baseline)) = self.previous.take() {
            self.samples.record(previous, now - baseline);
        }
    }
}

/// Hook handed to the thread's slot; shares state with its tracer
struct TracerHook<M>(Rc<RefCell<TraceState<M>>>);

impl<M: Metric> StepHook for TracerHook<M> {
    fn on_step(&mut self, location: SourceLocation) {
        let mut state = self.0.borrow_mut();
        // Read first so that bookkeeping below is not billed to the line
        let now = state.metric.sample();
        if location.file != state.root_file {
            state.foreign_steps += 1;
            return;
        }
        untracked(|| state.observe(location, now));
    }
}

/// One active line-tracing session on the current thread
///
/// Created by [`ExecutionTracer::begin`], which installs the session's hook.
/// [`ExecutionTracer::end`] (or dropping the tracer, including while a panic
/// unwinds) flushes the last pending delta and ends the session. Tracers may
/// end in any order; see [`exit_session`](super::exit_session).
pub struct ExecutionTracer<M: Metric> {
    state: Rc<RefCell<TraceState<M>>>,
    session: Option<SessionId>,
}

impl<M: Metric> ExecutionTracer<M> {
    /// Install a tracer attributing lines of `root_file`
    pub fn begin(root_file: impl Into<String>) -> Self {
        untracked(|| {
            let root_file = root_file.into();
            debug!("Tracing {} lines in {}", M::KIND, root_file);

            let state = Rc::new(RefCell::new(TraceState {
                metric: M::default(),
                root_file,
                previous: None,
                samples: LineSampleMap::new(),
                foreign_steps: 0,
            }));
            let session = enter_session(Box::new(TracerHook(Rc::clone(&state))));

            Self {
                state,
                session: Some(session),
            }
        })
    }

    pub fn root_file(&self) -> String {
        self.state.borrow().root_file.clone()
    }

    /// Whether this session's hook is still installed
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Finish the session and return the samples collected
    pub fn end(self) -> LineSampleMap {
        // The session's state is released here too, still uncounted
        untracked(move || {
            let mut tracer = self;
            tracer.finish()
        })
    }

    /// Flush, end the session and take the samples
    ///
    /// Idempotent: a second call returns an empty map.
    pub(crate) fn finish(&mut self) -> LineSampleMap {
        let Some(session) = self.session.take() else {
            return LineSampleMap::new();
        };

        let mut state = self.state.borrow_mut();
        let now = state.metric.sample();

        untracked(|| {
            state.flush(now);

            match exit_session(session) {
                SessionExit::Restored => {}
                SessionExit::Unlinked => debug!(
                    "Trace of {} ended inside a newer trace; that trace keeps the hook",
                    state.root_file
                ),
                SessionExit::Unknown => {
                    warn!("Trace session for {} was already gone", state.root_file)
                }
            }

            let samples = std::mem::take(&mut state.samples);
            debug!(
                "Trace of {} finished: {} lines, {} samples, {} foreign steps",
                state.root_file,
                samples.len(),
                samples.sample_count(),
                state.foreign_steps
            );
            samples
        })
    }
}

impl<M: Metric> Drop for ExecutionTracer<M> {
    fn drop(&mut self) {
        if self.is_open() {
            let discarded = self.finish();
            untracked(move || drop(discarded));
        }
    }
}
