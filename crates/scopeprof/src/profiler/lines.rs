//! Line profilers: per-line attribution of a metric inside one source file.

use super::builder::{FromSettings, ProfilerBuilder, Resolved, Settings};
use super::{callable_name, emit_isolated};
use super::guard::{Phase, PhaseTracker, RunningGuard, UnitId};
use crate::aggregator::LineSampleMap;
use crate::metric::allocator::untracked;
use crate::metric::Metric;
use crate::output::Report;
use crate::trace::ExecutionTracer;
use crate::utils::error::ProfileError;
use log::debug;
use std::marker::PhantomData;
use std::mem;
use std::panic::Location;

/// Attributes a metric to the lines of one source file
///
/// Only code carrying step calls reports lines: functions marked
/// [`#[traced]`](crate::traced), blocks inside
/// [`trace_lines!`](crate::trace_lines) and manual [`step!`](crate::step)
/// calls. Lines are attributed when their file is the root file, which
/// defaults to the file calling `wrap`, `scope` or `run`.
///
/// See [`LineTimer`](super::LineTimer) and
/// [`LineMemTracer`](super::LineMemTracer).
pub struct LineProfiler<M: Metric> {
    settings: Resolved,
    _metric: PhantomData<fn() -> M>,
}

impl<M: Metric> Clone for LineProfiler<M> {
    fn clone(&self) -> Self {
        Self {
            settings: self.settings.clone(),
            _metric: PhantomData,
        }
    }
}

impl<M: Metric> Default for LineProfiler<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Metric> FromSettings for LineProfiler<M> {
    fn from_settings(settings: Settings) -> Result<Self, ProfileError> {
        Ok(Self {
            settings: settings.resolve()?,
            _metric: PhantomData,
        })
    }
}

impl<M: Metric> LineProfiler<M> {
    pub fn new() -> Self {
        Self {
            settings: Resolved::default(),
            _metric: PhantomData,
        }
    }

    pub fn builder() -> ProfilerBuilder<Self> {
        ProfilerBuilder::new()
    }

    pub fn repeat(&self) -> usize {
        self.settings.repeat
    }

    pub fn label(&self) -> Option<&str> {
        self.settings.label.as_deref()
    }

    #[track_caller]
    fn root_file(&self) -> String {
        match &self.settings.root_file {
            Some(file) => file.clone(),
            None => Location::caller().file().to_string(),
        }
    }

    /// Wrap a callable taking its arguments as one value
    ///
    /// ```ignore
    /// #[traced]
    /// fn fill(n: usize) -> Vec<u64> { .. }
    ///
    /// let fill = ltimer().wrap(fill);
    /// fill.call(1_000);
    /// ```
    #[track_caller]
    pub fn wrap<F>(&self, f: F) -> LineProfiled<M, F> {
        let mut profiler = self.clone();
        if profiler.settings.label.is_none() {
            profiler.settings.label = callable_name::<F>();
        }
        LineProfiled {
            unit: UnitId::next(),
            f,
            root_file: self.root_file(),
            profiler,
        }
    }

    /// Trace lines until the returned scope is finished or dropped
    ///
    /// ```ignore
    /// let scope = ltimer().scope();
    /// trace_lines! {
    ///     let mut total = 0;
    ///     for i in 0..10 {
    ///         total += i;
    ///     }
    /// }
    /// let samples = scope.finish()?;
    /// ```
    #[track_caller]
    pub fn scope(&self) -> LineScope<M> {
        let root_file = self.root_file();
        let mut phase = PhaseTracker::new(UnitId::next());
        phase.advance(Phase::Armed);
        let tracer = untracked(|| ExecutionTracer::begin(root_file.clone()));
        phase.advance(Phase::Accumulating);

        LineScope {
            tracer: Some(tracer),
            root_file,
            settings: self.settings.clone(),
            phase,
        }
    }

    /// Trace one execution of `f`
    ///
    /// Report failures are logged and never affect the returned value.
    #[track_caller]
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let scope = self.scope();
        let result = f();
        drop(scope);
        result
    }
}

/// A callable whose lines are traced on every invocation
pub struct LineProfiled<M: Metric, F> {
    unit: UnitId,
    f: F,
    root_file: String,
    profiler: LineProfiler<M>,
}

impl<M: Metric, F: Clone> Clone for LineProfiled<M, F> {
    fn clone(&self) -> Self {
        Self {
            unit: self.unit,
            f: self.f.clone(),
            root_file: self.root_file.clone(),
            profiler: self.profiler.clone(),
        }
    }
}

impl<M: Metric, F> LineProfiled<M, F> {
    pub fn unit(&self) -> UnitId {
        self.unit
    }

    pub fn label(&self) -> Option<&str> {
        self.profiler.label()
    }

    pub fn root_file(&self) -> &str {
        &self.root_file
    }

    pub fn inner(&self) -> &F {
        &self.f
    }

    /// Run the callable `repeat` times and return the last result
    ///
    /// Tracing is re-armed for every run and the line samples of all runs
    /// are merged into one report. A nested call of the same unit on this
    /// thread runs once without re-arming; its lines still land in the
    /// outer trace.
    pub fn call<A: Clone, R>(&self, args: A) -> R
    where
        F: Fn(A) -> R,
    {
        let Some(_running) = RunningGuard::enter(self.unit) else {
            return (self.f)(args);
        };

        let mut phase = PhaseTracker::new(self.unit);
        let mut emission = LineEmission::<M>::new(&self.profiler.settings, &self.root_file);

        let mut result = self.trace_once(&args, &mut phase, &mut emission);
        for _ in 1..self.profiler.settings.repeat {
            let next = self.trace_once(&args, &mut phase, &mut emission);
            drop(mem::replace(&mut result, next));
        }

        emission.emit();
        result
    }

    fn trace_once<A: Clone, R>(
        &self,
        args: &A,
        phase: &mut PhaseTracker,
        emission: &mut LineEmission<'_, M>,
    ) -> R
    where
        F: Fn(A) -> R,
    {
        let args = args.clone();
        phase.advance(Phase::Armed);
        emission.open();
        phase.advance(Phase::Accumulating);

        let result = (self.f)(args);

        phase.advance(Phase::Finalizing);
        emission.close();
        result
    }
}

/// Line samples of one invocation, reported exactly once
///
/// Owns the active tracer so that a panicking run still flushes its last
/// line and restores the previous hook before the report goes out.
struct LineEmission<'a, M: Metric> {
    settings: &'a Resolved,
    root_file: &'a str,
    tracer: Option<ExecutionTracer<M>>,
    samples: LineSampleMap,
    emitted: bool,
}

impl<'a, M: Metric> LineEmission<'a, M> {
    fn new(settings: &'a Resolved, root_file: &'a str) -> Self {
        Self {
            settings,
            root_file,
            tracer: None,
            samples: LineSampleMap::new(),
            emitted: false,
        }
    }

    fn open(&mut self) {
        let tracer = ExecutionTracer::begin(untracked(|| self.root_file.to_string()));
        self.tracer = Some(tracer);
    }

    fn close(&mut self) {
        if let Some(tracer) = self.tracer.take() {
            let samples = tracer.end();
            untracked(|| self.samples.merge(samples));
        }
    }

    fn emit(&mut self) {
        self.close();
        if mem::replace(&mut self.emitted, true) {
            return;
        }
        untracked(|| {
            let samples = mem::take(&mut self.samples);
            debug!(
                "{} line trace finished: {} lines, {} samples",
                M::KIND,
                samples.len(),
                samples.sample_count()
            );
            let report = Report::lines(M::KIND, self.settings.label.clone(), self.root_file, samples);
            emit_isolated(self.settings.sink.as_ref(), &report);
        });
    }
}

impl<M: Metric> Drop for LineEmission<'_, M> {
    fn drop(&mut self) {
        self.emit();
    }
}

/// Line trace of one block, finished explicitly or on drop
pub struct LineScope<M: Metric> {
    tracer: Option<ExecutionTracer<M>>,
    root_file: String,
    settings: Resolved,
    phase: PhaseTracker,
}

impl<M: Metric> LineScope<M> {
    pub fn root_file(&self) -> &str {
        &self.root_file
    }

    /// Stop tracing and emit the report
    ///
    /// Returns the collected line samples, or the error from emitting the
    /// report.
    pub fn finish(mut self) -> Result<LineSampleMap, ProfileError> {
        self.complete()
    }

    fn complete(&mut self) -> Result<LineSampleMap, ProfileError> {
        let Some(tracer) = self.tracer.take() else {
            return Ok(LineSampleMap::new());
        };
        self.phase.advance(Phase::Finalizing);
        let samples = tracer.end();

        untracked(|| {
            debug!(
                "{} line block finished: {} lines, {} samples",
                M::KIND,
                samples.len(),
                samples.sample_count()
            );
            let report = Report::lines(
                M::KIND,
                self.settings.label.clone(),
                self.root_file.clone(),
                samples.clone(),
            );
            self.settings.sink.emit(&report)?;
            Ok(samples)
        })
    }
}

impl<M: Metric> Drop for LineScope<M> {
    fn drop(&mut self) {
        if self.tracer.is_some() {
            if let Err(e) = self.complete() {
                super::log_emit_error(&e);
            }
        }
    }
}
