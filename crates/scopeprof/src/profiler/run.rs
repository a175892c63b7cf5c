//! Whole-run profilers: one total per run of a callable or block.

use super::builder::{FromSettings, ProfilerBuilder, Resolved, Settings};
use super::{callable_name, emit_isolated};
use super::guard::{Phase, PhaseTracker, RunningGuard, UnitId};
use crate::metric::allocator::untracked;
use crate::metric::Metric;
use crate::output::{Report, RunSamples};
use crate::utils::error::ProfileError;
use log::debug;
use std::marker::PhantomData;
use std::mem;

/// Measures the total of a metric over each run of a callable or block
///
/// See [`Timer`](super::Timer) and [`MemTracer`](super::MemTracer).
pub struct Profiler<M: Metric> {
    settings: Resolved,
    _metric: PhantomData<fn() -> M>,
}

impl<M: Metric> Clone for Profiler<M> {
    fn clone(&self) -> Self {
        Self {
            settings: self.settings.clone(),
            _metric: PhantomData,
        }
    }
}

impl<M: Metric> Default for Profiler<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Metric> FromSettings for Profiler<M> {
    fn from_settings(settings: Settings) -> Result<Self, ProfileError> {
        Ok(Self {
            settings: settings.resolve()?,
            _metric: PhantomData,
        })
    }
}

impl<M: Metric> Profiler<M> {
    /// Profiler with one run per invocation, reporting to stderr
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

    /// Wrap a callable taking its arguments as one value
    ///
    /// ```ignore
    /// let parse = Timer::builder().repeat(3).build()?.wrap(|(src, strict)| parse(src, strict));
    /// let ast = parse.call(("1 + 2", true));
    /// ```
    ///
    /// Without an explicit label the report is titled after the callable.
    pub fn wrap<F>(&self, f: F) -> Profiled<M, F> {
        let mut profiler = self.clone();
        if profiler.settings.label.is_none() {
            profiler.settings.label = callable_name::<F>();
        }
        Profiled {
            unit: UnitId::next(),
            f,
            profiler,
        }
    }

    /// Measure a block until the returned scope is finished or dropped
    ///
    /// Blocks run once; the repeat count only applies to wrapped callables.
    pub fn scope(&self) -> RunScope<M> {
        let unit = UnitId::next();
        let settings = untracked(|| self.settings.clone());
        let mut phase = PhaseTracker::new(unit);
        phase.advance(Phase::Armed);
        let metric = M::default();
        let mark = metric.mark();
        phase.advance(Phase::Accumulating);

        RunScope {
            metric,
            mark: Some(mark),
            settings,
            phase,
        }
    }

    /// Measure one execution of `f`
    ///
    /// Report failures are logged and never affect the returned value.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let scope = self.scope();
        let result = f();
        drop(scope);
        result
    }
}

/// A callable measured on every invocation
pub struct Profiled<M: Metric, F> {
    unit: UnitId,
    f: F,
    profiler: Profiler<M>,
}

impl<M: Metric, F: Clone> Clone for Profiled<M, F> {
    fn clone(&self) -> Self {
        Self {
            unit: self.unit,
            f: self.f.clone(),
            profiler: self.profiler.clone(),
        }
    }
}

impl<M: Metric, F> Profiled<M, F> {
    pub fn unit(&self) -> UnitId {
        self.unit
    }

    /// Name shown in report titles
    pub fn label(&self) -> Option<&str> {
        self.profiler.label()
    }

    /// The wrapped callable
    pub fn inner(&self) -> &F {
        &self.f
    }

    /// Run the callable `repeat` times and return the last result
    ///
    /// Each run receives a clone of `args`, made before its measurement
    /// starts. A nested call of the same unit on this thread runs once,
    /// unmeasured. One report is emitted after the last run, or while
    /// unwinding if a run panics.
    pub fn call<A: Clone, R>(&self, args: A) -> R
    where
        F: Fn(A) -> R,
    {
        let Some(_running) = RunningGuard::enter(self.unit) else {
            return (self.f)(args);
        };

        let mut phase = PhaseTracker::new(self.unit);
        let mut emission = RunEmission::<M>::new(&self.profiler.settings);

        let mut result = self.measure_once(&args, &mut phase, &mut emission);
        for _ in 1..self.profiler.settings.repeat {
            let next = self.measure_once(&args, &mut phase, &mut emission);
            // Earlier results are dropped outside the measured window
            drop(mem::replace(&mut result, next));
        }

        emission.emit();
        result
    }

    fn measure_once<A: Clone, R>(
        &self,
        args: &A,
        phase: &mut PhaseTracker,
        emission: &mut RunEmission<'_, M>,
    ) -> R
    where
        F: Fn(A) -> R,
    {
        let args = args.clone();
        phase.advance(Phase::Armed);
        let metric = M::default();
        let mark = metric.mark();
        phase.advance(Phase::Accumulating);

        let result = (self.f)(args);

        let total = metric.measure(mark);
        phase.advance(Phase::Finalizing);
        emission.record(total);
        result
    }
}

/// Samples of one invocation, reported exactly once
struct RunEmission<'a, M: Metric> {
    settings: &'a Resolved,
    samples: RunSamples,
    emitted: bool,
    _metric: PhantomData<fn() -> M>,
}

impl<'a, M: Metric> RunEmission<'a, M> {
    fn new(settings: &'a Resolved) -> Self {
        let samples = untracked(|| Vec::with_capacity(settings.repeat));
        Self {
            settings,
            samples,
            emitted: false,
            _metric: PhantomData,
        }
    }

    fn record(&mut self, total: f64) {
        untracked(|| self.samples.push(total));
    }

    fn emit(&mut self) {
        if mem::replace(&mut self.emitted, true) {
            return;
        }
        untracked(|| {
            let samples = mem::take(&mut self.samples);
            debug!("{} run finished: {} samples", M::KIND, samples.len());
            let report = Report::runs(M::KIND, self.settings.label.clone(), samples);
            emit_isolated(self.settings.sink.as_ref(), &report);
        });
    }
}

impl<M: Metric> Drop for RunEmission<'_, M> {
    fn drop(&mut self) {
        // Reached without emit() only when a run panicked
        self.emit();
    }
}

/// Measurement of one block, finished explicitly or on drop
pub struct RunScope<M: Metric> {
    metric: M,
    mark: Option<M::Mark>,
    settings: Resolved,
    phase: PhaseTracker,
}

impl<M: Metric> RunScope<M> {
    /// Close the measurement and emit the report
    ///
    /// Returns the measured total, or the error from emitting the report.
    pub fn finish(mut self) -> Result<RunSamples, ProfileError> {
        self.complete()
    }

    fn complete(&mut self) -> Result<RunSamples, ProfileError> {
        let Some(mark) = self.mark.take() else {
            return Ok(Vec::new());
        };
        let total = self.metric.measure(mark);
        self.phase.advance(Phase::Finalizing);

        untracked(|| {
            let report = Report::runs(M::KIND, self.settings.label.clone(), vec![total]);
            debug!("{} block finished: {}", M::KIND, total);
            self.settings.sink.emit(&report)?;
            Ok(vec![total])
        })
    }
}

impl<M: Metric> Drop for RunScope<M> {
    fn drop(&mut self) {
        if self.mark.is_some() {
            if let Err(e) = self.complete() {
                super::log_emit_error(&e);
            }
        }
    }
}
