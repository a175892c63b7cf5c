//! Monotonic wall-clock metric.

use super::{Metric, MetricKind};
use std::sync::OnceLock;
use std::time::Instant;

static EPOCH: OnceLock<Instant> = OnceLock::new();

fn epoch() -> Instant {
    *EPOCH.get_or_init(Instant::now)
}

/// Elapsed time in seconds, read from [`Instant`]
#[derive(Debug, Default, Clone, Copy)]
pub struct WallClock;

impl Metric for WallClock {
    type Mark = Instant;

    const KIND: MetricKind = MetricKind::Time;

    /// Seconds since the first reading taken in this process
    fn sample(&self) -> f64 {
        epoch().elapsed().as_secs_f64()
    }

    fn mark(&self) -> Instant {
        Instant::now()
    }

    fn measure(&self, mark: Instant) -> f64 {
        mark.elapsed().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_samples_are_monotonic() {
        let clock = WallClock;
        let first = clock.sample();
        let second = clock.sample();
        assert!(second >= first);
    }

    #[test]
    fn test_measure_covers_sleep() {
        let clock = WallClock;
        let mark = clock.mark();
        thread::sleep(Duration::from_millis(20));
        assert!(clock.measure(mark) >= 0.020);
    }
}
