use scopeprof::profiler::is_running;
use scopeprof::{timer, CollectingSink, Output, ProfileError, Profiled, Timer, WallClock};
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn collecting_timer(repeat: i64) -> (Timer, CollectingSink) {
    let sink = CollectingSink::new();
    let profiler = Timer::builder()
        .repeat(repeat)
        .label("work")
        .sink(sink.clone())
        .build()
        .unwrap();
    (profiler, sink)
}

#[test]
fn test_repeat_produces_n_samples() {
    for repeat in [1, 2, 7] {
        let (profiler, sink) = collecting_timer(repeat);
        let wrapped = profiler.wrap(|ms: u64| thread::sleep(Duration::from_millis(ms)));
        wrapped.call(1);

        let reports = sink.take();
        assert_eq!(reports.len(), 1);
        let samples = reports[0].run_samples().unwrap();
        assert_eq!(samples.len(), repeat as usize);
        assert!(samples.iter().all(|s| *s >= 0.001));
    }
}

#[test]
fn test_invalid_repeat_rejected_before_body_runs() {
    for repeat in [0, -3] {
        let ran = Cell::new(false);
        let result = Timer::builder()
            .repeat(repeat)
            .build()
            .map(|profiler| profiler.wrap(|()| ran.set(true)).call(()));

        match result {
            Err(ProfileError::InvalidConfiguration(message)) => {
                assert!(message.contains(&repeat.to_string()));
            }
            other => panic!("expected InvalidConfiguration, got {:?}", other),
        }
        assert!(!ran.get());
    }
}

#[test]
fn test_returns_last_result() {
    let (profiler, _sink) = collecting_timer(3);
    let counter = Cell::new(0);
    let wrapped = profiler.wrap(|step: u32| {
        counter.set(counter.get() + step);
        counter.get()
    });
    assert_eq!(wrapped.call(5), 15);
}

#[test]
fn test_arguments_cloned_per_run() {
    let (profiler, _sink) = collecting_timer(3);
    let wrapped = profiler.wrap(|mut items: Vec<u32>| {
        items.push(0);
        items.len()
    });
    assert_eq!(wrapped.call(vec![1, 2]), 3);
}

thread_local! {
    static REPORTS: CollectingSink = CollectingSink::new();
    static FACTORIAL: Profiled<WallClock, fn(u64) -> u64> = {
        let sink = REPORTS.with(CollectingSink::clone);
        Timer::builder()
            .sink(sink)
            .build()
            .unwrap()
            .wrap(factorial_body as fn(u64) -> u64)
    };
}

fn factorial_body(n: u64) -> u64 {
    if n <= 1 {
        1
    } else {
        n * factorial(n - 1)
    }
}

fn factorial(n: u64) -> u64 {
    FACTORIAL.with(|f| f.call(n))
}

#[test]
fn test_recursive_call_reports_once() {
    assert_eq!(factorial(5), 120);
    assert_eq!(REPORTS.with(CollectingSink::len), 1);

    // A second top-level call is measured again
    assert_eq!(factorial(3), 6);
    assert_eq!(REPORTS.with(CollectingSink::len), 2);
}

#[test]
fn test_unit_marked_running_during_call() {
    let (profiler, sink) = collecting_timer(2);
    let wrapped = profiler.wrap(is_running);
    let clone = wrapped.clone();
    assert_eq!(wrapped.unit(), clone.unit());

    // Clones share the running state of their unit
    assert!(clone.call(wrapped.unit()));
    assert!(!is_running(wrapped.unit()));
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_concurrent_callers_measured_independently() {
    let sink = CollectingSink::new();
    let profiler = Timer::builder().sink(sink.clone()).build().unwrap();
    let wrapped = Arc::new(profiler.wrap(|ms: u64| {
        thread::sleep(Duration::from_millis(ms));
        ms
    }));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let wrapped = Arc::clone(&wrapped);
            thread::spawn(move || wrapped.call(20))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 20);
    }

    let reports = sink.take();
    assert_eq!(reports.len(), 4);
    for report in reports {
        let samples = report.run_samples().unwrap();
        assert_eq!(samples.len(), 1);
        assert!(samples[0] >= 0.020);
    }
}

#[test]
fn test_panicking_run_reports_partial_samples() {
    let (profiler, sink) = collecting_timer(5);
    let runs = Cell::new(0);
    let wrapped = profiler.wrap(|()| {
        runs.set(runs.get() + 1);
        if runs.get() == 3 {
            panic!("third run fails");
        }
    });

    let result = panic::catch_unwind(AssertUnwindSafe(|| wrapped.call(())));
    assert!(result.is_err());

    let reports = sink.take();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].run_samples().unwrap().len(), 2);
}

#[test]
fn test_render_failure_does_not_affect_result() {
    let dir = tempfile::tempdir().unwrap();
    let profiler = Timer::builder()
        .output(Output::File(dir.path().to_path_buf()))
        .build()
        .unwrap();

    assert_eq!(profiler.wrap(|x: i32| x * 3).call(7), 21);
    assert_eq!(profiler.run(|| "still here"), "still here");

    // The explicit block form surfaces the error
    let result = profiler.scope().finish();
    assert!(matches!(result, Err(ProfileError::OutputTarget(_))));
}

#[test]
fn test_zero_config_timer() {
    let profiler = timer();
    assert_eq!(profiler.repeat(), 1);
    assert_eq!(profiler.label(), None);
}
