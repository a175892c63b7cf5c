mod support;

use scopeprof::{
    step, trace, trace_lines, traced, CollectingSink, LineProfiled, LineSampleMap, LineTimer,
    ReportData, WallClock,
};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn collecting_line_timer(repeat: i64) -> (LineTimer, CollectingSink) {
    let sink = CollectingSink::new();
    let profiler = LineTimer::builder()
        .repeat(repeat)
        .sink(sink.clone())
        .build()
        .unwrap();
    (profiler, sink)
}

fn counts(samples: &LineSampleMap) -> Vec<usize> {
    samples.sorted().iter().map(|(_, d)| d.len()).collect()
}

#[traced]
fn factorial(n: u64) -> u64 {
    if n <= 1 {
        return 1;
    }
    n * factorial(n - 1)
}

#[test]
fn test_five_statement_block() {
    let (profiler, sink) = collecting_line_timer(1);

    let scope = profiler.scope();
    trace_lines! {
        let mut total = 0;
        for i in 0..3 {
            total += i;
        }
        thread::sleep(Duration::from_millis(100));
        total *= 2;
    }
    let samples = scope.finish().unwrap();

    assert_eq!(total, 6);
    assert_eq!(samples.len(), 5);
    assert_eq!(counts(&samples), vec![1, 1, 3, 1, 1]);

    // Locations sort in source order; the sleep is the fourth statement
    let sleep: f64 = samples.sorted()[3].1.iter().sum();
    assert!(
        (sleep - 0.100).abs() <= 0.100 * 0.05,
        "sleep line measured {} s",
        sleep
    );

    assert_eq!(sink.len(), 1);
    assert!(!trace::is_active());
}

#[test]
fn test_time_deltas_are_non_negative() {
    let (profiler, _sink) = collecting_line_timer(1);
    let samples = profiler.run(|| {
        let scope = profiler.scope();
        trace_lines! {
            let mut v = Vec::new();
            for i in 0..100 {
                v.push(i);
            }
            v.sort();
        }
        scope.finish().unwrap()
    });
    assert!(samples
        .sorted()
        .iter()
        .all(|(_, deltas)| deltas.iter().all(|d| *d >= 0.0)));
}

#[test]
fn test_recursive_function_aggregates_across_depths() {
    let (profiler, sink) = collecting_line_timer(1);
    let wrapped = profiler.wrap(factorial);

    assert_eq!(wrapped.call(5), 120);

    let reports = sink.take();
    assert_eq!(reports.len(), 1);
    let samples = reports[0].line_samples().unwrap();
    // `if` line at every depth, `return` once, recursive tail four times
    assert_eq!(counts(samples), vec![5, 1, 4]);
}

#[test]
fn test_repeat_multiplies_counts() {
    let (profiler, sink) = collecting_line_timer(3);
    let wrapped = profiler.wrap(factorial);

    assert_eq!(wrapped.call(2), 2);

    let reports = sink.take();
    assert_eq!(reports.len(), 1);
    assert_eq!(counts(reports[0].line_samples().unwrap()), vec![6, 3, 3]);
}

thread_local! {
    static REPORTS: CollectingSink = CollectingSink::new();
    static FACTORIAL: LineProfiled<WallClock, fn(u64) -> u64> = {
        let sink = REPORTS.with(CollectingSink::clone);
        LineTimer::builder()
            .sink(sink)
            .build()
            .unwrap()
            .wrap(wrapped_factorial_body as fn(u64) -> u64)
    };
}

#[traced]
fn wrapped_factorial_body(n: u64) -> u64 {
    if n <= 1 {
        return 1;
    }
    n * wrapped_factorial(n - 1)
}

fn wrapped_factorial(n: u64) -> u64 {
    FACTORIAL.with(|f| f.call(n))
}

#[test]
fn test_recursion_through_wrapped_unit_reports_once() {
    assert_eq!(wrapped_factorial(5), 120);

    let reports = REPORTS.with(CollectingSink::take);
    assert_eq!(reports.len(), 1);
    // Inner calls run unmeasured but their lines still reach the outer trace
    assert_eq!(counts(reports[0].line_samples().unwrap()), vec![5, 1, 4]);
}

#[test]
fn test_foreign_file_cost_folds_into_caller() {
    let (profiler, _sink) = collecting_line_timer(1);

    let scope = profiler.scope();
    trace_lines! {
        let value = support::slow_helper(30);
        let doubled = value * 2;
    }
    let samples = scope.finish().unwrap();

    assert_eq!(doubled, 62);
    assert_eq!(samples.len(), 2);
    assert!(samples.locations().all(|loc| loc.file == file!()));
    let call_line: f64 = samples.sorted()[0].1.iter().sum();
    assert!(call_line >= 0.030);
}

#[test]
fn test_nested_sessions_restore_outer() {
    let (outer_profiler, _outer_sink) = collecting_line_timer(1);
    let (inner_profiler, _inner_sink) = collecting_line_timer(1);

    let outer = outer_profiler.scope();
    step!();
    let inner = inner_profiler.scope();
    step!();
    step!();
    let inner_samples = inner.finish().unwrap();
    step!();
    let outer_samples = outer.finish().unwrap();

    assert_eq!(inner_samples.len(), 2);
    assert_eq!(outer_samples.len(), 2);
    assert!(!trace::is_active());
}

#[test]
fn test_scopes_dropped_out_of_order() {
    let (first_profiler, first_sink) = collecting_line_timer(1);
    let (second_profiler, second_sink) = collecting_line_timer(1);

    let first = first_profiler.scope();
    let second = second_profiler.scope();
    drop(first);
    step!();
    step!();
    drop(second);

    assert!(!trace::is_active());
    assert_eq!(trace::open_sessions(), 0);
    assert!(first_sink.take()[0].is_empty());
    assert_eq!(second_sink.take()[0].line_samples().unwrap().len(), 2);

    // Later scopes start from a clean slot
    let third = first_profiler.scope();
    step!();
    assert_eq!(third.finish().unwrap().len(), 1);
    assert!(!trace::is_active());
}

#[test]
fn test_panic_still_reports_and_restores_hook() {
    let (profiler, sink) = collecting_line_timer(1);
    let wrapped = profiler.wrap(|fail: bool| {
        trace_lines! {
            let before = 1;
            if fail {
                panic!("measured code failed");
            }
        }
        before
    });

    let result = panic::catch_unwind(AssertUnwindSafe(|| wrapped.call(true)));
    assert!(result.is_err());
    assert!(!trace::is_active());

    let reports = sink.take();
    assert_eq!(reports.len(), 1);
    assert!(!reports[0].is_empty());

    // The unit is usable again after the panic
    assert_eq!(wrapped.call(false), 1);
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_threads_trace_independently() {
    let sink = CollectingSink::new();
    let profiler = Arc::new(
        LineTimer::builder()
            .sink(sink.clone())
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (1..=4usize)
        .map(|iterations| {
            let profiler = Arc::clone(&profiler);
            thread::spawn(move || {
                let scope = profiler.scope();
                trace_lines! {
                    let mut total = 0;
                    for i in 0..iterations {
                        total += i;
                        thread::sleep(Duration::from_millis(2));
                    }
                }
                let samples = scope.finish().unwrap();
                (iterations, total, samples)
            })
        })
        .collect();

    for handle in handles {
        let (iterations, total, samples) = handle.join().unwrap();
        assert_eq!(total, iterations * (iterations - 1) / 2);
        // let, for, loop body (two statements)
        assert_eq!(counts(&samples), vec![1, 1, iterations, iterations]);
    }

    let reports = sink.take();
    assert_eq!(reports.len(), 4);
    assert!(reports
        .iter()
        .all(|r| matches!(&r.data, ReportData::Lines { samples, .. } if samples.len() == 4)));
}
