//! Demonstration workloads.
//!
//! `sleep` and `alloc` run a known amount of work under a profiler so the
//! reports can be checked against the requested duration or size.

use crate::commands::models::{AllocArgs, SleepArgs};
use crate::metric::{HeapUsage, TrackingAllocator, WallClock};
use crate::output::Output;
use crate::profiler::{FromSettings, LineProfiler, Profiler, ProfilerBuilder};
use crate::traced;
use crate::utils::config::ProfilerConfig;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::hint::black_box;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

#[traced]
fn sleep_workload(millis: u64) -> u64 {
    let mut ticks = 0;
    for _ in 0..3 {
        ticks += 1;
    }
    thread::sleep(Duration::from_millis(millis));
    ticks * 2
}

fn allocation_workload(bytes: usize) -> usize {
    let buffer = black_box(vec![0u8; bytes]);
    buffer.len()
}

/// Apply config file values, then the command-line overrides
fn configure<P: FromSettings>(
    builder: ProfilerBuilder<P>,
    config: Option<&ProfilerConfig>,
    repeat: Option<i64>,
    output: Option<PathBuf>,
) -> ProfilerBuilder<P> {
    let mut builder = match config {
        Some(config) => builder.config(config),
        None => builder,
    };
    if let Some(repeat) = repeat {
        builder = builder.repeat(repeat);
    }
    if let Some(path) = output {
        builder = builder.output(Output::File(path));
    }
    builder
}

/// Execute the sleep workload
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Invalid repeat count from the flags or the config file
pub fn execute_sleep(args: SleepArgs) -> Result<u64> {
    info!(
        "Sleeping {} ms per run ({} mode)",
        args.millis,
        if args.lines { "line" } else { "run" }
    );

    let result = if args.lines {
        let profiler = configure(
            LineProfiler::<WallClock>::builder().label("sleep"),
            args.config.as_ref(),
            args.repeat,
            args.output,
        )
        .build()
        .context("Invalid line profiler configuration")?;
        profiler.wrap(sleep_workload).call(args.millis)
    } else {
        let profiler = configure(
            Profiler::<WallClock>::builder().label("sleep"),
            args.config.as_ref(),
            args.repeat,
            args.output,
        )
        .build()
        .context("Invalid timer configuration")?;
        profiler.wrap(sleep_workload).call(args.millis)
    };

    Ok(result)
}

/// Execute the allocation workload
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Invalid repeat count from the flags or the config file
pub fn execute_alloc(args: AllocArgs) -> Result<usize> {
    if !crate::metric::allocator::is_installed() {
        warn!(
            "{} is not the global allocator of this binary; reports will show zero",
            std::any::type_name::<TrackingAllocator>()
        );
    }
    info!("Allocating {} bytes per run", args.bytes);

    let profiler = configure(
        Profiler::<HeapUsage>::builder().label("alloc"),
        args.config.as_ref(),
        args.repeat,
        args.output,
    )
    .build()
    .context("Invalid memory tracer configuration")?;

    let allocated = profiler.wrap(allocation_workload).call(args.bytes);
    debug!("Heap after workload: {:?}", crate::metric::allocator::snapshot());
    Ok(allocated)
}
