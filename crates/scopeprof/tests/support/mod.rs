//! Helpers living outside the files under test, for root-file filtering.

use scopeprof::traced;
use std::thread;
use std::time::Duration;

/// Instrumented function whose lines belong to this file
#[traced]
pub fn slow_helper(millis: u64) -> u64 {
    let start = millis;
    thread::sleep(Duration::from_millis(millis));
    start + 1
}
