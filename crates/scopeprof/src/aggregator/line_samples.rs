//! Per-line sample aggregation.
//!
//! A [`LineSampleMap`] collects one metric delta per completed execution of a
//! source line. Repeats, loop iterations and recursive passes through the same
//! line all append to the same sequence, in chronological order.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// A line in a source file, as reported by `file!()` / `line!()`
///
/// Identity key: two events at the same file and line are the same location
/// regardless of call depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SourceLocation {
    pub file: &'static str,
    pub line: u32,
}

impl SourceLocation {
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Metric deltas keyed by source location
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineSampleMap {
    samples: HashMap<SourceLocation, Vec<f64>>,
}

impl LineSampleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one delta to a location's sequence
    pub fn record(&mut self, location: SourceLocation, delta: f64) {
        self.samples.entry(location).or_default().push(delta);
    }

    /// Append every sequence of `other` after the sequences already held
    ///
    /// Used to fold per-repeat maps into one map for the whole invocation.
    pub fn merge(&mut self, other: LineSampleMap) {
        for (location, deltas) in other.samples {
            self.samples.entry(location).or_default().extend(deltas);
        }
    }

    pub fn get(&self, location: &SourceLocation) -> Option<&[f64]> {
        self.samples.get(location).map(Vec::as_slice)
    }

    /// Number of distinct locations
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total number of recorded deltas across all locations
    pub fn sample_count(&self) -> usize {
        self.samples.values().map(Vec::len).sum()
    }

    /// Sum of every recorded delta
    ///
    /// Approximately the whole-region total, minus the unmeasured cost before
    /// the first step.
    pub fn total(&self) -> f64 {
        self.samples.values().flatten().sum()
    }

    pub fn locations(&self) -> impl Iterator<Item = &SourceLocation> {
        self.samples.keys()
    }

    /// Entries sorted by location, for deterministic rendering
    pub fn sorted(&self) -> Vec<(&SourceLocation, &[f64])> {
        let mut entries: Vec<_> = self
            .samples
            .iter()
            .map(|(location, deltas)| (location, deltas.as_slice()))
            .collect();
        entries.sort_by_key(|(location, _)| **location);
        entries
    }
}
