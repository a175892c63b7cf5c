//! Summary statistics over measured samples.
//!
//! Pure functions only. The median is the upper median (`sorted[n / 2]`) and
//! the interquartile range uses floor-indexed quartiles, which keeps every
//! reported value an actual observed sample.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Summary statistics for a non-empty sample sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1); zero for a single sample
    pub stdev: f64,
    pub iqr: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
    pub sum: f64,
}

/// Compute summary statistics for a sequence of samples
///
/// **Public** - main entry point of the statistics engine
///
/// # Returns
/// `None` for an empty sequence; callers render that as "no data"
pub fn compute_statistics(samples: &[f64]) -> Option<Statistics> {
    if samples.is_empty() {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let count = sorted.len();
    let sum: f64 = samples.iter().sum();
    let mean = sum / count as f64;

    let stdev = if count > 1 {
        let variance =
            sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        variance.sqrt()
    } else {
        0.0
    };

    let q1 = sorted[quartile_index(count, 0.25)];
    let q3 = sorted[quartile_index(count, 0.75)];

    Some(Statistics {
        mean,
        median: sorted[count / 2],
        stdev,
        iqr: q3 - q1,
        min: sorted[0],
        max: sorted[count - 1],
        count,
        sum,
    })
}

/// Floor index of a quantile, clamped to the last element
fn quartile_index(count: usize, quantile: f64) -> usize {
    ((count as f64 * quantile) as usize).min(count - 1)
}

impl Statistics {
    /// Keyed view of the statistics
    ///
    /// Keys: `mean, median, stdev, iqr, min, max, count, sum`
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("mean", self.mean),
            ("median", self.median),
            ("stdev", self.stdev),
            ("iqr", self.iqr),
            ("min", self.min),
            ("max", self.max),
            ("count", self.count as f64),
            ("sum", self.sum),
        ])
    }

    /// One-line summary for logging
    pub fn summary(&self) -> String {
        format!(
            "n={} | sum={:.6} | mean={:.6} | median={:.6} | stdev={:.6}",
            self.count, self.sum, self.mean, self.median, self.stdev
        )
    }
}
