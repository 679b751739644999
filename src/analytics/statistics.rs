//! Statistical primitives for duration analysis
//!
//! Durations are accumulated with Welford's online update; partial results
//! from different workers merge with the parallel-variance combination
//! (Chan et al.).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Descriptive statistics for a group of durations (hours)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationSummary {
    pub count: usize,
    pub mean_hours: f64,
    pub median_hours: f64,
    /// Sample standard deviation; `None` for a single observation
    pub stddev_hours: Option<f64>,
}

/// Mergeable accumulator of durations
#[derive(Debug, Clone, Default)]
pub struct DurationAccumulator {
    count: usize,
    mean: f64,
    m2: f64,
    values: Vec<f64>,
}

impl DurationAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.values.push(value);
    }

    /// Combine a partial accumulator produced elsewhere
    pub fn merge(&mut self, other: DurationAccumulator) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other;
            return;
        }

        let n_a = self.count as f64;
        let n_b = other.count as f64;
        let n = n_a + n_b;
        let delta = other.mean - self.mean;

        self.mean += delta * n_b / n;
        self.m2 += other.m2 + delta * delta * n_a * n_b / n;
        self.count += other.count;
        self.values.extend(other.values);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// Sample variance (divides by n - 1)
    pub fn sample_variance(&self) -> Option<f64> {
        (self.count > 1).then(|| (self.m2 / (self.count - 1) as f64).max(0.0))
    }

    pub fn sample_std_dev(&self) -> Option<f64> {
        self.sample_variance().map(f64::sqrt)
    }

    pub fn median(&self) -> Option<f64> {
        median(&self.values)
    }

    /// Snapshot the accumulated statistics
    pub fn summary(&self) -> Option<DurationSummary> {
        Some(DurationSummary {
            count: self.count,
            mean_hours: self.mean()?,
            median_hours: self.median()?,
            stddev_hours: self.sample_std_dev(),
        })
    }
}

impl FromIterator<f64> for DurationAccumulator {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = Self::new();
        for value in iter {
            acc.push(value);
        }
        acc
    }
}

/// Continuous percentile with linear interpolation between order statistics.
///
/// `sorted_data` must be sorted ascending; `percentile` is in `[0, 100]`.
pub fn percentile(sorted_data: &[f64], percentile: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }

    let index = (percentile / 100.0) * (sorted_data.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted_data[lower]
    } else {
        let weight = index - lower as f64;
        sorted_data[lower] * (1.0 - weight) + sorted_data[upper] * weight
    }
}

/// Median of unsorted data (0.5-quantile, interpolated)
pub fn median(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(percentile(&sorted, 50.0))
}

/// Arithmetic mean
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Sample standard deviation (n - 1); `None` below two observations
pub fn sample_std_dev(data: &[f64]) -> Option<f64> {
    if data.len() < 2 {
        return None;
    }
    let avg = mean(data)?;
    let variance =
        data.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / (data.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Descending order on a float key with a deterministic fallback
pub(crate) fn descending_then<T: Ord>(a: (f64, T), b: (f64, T)) -> Ordering {
    b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1))
}
