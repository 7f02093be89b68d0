//! Latency collection and statistics
//!
//! Provides the per-level sample collector, latency percentiles and throughput.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;

/// Latency percentiles in microseconds (p50, p90, p99, p999)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Percentiles {
    /// 50th percentile (median)
    pub p50: f64,
    /// 90th percentile
    pub p90: f64,
    /// 99th percentile
    pub p99: f64,
    /// 99.9th percentile
    pub p999: f64,
}

impl Percentiles {
    /// Calculate percentiles from sorted latencies (in microseconds)
    pub fn from_sorted(latencies: &[f64]) -> Self {
        if latencies.is_empty() {
            return Self::default();
        }

        Self {
            p50: percentile(latencies, 50.0),
            p90: percentile(latencies, 90.0),
            p99: percentile(latencies, 99.0),
            p999: percentile(latencies, 99.9),
        }
    }
}

/// Percentile of a sorted slice.
///
/// Position `p * (n + 1) / 100` over the 1-based order statistics, clamped to
/// the minimum below 1 and to the maximum at or past `n`, linearly
/// interpolated in between.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let pos = p * (n + 1) as f64 / 100.0;
    if pos < 1.0 {
        return sorted[0];
    }
    if pos >= n as f64 {
        return sorted[n - 1];
    }

    let lower = pos.floor();
    let fraction = pos - lower;
    let lower = lower as usize;
    sorted[lower - 1] + fraction * (sorted[lower] - sorted[lower - 1])
}

/// Latency statistics
#[derive(Clone, Debug, Default)]
pub struct LatencyStats {
    /// Minimum latency in microseconds
    pub min: f64,
    /// Maximum latency in microseconds
    pub max: f64,
    /// Mean latency in microseconds
    pub mean: f64,
    /// Latency percentiles
    pub percentiles: Percentiles,
    /// Total number of samples
    pub count: usize,
}

impl LatencyStats {
    /// Calculate statistics from raw nanosecond samples.
    ///
    /// Returns `None` when there are no samples.
    pub fn from_nanos(samples: &[u64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted: Vec<f64> = samples.iter().map(|&ns| ns as f64 / 1e3).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;

        Some(Self {
            min,
            max,
            mean,
            percentiles: Percentiles::from_sorted(&sorted),
            count: sorted.len(),
        })
    }

    /// Format as summary string
    pub fn format_summary(&self) -> String {
        format!(
            "n={} min={:.2}µs max={:.2}µs mean={:.2}µs p99={:.2}µs",
            self.count, self.min, self.max, self.mean, self.percentiles.p99
        )
    }
}

/// Successful queries per second of wall-clock time
pub fn throughput(completed: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        completed as f64 / secs
    } else {
        0.0
    }
}

/// Completed and failed query counts for one level
#[derive(Debug, Default)]
pub struct RunCounters {
    completed: AtomicU64,
    errors: AtomicU64,
}

impl RunCounters {
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

/// Collects latency samples from concurrent workers for one level
#[derive(Debug, Default)]
pub struct LatencyCollector {
    /// Latency samples in nanoseconds, unordered
    samples: Mutex<Vec<u64>>,
    counters: RunCounters,
}

impl LatencyCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful query.
    ///
    /// The sample and the completed count are updated under the same lock so a
    /// cancelled worker can never leave one without the other.
    pub async fn record_success(&self, latency: Duration) {
        let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        let mut samples = self.samples.lock().await;
        samples.push(nanos);
        self.counters.completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed query or connection attempt
    pub fn record_error(&self) {
        self.counters.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    /// Take every sample recorded so far
    pub async fn take_samples(&self) -> Vec<u64> {
        std::mem::take(&mut *self.samples.lock().await)
    }
}
