//! Level runner
//!
//! Runs one concurrency level: spawns the workers, waits for every one of
//! them and reduces the collected samples into a [`BenchmarkResult`].

use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinSet};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, warn};

use super::metrics::{throughput, LatencyCollector, LatencyStats};
use super::worker::{run_worker, WorkerError, WorkerStats};
use crate::db::Driver;
use crate::error::BenchError;
use crate::utils::Timer;

/// How long to wait for workers past their interval before aborting them
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(60);

/// Outcome of one concurrency level
#[derive(Clone, Debug, PartialEq)]
pub struct BenchmarkResult {
    /// Number of concurrent workers
    pub inflight: u32,
    /// Successful queries per elapsed second
    pub rps: f64,
    /// Latency percentiles in microseconds
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
    pub p999: f64,
}

/// Runs single concurrency levels against one target
pub struct LevelRunner<D> {
    driver: Arc<D>,
    url: Arc<str>,
    interval: Duration,
    shutdown_grace: Duration,
}

impl<D: Driver> LevelRunner<D> {
    /// Create a runner for `url` with `interval` per level
    pub fn new(driver: D, url: impl Into<String>, interval: Duration) -> Self {
        Self {
            driver: Arc::new(driver),
            url: Arc::from(url.into()),
            interval,
            shutdown_grace: SHUTDOWN_GRACE,
        }
    }

    /// Set the shutdown grace period
    #[cfg(test)]
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `inflight` workers in parallel for one interval
    pub async fn run_level(&self, inflight: u32) -> Result<BenchmarkResult, BenchError> {
        info!(
            "Running inflight {} for {:.1}s",
            inflight,
            self.interval.as_secs_f64()
        );

        let collector = Arc::new(LatencyCollector::new());
        let timer = Timer::start(format!("inflight {inflight}"));

        let mut workers = JoinSet::new();
        for _ in 0..inflight {
            let driver = self.driver.clone();
            let url = self.url.clone();
            let collector = collector.clone();
            let interval = self.interval;

            workers.spawn(async move { run_worker(&*driver, &url, interval, &collector).await });
        }

        self.join_all(&mut workers).await;
        let elapsed = timer.stop();

        let samples = collector.take_samples().await;
        let completed = collector.counters().completed();
        let errors = collector.counters().errors();

        let stats = LatencyStats::from_nanos(&samples)
            .ok_or(BenchError::NoSuccessfulQueries { inflight, errors })?;

        if errors > 0 {
            warn!("{errors} errors occurred during benchmark at inflight {inflight}");
        }

        let result = BenchmarkResult {
            inflight,
            rps: throughput(completed, elapsed),
            p50: stats.percentiles.p50,
            p90: stats.percentiles.p90,
            p99: stats.percentiles.p99,
            p999: stats.percentiles.p999,
        };

        debug!("Latency: {}", stats.format_summary());
        info!(
            "Inflight {} complete: {} queries, {:.2} RPS, p99={:.2}µs",
            inflight, completed, result.rps, result.p99
        );

        Ok(result)
    }

    /// Wait for every worker, aborting stragglers once the grace period is spent
    async fn join_all(&self, workers: &mut JoinSet<Result<WorkerStats, WorkerError>>) {
        // Past the representable range there is no deadline to enforce
        let Some(deadline) = self
            .interval
            .checked_add(self.shutdown_grace)
            .and_then(|wait| Instant::now().checked_add(wait))
        else {
            while let Some(outcome) = workers.join_next().await {
                log_outcome(outcome);
            }
            return;
        };

        loop {
            match timeout_at(deadline, workers.join_next()).await {
                Ok(Some(outcome)) => log_outcome(outcome),
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        "Timeout waiting for worker shutdown, aborting {} workers",
                        workers.len()
                    );
                    workers.abort_all();
                    while let Some(outcome) = workers.join_next().await {
                        log_outcome(outcome);
                    }
                    break;
                }
            }
        }
    }
}

fn log_outcome(outcome: Result<Result<WorkerStats, WorkerError>, JoinError>) {
    match outcome {
        Ok(Ok(stats)) => debug!(
            completed = stats.completed,
            errors = stats.errors,
            "Worker joined"
        ),
        Ok(Err(e)) => error!("{e}"),
        Err(e) if e.is_cancelled() => warn!("Worker aborted after shutdown grace"),
        Err(e) => error!("Worker panicked: {e}"),
    }
}
