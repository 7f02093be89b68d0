//! Query worker
//!
//! One worker owns one connection and issues the probe query in a loop until
//! its duration elapses.

use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::metrics::LatencyCollector;
use crate::db::{Connection, DbError, Driver};

/// The probe query
pub const PROBE_QUERY: &str = "SELECT 1";

/// Pause after a failed query so a dead connection does not spin a core
pub const QUERY_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Errors that end a worker early
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Error in query runner: {0}")]
    Connect(#[source] DbError),

    #[error("Error in query runner: {0}")]
    Prepare(#[source] DbError),
}

/// Outcome of a single probe attempt
#[derive(Debug)]
pub enum Attempt {
    Success(Duration),
    Failed(DbError),
}

/// Per-worker totals, mirrored into the shared collector
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub completed: u64,
    pub errors: u64,
}

/// Run one worker against `url` for `duration`.
///
/// The probe is prepared before the clock starts. A connect or prepare
/// failure is counted, then returned. Query failures are counted, logged and
/// retried after [`QUERY_ERROR_BACKOFF`].
pub async fn run_worker<D: Driver>(
    driver: &D,
    url: &str,
    duration: Duration,
    collector: &LatencyCollector,
) -> Result<WorkerStats, WorkerError> {
    let mut conn = match driver.connect(url).await {
        Ok(conn) => conn,
        Err(e) => {
            collector.record_error();
            return Err(WorkerError::Connect(e));
        }
    };

    if let Err(e) = conn.prepare(PROBE_QUERY).await {
        collector.record_error();
        if let Err(close_err) = conn.close().await {
            warn!("Error closing connection: {close_err}");
        }
        return Err(WorkerError::Prepare(e));
    }

    let mut stats = WorkerStats::default();
    let start = Instant::now();

    while start.elapsed() < duration {
        match probe(&mut conn).await {
            Attempt::Success(latency) => {
                collector.record_success(latency).await;
                stats.completed += 1;
            }
            Attempt::Failed(e) => {
                collector.record_error();
                stats.errors += 1;
                warn!("Error executing query: {e}");
                sleep(QUERY_ERROR_BACKOFF).await;
            }
        }
    }

    if let Err(e) = conn.close().await {
        warn!("Error closing connection: {e}");
    }

    debug!(
        completed = stats.completed,
        errors = stats.errors,
        "Worker finished"
    );
    Ok(stats)
}

/// Issue the probe once and time the round trip
pub async fn probe<C: Connection>(conn: &mut C) -> Attempt {
    let start = Instant::now();
    match conn.query(PROBE_QUERY).await {
        Ok(rows) if rows.is_empty() => Attempt::Failed(DbError::EmptyResult),
        Ok(_) => Attempt::Success(start.elapsed()),
        Err(e) => Attempt::Failed(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mock::MockDriver;

    const URL: &str = "postgres://mock/postgres";

    #[tokio::test]
    async fn test_worker_records_every_success() {
        let driver = MockDriver::new().with_latency(Duration::from_millis(1));
        let stats_handle = driver.stats();
        let collector = LatencyCollector::new();

        let stats = run_worker(&driver, URL, Duration::from_millis(100), &collector)
            .await
            .unwrap();

        let samples = collector.take_samples().await;
        assert!(stats.completed > 0);
        assert_eq!(stats.errors, 0);
        assert_eq!(samples.len() as u64, stats.completed);
        assert_eq!(collector.counters().completed(), stats.completed);
        assert!(samples.iter().all(|&ns| ns >= 1_000_000));

        assert_eq!(stats_handle.connects(), 1);
        assert_eq!(stats_handle.queries(), stats.completed);
        assert_eq!(stats_handle.closes(), 1);
    }

    #[tokio::test]
    async fn test_worker_connect_failure() {
        let driver = MockDriver::new().failing_connect();
        let stats_handle = driver.stats();
        let collector = LatencyCollector::new();

        let result = run_worker(&driver, URL, Duration::from_millis(50), &collector).await;

        assert!(matches!(result, Err(WorkerError::Connect(DbError::Connect(_)))));
        assert_eq!(collector.counters().errors(), 1);
        assert_eq!(collector.counters().completed(), 0);
        assert!(collector.take_samples().await.is_empty());
        assert_eq!(stats_handle.queries(), 0);
        assert_eq!(stats_handle.closes(), 0);
    }

    #[tokio::test]
    async fn test_worker_backs_off_after_query_error() {
        let driver = MockDriver::new()
            .with_latency(Duration::from_micros(10))
            .failing_every(1);
        let stats_handle = driver.stats();
        let collector = LatencyCollector::new();

        let stats = run_worker(&driver, URL, Duration::from_millis(250), &collector)
            .await
            .unwrap();

        // 100ms backoff bounds the attempts to a handful
        assert_eq!(stats.completed, 0);
        assert!(stats.errors >= 2 && stats.errors <= 4, "errors = {}", stats.errors);
        assert_eq!(collector.counters().errors(), stats.errors);
        assert!(collector.take_samples().await.is_empty());
        assert_eq!(stats_handle.closes(), 1);
    }

    #[tokio::test]
    async fn test_worker_attempt_is_sample_or_error() {
        let driver = MockDriver::new()
            .with_latency(Duration::from_micros(50))
            .failing_every(3);
        let stats_handle = driver.stats();
        let collector = LatencyCollector::new();

        let stats = run_worker(&driver, URL, Duration::from_millis(300), &collector)
            .await
            .unwrap();

        let samples = collector.take_samples().await;
        assert!(stats.errors > 0);
        assert!(stats.completed > 0);
        assert_eq!(stats_handle.queries(), stats.completed + stats.errors);
        assert_eq!(samples.len() as u64 + collector.counters().errors(), stats_handle.queries());
    }

    #[tokio::test]
    async fn test_setup_latency_stays_out_of_samples() {
        let driver = MockDriver::new()
            .with_setup_latency(Duration::from_millis(50))
            .with_latency(Duration::from_micros(100));
        let stats_handle = driver.stats();
        let collector = LatencyCollector::new();

        let stats = run_worker(&driver, URL, Duration::from_millis(100), &collector)
            .await
            .unwrap();

        let samples = collector.take_samples().await;
        assert!(stats.completed > 0);
        assert_eq!(stats_handle.prepares(), 1);
        assert!(
            samples.iter().all(|&ns| ns < 50_000_000),
            "max sample = {:?}",
            samples.iter().max()
        );
    }

    #[tokio::test]
    async fn test_prepare_failure_ends_worker() {
        let driver = MockDriver::new().failing_prepare();
        let stats_handle = driver.stats();
        let collector = LatencyCollector::new();

        let result = run_worker(&driver, URL, Duration::from_millis(50), &collector).await;

        assert!(matches!(result, Err(WorkerError::Prepare(DbError::Prepare(_)))));
        assert_eq!(collector.counters().errors(), 1);
        assert!(collector.take_samples().await.is_empty());
        assert_eq!(stats_handle.queries(), 0);
        assert_eq!(stats_handle.closes(), 1);
    }

    #[tokio::test]
    async fn test_empty_row_set_counts_as_error() {
        let driver = MockDriver::new().with_empty_rows();
        let mut conn = driver.connect(URL).await.unwrap();

        assert!(matches!(probe(&mut conn).await, Attempt::Failed(DbError::EmptyResult)));
    }

    #[tokio::test]
    async fn test_close_failure_does_not_fail_worker() {
        let driver = MockDriver::new().failing_close();
        let collector = LatencyCollector::new();

        let stats = run_worker(&driver, URL, Duration::from_millis(20), &collector)
            .await
            .unwrap();

        assert!(stats.completed > 0);
        assert_eq!(collector.counters().errors(), 0);
    }
}
