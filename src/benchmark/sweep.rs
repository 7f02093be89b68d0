//! Concurrency sweep
//!
//! Runs levels one after another from the minimum to the maximum inflight.

use std::ops::RangeInclusive;

use tracing::info;

use super::runner::{BenchmarkResult, LevelRunner};
use crate::db::Driver;
use crate::error::BenchError;

/// Run every level in `levels` in order.
///
/// Stops at the first failing level and returns its error.
pub async fn run_sweep<D: Driver>(
    runner: &LevelRunner<D>,
    levels: RangeInclusive<u32>,
) -> Result<Vec<BenchmarkResult>, BenchError> {
    let (min, max) = (*levels.start(), *levels.end());
    if min == 0 || min > max {
        return Err(BenchError::InvalidConfig(format!(
            "inflight range {min}..={max} must satisfy 1 <= min <= max"
        )));
    }

    info!(
        "Sweeping inflight {}..={} ({:.1}s per level)",
        min,
        max,
        runner.interval().as_secs_f64()
    );

    let mut results = Vec::new();
    for inflight in levels {
        results.push(runner.run_level(inflight).await?);
    }

    Ok(results)
}
