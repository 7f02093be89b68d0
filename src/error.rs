//! Benchmark error types
//!
//! Errors that escape a single worker and reach the sweep or the CLI.

use thiserror::Error;

/// Errors surfaced by configuration and the level/sweep runners
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No successful queries completed at inflight {inflight} ({errors} errors)")]
    NoSuccessfulQueries { inflight: u32, errors: u64 },
}
