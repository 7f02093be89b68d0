//! Load generation and measurement
//!
//! Query workers, the per-level runner, the concurrency sweep and reporting.

mod metrics;
mod report;
mod runner;
mod sweep;
mod worker;

pub use report::{BenchmarkReport, ReportFormat};
pub use runner::LevelRunner;
pub use sweep::run_sweep;
