//! select1-bench - SELECT 1 latency and throughput sweep
//!
//! Opens `inflight` dedicated connections, issues `SELECT 1` on each of them
//! as fast as possible for a fixed interval, and reports latency percentiles
//! and throughput for every concurrency level from `--min-inflight` to
//! `--max-inflight`.
//!
//! ## Usage
//!
//! ```bash
//! # Sweep 1..=64 workers against a local Postgres, 5 seconds per level
//! select1-bench
//!
//! # Explicit URL, short sweep, CSV output
//! select1-bench -j postgresql://bench:secret@db:5432/postgres -m 1 -M 8 -i 2 -f csv
//! ```

use std::process;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::debug;

mod benchmark;
mod cli;
mod config;
mod db;
mod error;
mod utils;

use benchmark::{run_sweep, BenchmarkReport, LevelRunner};
use cli::Args;
use config::{EnvConfig, SweepConfig};
use db::UrlDriver;
use utils::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    let level = if args.verbose {
        LogLevel::Debug
    } else {
        LogLevel::from_name(&args.log_level)
            .unwrap_or_else(|| usage_error(&format!("Invalid log level: {}", args.log_level)))
    };
    init_logger(level);

    let env = EnvConfig::load();
    if env.has_any() {
        debug!("Applying SELECT1_BENCH_* environment overrides");
    }

    let config = SweepConfig::resolve(&args, &env).unwrap_or_else(|e| usage_error(&e.to_string()));

    println!("Running benchmark with parameters:");
    println!("{}", config.describe());

    let runner = LevelRunner::new(UrlDriver, config.url.as_str(), config.interval);
    let results = run_sweep(&runner, config.min_inflight..=config.max_inflight)
        .await
        .context("Error running benchmark")?;

    let report = BenchmarkReport::render(&results, config.format)?;
    print!("{report}");

    Ok(())
}

/// Print `message` and the usage line, then exit with status 1
fn usage_error(message: &str) -> ! {
    eprintln!("{message}");
    eprintln!("{}", Args::command().render_usage());
    process::exit(1);
}
