//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{value_parser, ArgAction, Parser};

use crate::config::{
    DEFAULT_INTERVAL_SECS, DEFAULT_MAX_INFLIGHT, DEFAULT_MIN_INFLIGHT, MAX_INTERVAL_SECS,
};

/// Measure SELECT 1 latency and throughput across concurrency levels
#[derive(Parser, Debug)]
#[command(name = "select1-bench")]
#[command(version)]
#[command(about = "Measure SELECT 1 round-trip latency and throughput under concurrent load")]
#[command(long_about = None)]
#[command(disable_help_flag = true)]
pub struct Args {
    /// Connection URL (overrides host/port/user/password options)
    #[arg(short = 'j', long = "jdbc-url", value_name = "URL")]
    pub url: Option<String>,

    /// Server hostname [default: localhost]
    #[arg(short = 'h', long)]
    pub host: Option<String>,

    /// Server port [default: 5432]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Username [default: postgres]
    #[arg(short, long)]
    pub user: Option<String>,

    /// Password [default: postgres]
    #[arg(short = 'w', long)]
    pub password: Option<String>,

    /// Minimum number of concurrent connections
    #[arg(short, long, default_value_t = DEFAULT_MIN_INFLIGHT,
          value_parser = value_parser!(u32).range(1..))]
    pub min_inflight: u32,

    /// Maximum number of concurrent connections
    #[arg(short = 'M', long, default_value_t = DEFAULT_MAX_INFLIGHT,
          value_parser = value_parser!(u32).range(1..))]
    pub max_inflight: u32,

    /// Duration in seconds to run each inflight level
    #[arg(short, long, default_value_t = DEFAULT_INTERVAL_SECS,
          value_parser = value_parser!(u64).range(1..=MAX_INTERVAL_SECS))]
    pub interval: u64,

    /// Output format: human or csv [default: human]
    #[arg(short, long)]
    pub format: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}
