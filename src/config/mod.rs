//! Configuration module
//!
//! Resolves CLI flags and environment overrides into an immutable
//! [`SweepConfig`].

mod env;

pub use env::EnvConfig;

use std::time::Duration;

use url::Url;

use crate::benchmark::ReportFormat;
use crate::cli::Args;
use crate::db::Scheme;
use crate::error::BenchError;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_USER: &str = "postgres";
pub const DEFAULT_PASSWORD: &str = "postgres";
pub const DEFAULT_MIN_INFLIGHT: u32 = 1;
pub const DEFAULT_MAX_INFLIGHT: u32 = 64;
pub const DEFAULT_INTERVAL_SECS: u64 = 5;
/// Upper bound on the per-level interval (one day)
pub const MAX_INTERVAL_SECS: u64 = 86_400;

/// Settings for one sweep, fixed for the whole run
#[derive(Clone, Debug, PartialEq)]
pub struct SweepConfig {
    /// Connection URL handed to the driver
    pub url: String,
    pub min_inflight: u32,
    pub max_inflight: u32,
    /// Time spent at each concurrency level
    pub interval: Duration,
    pub format: ReportFormat,
}

impl SweepConfig {
    /// Build and validate a config. CLI flags win over environment variables,
    /// environment variables over defaults.
    pub fn resolve(args: &Args, env: &EnvConfig) -> Result<Self, BenchError> {
        let url = match args.url.clone().or_else(|| env.url.clone()) {
            Some(url) => url,
            None => compose_url(
                args.host
                    .as_deref()
                    .or(env.host.as_deref())
                    .unwrap_or(DEFAULT_HOST),
                args.port.or(env.port).unwrap_or(DEFAULT_PORT),
                args.user
                    .as_deref()
                    .or(env.user.as_deref())
                    .unwrap_or(DEFAULT_USER),
                args.password
                    .as_deref()
                    .or(env.password.as_deref())
                    .unwrap_or(DEFAULT_PASSWORD),
            )?,
        };

        let format_name = args
            .format
            .clone()
            .or_else(|| env.format.clone())
            .unwrap_or_else(|| ReportFormat::default().name().to_string());
        let format = ReportFormat::from_name(&format_name).ok_or_else(|| {
            BenchError::InvalidConfig(format!(
                "Invalid format: {format_name}. Must be 'human' or 'csv'"
            ))
        })?;

        let config = Self {
            url,
            min_inflight: args.min_inflight,
            max_inflight: args.max_inflight,
            interval: Duration::from_secs(args.interval),
            format,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the inflight range, interval and URL scheme
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.min_inflight == 0 {
            return Err(BenchError::InvalidConfig(
                "min inflight must be at least 1".to_string(),
            ));
        }
        if self.min_inflight > self.max_inflight {
            return Err(BenchError::InvalidConfig(format!(
                "min inflight ({}) is greater than max inflight ({})",
                self.min_inflight, self.max_inflight
            )));
        }
        if self.interval.is_zero() {
            return Err(BenchError::InvalidConfig(
                "interval must be greater than zero".to_string(),
            ));
        }
        if self.interval.as_secs() > MAX_INTERVAL_SECS {
            return Err(BenchError::InvalidConfig(format!(
                "interval must be at most {MAX_INTERVAL_SECS} seconds"
            )));
        }
        Scheme::detect(&self.url).map_err(|e| BenchError::InvalidConfig(e.to_string()))?;
        Ok(())
    }

    /// Startup parameter echo, password redacted
    pub fn describe(&self) -> String {
        format!(
            "JDBC URL: {}, Min Inflight: {}, Max Inflight: {}, Interval: {} seconds, Format: {}",
            redact_url(&self.url),
            self.min_inflight,
            self.max_inflight,
            self.interval.as_secs(),
            self.format.name()
        )
    }
}

/// Compose a Postgres URL from its parts, percent-encoding the credentials
pub fn compose_url(host: &str, port: u16, user: &str, password: &str) -> Result<String, BenchError> {
    let invalid = |what: &str| BenchError::InvalidConfig(format!("invalid {what} for connection URL"));

    let mut url = Url::parse(&format!("postgresql://{host}:{port}/postgres"))
        .map_err(|e| BenchError::InvalidConfig(format!("invalid host {host}: {e}")))?;
    url.set_username(user).map_err(|_| invalid("user"))?;
    url.set_password(Some(password))
        .map_err(|_| invalid("password"))?;
    Ok(url.to_string())
}

const REDACTED: &str = "***";

/// Hide the password in `url`, whether it sits in the userinfo or in a
/// `password` query parameter. Unparseable URLs are returned unchanged.
pub fn redact_url(url: &str) -> String {
    let (prefix, rest) = match url.strip_prefix("jdbc:") {
        Some(rest) => ("jdbc:", rest),
        None => ("", url),
    };
    let Ok(mut parsed) = Url::parse(rest) else {
        return url.to_string();
    };

    if parsed.password().is_some() && parsed.set_password(Some(REDACTED)).is_err() {
        return url.to_string();
    }

    if parsed.query_pairs().any(|(k, _)| k == "password") {
        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| {
                let v = if k == "password" {
                    REDACTED.to_string()
                } else {
                    v.into_owned()
                };
                (k.into_owned(), v)
            })
            .collect();
        parsed.query_pairs_mut().clear().extend_pairs(pairs);
    }

    format!("{prefix}{parsed}")
}
