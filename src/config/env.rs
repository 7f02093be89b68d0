//! Environment variable configuration
//!
//! Provides environment variable overrides for connection and output settings.

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use tracing::warn;

/// Environment variable prefix
const ENV_PREFIX: &str = "SELECT1_BENCH";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    /// Connection URL from SELECT1_BENCH_URL
    pub url: Option<String>,
    /// Hostname from SELECT1_BENCH_HOST
    pub host: Option<String>,
    /// Port from SELECT1_BENCH_PORT
    pub port: Option<u16>,
    /// Username from SELECT1_BENCH_USER
    pub user: Option<String>,
    /// Password from SELECT1_BENCH_PASSWORD
    pub password: Option<String>,
    /// Output format from SELECT1_BENCH_FORMAT
    pub format: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            url: get_env("URL"),
            host: get_env("HOST"),
            port: get_env_parse("PORT"),
            user: get_env("USER"),
            password: get_env("PASSWORD"),
            format: get_env("FORMAT"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.url.is_some()
            || self.host.is_some()
            || self.port.is_some()
            || self.user.is_some()
            || self.password.is_some()
            || self.format.is_some()
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}")).ok()
}

/// Get environment variable and parse to type
fn get_env_parse<T>(name: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    get_env(name).and_then(|raw| parse_env_value(name, &raw))
}

/// Parse a set variable, warning when the value is malformed
fn parse_env_value<T>(name: &str, raw: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring {ENV_PREFIX}_{name}={raw:?}: {e}");
            None
        }
    }
}

/// Builder for setting environment variables in tests
#[cfg(test)]
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

#[cfg(test)]
impl EnvBuilder {
    pub fn new() -> Self {
        Self { vars: Vec::new() }
    }

    pub fn var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_{name}"), value.into()));
        self
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        for (key, value) in self.vars {
            env::set_var(key, value);
        }

        EnvGuard { previous }
    }
}

/// Guard that restores environment variables on drop
#[cfg(test)]
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

#[cfg(test)]
impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}
