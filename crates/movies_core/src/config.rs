//! Harness configuration read from environment variables.
//!
//! # Responsibility
//! - Resolve the fixture directory, query timeout and log level.
//! - Keep parsing testable through an injectable lookup function.
//!
//! # Invariants
//! - Unset variables fall back to defaults; malformed values are errors.
//! - A timeout of `0` seconds disables per-query interruption.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const FIXTURE_DIR_ENV: &str = "SQL_MOVIES_FIXTURE_DIR";
pub const QUERY_TIMEOUT_ENV: &str = "SQL_MOVIES_QUERY_TIMEOUT_SECS";
pub const LOG_LEVEL_ENV: &str = "SQL_MOVIES_LOG_LEVEL";

const DEFAULT_FIXTURE_DIR: &str = "db";
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 180;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue {
                key,
                value,
                message,
            } => write!(f, "invalid value `{value}` for {key}: {message}"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Directory holding `<stage>.db` files.
    pub fixture_dir: PathBuf,
    /// Per-query limit; `None` disables interruption.
    pub query_timeout: Option<Duration>,
    pub log_level: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            fixture_dir: PathBuf::from(DEFAULT_FIXTURE_DIR),
            query_timeout: Some(Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS)),
            log_level: default_log_level().to_string(),
        }
    }
}

impl HarnessConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which returns a variable's value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = non_blank(lookup(FIXTURE_DIR_ENV)) {
            config.fixture_dir = PathBuf::from(dir);
        }

        if let Some(raw) = non_blank(lookup(QUERY_TIMEOUT_ENV)) {
            let secs = raw
                .parse::<u64>()
                .map_err(|err| ConfigError::InvalidValue {
                    key: QUERY_TIMEOUT_ENV,
                    value: raw.clone(),
                    message: err.to_string(),
                })?;
            config.query_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(level) = non_blank(lookup(LOG_LEVEL_ENV)) {
            config.log_level = level;
        }

        Ok(config)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}
