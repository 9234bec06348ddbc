//! Downcache configuration
//!
//! Settings used in the absence of a per-call override. A [`Downcache`]
//! holds its own [`Config`]; updates are partial records merged over it.
//!
//! [`Downcache`]: crate::Downcache

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::errors::{DowncacheError, Result};

/// Default cache directory
const DEFAULT_BASE_DIRECTORY: &str = "./cache/";

/// Default interval between live fetches, in milliseconds
const DEFAULT_RATE_LIMIT_MS: u64 = 1000;

/// Environment overrides read by [`Config::from_env`]
pub const ENV_DIR: &str = "DOWNCACHE_DIR";
pub const ENV_RATE_LIMIT: &str = "DOWNCACHE_RATE_LIMIT_MS";
pub const ENV_LOG: &str = "DOWNCACHE_LOG";

/// Verbosity of events emitted by retrieve calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Silent,
    Error,
    #[default]
    Warn,
    Info,
    Verbose,
}

impl LogLevel {
    /// Equivalent tracing filter
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Silent => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Verbose => LevelFilter::DEBUG,
        }
    }
}

impl FromStr for LogLevel {
    type Err = DowncacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "silent" | "off" => Ok(LogLevel::Silent),
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "verbose" | "debug" => Ok(LogLevel::Verbose),
            other => Err(DowncacheError::InvalidConfig(format!(
                "unknown log level '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Silent => "silent",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Verbose => "verbose",
        };
        f.write_str(name)
    }
}

/// Downcache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory cache paths are joined under
    pub base_directory: PathBuf,
    /// Minimum interval between live fetches in milliseconds (0 = unlimited)
    pub rate_limit: u64,
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_directory: PathBuf::from(DEFAULT_BASE_DIRECTORY),
            rate_limit: DEFAULT_RATE_LIMIT_MS,
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Defaults overlaid with `DOWNCACHE_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        let mut update = ConfigUpdate::default();

        if let Ok(dir) = std::env::var(ENV_DIR) {
            update.directory = Some(PathBuf::from(dir));
        }
        if let Ok(limit) = std::env::var(ENV_RATE_LIMIT) {
            update.rate_limit = Some(parse_rate_limit(&limit)?);
        }
        if let Ok(level) = std::env::var(ENV_LOG) {
            update.log_level = Some(level.parse()?);
        }

        config.apply(update);
        Ok(config)
    }

    /// Merge a partial update into this config
    ///
    /// # Returns
    /// true if the rate limit changed
    pub fn apply(&mut self, update: ConfigUpdate) -> bool {
        let mut rate_limit_changed = false;

        if let Some(directory) = update.directory {
            self.base_directory = directory;
        }
        if let Some(rate_limit) = update.rate_limit {
            rate_limit_changed = rate_limit != self.rate_limit;
            self.rate_limit = rate_limit;
        }
        if let Some(log_level) = update.log_level {
            self.log_level = log_level;
        }

        rate_limit_changed
    }
}

/// Partial configuration; unset fields leave the current value alone
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfigUpdate {
    #[serde(alias = "dir", alias = "base_directory")]
    pub directory: Option<PathBuf>,
    #[serde(alias = "limit")]
    pub rate_limit: Option<u64>,
    #[serde(alias = "log")]
    pub log_level: Option<LogLevel>,
}

impl ConfigUpdate {
    /// Build an update from a single `key = value` pair
    ///
    /// Accepts `dir`/`directory`, `limit`/`rate_limit` and `log`/`log_level`.
    pub fn from_pair(key: &str, value: &str) -> Result<Self> {
        let mut update = Self::default();
        match key {
            "dir" | "directory" | "base_directory" => {
                update.directory = Some(PathBuf::from(value));
            }
            "limit" | "rate_limit" => {
                update.rate_limit = Some(parse_rate_limit(value)?);
            }
            "log" | "log_level" => {
                update.log_level = Some(value.parse()?);
            }
            other => {
                return Err(DowncacheError::InvalidConfig(format!(
                    "unknown setting '{}'",
                    other
                )))
            }
        }
        Ok(update)
    }

    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn rate_limit(mut self, millis: u64) -> Self {
        self.rate_limit = Some(millis);
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }
}

fn parse_rate_limit(value: &str) -> Result<u64> {
    value.trim().parse::<u64>().map_err(|e| {
        DowncacheError::InvalidConfig(format!("invalid rate limit '{}': {}", value, e))
    })
}
