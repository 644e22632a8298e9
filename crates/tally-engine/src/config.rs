//! Engine configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;
use tally_db::DbConfig;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// How long a statement waits on a locked database
    pub lock_timeout: Duration,

    /// Attempts per operation when it hits contention
    pub retry_attempts: u32,

    /// Delay before the first retry; later retries back off from here
    pub retry_backoff: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            database_path: PathBuf::from("tally.db"),
            max_connections: 5,
            lock_timeout: Duration::from_millis(5_000),
            retry_attempts: 3,
            retry_backoff: Duration::from_millis(25),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                 | Default    |
    /// |--------------------------|------------|
    /// | `TALLY_DB_PATH`          | `tally.db` |
    /// | `TALLY_MAX_CONNECTIONS`  | `5`        |
    /// | `TALLY_LOCK_TIMEOUT_MS`  | `5000`     |
    /// | `TALLY_RETRY_ATTEMPTS`   | `3`        |
    /// | `TALLY_RETRY_BACKOFF_MS` | `25`       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = EngineConfig {
            database_path: lookup("TALLY_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("tally.db")),

            max_connections: lookup("TALLY_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("TALLY_MAX_CONNECTIONS".to_string()))?,

            lock_timeout: lookup("TALLY_LOCK_TIMEOUT_MS")
                .unwrap_or_else(|| "5000".to_string())
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidValue("TALLY_LOCK_TIMEOUT_MS".to_string()))?,

            retry_attempts: lookup("TALLY_RETRY_ATTEMPTS")
                .unwrap_or_else(|| "3".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("TALLY_RETRY_ATTEMPTS".to_string()))?,

            retry_backoff: lookup("TALLY_RETRY_BACKOFF_MS")
                .unwrap_or_else(|| "25".to_string())
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidValue("TALLY_RETRY_BACKOFF_MS".to_string()))?,
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("TALLY_MAX_CONNECTIONS".to_string()));
        }
        if config.retry_attempts == 0 {
            return Err(ConfigError::InvalidValue("TALLY_RETRY_ATTEMPTS".to_string()));
        }

        Ok(config)
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone())
            .max_connections(self.max_connections)
            .lock_timeout(self.lock_timeout)
    }

    /// Retry settings derived from this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, self.retry_backoff)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
