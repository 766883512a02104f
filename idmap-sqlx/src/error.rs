//! Error types for connection management and query execution.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::manager::ConnectionState;

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors that can occur while configuring, opening or using a connection.
#[derive(Error, Debug)]
pub enum DbError {
    /// Missing, unreadable or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The configured driver tag is not one of postgres, mysql or sqlite.
    #[error("Unsupported database driver: {0}")]
    UnsupportedDriver(String),

    /// The configured components cannot be assembled into a connection string.
    #[error("Invalid connection string for {driver}: {reason}")]
    InvalidDsn {
        /// Driver the DSN was being built for
        driver: &'static str,
        /// What went wrong
        reason: String,
    },

    /// The driver refused to open the pool.
    #[error("Failed to open database connection: {0}")]
    ConnectionOpen(#[source] sqlx::Error),

    /// The liveness probe timed out or failed.
    #[error(transparent)]
    HealthCheck(#[from] HealthCheckError),

    /// A query failed; the native driver error is kept as-is.
    #[error("Query error: {0}")]
    Query(#[source] sqlx::Error),

    /// An operation was attempted in the wrong lifecycle state.
    #[error("Invalid connection state: expected {expected}, found {actual}")]
    InvalidState {
        /// State(s) the operation requires
        expected: &'static str,
        /// State the manager was in
        actual: ConnectionState,
    },
}

impl DbError {
    /// Create an invalid state error.
    pub fn invalid_state(expected: &'static str, actual: ConnectionState) -> Self {
        Self::InvalidState { expected, actual }
    }

    /// Check if this error came from the configuration layer.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this error means the driver tag was rejected.
    pub fn is_unsupported_driver(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedDriver(_) | Self::Config(ConfigError::UnsupportedDriver(_))
        )
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that was read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The configuration document is not valid YAML for this schema.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Path that was parsed
        path: PathBuf,
        /// Underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// The driver tag is not recognised.
    #[error("unsupported database driver: {0}")]
    UnsupportedDriver(String),

    /// A value is missing or out of range.
    #[error("{0}")]
    Invalid(String),
}

impl ConfigError {
    /// Create an invalid configuration error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Why a liveness probe failed.
#[derive(Error, Debug)]
pub enum ProbeFailure {
    /// The probe did not finish within the limit.
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The driver reported an error.
    #[error("{0}")]
    Driver(#[source] sqlx::Error),
}

/// Health check failure with the time spent probing.
#[derive(Error, Debug)]
#[error("Database ping failed after {}ms: {cause}", elapsed.as_millis())]
pub struct HealthCheckError {
    /// Time elapsed before the probe gave up or failed
    pub elapsed: Duration,
    /// Underlying cause
    #[source]
    pub cause: ProbeFailure,
}

impl HealthCheckError {
    /// Check if the probe ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self.cause, ProbeFailure::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = DbError::UnsupportedDriver("oracle".into());
        assert!(err.is_unsupported_driver());
        assert!(err.to_string().contains("oracle"));

        let err: DbError = ConfigError::UnsupportedDriver("db2".into()).into();
        assert!(err.is_config());
        assert!(err.is_unsupported_driver());

        let err = DbError::invalid_state("Ready", ConnectionState::Closed);
        assert!(matches!(err, DbError::InvalidState { .. }));
        assert!(err.to_string().contains("Closed"));
    }

    #[test]
    fn test_health_check_error_message() {
        let err = HealthCheckError {
            elapsed: Duration::from_millis(5002),
            cause: ProbeFailure::Timeout(Duration::from_secs(5)),
        };
        assert!(err.is_timeout());
        let msg = err.to_string();
        assert!(msg.contains("5002ms"));
        assert!(msg.contains("timed out after 5000ms"));
    }
}
