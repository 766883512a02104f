//! Logging infrastructure.
//!
//! Components never install a global subscriber. Instead a [`Logger`] is
//! built from the configuration and handed to every component, which emits
//! its `tracing` events inside the logger's dispatch:
//!
//! ```rust,ignore
//! let logger = Logger::from_config(&config.log)?;
//!
//! logger.in_scope(|| tracing::info!(driver = "postgres", "Connecting"));
//! logger.instrument(async { /* events in here go to `logger` */ }).await;
//! ```
//!
//! Output is JSON by default; `pretty` and `compact` are available for
//! humans. Only `idmap*` targets are raised to the configured level, driver
//! internals stay at `warn`.

use std::fs::OpenOptions;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::Dispatch;
use tracing::instrument::{WithDispatch, WithSubscriber};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::ConfigError;

/// Log threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Everything, including every query
    Debug,
    /// Lifecycle events
    #[default]
    Info,
    /// Recoverable problems such as configuration fallbacks
    Warn,
    /// Failures only
    Error,
}

impl LogLevel {
    /// Parse a level name, falling back to `info` for anything unknown.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "debug" => Self::Debug,
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }

    /// Get the directive string for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event
    #[default]
    Json,
    /// Multi-line human readable output
    Pretty,
    /// Single-line human readable output
    Compact,
}

impl LogFormat {
    /// Parse a format name, falling back to JSON.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            _ => Self::Json,
        }
    }
}

/// Logging settings taken from the `database` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogConfig {
    /// Threshold for `idmap*` targets
    pub level: LogLevel,
    /// Output format
    pub format: LogFormat,
    /// Append to this file instead of stdout
    pub file: Option<PathBuf>,
}

/// A logging sink injected into components.
#[derive(Clone)]
pub struct Logger {
    dispatch: Dispatch,
}

impl Logger {
    /// Wrap an existing dispatch.
    pub fn new(dispatch: Dispatch) -> Self {
        Self { dispatch }
    }

    /// A logger that drops every event.
    pub fn disabled() -> Self {
        Self {
            dispatch: Dispatch::none(),
        }
    }

    /// Build a logger from configuration.
    pub fn from_config(config: &LogConfig) -> Result<Self, ConfigError> {
        let level = config.level.as_str();
        let filter = EnvFilter::try_new(format!(
            "warn,idmap={level},idmap_sqlx={level},idmap_ingest={level},idmap_cli={level}"
        ))
        .map_err(|e| ConfigError::invalid(format!("invalid log filter: {e}")))?;

        let (writer, ansi) = match &config.file {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| ConfigError::Io {
                        path: path.clone(),
                        source,
                    })?;
                (BoxMakeWriter::new(Mutex::new(file)), false)
            }
            None => (BoxMakeWriter::new(std::io::stdout), true),
        };

        let dispatch = match config.format {
            LogFormat::Json => Dispatch::new(
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().json().with_writer(writer)),
            ),
            LogFormat::Pretty => Dispatch::new(
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().pretty().with_ansi(ansi).with_writer(writer)),
            ),
            LogFormat::Compact => Dispatch::new(
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().compact().with_ansi(ansi).with_writer(writer)),
            ),
        };

        Ok(Self { dispatch })
    }

    /// Run a closure with this logger as the current dispatch.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Attach this logger to a future.
    pub fn instrument<F: Future>(&self, future: F) -> WithDispatch<F> {
        future.with_subscriber(self.dispatch.clone())
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!(LogLevel::parse_lenient("debug"), LogLevel::Debug);
        assert_eq!(LogLevel::parse_lenient("WARN"), LogLevel::Warn);
        assert_eq!(LogLevel::parse_lenient("error"), LogLevel::Error);
        assert_eq!(LogLevel::parse_lenient("info"), LogLevel::Info);
        assert_eq!(LogLevel::parse_lenient("verbose"), LogLevel::Info);
        assert_eq!(LogLevel::parse_lenient(""), LogLevel::Info);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(LogFormat::parse_lenient("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse_lenient("compact"), LogFormat::Compact);
        assert_eq!(LogFormat::parse_lenient(""), LogFormat::Json);
    }

    #[test]
    fn test_events_stay_in_logger_scope() {
        let (logger, logs) = capture::logger();

        logger.in_scope(|| tracing::info!(driver = "sqlite", "inside"));
        tracing::info!("outside");

        let out = logs.contents();
        assert!(out.contains("inside"));
        assert!(out.contains("driver=\"sqlite\""));
        assert!(!out.contains("outside"));
    }

    #[tokio::test]
    async fn test_instrumented_future() {
        let (logger, logs) = capture::logger();

        logger
            .instrument(async {
                tokio::task::yield_now().await;
                tracing::warn!("after yield");
            })
            .await;

        assert!(logs.contents().contains("after yield"));
    }

    #[test]
    fn test_file_logger_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("idmap.log");
        let config = LogConfig {
            level: LogLevel::Info,
            format: LogFormat::Json,
            file: Some(path.clone()),
        };

        let logger = Logger::from_config(&config).unwrap();
        logger.in_scope(|| tracing::info!(target: "idmap_sqlx", "written to file"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("written to file"));
    }
}
