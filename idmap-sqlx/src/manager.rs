//! Connection lifecycle management.
//!
//! ```text
//! Unconfigured -> Configured -> Opened -> Ready -> Closed
//!        \             \           \
//!         +-------------+-----------+--> Failed
//! ```
//!
//! A [`Connection`] is only handed out in `Ready`, which is only reachable
//! through a successful health check.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::DatabaseConfig;
use crate::connection::{Connection, QueryStats};
use crate::error::{DbError, DbResult};
use crate::health::HealthChecker;
use crate::logging::{LogConfig, Logger};
use crate::pool::{DbPool, PoolSettings};

/// Lifecycle state of a [`ConnectionManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No configuration yet
    Unconfigured,
    /// Configuration loaded and validated
    Configured,
    /// Pool opened, not yet verified
    Opened,
    /// Health check passed; the connection is usable
    Ready,
    /// Connection released
    Closed,
    /// A step failed; terminal
    Failed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unconfigured => "Unconfigured",
            Self::Configured => "Configured",
            Self::Opened => "Opened",
            Self::Ready => "Ready",
            Self::Closed => "Closed",
            Self::Failed => "Failed",
        };
        write!(f, "{}", name)
    }
}

/// Owns the configuration and the pool for one process invocation.
///
/// # Example
///
/// ```rust,ignore
/// use idmap_sqlx::ConnectionManager;
///
/// let mut manager = ConnectionManager::connect("config.yaml").await?;
/// let rows = manager.connection()?.query_many("SELECT 1", &[]).await?;
/// manager.close().await?;
/// ```
#[derive(Debug)]
pub struct ConnectionManager {
    state: ConnectionState,
    logger: Logger,
    health: HealthChecker,
    config: Option<Arc<DatabaseConfig>>,
    connection: Option<Connection>,
}

impl ConnectionManager {
    /// Create an unconfigured manager.
    pub fn new(logger: Logger) -> Self {
        Self {
            state: ConnectionState::Unconfigured,
            logger,
            health: HealthChecker::new(),
            config: None,
            connection: None,
        }
    }

    /// Replace the health checker.
    pub fn with_health_checker(mut self, health: HealthChecker) -> Self {
        self.health = health;
        self
    }

    /// Load a configuration file, build its logger and open a ready connection.
    ///
    /// Failures that happen before the configured logger exists are logged
    /// with the default logging settings.
    pub async fn connect(config_path: impl AsRef<Path>) -> DbResult<Self> {
        let bootstrap = Logger::from_config(&LogConfig::default())?;
        Self::connect_with(config_path, bootstrap).await
    }

    /// Like [`ConnectionManager::connect`], with `bootstrap` receiving events
    /// until the configured logger replaces it.
    pub async fn connect_with(config_path: impl AsRef<Path>, bootstrap: Logger) -> DbResult<Self> {
        let mut manager = Self::new(bootstrap);
        manager.configure_from_path(config_path)?;

        let log = manager.config().map(|c| c.log.clone()).unwrap_or_default();
        match Logger::from_config(&log) {
            Ok(logger) => manager.logger = logger,
            Err(e) => return Err(manager.fail(e.into())),
        }

        manager.open().await?;
        Ok(manager)
    }

    /// Get the current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Get the logger.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Get the configuration, once configured.
    pub fn config(&self) -> Option<&DatabaseConfig> {
        self.config.as_deref()
    }

    /// Load and validate configuration from a YAML file.
    pub fn configure_from_path(&mut self, path: impl AsRef<Path>) -> DbResult<()> {
        self.require(ConnectionState::Unconfigured, "Unconfigured")?;
        match DatabaseConfig::load(path) {
            Ok(config) => self.configure(config),
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Take ownership of an already validated configuration.
    pub fn configure(&mut self, config: DatabaseConfig) -> DbResult<()> {
        self.require(ConnectionState::Unconfigured, "Unconfigured")?;
        self.config = Some(Arc::new(config));
        self.transition(ConnectionState::Configured);
        Ok(())
    }

    /// Open the pool, verify it and return the ready connection.
    pub async fn open(&mut self) -> DbResult<&Connection> {
        self.require(ConnectionState::Configured, "Configured")?;
        let Some(config) = self.config.clone() else {
            return Err(DbError::invalid_state("Configured", self.state));
        };

        let dsn = match config.driver.dsn(&config) {
            Ok(dsn) => dsn,
            Err(e) => return Err(self.fail(e)),
        };

        let settings = PoolSettings::resolve(&config.pool, &self.logger);
        let pool = match DbPool::open_lazy(config.driver, &dsn, &settings) {
            Ok(pool) => pool,
            Err(e) => return Err(self.fail(DbError::ConnectionOpen(e))),
        };
        self.transition(ConnectionState::Opened);

        let elapsed = match self.health.ping(&pool).await {
            Ok(elapsed) => elapsed,
            Err(e) => {
                pool.close().await;
                return Err(self.fail(e.into()));
            }
        };

        self.logger.in_scope(|| {
            info!(
                driver = %config.driver,
                host = %config.display_host(),
                database = %config.database_name,
                ping_duration_ms = elapsed.as_millis() as u64,
                max_open = settings.max_open,
                max_idle = settings.max_idle,
                "Database connection established successfully"
            )
        });

        let connection = Connection {
            pool,
            config,
            logger: self.logger.clone(),
            settings,
            health: self.health,
            stats: QueryStats::default(),
        };
        self.transition(ConnectionState::Ready);
        Ok(&*self.connection.insert(connection))
    }

    /// Get the ready connection.
    pub fn connection(&self) -> DbResult<&Connection> {
        match (&self.connection, self.state) {
            (Some(connection), ConnectionState::Ready) => Ok(connection),
            _ => Err(DbError::invalid_state("Ready", self.state)),
        }
    }

    /// Release the pool.
    ///
    /// Calling this twice is a caller error and returns
    /// [`DbError::InvalidState`].
    pub async fn close(&mut self) -> DbResult<()> {
        self.require(ConnectionState::Ready, "Ready")?;
        let Some(connection) = self.connection.take() else {
            return Err(DbError::invalid_state("Ready", self.state));
        };

        self.logger.in_scope(|| info!("Closing database connection"));
        connection.pool.close().await;
        self.transition(ConnectionState::Closed);
        Ok(())
    }

    fn require(&self, expected: ConnectionState, name: &'static str) -> DbResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(DbError::invalid_state(name, self.state))
        }
    }

    fn transition(&mut self, to: ConnectionState) {
        let from = self.state;
        self.logger
            .in_scope(|| debug!(from = %from, to = %to, "Connection state transition"));
        self.state = to;
    }

    fn fail(&mut self, err: DbError) -> DbError {
        let from = self.state;
        self.logger.in_scope(|| {
            error!(from = %from, error = %err, "Database connection failed")
        });
        self.transition(ConnectionState::Failed);
        err
    }
}
