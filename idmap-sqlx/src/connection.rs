//! A ready-to-use database connection.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::info;

use crate::config::{DatabaseConfig, Driver};
use crate::error::HealthCheckError;
use crate::health::HealthChecker;
use crate::logging::Logger;
use crate::pool::{DbPool, PoolSettings, PoolStatus};

/// Query counters updated by the executor.
#[derive(Debug, Default)]
pub struct QueryStats {
    queries: AtomicU64,
    failures: AtomicU64,
}

impl QueryStats {
    pub(crate) fn record(&self, ok: bool) {
        self.queries.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Number of queries executed.
    pub fn queries(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    /// Number of queries that failed.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

/// A live pool that has passed its health check.
///
/// Only [`crate::manager::ConnectionManager`] creates these.
#[derive(Debug)]
pub struct Connection {
    pub(crate) pool: DbPool,
    pub(crate) config: Arc<DatabaseConfig>,
    pub(crate) logger: Logger,
    pub(crate) settings: PoolSettings,
    pub(crate) health: HealthChecker,
    pub(crate) stats: QueryStats,
}

impl Connection {
    /// Get the database driver.
    pub fn driver(&self) -> Driver {
        self.pool.driver()
    }

    /// Get the configuration this connection was opened with.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Get the logger.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Get the resolved pool settings.
    pub fn pool_settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Get pool status.
    pub fn pool_status(&self) -> PoolStatus {
        self.pool.status()
    }

    /// Get query counters.
    pub fn stats(&self) -> &QueryStats {
        &self.stats
    }

    /// Probe the database again and log the round-trip.
    pub async fn ping(&self) -> Result<Duration, HealthCheckError> {
        let result = self.health.ping(&self.pool).await;
        self.logger.in_scope(|| match &result {
            Ok(elapsed) => info!(
                driver = %self.config.driver,
                host = %self.config.display_host(),
                database = %self.config.database_name,
                ping_duration_ms = elapsed.as_millis() as u64,
                "Database connection successful"
            ),
            Err(e) => tracing::error!(
                driver = %self.config.driver,
                host = %self.config.display_host(),
                database = %self.config.database_name,
                ping_duration_ms = e.elapsed.as_millis() as u64,
                error = %e.cause,
                "Database ping failed"
            ),
        });
        result
    }
}

#[cfg(all(test, feature = "sqlite"))]
pub(crate) mod testing {
    use super::*;
    use crate::config::PoolConfig;

    /// Open a verified connection to a fresh SQLite file.
    pub(crate) async fn sqlite(logger: Logger) -> (Connection, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig::sqlite(dir.path().join("test.db")).with_pool(PoolConfig {
            max_open: 1,
            ..PoolConfig::default()
        });
        let settings = PoolSettings::resolve(&config.pool, &Logger::disabled());
        let pool = DbPool::open_lazy(Driver::Sqlite, &config.file_path.to_string_lossy(), &settings)
            .unwrap();
        let health = HealthChecker::new();
        health.ping(&pool).await.unwrap();

        let connection = Connection {
            pool,
            config: Arc::new(config),
            logger,
            settings,
            health,
            stats: QueryStats::default(),
        };
        (connection, dir)
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::logging::capture;

    #[test]
    fn test_query_stats() {
        let stats = QueryStats::default();
        stats.record(true);
        stats.record(false);
        stats.record(true);
        assert_eq!(stats.queries(), 3);
        assert_eq!(stats.failures(), 1);
    }

    #[tokio::test]
    async fn test_ping_logs_round_trip() {
        let (logger, logs) = capture::logger();
        let (connection, _dir) = testing::sqlite(logger).await;

        connection.ping().await.unwrap();
        let out = logs.contents();
        assert!(out.contains("Database connection successful"));
        assert!(out.contains("ping_duration_ms"));
        assert!(out.contains("driver=sqlite"));
    }

    #[tokio::test]
    async fn test_pool_status() {
        let (connection, _dir) = testing::sqlite(Logger::disabled()).await;
        let status = connection.pool_status();
        assert_eq!(status.driver, Driver::Sqlite);
        assert!(!status.is_closed);
        assert!(status.size <= 1);
    }
}
