//! # idmap SQLx backend
//!
//! Configuration-driven database connectivity for PostgreSQL, MySQL and
//! SQLite on top of SQLx.
//!
//! ## Features
//!
//! - **YAML configuration** - One file describes the driver, credentials, pool and logging
//! - **Multi-database support** - PostgreSQL, MySQL, and SQLite through a unified API
//! - **Verified connections** - A pool is only handed out after a bounded-time ping
//! - **Instrumented queries** - Every statement is logged with its arguments and timing
//!
//! ## Usage
//!
//! ```rust,ignore
//! use idmap_sqlx::{ConnectionManager, Value};
//!
//! let mut manager = ConnectionManager::connect("config.yaml").await?;
//! let conn = manager.connection()?;
//!
//! let rows = conn
//!     .query_many("SELECT id, name FROM domains WHERE name = $1", &[Value::from("example.com")])
//!     .await?;
//!
//! manager.close().await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod connection;
pub mod dsn;
pub mod error;
pub mod executor;
pub mod health;
pub mod logging;
pub mod manager;
pub mod pool;
pub mod row;
pub mod types;

/// Re-export commonly used types
pub use config::{DatabaseConfig, Driver, PoolConfig};
pub use connection::{Connection, QueryStats};
pub use dsn::build_dsn;
pub use error::{ConfigError, DbError, DbResult, HealthCheckError, ProbeFailure};
pub use executor::SqlExecutor;
pub use health::{HealthChecker, PING_TIMEOUT, Probe};
pub use logging::{LogConfig, LogFormat, LogLevel, Logger};
pub use manager::{ConnectionManager, ConnectionState};
pub use pool::{DbPool, PoolSettings, PoolStatus};
pub use row::{ColumnDecode, DbRow};
pub use types::{Value, placeholder, placeholders};

/// Re-export SQLx for callers that need driver types
pub use sqlx;
