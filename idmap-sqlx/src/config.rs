//! Database configuration loaded from YAML.
//!
//! The on-disk document keeps the historical key names (`dbname`, `sslmode`,
//! `max_open_conns`, ...). It is deserialised into a raw, permissive shape and
//! then validated into [`DatabaseConfig`], which is what the rest of the crate
//! works with.
//!
//! ```yaml
//! database:
//!   driver: postgres
//!   host: localhost
//!   port: 5432
//!   username: app
//!   password: secret
//!   dbname: identity
//!   sslmode: disable
//!   dbschema: public
//!   log_level: info
//!   pool:
//!     max_open_conns: 25
//!     max_idle_conns: 5
//!     conn_max_lifetime: 30m
//!     conn_max_idle_time: 15m
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::logging::{LogConfig, LogFormat, LogLevel};

/// Database driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    /// PostgreSQL database
    Postgres,
    /// MySQL / MariaDB database
    MySql,
    /// SQLite database file
    Sqlite,
}

impl Driver {
    /// Get the driver name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Get the default port for this driver.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::Postgres => Some(5432),
            Self::MySql => Some(3306),
            Self::Sqlite => None,
        }
    }

    /// Whether the driver talks to a server over the network.
    pub fn is_network(&self) -> bool {
        !matches!(self, Self::Sqlite)
    }
}

impl FromStr for Driver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            _ => Err(ConfigError::UnsupportedDriver(s.to_string())),
        }
    }
}

impl std::fmt::Display for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Pool tuning as written in the configuration.
///
/// Durations stay as strings here; they are parsed (with fallbacks) when the
/// pool is opened, see [`crate::pool::PoolSettings::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum open connections (0 or negative means no limit)
    pub max_open: i64,
    /// Maximum idle connections (0 or negative means no limit)
    pub max_idle: i64,
    /// Maximum connection lifetime, e.g. `30m`
    pub max_lifetime: String,
    /// Maximum idle time per connection, e.g. `15m`
    pub max_idle_time: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_open: 0,
            max_idle: 0,
            max_lifetime: String::new(),
            max_idle_time: String::new(),
        }
    }
}

/// Validated connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database driver
    pub driver: Driver,
    /// Server host (network drivers)
    pub host: String,
    /// Server port (network drivers)
    pub port: u16,
    /// User name
    pub username: String,
    /// Password
    pub password: String,
    /// Database name
    pub database_name: String,
    /// Schema placed on the search path (PostgreSQL)
    pub schema: String,
    /// SSL mode (PostgreSQL)
    pub ssl_mode: String,
    /// Database file (SQLite)
    pub file_path: PathBuf,
    /// Pool tuning
    pub pool: PoolConfig,
    /// Logging settings
    pub log: LogConfig,
}

impl DatabaseConfig {
    /// Create a configuration for a network database.
    pub fn network(driver: Driver, host: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            driver,
            host: host.into(),
            port: driver.default_port().unwrap_or_default(),
            username: String::new(),
            password: String::new(),
            database_name: database.into(),
            schema: String::new(),
            ssl_mode: String::new(),
            file_path: PathBuf::new(),
            pool: PoolConfig::default(),
            log: LogConfig::default(),
        }
    }

    /// Create a configuration for a SQLite database file.
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: path.into(),
            ..Self::network(Driver::Sqlite, "", "")
        }
    }

    /// Set credentials.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Set port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set schema.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Set SSL mode.
    pub fn with_ssl_mode(mut self, mode: impl Into<String>) -> Self {
        self.ssl_mode = mode.into();
        self
    }

    /// Set pool tuning.
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Set logging settings.
    pub fn with_log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Load and validate a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let abs = std::path::absolute(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let content = std::fs::read_to_string(&abs).map_err(|source| ConfigError::Io {
            path: abs.clone(),
            source,
        })?;
        let raw: RawDocument =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: abs.clone(),
                source,
            })?;
        raw.database.validate()
    }

    /// Parse and validate a YAML document held in memory.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawDocument =
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: PathBuf::from("<memory>"),
                source,
            })?;
        raw.database.validate()
    }

    /// Host shown in log events (the file path for SQLite).
    pub fn display_host(&self) -> String {
        if self.driver.is_network() {
            self.host.clone()
        } else {
            self.file_path.display().to_string()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDocument {
    database: RawDatabase,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDatabase {
    driver: String,
    host: String,
    port: u16,
    username: String,
    password: String,
    dbname: String,
    sslmode: String,
    filepath: String,
    log_level: String,
    log_format: String,
    log_file: Option<PathBuf>,
    dbschema: String,
    pool: RawPool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPool {
    max_open_conns: i64,
    max_idle_conns: i64,
    conn_max_lifetime: String,
    conn_max_idle_time: String,
}

impl RawDatabase {
    fn validate(self) -> Result<DatabaseConfig, ConfigError> {
        if self.driver.trim().is_empty() {
            return Err(ConfigError::invalid("database.driver is required"));
        }
        let driver: Driver = self.driver.parse()?;

        // Older layouts put the SQLite path under `dbname`.
        let file_path = match (driver, self.filepath.trim()) {
            (Driver::Sqlite, "") => self.dbname.trim().to_string(),
            (_, path) => path.to_string(),
        };

        if driver.is_network() && self.host.trim().is_empty() {
            return Err(ConfigError::invalid(format!(
                "database.host is required for {}",
                driver
            )));
        }
        if driver == Driver::Sqlite && file_path.is_empty() {
            return Err(ConfigError::invalid("database.filepath is required for sqlite"));
        }

        let port = match self.port {
            0 => driver.default_port().unwrap_or_default(),
            port => port,
        };

        Ok(DatabaseConfig {
            driver,
            host: self.host.trim().to_string(),
            port,
            username: self.username,
            password: self.password,
            database_name: self.dbname,
            schema: self.dbschema,
            ssl_mode: self.sslmode,
            file_path: PathBuf::from(file_path),
            pool: PoolConfig {
                max_open: self.pool.max_open_conns,
                max_idle: self.pool.max_idle_conns,
                max_lifetime: self.pool.conn_max_lifetime,
                max_idle_time: self.pool.conn_max_idle_time,
            },
            log: LogConfig {
                level: LogLevel::parse_lenient(&self.log_level),
                format: LogFormat::parse_lenient(&self.log_format),
                file: self.log_file,
            },
        })
    }
}
