//! # idmap
//!
//! Configuration-driven database connections with an identity/domain
//! mapping loader on top.
//!
//! idmap provides:
//! - One YAML file describing a PostgreSQL, MySQL or SQLite database
//! - Pools that are only handed out after a bounded-time health check
//! - Query execution with structured logging of statements and timing
//! - Idempotent loading of `domain,identity:identity` mapping files
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use idmap::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut manager = ConnectionManager::connect("config.yaml").await?;
//!
//!     let ingestor = MappingIngestor::new(manager.logger().clone());
//!     let loaded = ingestor.load("mappings.csv")?;
//!     let report = ingestor.persist(&loaded.sets, manager.connection()?).await;
//!     println!("{} rows failed", report.failed_total());
//!
//!     manager.close().await?;
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Connection management, health checks and query execution.
pub mod db {
    pub use idmap_sqlx::*;
}

/// Mapping file parsing and loading.
pub mod ingest {
    pub use idmap_ingest::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::db::{
        Connection, ConnectionManager, ConnectionState, DatabaseConfig, DbError, Driver, Logger,
        SqlExecutor, Value,
    };
    pub use crate::ingest::{EntitySets, IngestOptions, MappingIngestor, PersistReport};
}

// Re-export key types at the crate root
pub use db::{DbError, DbResult};
pub use ingest::{IngestError, IngestResult};
