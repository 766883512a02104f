//! `idmap --ping` - Test the database connection.

use std::path::Path;

use idmap_sqlx::{ConnectionManager, DbError};

use crate::error::CliResult;
use crate::output::{self, success};

/// Run the ping mode
pub async fn run(config: &Path) -> CliResult<()> {
    output::info("Testing database connection...");

    let mut manager = ConnectionManager::connect(config).await?;
    let elapsed = manager
        .connection()?
        .ping()
        .await
        .map_err(DbError::from);

    // The pool is released whatever the probe said.
    manager.close().await?;
    let elapsed = elapsed?;

    success("Database connection successful!");
    output::kv("Round-trip", &output::millis(elapsed));
    Ok(())
}
