//! `idmap --query` - Run one query and print its rows.

use std::path::Path;

use idmap_sqlx::{ConnectionManager, DbError};

use crate::error::CliResult;
use crate::output;

/// Run the query mode
pub async fn run(config: &Path, sql: &str) -> CliResult<()> {
    let mut manager = ConnectionManager::connect(config).await?;

    let rows = manager
        .connection()?
        .query_many(sql, &[])
        .await
        .map_err(DbError::Query);
    manager.close().await?;

    let rows: Vec<_> = rows?.iter().map(|row| row.to_json()).collect();
    output::plain(&serde_json::to_string_pretty(&rows)?);
    Ok(())
}
