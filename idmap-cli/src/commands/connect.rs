//! Default mode - open a verified connection and close it again.

use std::path::Path;

use idmap_sqlx::ConnectionManager;

use crate::error::CliResult;
use crate::output::{self, success};

/// Run the default mode
pub async fn run(config: &Path) -> CliResult<()> {
    let mut manager = ConnectionManager::connect(config).await?;

    let connection = manager.connection()?;
    let settings = connection.pool_settings();
    success("Database connection established");
    output::kv("Driver", connection.driver().name());
    output::kv("Host", &connection.config().display_host());
    output::kv("Max open", &settings.max_open.to_string());
    output::kv("Max idle", &settings.max_idle.to_string());
    for key in &settings.fallbacks {
        output::warn(&format!("{} is invalid, using the default", key));
    }

    manager.close().await?;
    Ok(())
}
