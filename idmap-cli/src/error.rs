//! CLI error types and result alias.

use idmap_ingest::IngestError;
use idmap_sqlx::DbError;
use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(code(idmap::config))]
    Config(String),

    /// Connection or lifecycle error
    #[error("Database error: {0}")]
    #[diagnostic(code(idmap::database))]
    Database(String),

    /// Query error
    #[error("Query error: {0}")]
    #[diagnostic(code(idmap::query))]
    Query(String),

    /// Mapping file error
    #[error("Ingestion error: {0}")]
    #[diagnostic(code(idmap::ingest))]
    Ingest(String),

    /// Output error
    #[error("Output error: {0}")]
    #[diagnostic(code(idmap::output))]
    Output(String),
}

impl From<DbError> for CliError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Config(e) => CliError::Config(e.to_string()),
            e @ (DbError::UnsupportedDriver(_) | DbError::InvalidDsn { .. }) => {
                CliError::Config(e.to_string())
            }
            DbError::Query(e) => CliError::Query(e.to_string()),
            e => CliError::Database(e.to_string()),
        }
    }
}

impl From<IngestError> for CliError {
    fn from(err: IngestError) -> Self {
        CliError::Ingest(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Output(format!("Failed to render JSON: {}", err))
    }
}
