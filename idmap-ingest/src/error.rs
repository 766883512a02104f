//! Error types for mapping ingestion.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for ingestion.
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors that abort a load.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The mapping file could not be opened
    #[error("Failed to open mapping file {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The mapping data could not be read
    #[error("Failed to read mapping data: {0}")]
    Csv(#[from] csv::Error),
}

/// A single row that could not be written.
///
/// These are collected into the pass report; they never abort a batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to insert {key} into {table}: {message}")]
pub struct IngestRowError {
    /// Destination table
    pub table: &'static str,
    /// Natural key of the row
    pub key: String,
    /// Driver error message
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_error_display() {
        let err = IngestRowError {
            table: "data_domains",
            key: "example.com".into(),
            message: "disk full".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to insert example.com into data_domains: disk full"
        );
    }

    #[test]
    fn test_io_error_display() {
        let err = IngestError::Io {
            path: PathBuf::from("/tmp/missing.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("/tmp/missing.csv"));
    }
}
