//! CLI argument definitions using clap.

use std::path::{Path, PathBuf};

use clap::builder::{OsStringValueParser, TypedValueParser};
use clap::{ArgGroup, Parser};
use idmap_ingest::IngestOptions;

use crate::error::{CliError, CliResult};

/// Default configuration file
pub const DEFAULT_CONFIG: &str = "config.yaml";

/// idmap - Database connectivity checks and identity mapping loads
#[derive(Parser, Debug)]
#[command(name = "idmap")]
#[command(version)]
#[command(about = "idmap - Load domain to identity mappings into SQL databases", long_about = None)]
#[command(group(ArgGroup::new("mode").args(["data", "ping", "query"]).multiple(false)))]
pub struct Cli {
    /// Path to the database configuration file
    #[arg(
        short = 'f',
        long = "config",
        default_value = DEFAULT_CONFIG,
        value_parser = OsStringValueParser::new().map(PathBuf::from)
    )]
    pub config: PathBuf,

    /// Mapping file to load (domain,identity:identity per line)
    #[arg(short = 'd', long = "data")]
    pub data: Option<PathBuf>,

    /// Only test the database connection
    #[arg(long)]
    pub ping: bool,

    /// Run a query and print the rows as JSON
    #[arg(short = 'q', long = "query")]
    pub query: Option<String>,

    /// Drop empty identities instead of loading them
    #[arg(long, requires = "data")]
    pub skip_empty_identities: bool,
}

/// What a single invocation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode<'a> {
    /// Open, verify and close
    Connect,
    /// Open, probe, report and close
    Ping,
    /// Load a mapping file
    Ingest(&'a Path),
    /// Run one query
    Query(&'a str),
}

impl Cli {
    /// Get the selected mode.
    pub fn mode(&self) -> Mode<'_> {
        if self.ping {
            Mode::Ping
        } else if let Some(data) = &self.data {
            Mode::Ingest(data)
        } else if let Some(sql) = &self.query {
            Mode::Query(sql)
        } else {
            Mode::Connect
        }
    }

    /// Get the configuration path, rejecting an empty value.
    pub fn config_path(&self) -> CliResult<&Path> {
        if self.config.as_os_str().is_empty() {
            return Err(CliError::Config(
                "Please provide a configuration file path using the -f flag".into(),
            ));
        }
        Ok(&self.config)
    }

    /// Get ingestion options.
    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            skip_empty_identities: self.skip_empty_identities,
        }
    }
}
