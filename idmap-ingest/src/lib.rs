//! # idmap ingestion
//!
//! Parses a headerless, comma-delimited mapping file into deduplicated
//! entity sets and loads them with idempotent upserts.
//!
//! ```text
//! example.com,alice:bob
//! example.org,carol
//! ```
//!
//! Column one is a data domain, column two a colon-separated list of
//! technical identities. Three tables are populated, in this order:
//!
//! | Table | Natural key |
//! |-------|-------------|
//! | `technical_identities` | `identity` |
//! | `data_domains` | `domain_name` |
//! | `data_domain_identities` | `(identity, domain_name)` |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use idmap_ingest::MappingIngestor;
//!
//! let ingestor = MappingIngestor::new(logger);
//! let loaded = ingestor.load("mappings.csv")?;
//! let report = ingestor.persist(&loaded.sets, connection).await;
//! assert!(report.is_complete());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod parser;
pub mod persist;

pub use error::{IngestError, IngestResult, IngestRowError};
pub use parser::{EntitySets, IngestOptions, LoadedMapping, MappingIngestor, MappingRecord, ParseStats};
pub use persist::{PassReport, PersistReport, Table, upsert_sql};
