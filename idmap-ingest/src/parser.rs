//! Mapping file parsing.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use idmap_sqlx::Logger;
use tracing::{debug, info, warn};

use crate::error::{IngestError, IngestResult};

/// Separator between identities in the second column.
pub const IDENTITY_SEPARATOR: char = ':';

/// One accepted line of a mapping file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRecord {
    /// Data domain
    pub domain: String,
    /// Identities in file order
    pub identities: Vec<String>,
}

impl MappingRecord {
    /// Split the two columns of a line into a record.
    pub fn from_columns(domain: &str, identities: &str) -> Self {
        Self {
            domain: domain.trim().to_string(),
            identities: identities
                .split(IDENTITY_SEPARATOR)
                .map(|identity| identity.trim().to_string())
                .collect(),
        }
    }
}

/// Deduplicated entities collected from a mapping file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitySets {
    /// Technical identities
    pub identities: BTreeSet<String>,
    /// Data domains
    pub domains: BTreeSet<String>,
    /// `(domain, identity)` pairs
    pub domain_identity_pairs: BTreeSet<(String, String)>,
}

impl EntitySets {
    /// Add every entity of a record.
    pub fn insert(&mut self, record: &MappingRecord) {
        self.domains.insert(record.domain.clone());
        for identity in &record.identities {
            self.identities.insert(identity.clone());
            self.domain_identity_pairs
                .insert((record.domain.clone(), identity.clone()));
        }
    }

    /// Check if nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty() && self.domains.is_empty()
    }
}

/// Per-load counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Lines read
    pub rows_read: u64,
    /// Lines turned into records
    pub rows_accepted: u64,
    /// Lines skipped (wrong field count or undecodable)
    pub rows_skipped: u64,
    /// Empty identity tokens seen
    pub empty_identities: u64,
}

/// Parsing options.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    /// Drop empty identity tokens instead of loading them
    pub skip_empty_identities: bool,
}

/// Result of a load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedMapping {
    /// Collected entities
    pub sets: EntitySets,
    /// Counters
    pub stats: ParseStats,
}

/// Loads mapping files and persists them.
#[derive(Debug, Clone)]
pub struct MappingIngestor {
    pub(crate) logger: Logger,
    pub(crate) options: IngestOptions,
}

impl MappingIngestor {
    /// Create an ingestor with default options.
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            options: IngestOptions::default(),
        }
    }

    /// Set parsing options.
    pub fn with_options(mut self, options: IngestOptions) -> Self {
        self.options = options;
        self
    }

    /// Get the parsing options.
    pub fn options(&self) -> IngestOptions {
        self.options
    }

    /// Parse a mapping file.
    pub fn load(&self, path: impl AsRef<Path>) -> IngestResult<LoadedMapping> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.logger
            .in_scope(|| debug!(path = %path.display(), "Reading mapping file"));
        self.load_reader(file)
    }

    /// Parse mapping data from any reader.
    pub fn load_reader<R: Read>(&self, reader: R) -> IngestResult<LoadedMapping> {
        self.logger.in_scope(|| self.parse(reader))
    }

    fn parse<R: Read>(&self, reader: R) -> IngestResult<LoadedMapping> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut loaded = LoadedMapping::default();
        let stats = &mut loaded.stats;

        for result in reader.records() {
            stats.rows_read += 1;
            let row = match result {
                Ok(row) => row,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    debug!(
                        line = e.position().map(|p| p.line()),
                        error = %e,
                        "Skipping undecodable mapping row"
                    );
                    stats.rows_skipped += 1;
                    continue;
                }
            };

            let line = row.position().map(|p| p.line());
            if row.len() != 2 {
                debug!(line, fields = row.len(), "Skipping mapping row with unexpected field count");
                stats.rows_skipped += 1;
                continue;
            }

            let mut record = MappingRecord::from_columns(&row[0], &row[1]);
            let empty = record.identities.iter().filter(|i| i.is_empty()).count() as u64;
            if empty > 0 {
                stats.empty_identities += empty;
                if self.options.skip_empty_identities {
                    debug!(line, domain = %record.domain, count = empty, "Dropping empty identities");
                    record.identities.retain(|i| !i.is_empty());
                } else {
                    warn!(line, domain = %record.domain, count = empty, "Mapping row contains empty identities");
                }
            }

            stats.rows_accepted += 1;
            loaded.sets.insert(&record);
        }

        info!(
            rows_read = loaded.stats.rows_read,
            rows_accepted = loaded.stats.rows_accepted,
            rows_skipped = loaded.stats.rows_skipped,
            identities = loaded.sets.identities.len(),
            domains = loaded.sets.domains.len(),
            pairs = loaded.sets.domain_identity_pairs.len(),
            "Mapping file parsed"
        );
        Ok(loaded)
    }
}
