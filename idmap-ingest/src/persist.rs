//! Idempotent loading of entity sets.

use idmap_sqlx::{Driver, SqlExecutor, Value, placeholders};
use tracing::{error, info};

use crate::error::IngestRowError;
use crate::parser::{EntitySets, MappingIngestor};

/// Destination tables, in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    /// `technical_identities(identity)`
    Identities,
    /// `data_domains(domain_name)`
    Domains,
    /// `data_domain_identities(identity, domain_name)`
    DomainIdentities,
}

impl Table {
    /// Get the table name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Identities => "technical_identities",
            Self::Domains => "data_domains",
            Self::DomainIdentities => "data_domain_identities",
        }
    }

    /// Get the natural key columns.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Identities => &["identity"],
            Self::Domains => &["domain_name"],
            Self::DomainIdentities => &["identity", "domain_name"],
        }
    }
}

/// Build an insert that does nothing when the natural key already exists.
pub fn upsert_sql(driver: Driver, table: Table) -> String {
    let columns = table.columns();
    let list = columns.join(", ");
    let values = placeholders(driver, columns.len(), 1);

    match driver {
        Driver::Postgres | Driver::Sqlite => format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) DO NOTHING",
            table.name(),
            list,
            values,
            list
        ),
        Driver::MySql => format!(
            "INSERT INTO {} ({}) VALUES ({}) ON DUPLICATE KEY UPDATE {} = {}",
            table.name(),
            list,
            values,
            columns[0],
            columns[0]
        ),
    }
}

/// Outcome of one table pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Rows sent to the database
    pub attempted: u64,
    /// Rows newly written
    pub inserted: u64,
    /// Rows whose key was already present
    pub already_present: u64,
    /// Rows that failed
    pub failures: Vec<IngestRowError>,
}

impl PassReport {
    /// Number of failed rows.
    pub fn failed(&self) -> u64 {
        self.failures.len() as u64
    }
}

/// Outcome of a full persist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistReport {
    /// `technical_identities` pass
    pub identities: PassReport,
    /// `data_domains` pass
    pub domains: PassReport,
    /// `data_domain_identities` pass
    pub pairs: PassReport,
}

impl PersistReport {
    /// True when no row failed.
    pub fn is_complete(&self) -> bool {
        self.failed_total() == 0
    }

    /// Failed rows across all passes.
    pub fn failed_total(&self) -> u64 {
        self.passes().map(PassReport::failed).sum()
    }

    /// Newly written rows across all passes.
    pub fn inserted_total(&self) -> u64 {
        self.passes().map(|p| p.inserted).sum()
    }

    /// Iterate the passes in load order.
    pub fn passes(&self) -> impl Iterator<Item = &PassReport> {
        [&self.identities, &self.domains, &self.pairs].into_iter()
    }
}

impl MappingIngestor {
    /// Write entity sets: identities, then domains, then pairs.
    ///
    /// A failing row is logged and recorded in the report; the batch always
    /// runs to the end.
    pub async fn persist<E>(&self, sets: &EntitySets, executor: &E) -> PersistReport
    where
        E: SqlExecutor + ?Sized,
    {
        self.logger
            .instrument(async {
                let driver = executor.driver();

                let identities = run_pass(
                    executor,
                    driver,
                    Table::Identities,
                    sets.identities.iter().map(|id| (id.clone(), vec![Value::from(id.as_str())])),
                )
                .await;

                let domains = run_pass(
                    executor,
                    driver,
                    Table::Domains,
                    sets.domains.iter().map(|d| (d.clone(), vec![Value::from(d.as_str())])),
                )
                .await;

                let pairs = run_pass(
                    executor,
                    driver,
                    Table::DomainIdentities,
                    sets.domain_identity_pairs.iter().map(|(domain, identity)| {
                        (
                            format!("{domain}/{identity}"),
                            vec![Value::from(identity.as_str()), Value::from(domain.as_str())],
                        )
                    }),
                )
                .await;

                let report = PersistReport {
                    identities,
                    domains,
                    pairs,
                };
                info!(
                    identities = report.identities.inserted,
                    domains = report.domains.inserted,
                    pairs = report.pairs.inserted,
                    failed = report.failed_total(),
                    complete = report.is_complete(),
                    "Data ingestion completed"
                );
                report
            })
            .await
    }
}

async fn run_pass<E, I>(executor: &E, driver: Driver, table: Table, rows: I) -> PassReport
where
    E: SqlExecutor + ?Sized,
    I: Iterator<Item = (String, Vec<Value>)>,
{
    let sql = upsert_sql(driver, table);
    let mut report = PassReport::default();

    for (key, args) in rows {
        report.attempted += 1;
        match executor.execute(&sql, &args).await {
            Ok(0) => report.already_present += 1,
            Ok(_) => report.inserted += 1,
            Err(e) => {
                error!(table = table.name(), key = %key, error = %e, "Failed to insert row");
                report.failures.push(IngestRowError {
                    table: table.name(),
                    key,
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        table = table.name(),
        attempted = report.attempted,
        inserted = report.inserted,
        already_present = report.already_present,
        failed = report.failed(),
        "Table pass finished"
    );
    report
}
