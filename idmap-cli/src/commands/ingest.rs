//! `idmap --data` - Load a mapping file.

use std::path::Path;

use idmap_ingest::{IngestOptions, MappingIngestor, PassReport, PersistReport};
use idmap_sqlx::ConnectionManager;

use crate::error::CliResult;
use crate::output::{self, success, warn};

/// Run the ingestion mode
pub async fn run(config: &Path, data: &Path, options: IngestOptions) -> CliResult<()> {
    output::header("Mapping Ingestion");
    output::kv("Config", &config.display().to_string());
    output::kv("Data", &data.display().to_string());
    output::newline();

    output::step(1, 3, "Connecting to database...");
    let mut manager = ConnectionManager::connect(config).await?;
    let ingestor = MappingIngestor::new(manager.logger().clone()).with_options(options);

    output::step(2, 3, "Parsing mapping file...");
    let loaded = match ingestor.load(data) {
        Ok(loaded) => loaded,
        Err(e) => {
            manager.close().await?;
            return Err(e.into());
        }
    };

    output::step(3, 3, "Writing entities...");
    let report = ingestor.persist(&loaded.sets, manager.connection()?).await;
    manager.close().await?;

    output::newline();
    output::section("Parsed");
    output::kv("Rows read", &loaded.stats.rows_read.to_string());
    output::kv("Rows skipped", &loaded.stats.rows_skipped.to_string());
    output::kv("Empty identities", &loaded.stats.empty_identities.to_string());
    output::newline();
    print_report(&report);

    output::newline();
    if report.is_complete() {
        success("Data ingestion completed successfully");
    } else {
        warn(&format!(
            "Data ingestion completed with {} failed rows",
            report.failed_total()
        ));
    }
    Ok(())
}

fn print_report(report: &PersistReport) {
    output::section("Written");
    print_pass("Identities", &report.identities);
    print_pass("Domains", &report.domains);
    print_pass("Domain identities", &report.pairs);

    for failure in report.passes().flat_map(|p| &p.failures) {
        output::list_item(&failure.to_string());
    }
}

fn print_pass(label: &str, pass: &PassReport) {
    output::kv(
        label,
        &format!(
            "{} inserted, {} already present, {} failed",
            pass.inserted,
            pass.already_present,
            pass.failed()
        ),
    );
}
