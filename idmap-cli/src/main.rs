//! idmap CLI - Command-line interface for idmap.

use clap::Parser;

use idmap_cli::cli::{Cli, Mode};
use idmap_cli::commands;
use idmap_cli::error::CliResult;
use idmap_cli::output;

#[tokio::main]
async fn main() {
    // Run the CLI and handle errors
    if let Err(e) = run().await {
        output::newline();
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = cli.config_path()?;

    match cli.mode() {
        Mode::Connect => commands::connect::run(config).await,
        Mode::Ping => commands::ping::run(config).await,
        Mode::Ingest(data) => commands::ingest::run(config, data, cli.ingest_options()).await,
        Mode::Query(sql) => commands::query::run(config, sql).await,
    }
}
