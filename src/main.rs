//! basarometer-scan: runs one collection session and prints its report

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use basarometer_core::application::{Coordinator, CoordinatorError, SessionReport};
use basarometer_core::infrastructure::logging::log_system_info;
use basarometer_core::infrastructure::{AppConfig, IngestionClient, build_collectors, init_logging_with_config};

#[derive(Debug, Parser)]
#[command(name = "basarometer-scan", version, about = "Collect, validate and unify retailer meat prices")]
struct Cli {
    /// Configuration file (TOML or JSON); defaults to config/basarometer.* when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Send the unified catalog to the configured ingestion endpoint
    #[arg(long)]
    ingest: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::load_default().context("Failed to load configuration")?,
    };

    init_logging_with_config(&config.logging)?;
    log_system_info();

    let collectors = build_collectors(&config)?;
    let coordinator = Coordinator::new(collectors, config.coordinator_settings());

    let outcome = match coordinator.run_session().await {
        Ok(outcome) => outcome,
        Err(CoordinatorError::SessionFailed { session, source }) => {
            error!("❌ Session {} failed: {}", session.id, source);
            println!("{}", serde_json::to_string_pretty(&SessionReport::from(session.as_ref()))?);
            return Err(source.into());
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", serde_json::to_string_pretty(&SessionReport::from(&outcome.session))?);

    if cli.ingest {
        let ingestion = config
            .ingestion
            .as_ref()
            .context("--ingest needs an [ingestion] section in the configuration")?;
        let client = IngestionClient::from_config(ingestion, config.retry.clone())?;
        let report = client.ingest(&outcome.session.id, &outcome.catalog).await;
        info!(
            "📦 Ingested {} products ({} failed, {} linked, {} new)",
            report.successful, report.failed, report.linked_to_existing, report.newly_created
        );
        eprintln!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
