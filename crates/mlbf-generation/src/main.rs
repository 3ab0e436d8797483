//! # mlbf
//!
//! Scheduled entry point for blocklist filter generation.
//!
//! - `mlbf run`: one pipeline run, meant to be triggered by cron
//! - `mlbf export <ID>`: build and write a filter locally without publishing
//!
//! Configuration comes from `MLBF_*` environment variables; see
//! `GenerationConfig::from_env`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use mlbf_generation::adapters::{
    FileArtifactStorage, FileGenerationLock, HttpDistributionClient, JsonCatalogSource,
    JsonFileConfigStore, SystemClock,
};
use mlbf_generation::domain::PublishGate;
use mlbf_generation::{
    BlocklistGenerationApi, ExportInputs, GenerationConfig, GenerationPorts, GenerationService,
    GenerationSettings, Outcome,
};

/// Blocklist filter generation
#[derive(Parser, Debug)]
#[command(name = "mlbf")]
#[command(about = "Build and publish the addon blocklist filter")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build and publish a new generation if any block changed
    Run,
    /// Build a filter and write it under ID without publishing
    Export {
        /// Directory name for the exported artifacts
        id: String,
        /// JSON array of [guid, version] pairs to treat as not blocked
        #[arg(long)]
        addon_guids_input: Option<PathBuf>,
        /// JSON array of [guid, version] pairs to treat as blocked
        #[arg(long)]
        block_guids_input: Option<PathBuf>,
    },
}

fn build_service(config: &GenerationConfig) -> Result<GenerationService> {
    let mut distribution = HttpDistributionClient::new(
        config.distribution_url.clone(),
        Duration::from_secs(config.distribution_timeout_secs),
    )
    .context("Failed to create distribution client")?;
    if let Some(record_id) = &config.distribution_record_id {
        distribution = distribution.with_record_id(record_id.clone());
    }
    if let Some(token) = &config.distribution_token {
        distribution = distribution.with_token(token.clone());
    }

    let ports = GenerationPorts {
        catalog: Arc::new(JsonCatalogSource::new(&config.catalog_path)),
        storage: Arc::new(FileArtifactStorage::new(&config.storage_root)),
        config_store: Arc::new(JsonFileConfigStore::new(&config.config_store_path)),
        distribution: Arc::new(distribution),
        clock: Arc::new(SystemClock),
        lock: Arc::new(FileGenerationLock::new(&config.lock_dir)),
    };
    Ok(GenerationService::new(ports, GenerationSettings::from(config)))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = GenerationConfig::from_env();
    config
        .cascade
        .validate()
        .context("Invalid cascade configuration")?;
    let service = build_service(&config)?;

    match args.command {
        Command::Run => {
            // Feature flag is read once; the run never re-checks it
            let gate = PublishGate::from_flag(config.publish_enabled);
            let outcome = service
                .run(gate)
                .await
                .context("MLBF generation failed")?;
            match outcome {
                Outcome::UpToDate { .. } => info!("Filter up to date"),
                Outcome::PublishDisabled { .. } => info!("Publishing disabled"),
                Outcome::BuiltLocally { generation_time, .. } => {
                    info!(generation_time, "Built filter locally")
                }
                Outcome::Published { generation_time, .. } => {
                    info!(generation_time, "Published filter")
                }
            }
        }
        Command::Export {
            id,
            addon_guids_input,
            block_guids_input,
        } => {
            let inputs = ExportInputs {
                blocked: block_guids_input,
                not_blocked: addon_guids_input,
            };
            let report = service
                .export(&id, &inputs)
                .await
                .with_context(|| format!("Export of {} failed", id))?;
            info!(
                id = %report.id,
                layers = report.stats.layers,
                filter_size = report.filter_size,
                "Export complete"
            );
        }
    }

    Ok(())
}
