//! pinner-worker: runs asset pinning jobs read as NDJSON.
//!
//! Each input line is `{"type": "<job type>", "payload": {...}}`. Jobs are read
//! from `--jobs <file>` or stdin, run on the worker pool, and the process exits
//! once every submitted job reached a terminal state.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;

use pinner_core::PinnerConfig;
use pinner_indexer::{IndexerClient, PinRecordStore};
use pinner_storage::{create_providers, ProviderSelector};
use pinner_worker::telemetry::init_telemetry;
use pinner_worker::{JobQueue, JobQueueConfig, JobRouter, JobStatus};

#[derive(Parser)]
#[command(
    name = "pinner-worker",
    about = "Pin release assets and organization logos"
)]
struct Cli {
    /// NDJSON file of jobs; reads stdin when omitted
    #[arg(long)]
    jobs: Option<PathBuf>,
}

#[derive(Deserialize)]
struct JobRequest {
    #[serde(rename = "type")]
    job_type: String,
    #[serde(default)]
    payload: serde_json::Value,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = PinnerConfig::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    init_telemetry(config.log_format, &config.environment)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
    tracing::debug!(config = ?config, "Configuration loaded");

    let providers = create_providers(&config).context("Failed to create pinning providers")?;
    let selector = Arc::new(ProviderSelector::new(providers));
    let store: Arc<dyn PinRecordStore> =
        Arc::new(IndexerClient::from_config(&config).context("Failed to create indexer client")?);
    let router = Arc::new(JobRouter::new(
        selector,
        store,
        config.manifest_temp_dir.clone(),
    ));

    let (finished_tx, mut finished_rx) = mpsc::channel(64);
    let queue = JobQueue::new(
        JobQueueConfig::from_config(&config),
        router,
        Some(finished_tx),
    );

    let input = read_input(cli.jobs.as_ref()).await?;
    let mut submitted = 0usize;
    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<JobRequest>(line) {
            Ok(request) => {
                queue.submit(&request.job_type, request.payload)?;
                submitted += 1;
            }
            Err(e) => {
                tracing::warn!(line = index + 1, error = %e, "Skipping malformed job line");
            }
        }
    }

    tracing::info!(jobs = submitted, "All jobs submitted");

    let (mut completed, mut failed) = (0usize, 0usize);
    while completed + failed < submitted {
        tokio::select! {
            finished = finished_rx.recv() => match finished {
                Some((_, JobStatus::Completed)) => completed += 1,
                Some((_, JobStatus::Failed)) => failed += 1,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("Interrupted, stopping before all jobs finished");
                break;
            }
        }
    }

    queue.shutdown().await;
    tracing::info!(completed, failed, "Worker finished");

    if failed > 0 {
        anyhow::bail!("{} of {} job(s) failed", failed, submitted);
    }
    Ok(())
}

async fn read_input(path: Option<&PathBuf>) -> anyhow::Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read jobs from {}", path.display())),
        None => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("Failed to read jobs from stdin")?;
            Ok(input)
        }
    }
}
