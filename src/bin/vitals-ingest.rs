// ABOUTME: CLI runner standing in for the upload-triggered ingestion job
// ABOUTME: Stages an export file into a local store, runs the pipeline, prints the status JSON
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitals

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vitals_ingest::config::IngestConfig;
use vitals_ingest::ingest::IngestionCoordinator;
use vitals_ingest::models::ProcessingPhase;
use vitals_ingest::storage::fs::LocalBlobStore;

/// Ingest an Apple Health export into per-metric JSON histories.
#[derive(Debug, Parser)]
#[command(name = "vitals-ingest", version, about)]
struct Cli {
    /// Path to the Apple Health export XML file
    export: PathBuf,

    /// Root directory of the local object store
    #[arg(long, default_value = "./data-store")]
    data_dir: PathBuf,

    /// User identifier owning the ingested data
    #[arg(long)]
    user: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Stage the export under the store root the way an upload handler would.
    let source_key = format!("uploads/{}/export.xml", cli.user);
    let staged = cli.data_dir.join(&source_key);
    if let Some(parent) = staged.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    tokio::fs::copy(&cli.export, &staged)
        .await
        .with_context(|| format!("staging {}", cli.export.display()))?;

    let store = Arc::new(LocalBlobStore::new(&cli.data_dir));
    let coordinator = IngestionCoordinator::new(store, IngestConfig::from_env());
    let status = coordinator.process_health_data(&cli.user, &source_key).await;

    println!("{}", serde_json::to_string_pretty(&status)?);
    if status.phase == ProcessingPhase::Error {
        bail!(
            "ingestion failed: {}",
            status.error.unwrap_or_else(|| "unknown error".into())
        );
    }
    Ok(())
}
