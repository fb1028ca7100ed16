// ABOUTME: Orchestrates one sequential pass per enabled metric over the tokenized source stream
// ABOUTME: Seeds dedup sets from history, flushes batches, tracks ProcessingStatus, retries stream failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitals

//! # Ingestion coordinator
//!
//! Runs the enabled metric passes in fixed order, one full traversal of the
//! source stream per metric. Passes are strictly sequential: each metric's
//! pass completes (or fails) before the next begins, so per-metric documents
//! never see concurrent writers.
//!
//! A pass that fails with a transient stream error is retried from the start
//! with a fresh extractor; persistence is idempotent, so re-processing
//! already-saved records only produces duplicate rejections. Persistence
//! retry exhaustion aborts the run: the failing metric's status is recorded
//! and remaining passes are skipped, while data persisted by earlier passes
//! stays in place (each metric's storage key is independent).

use std::sync::Arc;

use futures_util::StreamExt;
use tracing::{error, info, warn};

use super::extractor::{MetricExtractor, RecordOutcome};
use super::persister::Persister;
use super::tokenizer::record_fragments;
use crate::config::IngestConfig;
use crate::errors::IngestResult;
use crate::models::{MetricType, ProcessingPhase, ProcessingStatus};
use crate::storage::BlobStore;

/// Drives the full ingestion pipeline for one user's uploaded export.
pub struct IngestionCoordinator {
    store: Arc<dyn BlobStore>,
    persister: Persister,
    config: IngestConfig,
}

impl IngestionCoordinator {
    /// Build a coordinator over `store` with the given configuration.
    #[must_use]
    pub fn new(store: Arc<dyn BlobStore>, config: IngestConfig) -> Self {
        let persister = Persister::new(Arc::clone(&store), &config);
        Self {
            store,
            persister,
            config,
        }
    }

    /// Process one uploaded export for `user_id`.
    ///
    /// Failures are encoded in the returned status: `phase` becomes `error`
    /// and `error` carries the message of the pass that failed.
    pub async fn process_health_data(&self, user_id: &str, source_key: &str) -> ProcessingStatus {
        let mut status = ProcessingStatus::new();
        status.phase = ProcessingPhase::Processing;
        info!(user_id, source_key, "starting health export ingestion");

        for metric in self.config.enabled_metrics.clone() {
            status.phase = ProcessingPhase::Metric(metric);
            if let Err(err) = self.run_pass(metric, user_id, source_key, &mut status).await {
                error!(
                    metric = %metric,
                    error = %err,
                    "metric pass failed; skipping remaining passes"
                );
                status.phase = ProcessingPhase::Error;
                status.error = Some(err.to_string());
                return status;
            }
        }

        status.phase = ProcessingPhase::Completed;
        info!(
            records = status.records_processed,
            batches = status.batches_saved,
            "ingestion completed"
        );
        status
    }

    /// One metric pass with bounded retry on transient stream failures.
    async fn run_pass(
        &self,
        metric: MetricType,
        user_id: &str,
        source_key: &str,
        status: &mut ProcessingStatus,
    ) -> IngestResult<()> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.run_pass_once(metric, user_id, source_key, status).await {
                Ok(()) => return Ok(()),
                Err(err) if err.retryable() && attempt < self.config.stream_attempts => {
                    warn!(
                        metric = %metric,
                        attempt,
                        error = %err,
                        "metric pass failed on stream error; retrying from start"
                    );
                    tokio::time::sleep(self.config.stream_retry_delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn run_pass_once(
        &self,
        metric: MetricType,
        user_id: &str,
        source_key: &str,
        status: &mut ProcessingStatus,
    ) -> IngestResult<()> {
        let history = self.persister.load_history(metric, user_id).await?;
        info!(
            metric = %metric,
            existing_points = history.len(),
            "starting metric pass"
        );
        let mut extractor = MetricExtractor::new(metric, &self.config)
            .with_seen_dates(history.iter().map(|point| point.date));

        let source = self.store.read_stream(source_key).await?;
        let mut fragments = record_fragments(source, self.config.max_buffer_bytes);

        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            if extractor.offer(&fragment) == RecordOutcome::StopPass {
                info!(
                    metric = %metric,
                    records = extractor.records_processed(),
                    "terminating metric pass early"
                );
                break;
            }
            if let Some(batch) = extractor.take_full_batch() {
                self.persister.save(metric, user_id, &batch).await?;
                status.batches_saved += 1;
            }
        }
        drop(fragments);

        let tail = extractor.drain_pending();
        if !tail.is_empty() {
            self.persister.save(metric, user_id, &tail).await?;
            status.batches_saved += 1;
        }

        status.records_processed += extractor.records_processed();
        info!(
            metric = %metric,
            records = extractor.records_processed(),
            accepted = extractor.points_accepted(),
            duplicates = extractor.duplicates(),
            skipped = extractor.skipped(),
            "metric pass finished"
        );
        Ok(())
    }
}
