// ABOUTME: Incremental per-metric history persistence - read-merge-sort-dedup-write with retry
// ABOUTME: Sole owner of per-metric storage documents; histories stay sorted, one point per instant
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitals

//! Incremental persistence.
//!
//! Each save is a read-modify-write of the entire per-metric document. The
//! document is assumed to stay within single-object limits for this domain
//! (years of daily-to-hourly points). Not safe under concurrent writers; the
//! coordinator's sequential passes are the only writer in this design.

use std::sync::Arc;

use tracing::warn;

use crate::config::IngestConfig;
use crate::errors::{IngestError, IngestResult};
use crate::models::{MetricPoint, MetricType};
use crate::storage::BlobStore;

/// Persists extracted points into per-metric history documents.
pub struct Persister {
    store: Arc<dyn BlobStore>,
    attempts: u32,
    retry_delay: std::time::Duration,
    write_timeout: std::time::Duration,
}

impl Persister {
    /// Build a persister over `store` with the configured retry policy.
    #[must_use]
    pub fn new(store: Arc<dyn BlobStore>, config: &IngestConfig) -> Self {
        Self {
            store,
            attempts: config.save_attempts.max(1),
            retry_delay: config.save_retry_delay,
            write_timeout: config.write_timeout,
        }
    }

    /// Load a metric's persisted history, falling back to the legacy key
    /// where one exists. Missing documents read as an empty history.
    ///
    /// # Errors
    ///
    /// Returns an error when the read fails or the document does not decode.
    pub async fn load_history(
        &self,
        metric: MetricType,
        user_id: &str,
    ) -> IngestResult<Vec<MetricPoint>> {
        if let Some(value) = self.store.read_json(&metric.storage_key(user_id)).await? {
            return Ok(serde_json::from_value(value)?);
        }
        if let Some(legacy_key) = metric.legacy_storage_key(user_id) {
            if let Some(value) = self.store.read_json(&legacy_key).await? {
                return Ok(serde_json::from_value(value)?);
            }
        }
        Ok(Vec::new())
    }

    /// Merge `new_points` into the metric's history and write it back.
    ///
    /// The whole fetch-merge-write sequence is retried with a fixed delay;
    /// exhaustion maps to [`IngestError::PersistenceFailed`], fatal for the
    /// caller's pass.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::PersistenceFailed`] when all attempts fail.
    pub async fn save(
        &self,
        metric: MetricType,
        user_id: &str,
        new_points: &[MetricPoint],
    ) -> IngestResult<()> {
        if new_points.is_empty() {
            return Ok(());
        }
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.save_once(metric, user_id, new_points).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < self.attempts => {
                    warn!(
                        metric = %metric,
                        attempt,
                        error = %err,
                        "save attempt failed; retrying"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(err) => {
                    return Err(IngestError::PersistenceFailed {
                        attempts: attempt,
                        message: err.to_string(),
                    });
                }
            }
        }
    }

    async fn save_once(
        &self,
        metric: MetricType,
        user_id: &str,
        new_points: &[MetricPoint],
    ) -> IngestResult<()> {
        let mut history = self.load_history(metric, user_id).await?;
        if let [single] = new_points {
            // Single-point fast path: skip the write entirely on an
            // exact-instant collision.
            if history.iter().any(|point| point.date == single.date) {
                return Ok(());
            }
            history.push(*single);
        } else {
            history.extend_from_slice(new_points);
        }
        // Stable sort + adjacent dedup: on instant collision the existing
        // history entry precedes the new point, so first occurrence wins.
        history.sort_by_key(|point| point.date);
        history.dedup_by_key(|point| point.date);

        let document = serde_json::to_value(&history)?;
        let key = metric.storage_key(user_id);
        match tokio::time::timeout(self.write_timeout, self.store.write_json(&key, &document)).await
        {
            Ok(result) => result,
            Err(_) => Err(IngestError::WriteTimeout(self.write_timeout)),
        }
    }
}
