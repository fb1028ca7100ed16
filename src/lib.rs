// ABOUTME: Library entry point for the vitals-ingest health export pipeline
// ABOUTME: Streams Apple Health XML exports from object storage into per-metric JSON histories
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitals

#![deny(unsafe_code)]

//! # vitals-ingest
//!
//! Streaming ingestion of Apple Health export files into per-user,
//! per-metric JSON histories in object storage.
//!
//! The pipeline reads a multi-gigabyte XML export as a byte stream without
//! buffering the whole document, slices it into single-`<Record>` fragments,
//! extracts and normalizes the metrics of interest (weight, body fat, HRV,
//! heart rate), deduplicates against previously persisted data, and writes
//! sorted histories back incrementally with retry.
//!
//! Data flows one direction:
//!
//! ```text
//! BlobStore -> tokenizer -> extractor -> persister -> BlobStore
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vitals_ingest::config::IngestConfig;
//! use vitals_ingest::ingest::IngestionCoordinator;
//! use vitals_ingest::storage::fs::LocalBlobStore;
//!
//! # async fn example() {
//! let store = Arc::new(LocalBlobStore::new("./data-store"));
//! let coordinator = IngestionCoordinator::new(store, IngestConfig::from_env());
//! let status = coordinator
//!     .process_health_data("user-1", "uploads/user-1/export.xml")
//!     .await;
//! println!("{}", status.phase);
//! # }
//! ```

/// Runtime configuration with environment overrides.
pub mod config;
/// Vocabulary tags, storage layout, and tunable defaults.
pub mod constants;
/// Error taxonomy.
pub mod errors;
/// The streaming ingestion pipeline.
pub mod ingest;
/// Domain models.
pub mod models;
/// Object storage seam and backends.
pub mod storage;

pub use config::IngestConfig;
pub use errors::{IngestError, IngestResult};
pub use ingest::IngestionCoordinator;
pub use models::{MetricPoint, MetricType, ProcessingPhase, ProcessingStatus};
pub use storage::{BlobStore, ByteStream};
