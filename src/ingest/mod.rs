// ABOUTME: Core ingestion pipeline - tokenizer, extractors, persister, coordinator
// ABOUTME: Data flows BlobStore -> tokenizer -> extractor -> persister -> BlobStore
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitals

//! Streaming ingestion pipeline.
//!
//! The coordinator drives one pass per enabled metric over the tokenized
//! source stream. Within a pass, records are processed strictly in stream
//! order; the persister keeps each metric's history sorted and deduplicated
//! by exact instant.

/// Sequential pass orchestration and status tracking.
pub mod coordinator;
/// Per-metric record validation, normalization, and batching.
pub mod extractor;
/// Incremental read-merge-write persistence with retry.
pub mod persister;
/// Single-record XML fragment parsing.
pub mod record;
/// Streaming record fragment tokenizer.
pub mod tokenizer;

pub use coordinator::IngestionCoordinator;
pub use extractor::{MetricExtractor, RecordOutcome, StallDetector};
pub use persister::Persister;
pub use record::parse_record;
pub use tokenizer::{record_fragments, RecordFragmentStream};
