// ABOUTME: Per-metric record pipeline - validation, exact-instant dedup, normalization, batching
// ABOUTME: StallDetector implements the no-new-valid-records early-termination heuristic
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitals

//! Per-metric extraction.
//!
//! One `MetricExtractor` owns one metric's pass over the tokenized stream:
//! it filters records by vocabulary tag, validates and normalizes values,
//! rejects exact-instant duplicates against a seen-set seeded from persisted
//! history, and accumulates accepted points into batches for the persister.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::record::parse_record;
use crate::config::IngestConfig;
use crate::models::{MetricPoint, MetricType};

/// Outcome of offering one record fragment to an extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The record produced a new pending point.
    Accepted,
    /// A point with this exact instant already exists.
    Duplicate,
    /// Irrelevant type, malformed record, or unusable value/timestamp.
    Skipped,
    /// The pass should stop: record ceiling reached or stall detected.
    StopPass,
}

/// Early-termination heuristic for one metric pass.
///
/// Periodically (every `check_every_records` records or `check_interval` of
/// wall clock, whichever comes first) compares the valid-point count against
/// its value at the previous check; after `threshold` consecutive unchanged
/// checks, the pass is assumed to be past this metric's records.
///
/// This relies on export files clustering record types. A densely interleaved
/// export could trip the detector before the metric's data truly ends; it is
/// a heuristic, not a correctness guarantee. The detector only arms once at
/// least one valid point has been seen, so a metric clustered at the end of a
/// file is not truncated before it is reached.
#[derive(Debug)]
pub struct StallDetector {
    check_every_records: u64,
    check_interval: Duration,
    threshold: u32,
    records_since_check: u64,
    last_check_at: Instant,
    last_valid_count: u64,
    unchanged_checks: u32,
}

impl StallDetector {
    /// Build a detector from the pass configuration.
    #[must_use]
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            check_every_records: config.stall_check_records.max(1),
            check_interval: config.stall_check_interval,
            threshold: config.stall_unchanged_threshold,
            records_since_check: 0,
            last_check_at: Instant::now(),
            last_valid_count: 0,
            unchanged_checks: 0,
        }
    }

    /// Record one processed record. Returns `true` when the pass should stop.
    pub fn observe(&mut self, valid_count: u64) -> bool {
        self.records_since_check += 1;
        let due = self.records_since_check >= self.check_every_records
            || self.last_check_at.elapsed() >= self.check_interval;
        if !due {
            return false;
        }
        self.records_since_check = 0;
        self.last_check_at = Instant::now();
        if valid_count > 0 && valid_count == self.last_valid_count {
            self.unchanged_checks += 1;
        } else {
            self.unchanged_checks = 0;
            self.last_valid_count = valid_count;
        }
        self.unchanged_checks >= self.threshold
    }
}

/// Extracts one metric's data points from a pass over the record stream.
pub struct MetricExtractor {
    metric: MetricType,
    tag: &'static str,
    seen: HashSet<DateTime<Utc>>,
    pending: Vec<MetricPoint>,
    batch_size: usize,
    max_records: u64,
    stall: StallDetector,
    records_processed: u64,
    points_accepted: u64,
    duplicates: u64,
    skipped: u64,
}

impl MetricExtractor {
    /// Create an extractor for `metric` with an empty seen-set.
    #[must_use]
    pub fn new(metric: MetricType, config: &IngestConfig) -> Self {
        Self {
            metric,
            tag: metric.vocabulary_tag(),
            seen: HashSet::new(),
            pending: Vec::new(),
            batch_size: config.batch_size_for(metric).max(1),
            max_records: config.max_records_per_pass,
            stall: StallDetector::new(config),
            records_processed: 0,
            points_accepted: 0,
            duplicates: 0,
            skipped: 0,
        }
    }

    /// Seed the dedup set with instants already persisted for this metric,
    /// avoiding redundant persistence round-trips per record.
    #[must_use]
    pub fn with_seen_dates(mut self, dates: impl IntoIterator<Item = DateTime<Utc>>) -> Self {
        self.seen.extend(dates);
        self
    }

    /// Offer one record fragment to the extractor.
    pub fn offer(&mut self, fragment: &str) -> RecordOutcome {
        self.records_processed += 1;
        let outcome = self.evaluate(fragment);
        match outcome {
            RecordOutcome::Accepted => self.points_accepted += 1,
            RecordOutcome::Duplicate => self.duplicates += 1,
            RecordOutcome::Skipped => self.skipped += 1,
            RecordOutcome::StopPass => {}
        }
        if self.records_processed >= self.max_records {
            warn!(
                metric = %self.metric,
                ceiling = self.max_records,
                "record ceiling reached; stopping pass"
            );
            return RecordOutcome::StopPass;
        }
        if self.stall.observe(self.points_accepted) {
            debug!(
                metric = %self.metric,
                records = self.records_processed,
                accepted = self.points_accepted,
                "no new valid records across stall window"
            );
            return RecordOutcome::StopPass;
        }
        outcome
    }

    fn evaluate(&mut self, fragment: &str) -> RecordOutcome {
        // Fast path: skip XML parsing for fragments that can't be ours.
        if !fragment.contains(self.tag) {
            return RecordOutcome::Skipped;
        }
        let Some(record) = parse_record(fragment) else {
            debug!(metric = %self.metric, "unparseable record fragment; skipping");
            return RecordOutcome::Skipped;
        };
        if record.record_type.as_deref() != Some(self.tag) {
            return RecordOutcome::Skipped;
        }
        let raw = match record.value.as_deref().map(str::parse::<f64>) {
            Some(Ok(value)) if !value.is_nan() => value,
            _ => return RecordOutcome::Skipped,
        };
        let Some(date) = record.resolve_timestamp() else {
            return RecordOutcome::Skipped;
        };
        if self.seen.contains(&date) {
            return RecordOutcome::Duplicate;
        }
        self.seen.insert(date);
        self.pending.push(MetricPoint {
            date,
            value: self.metric.normalize(raw),
        });
        RecordOutcome::Accepted
    }

    /// Take the pending buffer when it has reached the batch size.
    pub fn take_full_batch(&mut self) -> Option<Vec<MetricPoint>> {
        (self.pending.len() >= self.batch_size).then(|| std::mem::take(&mut self.pending))
    }

    /// Drain the final partial batch at end of stream.
    pub fn drain_pending(&mut self) -> Vec<MetricPoint> {
        std::mem::take(&mut self.pending)
    }

    /// Records offered so far, including skips and duplicates.
    #[must_use]
    pub const fn records_processed(&self) -> u64 {
        self.records_processed
    }

    /// New points accepted so far.
    #[must_use]
    pub const fn points_accepted(&self) -> u64 {
        self.points_accepted
    }

    /// Exact-instant duplicates rejected so far.
    #[must_use]
    pub const fn duplicates(&self) -> u64 {
        self.duplicates
    }

    /// Records skipped as irrelevant or malformed so far.
    #[must_use]
    pub const fn skipped(&self) -> u64 {
        self.skipped
    }
}
