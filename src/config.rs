// ABOUTME: Runtime configuration for the ingestion pipeline with environment overrides
// ABOUTME: Exposes every heuristic threshold and retry knob as a tunable with upstream defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitals

//! Pipeline configuration.
//!
//! Defaults come from [`crate::constants`]; `from_env` applies per-field
//! environment overrides, falling back with a warning on unparseable values.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::constants::{batching, env as env_keys, retry, stall, tokenizer};
use crate::models::MetricType;

/// Tunables for one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Metric passes to run, in order. Heart rate is supported but not
    /// enabled by default, matching production policy.
    pub enabled_metrics: Vec<MetricType>,
    /// Flush threshold for low-frequency metrics (weight, body fat, HRV).
    pub low_frequency_batch_size: usize,
    /// Flush threshold for high-frequency metrics (heart rate).
    pub high_frequency_batch_size: usize,
    /// Absolute per-pass record ceiling.
    pub max_records_per_pass: u64,
    /// Records between consecutive stall checks.
    pub stall_check_records: u64,
    /// Wall-clock interval forcing a stall check.
    pub stall_check_interval: Duration,
    /// Consecutive unchanged checks before a pass stops early.
    pub stall_unchanged_threshold: u32,
    /// Tokenizer buffer ceiling before the lossy trim policy engages.
    pub max_buffer_bytes: usize,
    /// Attempts for one fetch-merge-write persistence sequence.
    pub save_attempts: u32,
    /// Fixed delay between persistence attempts.
    pub save_retry_delay: Duration,
    /// Deadline on the storage write step.
    pub write_timeout: Duration,
    /// Attempts for one stream-open-and-tokenize pass.
    pub stream_attempts: u32,
    /// Fixed delay between pass attempts.
    pub stream_retry_delay: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            enabled_metrics: vec![MetricType::Weight, MetricType::BodyFat, MetricType::Hrv],
            low_frequency_batch_size: batching::LOW_FREQUENCY_BATCH_SIZE,
            high_frequency_batch_size: batching::HIGH_FREQUENCY_BATCH_SIZE,
            max_records_per_pass: stall::MAX_RECORDS_PER_PASS,
            stall_check_records: stall::CHECK_EVERY_RECORDS,
            stall_check_interval: Duration::from_secs(stall::CHECK_INTERVAL_SECS),
            stall_unchanged_threshold: stall::UNCHANGED_CHECKS_THRESHOLD,
            max_buffer_bytes: tokenizer::MAX_BUFFER_BYTES,
            save_attempts: retry::SAVE_ATTEMPTS,
            save_retry_delay: Duration::from_millis(retry::SAVE_RETRY_DELAY_MS),
            write_timeout: Duration::from_secs(retry::WRITE_TIMEOUT_SECS),
            stream_attempts: retry::STREAM_ATTEMPTS,
            stream_retry_delay: Duration::from_millis(retry::STREAM_RETRY_DELAY_MS),
        }
    }
}

impl IngestConfig {
    /// Build a configuration from defaults plus environment overrides.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled_metrics: parse_enabled_metrics(defaults.enabled_metrics),
            low_frequency_batch_size: env_parsed(
                env_keys::LOW_FREQUENCY_BATCH_SIZE,
                defaults.low_frequency_batch_size,
            ),
            high_frequency_batch_size: env_parsed(
                env_keys::HIGH_FREQUENCY_BATCH_SIZE,
                defaults.high_frequency_batch_size,
            ),
            max_records_per_pass: env_parsed(
                env_keys::MAX_RECORDS_PER_PASS,
                defaults.max_records_per_pass,
            ),
            stall_check_records: env_parsed(
                env_keys::STALL_CHECK_RECORDS,
                defaults.stall_check_records,
            ),
            stall_check_interval: Duration::from_secs(env_parsed(
                env_keys::STALL_CHECK_INTERVAL_SECS,
                defaults.stall_check_interval.as_secs(),
            )),
            stall_unchanged_threshold: env_parsed(
                env_keys::STALL_UNCHANGED_THRESHOLD,
                defaults.stall_unchanged_threshold,
            ),
            max_buffer_bytes: env_parsed(env_keys::MAX_BUFFER_BYTES, defaults.max_buffer_bytes),
            save_attempts: env_parsed(env_keys::SAVE_ATTEMPTS, defaults.save_attempts),
            save_retry_delay: Duration::from_millis(env_parsed(
                env_keys::SAVE_RETRY_DELAY_MS,
                defaults.save_retry_delay.as_millis() as u64,
            )),
            write_timeout: Duration::from_secs(env_parsed(
                env_keys::WRITE_TIMEOUT_SECS,
                defaults.write_timeout.as_secs(),
            )),
            stream_attempts: env_parsed(env_keys::STREAM_ATTEMPTS, defaults.stream_attempts),
            stream_retry_delay: Duration::from_millis(env_parsed(
                env_keys::STREAM_RETRY_DELAY_MS,
                defaults.stream_retry_delay.as_millis() as u64,
            )),
        }
    }

    /// Batch size for the given metric's flush threshold.
    #[must_use]
    pub const fn batch_size_for(&self, metric: MetricType) -> usize {
        match metric {
            MetricType::HeartRate => self.high_frequency_batch_size,
            _ => self.low_frequency_batch_size,
        }
    }
}

fn parse_enabled_metrics(default: Vec<MetricType>) -> Vec<MetricType> {
    let Ok(raw) = env::var(env_keys::ENABLED_METRICS) else {
        return default;
    };
    let mut metrics = Vec::new();
    for slug in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match MetricType::from_slug(slug) {
            Some(metric) if !metrics.contains(&metric) => metrics.push(metric),
            Some(_) => {}
            None => warn!(slug, "unknown metric slug in {}", env_keys::ENABLED_METRICS),
        }
    }
    if metrics.is_empty() {
        warn!(
            "no valid metrics in {}; using defaults",
            env_keys::ENABLED_METRICS
        );
        return default;
    }
    metrics
}

fn env_parsed<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, raw, "unparseable environment override; using default");
            default
        }),
        Err(_) => default,
    }
}
