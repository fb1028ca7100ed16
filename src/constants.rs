// ABOUTME: Named constants for vocabulary tags, storage layout, and pipeline tunable defaults
// ABOUTME: Every default here can be overridden through IngestConfig / environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitals

//! Default tunables and fixed vocabulary for the ingestion pipeline.

/// HealthKit record type identifiers, exact strings from the export format.
pub mod vocabulary {
    /// Body weight in kilograms.
    pub const BODY_MASS: &str = "HKQuantityTypeIdentifierBodyMass";
    /// Body fat as a fraction in `[0, 1]`.
    pub const BODY_FAT_PERCENTAGE: &str = "HKQuantityTypeIdentifierBodyFatPercentage";
    /// Heart rate variability (SDNN) in milliseconds.
    pub const HEART_RATE_VARIABILITY_SDNN: &str = "HKQuantityTypeIdentifierHeartRateVariabilitySDNN";
    /// Heart rate in beats per minute.
    pub const HEART_RATE: &str = "HKQuantityTypeIdentifierHeartRate";
}

/// Storage key layout. Must stay bit-exact for compatibility with existing data.
pub mod storage {
    /// Prefix of every per-user document key.
    pub const DATA_PREFIX: &str = "data";
}

/// Batch size defaults. Low-frequency metrics flush often for responsiveness;
/// high-frequency metrics batch heavily to bound write amplification.
pub mod batching {
    /// Flush threshold for weight, body fat, and HRV.
    pub const LOW_FREQUENCY_BATCH_SIZE: usize = 50;
    /// Flush threshold for heart rate.
    pub const HIGH_FREQUENCY_BATCH_SIZE: usize = 2000;
}

/// Retry and timeout defaults for storage operations.
pub mod retry {
    /// Attempts for one fetch-merge-write persistence sequence.
    pub const SAVE_ATTEMPTS: u32 = 3;
    /// Fixed delay between persistence attempts, in milliseconds.
    pub const SAVE_RETRY_DELAY_MS: u64 = 1000;
    /// Deadline on the network write step, in seconds.
    pub const WRITE_TIMEOUT_SECS: u64 = 30;
    /// Attempts for one stream-open-and-tokenize pass.
    pub const STREAM_ATTEMPTS: u32 = 3;
    /// Fixed delay between pass attempts, in milliseconds.
    pub const STREAM_RETRY_DELAY_MS: u64 = 2000;
}

/// Early-termination heuristic defaults.
pub mod stall {
    /// Records between consecutive stall checks.
    pub const CHECK_EVERY_RECORDS: u64 = 10_000;
    /// Wall-clock interval forcing a stall check, in seconds.
    pub const CHECK_INTERVAL_SECS: u64 = 10;
    /// Consecutive unchanged checks before the pass stops.
    pub const UNCHANGED_CHECKS_THRESHOLD: u32 = 10;
    /// Absolute per-pass record ceiling.
    pub const MAX_RECORDS_PER_PASS: u64 = 2_000_000;
}

/// Tokenizer buffer defaults.
pub mod tokenizer {
    /// Buffer ceiling before the lossy trim policy engages.
    pub const MAX_BUFFER_BYTES: usize = 10 * 1024 * 1024;
}

/// Environment variable names recognized by `IngestConfig::from_env`.
pub mod env {
    /// Comma-separated metric slugs enabling passes, e.g. `weight,bodyFat,hrv`.
    pub const ENABLED_METRICS: &str = "VITALS_ENABLED_METRICS";
    /// Override for the low-frequency batch size.
    pub const LOW_FREQUENCY_BATCH_SIZE: &str = "VITALS_LOW_FREQUENCY_BATCH_SIZE";
    /// Override for the high-frequency batch size.
    pub const HIGH_FREQUENCY_BATCH_SIZE: &str = "VITALS_HIGH_FREQUENCY_BATCH_SIZE";
    /// Override for the per-pass record ceiling.
    pub const MAX_RECORDS_PER_PASS: &str = "VITALS_MAX_RECORDS_PER_PASS";
    /// Override for the record interval between stall checks.
    pub const STALL_CHECK_RECORDS: &str = "VITALS_STALL_CHECK_RECORDS";
    /// Override for the wall-clock stall check interval (seconds).
    pub const STALL_CHECK_INTERVAL_SECS: &str = "VITALS_STALL_CHECK_INTERVAL_SECS";
    /// Override for the unchanged-checks stop threshold.
    pub const STALL_UNCHANGED_THRESHOLD: &str = "VITALS_STALL_UNCHANGED_THRESHOLD";
    /// Override for the tokenizer buffer ceiling (bytes).
    pub const MAX_BUFFER_BYTES: &str = "VITALS_MAX_BUFFER_BYTES";
    /// Override for persistence attempts.
    pub const SAVE_ATTEMPTS: &str = "VITALS_SAVE_ATTEMPTS";
    /// Override for the delay between persistence attempts (milliseconds).
    pub const SAVE_RETRY_DELAY_MS: &str = "VITALS_SAVE_RETRY_DELAY_MS";
    /// Override for the write deadline (seconds).
    pub const WRITE_TIMEOUT_SECS: &str = "VITALS_WRITE_TIMEOUT_SECS";
    /// Override for pass attempts.
    pub const STREAM_ATTEMPTS: &str = "VITALS_STREAM_ATTEMPTS";
    /// Override for the delay between pass attempts (milliseconds).
    pub const STREAM_RETRY_DELAY_MS: &str = "VITALS_STREAM_RETRY_DELAY_MS";
}
