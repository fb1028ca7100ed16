// ABOUTME: Core domain models - metric types, data points, parsed records, processing status
// ABOUTME: MetricType carries vocabulary tags, storage slugs, and per-metric value normalization
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitals

//! Domain models for the ingestion pipeline.
//!
//! `MetricPoint` is the canonical persisted unit: a fully-qualified instant
//! (sub-day granularity is preserved) plus a value rounded to the metric's
//! precision. Per-metric histories are JSON arrays of these points, ascending
//! by date, at most one point per exact instant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{storage, vocabulary};

/// Canonical health metrics extracted from an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricType {
    /// Body weight, kilograms.
    #[serde(rename = "weight")]
    Weight,
    /// Body fat, persisted as a percentage (source values are fractions).
    #[serde(rename = "bodyFat")]
    BodyFat,
    /// Heart rate variability (SDNN), milliseconds.
    #[serde(rename = "hrv")]
    Hrv,
    /// Heart rate, beats per minute.
    #[serde(rename = "heartRate")]
    HeartRate,
}

impl MetricType {
    /// All metrics the pipeline can extract, in canonical pass order.
    pub const ALL: [Self; 4] = [Self::Weight, Self::BodyFat, Self::Hrv, Self::HeartRate];

    /// Storage path segment for this metric.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Weight => "weight",
            Self::BodyFat => "bodyFat",
            Self::Hrv => "hrv",
            Self::HeartRate => "heartRate",
        }
    }

    /// Parse a storage slug, accepting the legacy lowercase body fat variant.
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "weight" => Some(Self::Weight),
            "bodyFat" | "bodyfat" => Some(Self::BodyFat),
            "hrv" => Some(Self::Hrv),
            "heartRate" => Some(Self::HeartRate),
            _ => None,
        }
    }

    /// HealthKit record type identifier matched against source records.
    #[must_use]
    pub const fn vocabulary_tag(self) -> &'static str {
        match self {
            Self::Weight => vocabulary::BODY_MASS,
            Self::BodyFat => vocabulary::BODY_FAT_PERCENTAGE,
            Self::Hrv => vocabulary::HEART_RATE_VARIABILITY_SDNN,
            Self::HeartRate => vocabulary::HEART_RATE,
        }
    }

    /// Object storage key for one user's history of this metric.
    #[must_use]
    pub fn storage_key(self, user_id: &str) -> String {
        format!("{}/{user_id}/{}.json", storage::DATA_PREFIX, self.slug())
    }

    /// Legacy read-only fallback key, where one exists.
    ///
    /// Early deployments wrote body fat under a lowercase segment; those
    /// documents must still be readable.
    #[must_use]
    pub fn legacy_storage_key(self, user_id: &str) -> Option<String> {
        match self {
            Self::BodyFat => Some(format!("{}/{user_id}/bodyfat.json", storage::DATA_PREFIX)),
            _ => None,
        }
    }

    /// Apply this metric's value transform to a raw source value.
    ///
    /// Weight and HRV round to 2 decimals. Body fat arrives as a fraction and
    /// is persisted as a percentage, 2 decimals. Heart rate rounds to a whole
    /// number.
    #[must_use]
    pub fn normalize(self, raw: f64) -> f64 {
        match self {
            Self::Weight | Self::Hrv => round2(raw),
            Self::BodyFat => round2(raw * 100.0),
            Self::HeartRate => raw.round(),
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One persisted data point: a fully-qualified instant and a normalized value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    /// ISO-8601 instant. Uniqueness within a history is per exact instant,
    /// not per calendar day.
    pub date: DateTime<Utc>,
    /// Value rounded to the metric's precision.
    pub value: f64,
}

/// Structured view of one `<Record>` element.
///
/// Any field may be absent; extractors tolerate malformed and irrelevant
/// records by skipping them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRecord {
    /// HealthKit record type identifier.
    pub record_type: Option<String>,
    /// Raw numeric value, not yet coerced.
    pub value: Option<String>,
    /// Observation start timestamp.
    pub start_date: Option<String>,
    /// Record creation timestamp.
    pub creation_date: Option<String>,
    /// Observation end timestamp.
    pub end_date: Option<String>,
}

impl ParsedRecord {
    /// Resolve the record's timestamp: `startDate`, falling back to
    /// `creationDate`, then `endDate`. `None` when no field parses.
    #[must_use]
    pub fn resolve_timestamp(&self) -> Option<DateTime<Utc>> {
        [&self.start_date, &self.creation_date, &self.end_date]
            .into_iter()
            .flatten()
            .find_map(|raw| parse_export_timestamp(raw))
    }
}

/// Parse a timestamp in the export's format (`2024-01-01 10:00:00 +0000`),
/// also accepting RFC 3339.
#[must_use]
pub fn parse_export_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z")
        .ok()
        .map(|instant| instant.with_timezone(&Utc))
}

/// Where the coordinator is in its multi-metric run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingPhase {
    /// Run not yet started.
    Pending,
    /// Run started, no metric pass active yet.
    Processing,
    /// The named metric's pass is active.
    Metric(MetricType),
    /// All enabled passes finished.
    Completed,
    /// A pass failed fatally; remaining passes were skipped.
    Error,
}

impl fmt::Display for ProcessingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Processing => f.write_str("processing"),
            Self::Metric(metric) => write!(f, "processing {}", metric.slug()),
            Self::Completed => f.write_str("completed"),
            Self::Error => f.write_str("error"),
        }
    }
}

impl Serialize for ProcessingPhase {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Aggregate status of one ingestion run, owned by the coordinator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStatus {
    /// Records offered to extractors across all passes, including skips.
    pub records_processed: u64,
    /// Batches flushed to storage across all passes.
    pub batches_saved: u64,
    /// Current phase, serialized as its status string.
    #[serde(rename = "status")]
    pub phase: ProcessingPhase,
    /// Human-readable message when `phase` is `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessingStatus {
    /// A fresh `pending` status.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records_processed: 0,
            batches_saved: 0,
            phase: ProcessingPhase::Pending,
            error: None,
        }
    }
}

impl Default for ProcessingStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_rounds_per_metric() {
        assert!((MetricType::Weight.normalize(70.456) - 70.46).abs() < f64::EPSILON);
        assert!((MetricType::BodyFat.normalize(0.183) - 18.3).abs() < f64::EPSILON);
        assert!((MetricType::Hrv.normalize(45.678) - 45.68).abs() < f64::EPSILON);
        assert!((MetricType::HeartRate.normalize(72.6) - 73.0).abs() < f64::EPSILON);
    }

    #[test]
    fn storage_keys_match_layout() {
        assert_eq!(MetricType::Weight.storage_key("u1"), "data/u1/weight.json");
        assert_eq!(MetricType::BodyFat.storage_key("u1"), "data/u1/bodyFat.json");
        assert_eq!(
            MetricType::BodyFat.legacy_storage_key("u1").as_deref(),
            Some("data/u1/bodyfat.json")
        );
        assert_eq!(MetricType::Weight.legacy_storage_key("u1"), None);
    }

    #[test]
    fn export_timestamps_parse_both_formats() {
        let apple = parse_export_timestamp("2024-01-01 10:00:00 +0000");
        let rfc = parse_export_timestamp("2024-01-01T10:00:00Z");
        assert_eq!(apple, rfc);
        assert!(apple.is_some());
        assert_eq!(parse_export_timestamp("not a date"), None);
    }

    #[test]
    fn timestamp_fallback_order() {
        let record = ParsedRecord {
            creation_date: Some("2024-02-02 08:00:00 +0000".into()),
            end_date: Some("2024-02-02 09:00:00 +0000".into()),
            ..ParsedRecord::default()
        };
        let resolved = record.resolve_timestamp();
        assert_eq!(resolved, parse_export_timestamp("2024-02-02 08:00:00 +0000"));
    }

    #[test]
    fn phase_status_strings() {
        assert_eq!(ProcessingPhase::Pending.to_string(), "pending");
        assert_eq!(
            ProcessingPhase::Metric(MetricType::BodyFat).to_string(),
            "processing bodyFat"
        );
        assert_eq!(ProcessingPhase::Completed.to_string(), "completed");
    }
}
