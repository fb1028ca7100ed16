// ABOUTME: Shared test utilities - export builders, chunked streams, instrumented stores
// ABOUTME: CountingStore wraps the in-memory backend with write/stream counters and failure injection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitals
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Once;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::stream;
use serde_json::Value;

use vitals_ingest::config::IngestConfig;
use vitals_ingest::errors::{IngestError, IngestResult};
use vitals_ingest::models::{parse_export_timestamp, MetricPoint};
use vitals_ingest::storage::memory::InMemoryBlobStore;
use vitals_ingest::storage::{BlobStore, ByteStream};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process).
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .init();
    });
}

/// Parse a timestamp string, panicking on failure (test input is static).
pub fn ts(raw: &str) -> DateTime<Utc> {
    parse_export_timestamp(raw).unwrap()
}

/// One `<Record>` element in the export's attribute layout.
pub fn record_xml(record_type: &str, value: &str, start_date: &str) -> String {
    format!(
        "<Record type=\"{record_type}\" sourceName=\"Health\" \
         creationDate=\"{start_date}\" startDate=\"{start_date}\" \
         endDate=\"{start_date}\" value=\"{value}\"></Record>"
    )
}

/// A full export document wrapping the given records.
pub fn export_xml(records: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<HealthData locale=\"en_US\">\n <ExportDate value=\"2024-06-01 00:00:00 +0000\"/>\n{}\n</HealthData>",
        records.join("\n")
    )
}

/// A record wrapped the way the tokenizer emits fragments, for direct
/// extractor tests.
pub fn fragment(record_type: &str, value: &str, start_date: &str) -> String {
    format!("<HealthData>{}</HealthData>", record_xml(record_type, value, start_date))
}

/// Deliver `data` as a byte stream split at fixed chunk offsets.
pub fn chunk_stream(data: &[u8], chunk_size: usize) -> ByteStream {
    let chunks: Vec<IngestResult<Bytes>> = data
        .chunks(chunk_size.max(1))
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
        .collect();
    Box::pin(stream::iter(chunks))
}

/// A config with test-friendly retry delays and small batches.
pub fn fast_config() -> IngestConfig {
    IngestConfig {
        save_retry_delay: std::time::Duration::from_millis(5),
        stream_retry_delay: std::time::Duration::from_millis(5),
        ..IngestConfig::default()
    }
}

/// Decode a persisted metric history document.
pub fn history_at(store: &InMemoryBlobStore, key: &str) -> Vec<MetricPoint> {
    let raw = store.raw(key).unwrap_or_else(|| panic!("no document at {key}"));
    serde_json::from_slice(&raw).unwrap()
}

/// In-memory store wrapper with operation counters and failure injection.
pub struct CountingStore {
    inner: InMemoryBlobStore,
    writes: AtomicU64,
    stream_opens: AtomicU64,
    fail_writes_remaining: AtomicI64,
    stream_open_budget: AtomicI64,
}

impl CountingStore {
    pub fn new(inner: InMemoryBlobStore) -> Self {
        Self {
            inner,
            writes: AtomicU64::new(0),
            stream_opens: AtomicU64::new(0),
            fail_writes_remaining: AtomicI64::new(0),
            stream_open_budget: AtomicI64::new(i64::MAX),
        }
    }

    pub fn inner(&self) -> &InMemoryBlobStore {
        &self.inner
    }

    /// Fail the next `n` `write_json` calls with an injected storage error.
    pub fn fail_next_writes(&self, n: i64) {
        self.fail_writes_remaining.store(n, Ordering::SeqCst);
    }

    /// Allow only `n` `read_stream` calls to succeed; the rest fail.
    pub fn allow_stream_opens(&self, n: i64) {
        self.stream_open_budget.store(n, Ordering::SeqCst);
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn stream_opens(&self) -> u64 {
        self.stream_opens.load(Ordering::SeqCst)
    }

    pub fn reset_counters(&self) {
        self.writes.store(0, Ordering::SeqCst);
        self.stream_opens.store(0, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl BlobStore for CountingStore {
    async fn read_stream(&self, key: &str) -> IngestResult<ByteStream> {
        self.stream_opens.fetch_add(1, Ordering::SeqCst);
        if self.stream_open_budget.fetch_sub(1, Ordering::SeqCst) <= 0 {
            return Err(IngestError::Storage("injected stream-open failure".into()));
        }
        self.inner.read_stream(key).await
    }

    async fn read_json(&self, key: &str) -> IngestResult<Option<Value>> {
        self.inner.read_json(key).await
    }

    async fn write_json(&self, key: &str, value: &Value) -> IngestResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes_remaining.fetch_sub(1, Ordering::SeqCst) > 0 {
            return Err(IngestError::Storage("injected write failure".into()));
        }
        self.inner.write_json(key, value).await
    }
}
