// ABOUTME: Object storage abstraction with pluggable backends
// ABOUTME: BlobStore exposes streaming reads plus whole-document JSON reads and writes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitals

//! Storage seam for the ingestion pipeline.
//!
//! The pipeline never talks to a concrete store directly: source exports are
//! read as byte streams and per-metric histories are read and written as whole
//! JSON documents through [`BlobStore`]. Backends are pluggable; the crate
//! ships an in-memory store and a directory-rooted local store.

/// Directory-rooted local filesystem store.
pub mod fs;
/// In-memory store with configurable stream chunking.
pub mod memory;

use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use serde_json::Value;

use crate::errors::IngestResult;

/// A lazy, finite, non-restartable stream of raw bytes from one object.
pub type ByteStream = Pin<Box<dyn Stream<Item = IngestResult<Bytes>> + Send>>;

/// Object storage interface keyed by logical paths such as
/// `data/{userId}/{metric}.json`.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Open the object at `key` as a byte stream.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::IngestError::NotFound`] when the object does
    /// not exist, or a storage error when the open fails.
    async fn read_stream(&self, key: &str) -> IngestResult<ByteStream>;

    /// Read the JSON document at `key`. `None` when the object does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error when the read fails or the document is not valid JSON.
    async fn read_json(&self, key: &str) -> IngestResult<Option<Value>>;

    /// Write `value` as a JSON document (`application/json`) at `key`,
    /// replacing any existing object.
    ///
    /// # Errors
    ///
    /// Returns an error when serialization or the write fails.
    async fn write_json(&self, key: &str, value: &Value) -> IngestResult<()>;
}
