// ABOUTME: In-memory BlobStore backend over a concurrent map
// ABOUTME: Stream chunk size is configurable so chunk-boundary behavior is testable
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitals

use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use futures_util::stream;
use serde_json::Value;

use super::{BlobStore, ByteStream};
use crate::errors::{IngestError, IngestResult};

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// In-memory object store.
///
/// `read_stream` delivers the object in chunks of a configurable size, which
/// lets tests split a source export at arbitrary byte offsets.
#[derive(Debug, Clone)]
pub struct InMemoryBlobStore {
    objects: Arc<DashMap<String, Vec<u8>>>,
    chunk_size: usize,
}

impl InMemoryBlobStore {
    /// Create an empty store with the default chunk size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            objects: Arc::new(DashMap::new()),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the chunk size used by `read_stream`. Clamped to at least 1.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Store raw bytes at `key`.
    pub fn insert_raw(&self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.objects.insert(key.into(), bytes.into());
    }

    /// Fetch the raw bytes at `key`, if present.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.get(key).map(|entry| entry.value().clone())
    }

    /// Whether an object exists at `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn read_stream(&self, key: &str) -> IngestResult<ByteStream> {
        let data = self
            .objects
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| IngestError::NotFound(key.to_owned()))?;
        let chunks: Vec<IngestResult<Bytes>> = data
            .chunks(self.chunk_size)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        Ok(Box::pin(stream::iter(chunks)))
    }

    async fn read_json(&self, key: &str) -> IngestResult<Option<Value>> {
        match self.objects.get(key) {
            Some(entry) => Ok(Some(serde_json::from_slice(entry.value())?)),
            None => Ok(None),
        }
    }

    async fn write_json(&self, key: &str, value: &Value) -> IngestResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.objects.insert(key.to_owned(), bytes);
        Ok(())
    }
}
