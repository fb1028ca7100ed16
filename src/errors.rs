// ABOUTME: Unified error types for the ingestion pipeline
// ABOUTME: Covers storage, stream, serialization, and retry-exhaustion failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitals

//! Error taxonomy for the ingestion pipeline.
//!
//! Malformed individual records are never surfaced here - extractors skip them
//! locally. `IngestError` is reserved for infrastructure failures (storage,
//! stream reads, timeouts) and for retry exhaustion, which is fatal for the
//! current metric pass.

use std::time::Duration;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors produced by the ingestion pipeline and its storage seam.
#[derive(Debug, Error)]
pub enum IngestError {
    /// An object storage operation failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// The requested object does not exist.
    #[error("object not found: {0}")]
    NotFound(String),

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The source byte stream failed mid-read.
    #[error("stream error: {0}")]
    Stream(String),

    /// A storage write exceeded its deadline.
    #[error("write timed out after {0:?}")]
    WriteTimeout(Duration),

    /// Persistence retries were exhausted. Fatal for the current pass.
    #[error("persistence failed after {attempts} attempts: {message}")]
    PersistenceFailed {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// Final attempt's error message.
        message: String,
    },

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),
}

impl IngestError {
    /// Whether a pass-level retry may succeed for this error.
    ///
    /// Stream and plain storage failures are transient. Exhausted persistence
    /// retries already consumed their retry budget and abort the pass.
    #[must_use]
    pub const fn retryable(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::Stream(_) | Self::WriteTimeout(_)
        )
    }
}
