// ABOUTME: Incremental tokenizer slicing a byte stream into single-record XML fragments
// ABOUTME: Lazy Stream with bounded buffering, stray-marker resync, and a lossy cap-trim policy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitals

//! # Record fragment tokenizer
//!
//! Consumes a raw byte stream incrementally and yields well-formed
//! single-`<Record>` XML fragments, in stream order, without ever
//! materializing the whole document. Multi-gigabyte exports are processed
//! with memory bounded by `max_buffer_bytes` plus one chunk.
//!
//! Implemented as a lazy, finite, non-restartable `Stream` so the
//! single-flight ordering guarantee is structural: the next fragment is not
//! produced until the consumer has awaited the previous one. Early
//! termination is simply dropping the stream.
//!
//! ## Recovery policies
//!
//! - A `</Record>` end marker with no preceding `<Record` start marker in the
//!   buffer marks unreadable bytes; everything through the marker is
//!   discarded and scanning resumes. This never deadlocks or errors.
//! - When the buffer exceeds its cap without a complete record, it is trimmed
//!   through the last complete end marker, or cleared entirely if none
//!   exists. A record may be lost; this is a documented lossy trade for a
//!   memory ceiling, not a crash.

use async_stream::try_stream;
use futures_util::StreamExt;
use std::pin::Pin;
use tracing::warn;

use crate::errors::IngestResult;
use crate::storage::ByteStream;

/// A lazy stream of independently parseable record fragments.
pub type RecordFragmentStream = Pin<Box<dyn futures_util::Stream<Item = IngestResult<String>> + Send>>;

const RECORD_START: &[u8] = b"<Record";
const RECORD_END: &[u8] = b"</Record>";

/// Tokenize `source` into single-record fragments, each wrapped in a minimal
/// root element so it parses on its own.
///
/// Stream-level read errors propagate and end the stream; fragment-level
/// corruption is recovered locally per the policies above.
#[must_use]
pub fn record_fragments(mut source: ByteStream, max_buffer_bytes: usize) -> RecordFragmentStream {
    Box::pin(try_stream! {
        let mut buf: Vec<u8> = Vec::new();
        while let Some(chunk) = source.next().await {
            let chunk = chunk?;
            buf.extend_from_slice(&chunk);
            loop {
                let Some(end) = find(&buf, RECORD_END, 0) else {
                    break;
                };
                let end_abs = end + RECORD_END.len();
                if let Some(start) = rfind(&buf[..end], RECORD_START) {
                    let fragment = wrap_fragment(&buf[start..end_abs]);
                    buf.drain(..end_abs);
                    yield fragment;
                } else {
                    // End marker with no start marker: unreadable bytes.
                    // Drop through the marker and resync on the next record.
                    warn!(discarded = end_abs, "record end marker without start marker; resyncing");
                    buf.drain(..end_abs);
                }
            }
            if buf.len() > max_buffer_bytes {
                trim_over_capacity(&mut buf, max_buffer_bytes);
            }
        }
    })
}

/// Lossy trim when the buffer grows past its cap without a record boundary.
fn trim_over_capacity(buf: &mut Vec<u8>, max_buffer_bytes: usize) {
    if let Some(end) = rfind(buf, RECORD_END) {
        let keep_from = end + RECORD_END.len();
        warn!(
            buffered = buf.len(),
            cap = max_buffer_bytes,
            discarded = keep_from,
            "tokenizer buffer over capacity; trimming through last record end"
        );
        buf.drain(..keep_from);
    } else {
        warn!(
            buffered = buf.len(),
            cap = max_buffer_bytes,
            "tokenizer buffer over capacity with no record boundary; clearing"
        );
        buf.clear();
    }
}

fn wrap_fragment(raw: &[u8]) -> String {
    format!("<HealthData>{}</HealthData>", String::from_utf8_lossy(raw))
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() || haystack.len() - from < needle.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .rposition(|window| window == needle)
}
