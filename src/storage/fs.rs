// ABOUTME: Directory-rooted BlobStore backend over tokio::fs
// ABOUTME: Keys map to relative paths under the store root
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitals

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_stream::try_stream;
use bytes::Bytes;
use serde_json::Value;
use tokio::io::AsyncReadExt;

use super::{BlobStore, ByteStream};
use crate::errors::{IngestError, IngestResult};

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Local filesystem store rooted at a directory.
///
/// Used by the CLI runner and local development; keys become relative paths,
/// so `data/u1/weight.json` lands at `<root>/data/u1/weight.json`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

fn storage_err(path: &Path, err: &std::io::Error) -> IngestError {
    IngestError::Storage(format!("{}: {err}", path.display()))
}

#[async_trait::async_trait]
impl BlobStore for LocalBlobStore {
    async fn read_stream(&self, key: &str) -> IngestResult<ByteStream> {
        let path = self.path_for(key);
        let mut file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(IngestError::NotFound(key.to_owned()));
            }
            Err(err) => return Err(storage_err(&path, &err)),
        };
        Ok(Box::pin(try_stream! {
            let mut buf = vec![0_u8; READ_CHUNK_SIZE];
            loop {
                let n = file
                    .read(&mut buf)
                    .await
                    .map_err(|err| IngestError::Stream(err.to_string()))?;
                if n == 0 {
                    break;
                }
                yield Bytes::copy_from_slice(&buf[..n]);
            }
        }))
    }

    async fn read_json(&self, key: &str) -> IngestResult<Option<Value>> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(storage_err(&path, &err)),
        }
    }

    async fn write_json(&self, key: &str, value: &Value) -> IngestResult<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| storage_err(parent, &err))?;
        }
        let bytes = serde_json::to_vec(value)?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|err| storage_err(&path, &err))
    }
}
