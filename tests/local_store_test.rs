// ABOUTME: Tests for the directory-rooted local BlobStore backend
// ABOUTME: Covers key-to-path mapping, missing-object behavior, and end-to-end ingestion on disk
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Vitals

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use common::{export_xml, fast_config, init_test_logging, record_xml, ts};
use futures_util::StreamExt;
use serde_json::json;
use vitals_ingest::ingest::IngestionCoordinator;
use vitals_ingest::models::{MetricPoint, ProcessingPhase};
use vitals_ingest::storage::fs::LocalBlobStore;
use vitals_ingest::storage::BlobStore;
use vitals_ingest::IngestError;

#[tokio::test]
async fn keys_map_to_paths_under_the_root() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let store = LocalBlobStore::new(dir.path());

    store
        .write_json("data/u1/weight.json", &json!([{"date": "2024-01-01T10:00:00Z", "value": 68.2}]))
        .await
        .unwrap();

    assert!(dir.path().join("data/u1/weight.json").is_file());
    let value = store.read_json("data/u1/weight.json").await.unwrap().unwrap();
    let history: Vec<MetricPoint> = serde_json::from_value(value).unwrap();
    assert_eq!(history[0].date, ts("2024-01-01 10:00:00 +0000"));
}

#[tokio::test]
async fn missing_document_reads_as_none() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let store = LocalBlobStore::new(dir.path());
    assert!(store.read_json("data/u1/weight.json").await.unwrap().is_none());
}

#[tokio::test]
async fn missing_object_fails_stream_open_with_not_found() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let store = LocalBlobStore::new(dir.path());
    let err = store.read_stream("uploads/u1/export.xml").await.err().unwrap();
    assert!(matches!(err, IngestError::NotFound(_)));
}

#[tokio::test]
async fn read_stream_delivers_file_contents() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("uploads/u1/export.xml");
    tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
    tokio::fs::write(&path, b"<HealthData></HealthData>").await.unwrap();

    let store = LocalBlobStore::new(dir.path());
    let mut stream = store.read_stream("uploads/u1/export.xml").await.unwrap();
    let mut collected = Vec::new();
    while let Some(chunk) = stream.next().await {
        collected.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(collected, b"<HealthData></HealthData>");
}

#[tokio::test]
async fn full_pipeline_runs_against_the_filesystem() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let export = export_xml(&[record_xml(
        "HKQuantityTypeIdentifierBodyMass",
        "68.2",
        "2024-01-01 10:00:00 +0000",
    )]);
    let source = dir.path().join("uploads/u1/export.xml");
    tokio::fs::create_dir_all(source.parent().unwrap()).await.unwrap();
    tokio::fs::write(&source, export).await.unwrap();

    let store = Arc::new(LocalBlobStore::new(dir.path()));
    let coordinator = IngestionCoordinator::new(store.clone(), fast_config());
    let status = coordinator
        .process_health_data("u1", "uploads/u1/export.xml")
        .await;

    assert_eq!(status.phase, ProcessingPhase::Completed);
    let value = store.read_json("data/u1/weight.json").await.unwrap().unwrap();
    let history: Vec<MetricPoint> = serde_json::from_value(value).unwrap();
    assert_eq!(history.len(), 1);
    assert!((history[0].value - 68.2).abs() < f64::EPSILON);
}
