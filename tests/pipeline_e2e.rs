//! End-to-end pipeline tests against a mock registry and file server.
//!
//! Each test stands up its own registry (listing + info endpoints) and
//! vocabulary file endpoint, runs the pipeline into a temp directory,
//! and asserts on the produced tree and summary.

use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use tempfile::tempdir;
use tokio::fs;
use url::Url;

use vocmirror::store::{MirrorStore, TermKind};
use vocmirror::{MirrorConfig, MirrorError, MirrorPipeline};

const EX_PREFIX: &str = "ex";
const EX_URI: &str = "http://example.org/ex#";
const EX_CLASS: &str = "http://example.org/ex#Thing";

const EX_TURTLE: &str = r#"
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
<http://example.org/ex#Thing> a owl:Class ;
    rdfs:label "Thing" .
"#;

fn config_for(server: &MockServer, output: &std::path::Path) -> MirrorConfig {
    let base = Url::parse(&server.base_url()).unwrap();
    MirrorConfig::new(output, base)
        .with_workers(2)
        .with_fetch_timeout(Duration::from_secs(5))
}

async fn mock_listing(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/vocabulary/list");
            then.status(200).json_body(json!([
                {"prefix": EX_PREFIX, "uri": EX_URI, "nsp": EX_URI}
            ]));
        })
        .await;
}

async fn mock_info<'a>(
    server: &'a MockServer,
    issued: &str,
    file_path: &str,
) -> httpmock::Mock<'a> {
    let file_url = server.url(file_path);
    server
        .mock_async(move |when, then| {
            when.method(GET)
                .path("/api/v2/vocabulary/info")
                .query_param("vocab", EX_PREFIX);
            then.status(200).json_body(json!({
                "versions": [
                    {"fileURL": file_url, "issued": issued}
                ]
            }));
        })
        .await
}

#[tokio::test]
async fn mirror_end_to_end_produces_the_full_tree() {
    let server = MockServer::start_async().await;
    mock_listing(&server).await;
    mock_info(&server, "2023-01-01T00:00:00Z", "/files/ex.ttl").await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/files/ex.ttl");
            then.status(200)
                .header("content-type", "text/turtle")
                .body(EX_TURTLE);
        })
        .await;

    let dir = tempdir().unwrap();
    let pipeline = MirrorPipeline::new(config_for(&server, dir.path())).unwrap();
    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.total, 1);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.failed, 0);

    let result = &summary.vocabularies[0];
    assert!(result.ok);
    assert!(!result.cached);
    assert!(!result.skipped);
    assert!(!result.format_guessed);
    assert_eq!(result.status_code, 200);
    assert_eq!(result.class_terms.len(), 1);
    assert_eq!(result.class_terms[0].iri, EX_CLASS);
    assert_eq!(result.class_terms[0].label.as_deref(), Some("Thing"));
    assert!(result.property_terms.is_empty());

    let store = MirrorStore::new(dir.path());

    // Artifact under both addresses.
    let by_prefix = store.prefix_dir(EX_PREFIX).join("vocabulary.nq");
    let by_uri = store.uri_dir(EX_URI).join("vocabulary.nq");
    let artifact = fs::read_to_string(&by_prefix).await.unwrap();
    assert!(artifact.contains("\"Thing\""));
    assert_eq!(artifact, fs::read_to_string(&by_uri).await.unwrap());

    // Tiny class file with exactly the type and label quads.
    let class_file = store.term_file(TermKind::Class, EX_CLASS);
    let tiny = fs::read_to_string(&class_file).await.unwrap();
    assert_eq!(tiny.lines().count(), 2);
    assert!(tiny.contains("owl#Class"));
    assert!(tiny.contains("\"Thing\""));

    // Root summary, global page and namespace group.
    assert!(fs::try_exists(dir.path().join("summary.json")).await.unwrap());
    assert!(fs::try_exists(dir.path().join("index.html")).await.unwrap());
    assert!(
        fs::try_exists(store.namespace_dir(EX_URI).join("summary.json"))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn unchanged_upstream_yields_cache_hits_and_no_rewrites() {
    let server = MockServer::start_async().await;
    mock_listing(&server).await;
    mock_info(&server, "2023-01-01T00:00:00Z", "/files/ex.ttl").await;
    let file_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/files/ex.ttl");
            then.status(200)
                .header("content-type", "text/turtle")
                .body(EX_TURTLE);
        })
        .await;

    let dir = tempdir().unwrap();
    let pipeline = MirrorPipeline::new(config_for(&server, dir.path())).unwrap();

    let first = pipeline.run().await.unwrap();
    assert!(first.vocabularies[0].ok);
    assert!(!first.vocabularies[0].cached);

    // Tamper with the artifact; a cache hit must leave it alone.
    let store = MirrorStore::new(dir.path());
    let artifact_path = store.prefix_dir(EX_PREFIX).join("vocabulary.nq");
    fs::write(&artifact_path, "tampered sentinel").await.unwrap();

    let second = pipeline.run().await.unwrap();
    let result = &second.vocabularies[0];
    assert!(result.ok);
    assert!(result.cached);
    assert_eq!(result.status_code, 200);
    assert_eq!(result.class_terms.len(), 1, "terms reused from metadata");

    let untouched = fs::read_to_string(&artifact_path).await.unwrap();
    assert_eq!(untouched, "tampered sentinel");

    // The vocabulary file was only fetched on the first run.
    file_mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn http_404_is_recorded_and_prior_artifact_survives() {
    let server = MockServer::start_async().await;
    mock_listing(&server).await;
    let mut info_v1 = mock_info(&server, "2023-01-01T00:00:00Z", "/files/ex.ttl").await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/files/ex.ttl");
            then.status(200)
                .header("content-type", "text/turtle")
                .body(EX_TURTLE);
        })
        .await;

    let dir = tempdir().unwrap();
    let pipeline = MirrorPipeline::new(config_for(&server, dir.path())).unwrap();
    let first = pipeline.run().await.unwrap();
    assert!(first.vocabularies[0].ok);

    // A newer version appears but its file is gone.
    info_v1.delete_async().await;
    mock_info(&server, "2024-06-01T00:00:00Z", "/files/gone.ttl").await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/files/gone.ttl");
            then.status(404);
        })
        .await;

    let second = pipeline.run().await.unwrap();
    let result = &second.vocabularies[0];
    assert!(!result.ok);
    assert!(!result.skipped);
    assert!(!result.cached);
    assert_eq!(result.status_code, 404);
    assert!(result.note.is_some());

    // The previously mirrored artifact is untouched.
    let store = MirrorStore::new(dir.path());
    let artifact = fs::read_to_string(store.prefix_dir(EX_PREFIX).join("vocabulary.nq"))
        .await
        .unwrap();
    assert!(artifact.contains("\"Thing\""));
}

#[tokio::test]
async fn vocabulary_without_usable_versions_is_skipped() {
    let server = MockServer::start_async().await;
    mock_listing(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v2/vocabulary/info")
                .query_param("vocab", EX_PREFIX);
            then.status(200).json_body(json!({"versions": []}));
        })
        .await;

    let dir = tempdir().unwrap();
    let pipeline = MirrorPipeline::new(config_for(&server, dir.path())).unwrap();
    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.skipped, 1);
    let result = &summary.vocabularies[0];
    assert!(result.skipped);
    assert!(!result.ok);
    assert_eq!(result.status_code, 0);

    let store = MirrorStore::new(dir.path());
    assert!(
        !fs::try_exists(store.prefix_dir(EX_PREFIX).join("vocabulary.nq"))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn unsupported_serialization_is_a_distinct_failure() {
    let server = MockServer::start_async().await;
    mock_listing(&server).await;
    mock_info(&server, "2023-01-01T00:00:00Z", "/files/ex.rdf").await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/files/ex.rdf");
            then.status(200)
                .header("content-type", "application/rdf+xml")
                .body("<rdf:RDF></rdf:RDF>");
        })
        .await;

    let dir = tempdir().unwrap();
    let pipeline = MirrorPipeline::new(config_for(&server, dir.path())).unwrap();
    let summary = pipeline.run().await.unwrap();

    let result = &summary.vocabularies[0];
    assert!(!result.ok);
    assert!(!result.skipped);
    assert_eq!(result.status_code, 200, "the fetch itself succeeded");
    let note = result.note.as_deref().unwrap();
    assert!(note.contains("unsupported"), "note: {note}");

    let store = MirrorStore::new(dir.path());
    assert!(
        !fs::try_exists(store.prefix_dir(EX_PREFIX).join("vocabulary.nq"))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn malformed_payload_is_a_conversion_failure_with_status_422() {
    let server = MockServer::start_async().await;
    mock_listing(&server).await;
    mock_info(&server, "2023-01-01T00:00:00Z", "/files/ex.ttl").await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/files/ex.ttl");
            then.status(200)
                .header("content-type", "text/turtle")
                .body("@prefix broken");
        })
        .await;

    let dir = tempdir().unwrap();
    let pipeline = MirrorPipeline::new(config_for(&server, dir.path())).unwrap();
    let summary = pipeline.run().await.unwrap();

    let result = &summary.vocabularies[0];
    assert!(!result.ok);
    assert_eq!(result.status_code, 422);
    assert!(result.note.as_deref().unwrap().contains("Turtle"));
}

#[tokio::test]
async fn registry_listing_failure_aborts_the_run() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v2/vocabulary/list");
            then.status(500);
        })
        .await;

    let dir = tempdir().unwrap();
    let pipeline = MirrorPipeline::new(config_for(&server, dir.path())).unwrap();
    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, MirrorError::Registry(_)));
}
