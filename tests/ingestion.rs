//! Integration tests for catalog ingestion and persistence.

mod common;

use assessrec::{CatalogRecord, Config, EmbeddingDimension, Recommender, YesNo};
use common::*;
use tempfile::tempdir;

#[test]
fn test_ingest_catalog_counts() {
    let dir = tempdir().unwrap();
    let rec = open_recommender(&dir, KeywordEmbedding::failing_on("BROKEN"), ScriptedModel::echo());

    let stats = rec
        .ingest_catalog(&[
            record("Alpha", "10", "first"),
            record("Beta", "20", "BROKEN description"),
            record("Gamma", "", "third"),
        ])
        .unwrap();

    assert_eq!(stats.processed, 3);
    assert_eq!(stats.upserted, 2);
    assert_eq!(stats.skipped, 1);
    assert_eq!(rec.document_count().unwrap(), 2);
    assert!(rec.get_document("Beta").unwrap().is_none());
}

#[test]
fn test_ingest_record_reports_skip() {
    let dir = tempdir().unwrap();
    let rec = open_recommender(&dir, FailingEmbedding, ScriptedModel::echo());

    assert!(!rec.ingest_record(&record("Alpha", "10", "x")).unwrap());
    assert_eq!(rec.document_count().unwrap(), 0);
}

#[test]
fn test_reingest_replaces_by_name() {
    let dir = tempdir().unwrap();
    let rec = open_recommender(&dir, KeywordEmbedding::new(), ScriptedModel::echo());

    rec.ingest_record(&record("Alpha", "10", "old description")).unwrap();
    rec.ingest_record(&record("Alpha", "15", "new description")).unwrap();

    assert_eq!(rec.document_count().unwrap(), 1);
    let doc = rec.get_document("Alpha").unwrap().unwrap();
    assert_eq!(doc.description, "new description");
    assert_eq!(doc.assessment_length, Some(15));
    assert_eq!(doc.embedding.len(), DIM);

    // The replaced vector no longer surfaces as a second hit.
    let results = rec.search("Alpha description", 10).unwrap();
    assert_eq!(names(&results), vec!["Alpha"]);
}

#[test]
fn test_stored_document_fields() {
    let dir = tempdir().unwrap();
    let rec = open_recommender(&dir, KeywordEmbedding::new(), ScriptedModel::echo());

    let record = CatalogRecord {
        url: "https://example.com/products/java-8".into(),
        remote_testing: YesNo::Yes,
        job_levels: "Mid-Professional".into(),
        languages: "English (USA)".into(),
        ..record("Java 8 (New)", "17.0", "Java 8 language features")
    };
    rec.ingest_record(&record).unwrap();

    let doc = rec.get_document("Java 8 (New)").unwrap().unwrap();
    assert_eq!(doc.url, "https://example.com/products/java-8");
    assert!(doc.remote_testing.is_yes());
    assert!(!doc.adaptive.is_yes());
    assert_eq!(doc.assessment_length, Some(17));
    assert!(doc.text.starts_with("Name: Java 8 (New)\nDescription: Java 8 language features\n"));
    assert!(doc.text.ends_with("Assessment Length: 17.0"));
}

#[test]
fn test_invalid_record_rejected() {
    let dir = tempdir().unwrap();
    let rec = open_recommender(&dir, KeywordEmbedding::new(), ScriptedModel::echo());

    let err = rec.ingest_record(&record("   ", "10", "x")).unwrap_err();
    assert!(err.is_validation());

    let err = rec
        .ingest_catalog(&[record("Good", "10", "x"), record("", "10", "x")])
        .unwrap_err();
    assert!(err.is_validation());
    // Records before the invalid one are kept.
    assert!(rec.get_document("Good").unwrap().is_some());
}

#[test]
fn test_corpus_survives_reopen() {
    let dir = tempdir().unwrap();

    let rec = open_recommender(&dir, KeywordEmbedding::new(), ScriptedModel::echo());
    rec.ingest_catalog(&[
        record("Rust Fundamentals", "30", "Rust ownership and borrowing"),
        record("Go Fundamentals", "30", "Go concurrency with goroutines"),
    ])
    .unwrap();
    rec.close().unwrap();

    let rec = open_recommender(&dir, KeywordEmbedding::new(), ScriptedModel::echo());
    assert_eq!(rec.document_count().unwrap(), 2);

    // HNSW index rebuilt from stored embeddings.
    let results = rec.search("Rust ownership borrowing", 1).unwrap();
    assert_eq!(names(&results), vec!["Rust Fundamentals"]);
}

#[test]
fn test_reopen_with_other_dimension_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("catalog.db");

    let rec = open_recommender(&dir, KeywordEmbedding::new(), ScriptedModel::echo());
    rec.close().unwrap();

    let config = Config {
        embedding_dimension: EmbeddingDimension::D768,
        ..test_config()
    };
    let err = assessrec::storage::RedbDocumentStore::open(&path, &config).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_from_parts_rejects_embedding_dimension_mismatch() {
    let config = Config {
        embedding_dimension: EmbeddingDimension::D768,
        ..test_config()
    };
    let err = Recommender::from_parts(
        Box::new(ScriptedStore::new()),
        Box::new(KeywordEmbedding::new()),
        Box::new(ScriptedModel::echo()),
        config,
    )
    .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_ingest_catalog_file() {
    let dir = tempdir().unwrap();
    let catalog = dir.path().join("catalog.json");
    std::fs::write(
        &catalog,
        r#"[
            {"Name": "Java 8 (New)", "Description": "Core Java", "Assessment Length": "18",
             "Remote Testing": "Yes", "Test Type": "Knowledge & Skills"},
            {"Name": "Verify Numerical", "Assessment Length": ""}
        ]"#,
    )
    .unwrap();

    let rec = open_recommender(&dir, KeywordEmbedding::new(), ScriptedModel::echo());
    let stats = rec.ingest_catalog_file(&catalog).unwrap();

    assert_eq!(stats.processed, 2);
    assert_eq!(stats.upserted, 2);
    let java = rec.get_document("Java 8 (New)").unwrap().unwrap();
    assert_eq!(java.assessment_length, Some(18));
    assert!(rec.get_document("Verify Numerical").unwrap().is_some());
}

#[test]
fn test_ingest_catalog_file_errors() {
    let dir = tempdir().unwrap();
    let rec = open_recommender(&dir, KeywordEmbedding::new(), ScriptedModel::echo());

    let err = rec
        .ingest_catalog_file(dir.path().join("missing.json"))
        .unwrap_err();
    assert!(matches!(err, assessrec::RecommenderError::Io(_)));

    let malformed = dir.path().join("malformed.json");
    std::fs::write(&malformed, r#"{"Name": "not an array"}"#).unwrap();
    let err = rec.ingest_catalog_file(&malformed).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(rec.document_count().unwrap(), 0);
}
