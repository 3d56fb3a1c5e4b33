//! End-to-end tests for the diagnosis and analysis workflows.
//!
//! Each test builds a throwaway database directory, runs a workflow against it
//! with the embedded client, and checks the report and any written artifacts.

use chroma_probe_core::client::AttemptResult;
use chroma_probe_core::migration::script_path;
use chroma_probe_core::workflow::BackupStatus;
use chroma_probe_core::{
    analyze, diagnose, AnalysisOptions, BackupOutcome, ConfigurationStatus, EmbeddedClient,
    ProbeError,
};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create `<temp>/chroma_db/chroma.sqlite3` with the given collection rows.
fn create_database(temp: &TempDir, rows: &[(&str, &str, Option<&str>)]) -> PathBuf {
    let db_dir = temp.path().join("chroma_db");
    std::fs::create_dir_all(&db_dir).unwrap();

    let conn = Connection::open(db_dir.join("chroma.sqlite3")).unwrap();
    conn.execute_batch(
        "CREATE TABLE collections (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            dimension INTEGER,
            configuration_json_str TEXT
        );
        CREATE TABLE embeddings (id INTEGER PRIMARY KEY, segment_id TEXT);",
    )
    .unwrap();
    for (id, name, config) in rows {
        conn.execute(
            "INSERT INTO collections (id, name, configuration_json_str) VALUES (?1, ?2, ?3)",
            params![id, name, config],
        )
        .unwrap();
    }
    db_dir
}

fn stored_configuration(db_dir: &Path, id: &str) -> Option<String> {
    let conn = Connection::open(db_dir.join("chroma.sqlite3")).unwrap();
    conn.query_row(
        "SELECT configuration_json_str FROM collections WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn test_healthy_database_needs_no_repair() {
    let temp = TempDir::new().unwrap();
    let db_dir = create_database(
        &temp,
        &[(
            "c1",
            "docs",
            Some(r#"{"_type":"CollectionConfigurationInternal","hnsw":{"space":"l2"}}"#),
        )],
    );

    let report = analyze(&db_dir, &EmbeddedClient::new(), &AnalysisOptions::default()).unwrap();
    assert!(report.is_compatible());
    assert!(report.configuration.is_none());
    assert!(report.recommendations().is_empty());
    assert!(!script_path(&db_dir).exists());
}

#[test]
fn test_legacy_database_generates_applicable_script() {
    let temp = TempDir::new().unwrap();
    let db_dir = create_database(
        &temp,
        &[
            ("abc", "docs", None),
            ("def", "notes", Some(r#"{"hnsw":{"space":"cosine"}}"#)),
            (
                "ghi",
                "ok",
                Some(r#"{"_type":"CollectionConfigurationInternal","hnsw":{}}"#),
            ),
        ],
    );

    let report = analyze(&db_dir, &EmbeddedClient::new(), &AnalysisOptions::default()).unwrap();
    assert!(!report.is_compatible());
    assert_eq!(report.connectivity.attempts.len(), 2);

    let analysis = report.configuration.as_ref().unwrap();
    assert_eq!(analysis.summary.total, 3);
    assert_eq!(analysis.summary.absent, 1);
    assert_eq!(analysis.summary.missing_discriminator, 1);
    assert_eq!(analysis.summary.valid, 1);

    let script = analysis.script.as_ref().unwrap();
    assert_eq!(script.path, script_path(&db_dir));
    assert_eq!(script.statements, 2);
    assert!(report.recommendations()[0].starts_with("IMMEDIATE FIX"));

    let sql = std::fs::read_to_string(&script.path).unwrap();
    assert!(sql.contains(
        r#"UPDATE collections SET configuration_json_str = '{"_type":"CollectionConfigurationInternal","hnsw":{},"embedding_function":{}}' WHERE id = 'abc';"#
    ));
    assert!(!sql.contains("WHERE id = 'ghi'"));

    // Apply the transaction part of the script; the trailing SELECT is for review
    let transaction = sql.split("-- Verify the changes").next().unwrap();
    let conn = Connection::open(db_dir.join("chroma.sqlite3")).unwrap();
    conn.execute_batch(transaction).unwrap();
    drop(conn);

    let repaired: serde_json::Value =
        serde_json::from_str(&stored_configuration(&db_dir, "def").unwrap()).unwrap();
    assert_eq!(repaired["_type"], "CollectionConfigurationInternal");
    assert_eq!(repaired["hnsw"]["space"], "cosine");

    let rerun = analyze(&db_dir, &EmbeddedClient::new(), &AnalysisOptions::default()).unwrap();
    assert!(rerun.is_compatible());
    assert_eq!(rerun.connectivity.collections().unwrap().len(), 3);
}

#[test]
fn test_null_discriminator_is_repaired() {
    let temp = TempDir::new().unwrap();
    let db_dir = create_database(
        &temp,
        &[("n1", "nulled", Some(r#"{"_type":null,"hnsw":{}}"#))],
    );

    let report = analyze(&db_dir, &EmbeddedClient::new(), &AnalysisOptions::default()).unwrap();
    assert!(!report.is_compatible());
    let analysis = report.configuration.unwrap();
    assert_eq!(analysis.summary.missing_discriminator, 1);
    let script = analysis.script.unwrap();
    assert_eq!(script.statements, 1);

    let sql = std::fs::read_to_string(&script.path).unwrap();
    let transaction = sql.split("-- Verify the changes").next().unwrap();
    let conn = Connection::open(db_dir.join("chroma.sqlite3")).unwrap();
    conn.execute_batch(transaction).unwrap();
    drop(conn);

    let rerun = analyze(&db_dir, &EmbeddedClient::new(), &AnalysisOptions::default()).unwrap();
    assert!(rerun.is_compatible());
}

#[test]
fn test_collection_filter_limits_script() {
    let temp = TempDir::new().unwrap();
    let db_dir = create_database(
        &temp,
        &[("a1", "alpha", None), ("b1", "beta", Some("{not json"))],
    );

    let options = AnalysisOptions {
        collection: Some("beta".into()),
        client_version: None,
    };
    let report = analyze(&db_dir, &EmbeddedClient::new(), &options).unwrap();
    let analysis = report.configuration.unwrap();

    assert_eq!(analysis.plans.len(), 1);
    assert!(matches!(
        analysis.plans[0].status,
        ConfigurationStatus::MalformedJson { .. }
    ));
    let sql = std::fs::read_to_string(analysis.script.unwrap().path).unwrap();
    assert!(sql.contains("WHERE id = 'b1'"));
    assert!(!sql.contains("WHERE id = 'a1'"));
}

#[test]
fn test_client_version_is_assessed() {
    let temp = TempDir::new().unwrap();
    let db_dir = create_database(&temp, &[]);

    let options = AnalysisOptions {
        collection: None,
        client_version: Some("0.6.3".into()),
    };
    let report = analyze(&db_dir, &EmbeddedClient::new(), &options).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["version"]["check"], "assessed");
    assert_eq!(json["version"]["compatibility"], "known_issues");

    let options = AnalysisOptions {
        collection: None,
        client_version: Some("nightly".into()),
    };
    let report = analyze(&db_dir, &EmbeddedClient::new(), &options).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["version"]["check"], "invalid");
}

#[test]
fn test_analyze_without_storage_file() {
    let temp = TempDir::new().unwrap();
    let db_dir = temp.path().join("empty_db");
    std::fs::create_dir_all(&db_dir).unwrap();

    let report = analyze(&db_dir, &EmbeddedClient::new(), &AnalysisOptions::default()).unwrap();
    assert!(!report.is_compatible());
    let analysis = report.configuration.unwrap();
    assert!(analysis.storage_file.is_none());
    assert!(analysis.error.is_some());
    assert!(analysis.script.is_none());
}

#[test]
fn test_missing_path_is_fatal() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nope");

    let err = analyze(&missing, &EmbeddedClient::new(), &AnalysisOptions::default()).unwrap_err();
    assert!(matches!(err, ProbeError::PathNotFound(_)));

    let err = diagnose(&missing, &EmbeddedClient::new()).unwrap_err();
    assert!(matches!(err, ProbeError::PathNotFound(_)));
    assert!(err.is_fatal());
}

#[test]
fn test_diagnose_healthy_database() {
    let temp = TempDir::new().unwrap();
    let db_dir = create_database(
        &temp,
        &[(
            "c1",
            "docs",
            Some(r#"{"_type":"CollectionConfigurationInternal","spann":{}}"#),
        )],
    );

    let report = diagnose(&db_dir, &EmbeddedClient::new()).unwrap();
    assert!(report.is_compatible());
    assert!(report.repair_attempt.is_none());
    assert_eq!(report.potential_storage_files, vec!["chroma.sqlite3"]);
    assert_eq!(
        report.storage_file.as_deref(),
        Some(db_dir.join("chroma.sqlite3").as_path())
    );

    let schema = report.schema.unwrap();
    assert!(schema.tables.contains(&"collections".to_string()));
    assert_eq!(schema.collections.unwrap().sample.len(), 1);
    assert!(!temp.path().join("chroma_db_backup").exists());
}

#[test]
fn test_diagnose_legacy_database_backs_up_and_retries() {
    let temp = TempDir::new().unwrap();
    let db_dir = create_database(&temp, &[("abc", "docs", Some(r#"{"hnsw":{}}"#))]);

    let report = diagnose(&db_dir, &EmbeddedClient::new()).unwrap();
    assert!(!report.is_compatible());
    assert_eq!(report.recommendations().len(), 4);

    match &report.connection.attempts[0].result {
        AttemptResult::Failed { kind, .. } => assert_eq!(kind, "InvalidConfiguration"),
        other => panic!("unexpected result: {other:?}"),
    }

    let attempt = report.repair_attempt.unwrap();
    match &attempt.backup {
        BackupStatus::Done(BackupOutcome::Created { path, files, .. }) => {
            assert_eq!(path, &temp.path().join("chroma_db_backup"));
            assert_eq!(*files, 1);
        }
        other => panic!("unexpected backup status: {other:?}"),
    }
    assert!(temp
        .path()
        .join("chroma_db_backup/chroma.sqlite3")
        .is_file());
    assert!(!attempt.connectivity.is_success());

    // A second run leaves the existing backup alone
    let again = diagnose(&db_dir, &EmbeddedClient::new()).unwrap();
    assert!(matches!(
        again.repair_attempt.unwrap().backup,
        BackupStatus::Done(BackupOutcome::AlreadyExists { .. })
    ));
}

#[test]
fn test_diagnose_directory_without_storage() {
    let temp = TempDir::new().unwrap();
    let db_dir = temp.path().join("chroma_db");
    std::fs::create_dir_all(db_dir.join("index")).unwrap();
    std::fs::write(db_dir.join("notes.txt"), "hello").unwrap();

    let report = diagnose(&db_dir, &EmbeddedClient::new()).unwrap();
    assert!(report.storage_file.is_none());
    assert!(report.schema.is_none());
    assert_eq!(report.listing.entries.len(), 2);
    assert!(!report.is_compatible());
    match &report.connection.attempts[0].result {
        AttemptResult::Failed { kind, .. } => assert_eq!(kind, "StorageMissing"),
        other => panic!("unexpected result: {other:?}"),
    }
}
