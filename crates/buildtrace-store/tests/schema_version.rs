//! Integration tests for schema versioning
//!
//! These tests verify that Database::open drops and recreates tables when
//! the stored `user_version` does not match the current schema version.

use buildtrace_store::Database;
use buildtrace_types::{ClientInfo, RunMetadata, VcsInfo};
use rusqlite::Connection;
use std::path::Path;
use tempfile::TempDir;

/// Create a database carrying a stale schema version with incompatible tables
fn create_stale_schema_db(path: &Path) {
    let conn = Connection::open(path).unwrap();

    conn.execute_batch(
        r#"
        CREATE TABLE runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL
        );

        PRAGMA user_version = 99;
        "#,
    )
    .unwrap();

    conn.execute(
        "INSERT INTO runs (started_at) VALUES ('2024-01-01T00:00:00Z')",
        [],
    )
    .unwrap();
}

fn metadata() -> RunMetadata {
    RunMetadata {
        command: "build".to_string(),
        package_inference_root: Some("apps".to_string()),
        context: "ci".to_string(),
        vcs: VcsInfo::default(),
        origination_user: "alice".to_string(),
        client: ClientInfo::new("cli", "buildtrace", "1.0"),
        start_time: 1_000,
    }
}

#[test]
fn test_version_mismatch_recreates_tables() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("telemetry.db");

    create_stale_schema_db(&db_path);

    let db = Database::open(&db_path).expect("open should recreate a stale schema");

    // Stale rows are gone and the new columns work.
    assert!(db.list_runs(None).unwrap().is_empty());
    let id = db.create_run(&metadata()).unwrap();
    assert_eq!(
        db.get_run(id).unwrap().unwrap().package_inference_root,
        Some("apps".to_string())
    );

    let version: i32 = Connection::open(&db_path)
        .unwrap()
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .unwrap();
    assert_ne!(version, 99);
}

#[test]
fn test_current_version_preserves_data() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("telemetry.db");

    let id = {
        let db = Database::open(&db_path).unwrap();
        db.create_run(&metadata()).unwrap()
    };

    // Reopening at the same version is not a migration.
    let db = Database::open(&db_path).unwrap();
    let runs = db.list_runs(None).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].id, id);
}
