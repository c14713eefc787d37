use rusqlite::Connection;

use crate::Result;

// Schema version (increment when changing table definitions)
pub const SCHEMA_VERSION: i32 = 1;

// NOTE: Schema Design Rationale
//
// Why append-only rows (no UPDATE except run completion)?
// - Runs, config snapshots, tasks and edges are telemetry history
// - Reporting tools read a consistent past; nothing rewrites it
// - The only two-phase record is the run itself: open at start,
//   closed exactly once at completion
//
// Why explicit FOREIGN KEY clauses plus `PRAGMA foreign_keys = ON`?
// - Edge tables must never reference rows that do not exist
// - SQLite leaves the pragma off by default; the store turns it on
//   for every connection it opens
//
// Why UNIQUE(name, path) on packages?
// - A package is identified by its (name, path) pair; upserts rely
//   on the conflict target to return the existing id

pub fn init_schema(conn: &Connection) -> Result<()> {
    let current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current_version != SCHEMA_VERSION {
        drop_all_tables(conn)?;
    }

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            start_time INTEGER NOT NULL,
            end_time INTEGER,
            exit_code INTEGER,
            status TEXT NOT NULL,
            command TEXT NOT NULL,
            package_inference_root TEXT,
            context TEXT NOT NULL,
            git_branch TEXT,
            git_sha TEXT,
            origination_user TEXT NOT NULL,
            client_id TEXT NOT NULL,
            client_name TEXT NOT NULL,
            client_version TEXT NOT NULL,
            full_cache_hit BOOLEAN NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS config (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            api_url TEXT,
            login_url TEXT,
            team_slug TEXT,
            team_id TEXT,
            signature BOOLEAN NOT NULL DEFAULT 0,
            preflight BOOLEAN NOT NULL DEFAULT 0,
            timeout INTEGER,
            global_deps TEXT NOT NULL,
            global_env TEXT NOT NULL,
            task_definitions TEXT NOT NULL,
            cache_dir TEXT,
            root_config_path TEXT
        );

        CREATE TABLE IF NOT EXISTS packages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            path TEXT NOT NULL,
            UNIQUE (name, path)
        );

        CREATE TABLE IF NOT EXISTS package_dependencies (
            dependent_id INTEGER NOT NULL,
            dependency_id INTEGER NOT NULL,
            FOREIGN KEY (dependent_id) REFERENCES packages(id),
            FOREIGN KEY (dependency_id) REFERENCES packages(id)
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            hash TEXT NOT NULL,
            package_id INTEGER NOT NULL,
            start_time INTEGER NOT NULL,
            end_time INTEGER NOT NULL,
            cache_status TEXT NOT NULL,
            exit_code INTEGER,
            logs TEXT NOT NULL,
            FOREIGN KEY (run_id) REFERENCES runs(id),
            FOREIGN KEY (package_id) REFERENCES packages(id)
        );

        CREATE TABLE IF NOT EXISTS task_dependencies (
            dependent_id INTEGER NOT NULL,
            dependency_id INTEGER NOT NULL,
            FOREIGN KEY (dependent_id) REFERENCES tasks(id),
            FOREIGN KEY (dependency_id) REFERENCES tasks(id)
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_run ON tasks(run_id);
        CREATE INDEX IF NOT EXISTS idx_tasks_hash ON tasks(hash);
        CREATE INDEX IF NOT EXISTS idx_package_deps_dependent
            ON package_dependencies(dependent_id);
        CREATE INDEX IF NOT EXISTS idx_task_deps_dependent
            ON task_dependencies(dependent_id);
        "#,
    )?;

    conn.execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])?;

    Ok(())
}

fn drop_all_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DROP TABLE IF EXISTS task_dependencies;
        DROP TABLE IF EXISTS tasks;
        DROP TABLE IF EXISTS package_dependencies;
        DROP TABLE IF EXISTS packages;
        DROP TABLE IF EXISTS config;
        DROP TABLE IF EXISTS runs;
        "#,
    )?;
    Ok(())
}
