use std::path::Path;
use std::time::Duration;

use buildtrace_types::{
    ConfigId, ConfigSnapshot, PackageId, RunId, RunMetadata, RunStatus, TaskId, TaskResult,
};
use rusqlite::Connection;

use crate::{
    Result, queries,
    records::{ConfigRecord, PackageGraph, PackageRecord, RunRecord, TaskRecord},
    schema,
};

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to one telemetry database.
///
/// Owns a single connection; it is not shared between threads. Callers
/// that need concurrent access open one `Database` per thread or process
/// and let SQLite serialize writers. A locked database surfaces as
/// `Error::Timeout` once the busy timeout elapses instead of blocking
/// indefinitely.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;

        let db = Self { conn };
        schema::init_schema(&db.conn)?;
        Ok(db)
    }

    /// Override the default busy timeout for this handle.
    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        self.conn.busy_timeout(timeout)?;
        Ok(())
    }

    // --- Runs ---

    /// Insert a new open run. `end_time` and `exit_code` stay NULL and the
    /// status is `pending` until `complete_run` closes it.
    pub fn create_run(&self, metadata: &RunMetadata) -> Result<RunId> {
        queries::run::insert(&self.conn, metadata)
    }

    /// Close an open run with its final exit code and terminal status.
    /// Closed runs are immutable; a second completion is a `Conflict`.
    pub fn complete_run(
        &self,
        id: RunId,
        end_time: i64,
        exit_code: i32,
        status: RunStatus,
    ) -> Result<()> {
        queries::run::complete(&self.conn, id, end_time, exit_code, status)
    }

    /// Recompute and store whether every task of an open run was served
    /// from cache. Returns the stored value.
    pub fn mark_full_cache_hit(&self, id: RunId) -> Result<bool> {
        queries::run::mark_full_cache_hit(&self.conn, id)
    }

    pub fn get_run(&self, id: RunId) -> Result<Option<RunRecord>> {
        queries::run::get(&self.conn, id)
    }

    /// Runs ordered newest-first by start time.
    pub fn list_runs(&self, limit: Option<usize>) -> Result<Vec<RunRecord>> {
        queries::run::list(&self.conn, limit)
    }

    // --- Config snapshots ---

    /// Record one immutable configuration snapshot.
    pub fn record_config(&self, snapshot: &ConfigSnapshot) -> Result<ConfigId> {
        queries::config::insert(&self.conn, snapshot)
    }

    pub fn get_config(&self, id: ConfigId) -> Result<Option<ConfigRecord>> {
        queries::config::get(&self.conn, id)
    }

    /// The most recently recorded snapshot, if any.
    pub fn latest_config(&self) -> Result<Option<ConfigRecord>> {
        queries::config::latest(&self.conn)
    }

    // --- Packages ---

    /// Insert a package, or return the existing id for this (name, path).
    pub fn upsert_package(&self, name: &str, path: &str) -> Result<PackageId> {
        queries::package::upsert(&self.conn, name, path)
    }

    pub fn add_package_dependency(
        &self,
        dependent: PackageId,
        dependency: PackageId,
    ) -> Result<()> {
        queries::package::add_dependency(&self.conn, dependent, dependency)
    }

    pub fn get_package(&self, id: PackageId) -> Result<Option<PackageRecord>> {
        queries::package::get(&self.conn, id)
    }

    pub fn list_packages(&self) -> Result<Vec<PackageRecord>> {
        queries::package::list(&self.conn)
    }

    pub fn package_graph(&self) -> Result<PackageGraph> {
        queries::package::graph(&self.conn)
    }

    // --- Tasks ---

    /// Record one task execution for a run. Append-only history.
    pub fn record_task(&self, run_id: RunId, result: &TaskResult) -> Result<TaskId> {
        queries::task::insert(&self.conn, run_id, result)
    }

    pub fn add_task_dependency(&self, dependent: TaskId, dependency: TaskId) -> Result<()> {
        queries::task::add_dependency(&self.conn, dependent, dependency)
    }

    pub fn get_task(&self, id: TaskId) -> Result<Option<TaskRecord>> {
        queries::task::get(&self.conn, id)
    }

    /// Tasks of one run, in insertion order.
    pub fn run_tasks(&self, run_id: RunId) -> Result<Vec<TaskRecord>> {
        queries::task::for_run(&self.conn, run_id)
    }

    /// Every recorded execution sharing a content hash, across runs.
    pub fn tasks_by_hash(&self, hash: &str) -> Result<Vec<TaskRecord>> {
        queries::task::by_hash(&self.conn, hash)
    }

    /// Direct dependencies of a task.
    pub fn task_dependencies(&self, id: TaskId) -> Result<Vec<TaskId>> {
        queries::task::dependencies_of(&self.conn, id)
    }

    /// Direct dependents of a task.
    pub fn task_dependents(&self, id: TaskId) -> Result<Vec<TaskId>> {
        queries::task::dependents_of(&self.conn, id)
    }

    /// Transitive dependency closure of a task, excluding the task itself.
    pub fn task_dependency_closure(&self, id: TaskId) -> Result<Vec<TaskId>> {
        queries::task::dependency_closure(&self.conn, id)
    }

    pub fn vacuum(&self) -> Result<()> {
        self.conn.execute("VACUUM", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_initialization() {
        let db = Database::open_in_memory().unwrap();

        assert!(db.list_runs(None).unwrap().is_empty());
        assert!(db.list_packages().unwrap().is_empty());
        assert!(db.latest_config().unwrap().is_none());
    }

    #[test]
    fn test_foreign_keys_are_enforced() {
        let db = Database::open_in_memory().unwrap();

        let err = db
            .add_package_dependency(PackageId::new(1), PackageId::new(2))
            .unwrap_err();
        assert!(matches!(err, crate::Error::ForeignKey(_)));
    }
}
