// SQLite run/task telemetry store
// Append-only records, no orchestration logic

mod db;
mod error;
mod queries;
mod records;
mod schema;

// Public API
pub use db::Database;
pub use error::{Error, Result};
pub use records::{ConfigRecord, PackageGraph, PackageRecord, RunRecord, TaskRecord};
