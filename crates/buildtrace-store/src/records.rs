use buildtrace_types::{CacheStatus, ConfigId, PackageId, RunId, RunStatus, TaskId};

/// Complete run record as stored.
///
/// `end_time`, `exit_code` and a terminal `status` appear only after the
/// run has been completed; until then the run is open.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RunRecord {
    pub id: RunId,
    /// Run start, epoch milliseconds.
    pub start_time: i64,
    /// Run end, epoch milliseconds. None while the run is open.
    pub end_time: Option<i64>,
    /// Overall exit code. None while the run is open.
    pub exit_code: Option<i32>,
    pub status: RunStatus,
    /// Command line as invoked.
    pub command: String,
    /// Directory used to infer the target package set, if any.
    pub package_inference_root: Option<String>,
    /// Execution context label, e.g. "local" or "ci".
    pub context: String,
    pub git_branch: Option<String>,
    pub git_sha: Option<String>,
    pub origination_user: String,
    pub client_id: String,
    pub client_name: String,
    pub client_version: String,
    /// True when every task in the run was served from cache.
    pub full_cache_hit: bool,
}

/// Stored configuration snapshot with its assigned id.
///
/// List and map fields are deserialized back from their JSON text columns.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ConfigRecord {
    pub id: ConfigId,
    pub api_url: Option<String>,
    pub login_url: Option<String>,
    pub team_slug: Option<String>,
    pub team_id: Option<String>,
    pub signature: bool,
    pub preflight: bool,
    pub timeout: Option<i64>,
    pub global_deps: Vec<String>,
    pub global_env: Vec<String>,
    pub task_definitions: serde_json::Value,
    pub cache_dir: Option<String>,
    pub root_config_path: Option<String>,
}

/// A workspace package, unique per (name, path) pair.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PackageRecord {
    pub id: PackageId,
    pub name: String,
    pub path: String,
}

/// The whole package dependency graph: every package plus every
/// `dependent -> dependency` edge.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PackageGraph {
    pub packages: Vec<PackageRecord>,
    pub edges: Vec<(PackageId, PackageId)>,
}

/// One task execution record within a run. Append-only history; never
/// updated after insert.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub run_id: RunId,
    pub name: String,
    /// Content-addressed hash used as the cache lookup key.
    pub hash: String,
    pub package_id: PackageId,
    /// Task start, epoch milliseconds.
    pub start_time: i64,
    /// Task end, epoch milliseconds.
    pub end_time: i64,
    pub cache_status: CacheStatus,
    pub exit_code: Option<i32>,
    /// Captured log output, stored verbatim.
    pub logs: String,
}
