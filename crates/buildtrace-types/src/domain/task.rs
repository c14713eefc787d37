use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::package::PackageId;
use crate::error::Error;

/// Surrogate identifier for one task execution within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TaskId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// How a task's result was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Fresh execution, nothing restored from cache
    Miss,
    /// Restored from the local filesystem cache
    Local,
    /// Restored from the remote cache
    Remote,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Miss => "miss",
            CacheStatus::Local => "local",
            CacheStatus::Remote => "remote",
        }
    }

    /// Whether the task was served from any cache tier
    pub fn is_hit(&self) -> bool {
        !matches!(self, CacheStatus::Miss)
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CacheStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "miss" => Ok(CacheStatus::Miss),
            "local" => Ok(CacheStatus::Local),
            "remote" => Ok(CacheStatus::Remote),
            other => Err(Error::InvalidCacheStatus(other.to_string())),
        }
    }
}

/// Outcome of one task execution, recorded as a single append-only row.
///
/// The owning run id is supplied separately at insert time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    /// Task name within the package, e.g. "build"
    pub name: String,
    /// Content-addressed hash used as the cache lookup key
    pub hash: String,
    /// Package the task belongs to
    pub package_id: PackageId,
    /// Task start, epoch milliseconds
    pub start_time: i64,
    /// Task end, epoch milliseconds
    pub end_time: i64,
    /// How the result was obtained
    pub cache_status: CacheStatus,
    /// Process exit code, if the task ran a process
    pub exit_code: Option<i32>,
    /// Captured log output, stored verbatim
    pub logs: String,
}
