use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Surrogate identifier for a single build invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(i64);

impl RunId {
    /// Create a RunId from a raw database rowid
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw integer id
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RunId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Lifecycle state of a run.
///
/// A run is created as `Pending` and closed exactly once with one of the
/// terminal states. Closed runs are never mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Success,
    Failed,
    Canceled,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
            RunStatus::Canceled => "canceled",
        }
    }

    /// Whether this status closes a run
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Pending)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RunStatus::Pending),
            "success" => Ok(RunStatus::Success),
            "failed" => Ok(RunStatus::Failed),
            "canceled" => Ok(RunStatus::Canceled),
            other => Err(Error::InvalidRunStatus(other.to_string())),
        }
    }
}

/// Identity of the client binary that started a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub id: String,
    pub name: String,
    pub version: String,
}

impl ClientInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Version-control context captured at run start, if available
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsInfo {
    pub branch: Option<String>,
    pub sha: Option<String>,
}

/// Everything known about a run at the moment it starts.
///
/// `end_time` and `exit_code` are deliberately absent: they are recorded
/// when the run completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// The command line as invoked, e.g. "turbo run build"
    pub command: String,
    /// Directory used to infer the target package set, if any
    pub package_inference_root: Option<String>,
    /// Execution context label, e.g. "local" or "ci"
    pub context: String,
    /// Git state at invocation time
    pub vcs: VcsInfo,
    /// User that started the run
    pub origination_user: String,
    /// Client binary identity
    pub client: ClientInfo,
    /// Run start, epoch milliseconds
    pub start_time: i64,
}
