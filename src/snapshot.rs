use std::fmt;

use serde::{Deserialize, Serialize};

/// Status Jenkins reports while a build is still running.
pub const IN_PROGRESS: &str = "IN_PROGRESS";

/// Opaque identifier naming a CI build (used in the output file name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildId(String);

impl BuildId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BuildId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BuildId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One flattened unit of console output: an execution's aggregated log or a
/// single flow node's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageLog {
    pub status: String,
    pub name: String,
    pub log_length: i64,
    pub log_text: String,
    /// Epoch milliseconds
    pub start_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Point-in-time view of a build, written after every poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSnapshot {
    pub status: String,
    pub name: String,
    pub id: String,
    #[serde(rename = "buildID")]
    pub build_id: BuildId,
    /// Sorted ascending by `start_time`, ties in discovery order
    pub stages: Vec<StageLog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BuildSnapshot {
    /// Whether the build is still running and should be polled again.
    ///
    /// An empty status counts as running: Jenkins omits it for queued builds,
    /// and a failed `describe` fetch degrades to an empty description.
    pub fn needs_repoll(&self) -> bool {
        self.status.is_empty() || self.status == IN_PROGRESS
    }
}
