use std::fmt;

use serde::{Deserialize, Serialize};

pub type TaskId = String;

/// Lifecycle state as reported by the status endpoint.
///
/// Unknown strings are preserved in [`TaskState::Other`] so they can be shown
/// verbatim and keep the poller running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskState {
    Pending,
    Started,
    Progress,
    Success,
    Failure,
    Revoked,
    Retry,
    Other(String),
}

impl TaskState {
    pub fn as_str(&self) -> &str {
        match self {
            TaskState::Pending => "PENDING",
            TaskState::Started => "STARTED",
            TaskState::Progress => "PROGRESS",
            TaskState::Success => "SUCCESS",
            TaskState::Failure => "FAILURE",
            TaskState::Revoked => "REVOKED",
            TaskState::Retry => "RETRY",
            TaskState::Other(raw) => raw,
        }
    }

    /// States after which no further polling happens.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Success | TaskState::Failure | TaskState::Revoked | TaskState::Retry
        )
    }
}

impl From<String> for TaskState {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "PENDING" => TaskState::Pending,
            "STARTED" => TaskState::Started,
            "PROGRESS" => TaskState::Progress,
            "SUCCESS" => TaskState::Success,
            "FAILURE" => TaskState::Failure,
            "REVOKED" => TaskState::Revoked,
            "RETRY" => TaskState::Retry,
            _ => TaskState::Other(raw),
        }
    }
}

impl From<TaskState> for String {
    fn from(state: TaskState) -> Self {
        state.as_str().to_owned()
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nested progress detail (`info`) of a status payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressInfo {
    #[serde(default)]
    pub current: Option<f64>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub eta: Option<String>,
    #[serde(default)]
    pub rate: Option<String>,
}

impl ProgressInfo {
    /// `current / total * 100` when both are present and `total > 0`.
    pub fn percent(&self) -> Option<f64> {
        match (self.current, self.total) {
            (Some(current), Some(total)) if total > 0.0 => Some(current / total * 100.0),
            _ => None,
        }
    }
}

/// One response of `GET /status/{task_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub state: TaskState,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub info: Option<ProgressInfo>,
    #[serde(default)]
    pub result_video: Option<String>,
    #[serde(default)]
    pub result_stats: Option<String>,
}

impl StatusPayload {
    pub fn new(state: TaskState) -> Self {
        Self {
            state,
            status: None,
            info: None,
            result_video: None,
            result_stats: None,
        }
    }
}
