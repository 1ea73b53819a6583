use std::path::PathBuf;

use crate::TaskId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Upload { path: PathBuf },
    StartPolling { task_id: TaskId },
    StopPolling,
    ProbeVideo { url: String },
    FetchStats { url: String },
}
