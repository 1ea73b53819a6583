use std::path::PathBuf;
use std::time::Instant;

use serde_json::Value;

use crate::{StatusPayload, TaskId};

/// File chosen in the file picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
}

/// Why a status request produced no usable payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollFailure {
    /// Non-2xx status response.
    HttpStatus(u16),
    /// Connection or transport failure.
    Transport(String),
    /// Response body was not a status payload.
    Decode(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User pressed the submit control with the current file selection.
    SubmitClicked { file: Option<SelectedFile> },
    /// Upload endpoint accepted the file.
    UploadSucceeded { task_id: TaskId },
    /// Upload endpoint rejected the file or could not be reached.
    UploadFailed { message: String },
    /// Attach to an already running task without uploading.
    WatchRequested { task_id: TaskId },
    /// One poll tick produced a payload.
    StatusReceived {
        task_id: TaskId,
        payload: StatusPayload,
        at: Instant,
    },
    /// One poll tick failed; polling has stopped on the engine side.
    StatusFailed { task_id: TaskId, failure: PollFailure },
    /// Result video was checked for playability.
    VideoProbed { url: String, ok: bool },
    /// Statistics document finished loading.
    StatsLoaded {
        url: String,
        result: Result<Value, String>,
    },
    /// User navigated away; stop polling.
    Teardown,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
