use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use serde_json::Value;
use thiserror::Error;
use tracker_core::{StatusPayload, TaskId};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    UploadCompleted {
        result: Result<TaskId, ApiError>,
    },
    /// One poll tick for `task_id`; `at` is when the response arrived.
    Status {
        task_id: TaskId,
        result: Result<StatusPayload, ApiError>,
        at: Instant,
    },
    VideoProbed {
        url: String,
        result: Result<MediaProbe, ApiError>,
    },
    StatsFetched {
        url: String,
        result: Result<Value, ApiError>,
    },
    ArtifactSaved {
        url: String,
        result: Result<PathBuf, ApiError>,
    },
}

/// Headers of a result video, as seen by a HEAD request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaProbe {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

const PLAYABLE_TYPES: &[&str] = &["video/mp4", "video/webm", "video/ogg"];

impl MediaProbe {
    /// Containers a typical player handles inline; anything else needs a download.
    pub fn is_playable(&self) -> bool {
        match self.content_type.as_deref() {
            None => true,
            Some(ct) => {
                let ct = ct.split(';').next().unwrap_or(ct).trim();
                PLAYABLE_TYPES
                    .iter()
                    .any(|playable| playable.eq_ignore_ascii_case(ct))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Io,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "decode error"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
