use std::path::PathBuf;
use std::time::Duration;

use tracker_core::{download_name, Effect, Msg, PollFailure};
use tracker_engine::{ApiError, ApiSettings, EngineError, EngineEvent, EngineHandle, FailureKind};
use tracker_logging::{tracker_debug, tracker_info, tracker_warn};

/// Executes core effects on the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    download_dir: Option<PathBuf>,
    pending_downloads: usize,
}

impl EffectRunner {
    pub fn new(settings: ApiSettings, download_dir: Option<PathBuf>) -> Result<Self, EngineError> {
        Ok(Self {
            engine: EngineHandle::new(settings)?,
            download_dir,
            pending_downloads: 0,
        })
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Upload { path } => {
                    tracker_info!("Upload path={}", path.display());
                    self.engine.upload(path);
                }
                Effect::StartPolling { task_id } => {
                    self.engine.start_polling(task_id);
                }
                Effect::StopPolling => {
                    self.engine.stop_polling();
                }
                Effect::ProbeVideo { url } => {
                    self.save_if_requested(&url);
                    self.engine.probe_video(url);
                }
                Effect::FetchStats { url } => {
                    self.save_if_requested(&url);
                    self.engine.fetch_stats(url);
                }
            }
        }
    }

    /// Artifact downloads still running; the app waits for them before exiting.
    pub fn pending_downloads(&self) -> usize {
        self.pending_downloads
    }

    /// Next message from the engine, `Ok(None)` when nothing arrived within `timeout`.
    pub fn next_msg(&mut self, timeout: Duration) -> Result<Option<Msg>, EngineError> {
        let Some(event) = self.engine.recv_timeout(timeout)? else {
            return Ok(None);
        };
        if matches!(event, EngineEvent::ArtifactSaved { .. }) {
            self.pending_downloads = self.pending_downloads.saturating_sub(1);
        }
        Ok(Some(map_event(event)))
    }

    fn save_if_requested(&mut self, url: &str) {
        if let Some(dir) = &self.download_dir {
            tracker_debug!("saving {} into {}", url, dir.display());
            self.engine
                .save_artifact(url, dir.clone(), download_name(url));
            self.pending_downloads += 1;
        }
    }
}

pub(crate) fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::UploadCompleted { result } => match result {
            Ok(task_id) => Msg::UploadSucceeded { task_id },
            Err(err) => {
                tracker_warn!("Upload failed: {}", err);
                Msg::UploadFailed {
                    message: err.message,
                }
            }
        },
        EngineEvent::Status {
            task_id,
            result,
            at,
        } => match result {
            Ok(payload) => Msg::StatusReceived {
                task_id,
                payload,
                at,
            },
            Err(err) => Msg::StatusFailed {
                task_id,
                failure: poll_failure(&err),
            },
        },
        EngineEvent::VideoProbed { url, result } => {
            let ok = match result {
                Ok(probe) => probe.is_playable(),
                Err(err) => {
                    tracker_warn!("Video check failed for {}: {}", url, err);
                    false
                }
            };
            Msg::VideoProbed { url, ok }
        }
        EngineEvent::StatsFetched { url, result } => Msg::StatsLoaded {
            url,
            result: result.map_err(|err| err.to_string()),
        },
        EngineEvent::ArtifactSaved { url, result } => {
            match result {
                Ok(path) => tracker_info!("Saved {} to {}", url, path.display()),
                Err(err) => tracker_warn!("Could not save {}: {}", url, err),
            }
            Msg::NoOp
        }
    }
}

fn poll_failure(err: &ApiError) -> PollFailure {
    match err.kind {
        FailureKind::HttpStatus(code) => PollFailure::HttpStatus(code),
        FailureKind::Decode => PollFailure::Decode(err.message.clone()),
        _ => PollFailure::Transport(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use tracker_core::{StatusPayload, TaskState};
    use tracker_engine::MediaProbe;

    use super::*;

    fn api_error(kind: FailureKind, message: &str) -> ApiError {
        // ApiError::new is crate-private to the engine.
        ApiError {
            kind,
            message: message.to_owned(),
        }
    }

    #[test]
    fn upload_error_carries_server_message() {
        let msg = map_event(EngineEvent::UploadCompleted {
            result: Err(api_error(FailureKind::HttpStatus(500), "disk full")),
        });
        assert_eq!(
            msg,
            Msg::UploadFailed {
                message: "disk full".into()
            }
        );
    }

    #[test]
    fn status_failures_keep_their_category() {
        let failed = |kind| {
            map_event(EngineEvent::Status {
                task_id: "t1".into(),
                result: Err(api_error(kind, "boom")),
                at: Instant::now(),
            })
        };

        assert!(matches!(
            failed(FailureKind::HttpStatus(503)),
            Msg::StatusFailed {
                failure: PollFailure::HttpStatus(503),
                ..
            }
        ));
        assert!(matches!(
            failed(FailureKind::Decode),
            Msg::StatusFailed {
                failure: PollFailure::Decode(_),
                ..
            }
        ));
        assert!(matches!(
            failed(FailureKind::Network),
            Msg::StatusFailed {
                failure: PollFailure::Transport(_),
                ..
            }
        ));
    }

    #[test]
    fn status_payload_passes_through() {
        let at = Instant::now();
        let payload = StatusPayload::new(TaskState::Started);
        let msg = map_event(EngineEvent::Status {
            task_id: "t1".into(),
            result: Ok(payload.clone()),
            at,
        });
        assert_eq!(
            msg,
            Msg::StatusReceived {
                task_id: "t1".into(),
                payload,
                at
            }
        );
    }

    #[test]
    fn unplayable_or_unreachable_video_is_not_ok() {
        let probe = |result| {
            map_event(EngineEvent::VideoProbed {
                url: "/files/out.avi".into(),
                result,
            })
        };

        let avi = MediaProbe {
            content_type: Some("video/x-msvideo".into()),
            content_length: None,
        };
        assert_eq!(
            probe(Ok(avi)),
            Msg::VideoProbed {
                url: "/files/out.avi".into(),
                ok: false
            }
        );
        assert_eq!(
            probe(Err(api_error(FailureKind::HttpStatus(404), "Not Found"))),
            Msg::VideoProbed {
                url: "/files/out.avi".into(),
                ok: false
            }
        );
        assert_eq!(
            probe(Ok(MediaProbe::default())),
            Msg::VideoProbed {
                url: "/files/out.avi".into(),
                ok: true
            }
        );
    }
}
