use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc as async_mpsc;
use tracker_core::TaskId;
use tracker_logging::{tracker_info, tracker_warn};

use crate::filename::safe_artifact_name;
use crate::persist::AtomicFileWriter;
use crate::poller::{ChannelEventSink, EventSink, Poller};
use crate::{ApiError, ApiSettings, EngineEvent, FailureKind, JobApi, ReqwestJobApi};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine runtime: {0}")]
    Runtime(#[from] io::Error),
    #[error("api client: {0}")]
    Api(#[from] ApiError),
    #[error("engine thread exited")]
    Stopped,
}

enum EngineCommand {
    Upload { path: PathBuf },
    StartPolling { task_id: TaskId },
    StopPolling,
    ProbeVideo { url: String },
    FetchStats { url: String },
    SaveArtifact {
        url: String,
        dir: PathBuf,
        download_name: String,
    },
}

/// Runs all network I/O on a dedicated thread with a single-threaded runtime.
pub struct EngineHandle {
    cmd_tx: async_mpsc::UnboundedSender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ApiSettings) -> Result<Self, EngineError> {
        let api = ReqwestJobApi::new(settings)?;
        let interval = api.settings().poll_interval;
        Self::with_api(Arc::new(api), interval)
    }

    pub fn with_api(api: Arc<dyn JobApi>, poll_interval: Duration) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = async_mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        thread::Builder::new()
            .name("tracker-engine".to_string())
            .spawn(move || {
                let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
                runtime.block_on(run(api, sink, poll_interval, cmd_rx));
            })?;

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn upload(&self, path: impl Into<PathBuf>) {
        self.send(EngineCommand::Upload { path: path.into() });
    }

    pub fn start_polling(&self, task_id: impl Into<TaskId>) {
        self.send(EngineCommand::StartPolling {
            task_id: task_id.into(),
        });
    }

    pub fn stop_polling(&self) {
        self.send(EngineCommand::StopPolling);
    }

    pub fn probe_video(&self, url: impl Into<String>) {
        self.send(EngineCommand::ProbeVideo { url: url.into() });
    }

    pub fn fetch_stats(&self, url: impl Into<String>) {
        self.send(EngineCommand::FetchStats { url: url.into() });
    }

    pub fn save_artifact(
        &self,
        url: impl Into<String>,
        dir: impl Into<PathBuf>,
        download_name: impl Into<String>,
    ) {
        self.send(EngineCommand::SaveArtifact {
            url: url.into(),
            dir: dir.into(),
            download_name: download_name.into(),
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// `Ok(None)` when nothing arrived in time; `Stopped` once the engine thread is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineError> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::Stopped),
        }
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            tracker_warn!("engine thread is gone; command dropped");
        }
    }
}

async fn run(
    api: Arc<dyn JobApi>,
    sink: Arc<dyn EventSink>,
    poll_interval: Duration,
    mut cmd_rx: async_mpsc::UnboundedReceiver<EngineCommand>,
) {
    let mut poller = Poller::new(api.clone(), sink.clone(), poll_interval);
    while let Some(command) = cmd_rx.recv().await {
        match command {
            EngineCommand::StartPolling { task_id } => poller.start(task_id),
            EngineCommand::StopPolling => poller.stop(),
            request => {
                let api = api.clone();
                let sink = sink.clone();
                tokio::spawn(async move {
                    handle_request(api.as_ref(), request, sink.as_ref()).await;
                });
            }
        }
    }
    poller.stop();
    tracker_info!("engine stopped");
}

async fn handle_request(api: &dyn JobApi, command: EngineCommand, sink: &dyn EventSink) {
    match command {
        EngineCommand::Upload { path } => {
            let result = api.upload(&path).await;
            sink.emit(EngineEvent::UploadCompleted { result });
        }
        EngineCommand::ProbeVideo { url } => {
            let result = api.probe_media(&url).await;
            sink.emit(EngineEvent::VideoProbed { url, result });
        }
        EngineCommand::FetchStats { url } => {
            let result = api.fetch_json(&url).await;
            sink.emit(EngineEvent::StatsFetched { url, result });
        }
        EngineCommand::SaveArtifact {
            url,
            dir,
            download_name,
        } => {
            let result = save_artifact(api, &url, dir, &download_name).await;
            sink.emit(EngineEvent::ArtifactSaved { url, result });
        }
        EngineCommand::StartPolling { .. } | EngineCommand::StopPolling => {}
    }
}

async fn save_artifact(
    api: &dyn JobApi,
    url: &str,
    dir: PathBuf,
    download_name: &str,
) -> Result<PathBuf, ApiError> {
    let bytes = api.download(url).await?;
    let filename = safe_artifact_name(download_name);
    let writer = AtomicFileWriter::new(dir);
    tokio::task::spawn_blocking(move || writer.write(&filename, &bytes))
        .await
        .map_err(|err| ApiError::new(FailureKind::Io, err.to_string()))?
        .map_err(|err| ApiError::new(FailureKind::Io, err.to_string()))
}
