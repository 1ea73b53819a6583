use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracker_core::TaskId;
use tracker_logging::{set_task_context, tracker_debug, tracker_info, tracker_warn};

use crate::{EngineEvent, JobApi};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

struct ActivePoll {
    task_id: TaskId,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the single polling loop of the session.
///
/// Must be used from within a tokio runtime.
pub struct Poller {
    api: Arc<dyn JobApi>,
    sink: Arc<dyn EventSink>,
    interval: Duration,
    active: Option<ActivePoll>,
}

impl Poller {
    pub fn new(api: Arc<dyn JobApi>, sink: Arc<dyn EventSink>, interval: Duration) -> Self {
        Self {
            api,
            sink,
            interval,
            active: None,
        }
    }

    /// Stops any previous loop, then polls `task_id` every interval.
    pub fn start(&mut self, task_id: impl Into<TaskId>) {
        self.stop();

        let task_id = task_id.into();
        let token = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            self.api.clone(),
            self.sink.clone(),
            task_id.clone(),
            self.interval,
            token.clone(),
        ));
        set_task_context(Some(&task_id));
        tracker_info!("polling started every {:?}", self.interval);
        set_task_context(None);

        self.active = Some(ActivePoll {
            task_id,
            token,
            handle,
        });
    }

    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.token.cancel();
            active.handle.abort();
            set_task_context(Some(&active.task_id));
            tracker_debug!("polling stopped");
            set_task_context(None);
        }
    }

    /// True while a loop is running; a loop that ended on a terminal state is not active.
    pub fn is_active(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
    }

    pub fn task_id(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.task_id.as_str())
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Sequential ticks: sleep, request, emit. Ends on a terminal state or any error.
async fn poll_loop(
    api: Arc<dyn JobApi>,
    sink: Arc<dyn EventSink>,
    task_id: TaskId,
    interval: Duration,
    token: CancellationToken,
) {
    let mut tick: u64 = 0;
    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }

        tick += 1;
        let result = tokio::select! {
            _ = token.cancelled() => return,
            result = api.status(&task_id) => result,
        };
        if token.is_cancelled() {
            return;
        }

        set_task_context(Some(&task_id));
        let finished = match &result {
            Ok(payload) => {
                tracker_debug!("tick {} state={}", tick, payload.state);
                payload.state.is_terminal()
            }
            Err(err) => {
                tracker_warn!("tick {} failed: {}", tick, err);
                true
            }
        };
        set_task_context(None);

        sink.emit(EngineEvent::Status {
            task_id: task_id.clone(),
            result,
            at: Instant::now(),
        });
        if finished {
            return;
        }
    }
}
