use serde_json::Value;

use crate::interpret::{Icon, LifecycleView, MessageTone, Step, StepChange, STEP_COUNT};
use crate::progress::ProgressTracker;
use crate::results::ResultsView;
use crate::view_model::{AppViewModel, ProgressView, StepView};
use crate::{PollFailure, StatusPayload, TaskId};

pub const INITIAL_MESSAGE: &str = "Upload a video to start.";
pub const UPLOADED_PERCENT: f64 = 10.0;

/// What the controller is currently waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Uploading,
    Polling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepState {
    #[default]
    Pending,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitLabel {
    #[default]
    Ready,
    Uploading,
    Uploaded,
}

impl SubmitLabel {
    pub fn text(self) -> &'static str {
        match self {
            SubmitLabel::Ready => "Upload & Process",
            SubmitLabel::Uploading => "Uploading...",
            SubmitLabel::Uploaded => "Uploaded",
        }
    }
}

/// Session state of the single controller.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    phase: Phase,
    task_id: Option<TaskId>,
    stage_label: String,
    icon: Option<Icon>,
    message: String,
    tone: MessageTone,
    progress: f64,
    progress_visible: bool,
    eta: Option<String>,
    steps: [StepState; STEP_COUNT],
    submit_enabled: bool,
    submit_label: SubmitLabel,
    results_visible: bool,
    results: ResultsView,
    tracker: ProgressTracker,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            task_id: None,
            stage_label: String::new(),
            icon: None,
            message: INITIAL_MESSAGE.to_owned(),
            tone: MessageTone::Normal,
            progress: 0.0,
            progress_visible: false,
            eta: None,
            steps: [StepState::Pending; STEP_COUNT],
            submit_enabled: true,
            submit_label: SubmitLabel::Ready,
            results_visible: false,
            results: ResultsView::default(),
            tracker: ProgressTracker::new(),
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            phase: self.phase,
            task_id: self.task_id.clone(),
            stage_label: self.stage_label.clone(),
            icon: self.icon,
            message: self.message.clone(),
            tone: self.tone,
            progress: ProgressView {
                percent: self.progress,
                visible: self.progress_visible,
            },
            eta: self.eta.clone(),
            steps: Step::ALL
                .iter()
                .zip(self.steps.iter())
                .map(|(step, state)| StepView {
                    step: *step,
                    state: *state,
                })
                .collect(),
            submit_enabled: self.submit_enabled,
            submit_label: self.submit_label,
            results: self.results_visible.then(|| self.results.clone()),
            dirty: self.dirty,
        }
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn is_polling(&self) -> bool {
        self.phase == Phase::Polling
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    /// Nothing in flight: no upload, no polling, no artifact still loading.
    pub fn is_settled(&self) -> bool {
        self.phase == Phase::Idle && !self.results.is_loading()
    }

    /// Back to the page-load state, keeping nothing from the previous task.
    pub(crate) fn reset(&mut self) {
        *self = Self {
            dirty: true,
            ..Self::default()
        };
    }

    pub(crate) fn fail_validation(&mut self, message: &str) {
        self.stage_label = "Error".into();
        self.message = message.to_owned();
        self.tone = MessageTone::Error;
        self.dirty = true;
    }

    pub(crate) fn begin_upload(&mut self) {
        self.phase = Phase::Uploading;
        self.icon = Some(Icon::Spinner);
        self.stage_label = "Uploading".into();
        self.message = "Preparing video file...".into();
        self.progress = 0.0;
        self.progress_visible = true;
        self.activate_step(Step::Upload);
        self.submit_enabled = false;
        self.submit_label = SubmitLabel::Uploading;
        self.dirty = true;
    }

    pub(crate) fn fail_upload(&mut self, message: &str) {
        self.phase = Phase::Idle;
        self.icon = None;
        self.stage_label = "Failed".into();
        self.message = format!("Upload failed: {message}");
        self.tone = MessageTone::Error;
        self.progress_visible = false;
        self.reset_steps();
        self.restore_submit();
        self.dirty = true;
    }

    /// Task id known: either the upload was accepted or an existing task is watched.
    pub(crate) fn begin_polling(&mut self, task_id: TaskId, message: &str) {
        self.phase = Phase::Polling;
        self.task_id = Some(task_id);
        self.icon = Some(Icon::Spinner);
        self.stage_label = "Preparing".into();
        self.message = message.to_owned();
        self.progress = UPLOADED_PERCENT;
        self.progress_visible = true;
        self.activate_step(Step::Prepare);
        self.submit_enabled = false;
        self.submit_label = SubmitLabel::Uploaded;
        self.tracker.reset();
        self.dirty = true;
    }

    /// Status responses only count for the current task while polling.
    pub(crate) fn accepts_status(&self, task_id: &str) -> bool {
        self.phase == Phase::Polling && self.task_id.as_deref() == Some(task_id)
    }

    pub(crate) fn tracker_mut(&mut self) -> &mut ProgressTracker {
        &mut self.tracker
    }

    pub(crate) fn apply_lifecycle(&mut self, view: &LifecycleView) {
        self.stage_label = view.stage_label.clone();
        self.icon = Some(view.icon);
        self.message = view.message.clone();
        self.tone = view.tone;
        if let Some(percent) = view.progress_percent {
            self.progress = percent;
        }
        self.progress_visible = view.progress_visible;
        self.eta = view.eta.clone();
        match view.step {
            StepChange::Activate(step) => self.activate_step(step),
            StepChange::Reset => self.reset_steps(),
            StepChange::Keep => {}
        }
        self.dirty = true;
    }

    pub(crate) fn finish_polling(&mut self) {
        self.phase = Phase::Idle;
        self.eta = None;
        self.tracker.reset();
        self.restore_submit();
        self.dirty = true;
    }

    pub(crate) fn fail_polling(&mut self, failure: &PollFailure) {
        self.finish_polling();
        self.icon = None;
        self.stage_label = "Error".into();
        self.message = match failure {
            PollFailure::HttpStatus(_) => {
                "Error checking status. Please try again later.".into()
            }
            PollFailure::Transport(_) | PollFailure::Decode(_) => {
                "Error checking status. See the log for details.".into()
            }
        };
        self.tone = MessageTone::Error;
        self.progress_visible = false;
        self.reset_steps();
    }

    /// Shows the results area; sections follow the URLs present in the payload.
    pub(crate) fn show_results(&mut self, payload: &StatusPayload) -> &ResultsView {
        self.results_visible = true;
        self.results = ResultsView::from_payload(payload);
        self.dirty = true;
        &self.results
    }

    /// Results area stays visible but empty after a failed job.
    pub(crate) fn show_empty_results(&mut self) {
        self.results_visible = true;
        self.results = ResultsView::default();
        self.dirty = true;
    }

    pub(crate) fn apply_video_probe(&mut self, url: &str, ok: bool) {
        if self.results_visible && self.results.apply_video_probe(url, ok) {
            self.dirty = true;
        }
    }

    pub(crate) fn apply_stats(&mut self, url: &str, result: Result<Value, String>) {
        if self.results_visible && self.results.apply_stats(url, result) {
            self.dirty = true;
        }
    }

    fn restore_submit(&mut self) {
        self.submit_enabled = true;
        self.submit_label = SubmitLabel::Ready;
    }

    fn activate_step(&mut self, current: Step) {
        for (step, state) in Step::ALL.iter().zip(self.steps.iter_mut()) {
            *state = match step.cmp(&current) {
                std::cmp::Ordering::Less => StepState::Completed,
                std::cmp::Ordering::Equal => StepState::Active,
                std::cmp::Ordering::Greater => StepState::Pending,
            };
        }
    }

    fn reset_steps(&mut self) {
        self.steps = [StepState::Pending; STEP_COUNT];
    }
}
