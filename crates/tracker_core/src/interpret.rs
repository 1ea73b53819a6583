//! Status interpretation: raw status payload to a normalized lifecycle view.

use crate::{StatusPayload, TaskState};

pub const PENDING_PERCENT: f64 = 5.0;
pub const STARTED_PERCENT: f64 = 15.0;
pub const COMPLETE_PERCENT: f64 = 100.0;

const DEFAULT_MESSAGE: &str = "Processing video...";

/// Processing steps in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    Upload,
    Prepare,
    Analyze,
    Process,
    Complete,
}

pub const STEP_COUNT: usize = 5;

impl Step {
    pub const ALL: [Step; STEP_COUNT] = [
        Step::Upload,
        Step::Prepare,
        Step::Analyze,
        Step::Process,
        Step::Complete,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Step::Upload => "upload",
            Step::Prepare => "prepare",
            Step::Analyze => "analyze",
            Step::Process => "process",
            Step::Complete => "complete",
        }
    }
}

/// What a lifecycle view does to the step indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepChange {
    Activate(Step),
    Reset,
    Keep,
}

/// Icon token for the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Spinner,
    Hourglass,
    Cogs,
    Film,
    Branch,
    CheckCircle,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageTone {
    #[default]
    Normal,
    Success,
    Error,
}

/// Terminal outcome carried by a lifecycle view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failure,
    Interrupted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleView {
    pub stage_label: String,
    pub icon: Icon,
    pub step: StepChange,
    /// `None` leaves the current progress value untouched.
    pub progress_percent: Option<f64>,
    pub progress_visible: bool,
    pub eta: Option<String>,
    pub message: String,
    pub tone: MessageTone,
    pub outcome: Option<TaskOutcome>,
}

/// Maps one status payload to its lifecycle view. First match wins.
pub fn interpret(payload: &StatusPayload) -> LifecycleView {
    let info = payload.info.as_ref();
    let info_status = info.and_then(|info| info.status.as_deref());
    let computed = info.and_then(|info| info.percent());

    let mut view = LifecycleView {
        stage_label: payload.state.as_str().to_owned(),
        icon: Icon::Info,
        step: StepChange::Keep,
        progress_percent: None,
        progress_visible: matches!(
            payload.state,
            TaskState::Pending | TaskState::Started | TaskState::Progress
        ),
        eta: None,
        message: base_message(payload),
        tone: MessageTone::Normal,
        outcome: None,
    };

    match &payload.state {
        TaskState::Pending => {
            view.stage_label = "Queued".into();
            view.icon = Icon::Hourglass;
            view.step = StepChange::Activate(Step::Prepare);
            view.progress_percent = Some(PENDING_PERCENT);
        }
        TaskState::Started => {
            view.stage_label = "Started".into();
            view.icon = Icon::Cogs;
            view.step = StepChange::Activate(Step::Analyze);
            view.progress_percent = Some(STARTED_PERCENT);
        }
        TaskState::Progress => {
            let (label, icon, step) = match info_status {
                Some(status) if status.contains("Converting") => {
                    ("Finalizing", Icon::Film, Step::Process)
                }
                Some(_) => ("Analyzing", Icon::Branch, Step::Analyze),
                None => ("Processing", Icon::Branch, Step::Analyze),
            };
            view.stage_label = label.into();
            view.icon = icon;
            view.step = StepChange::Activate(step);

            if let (Some(percent), Some(info)) = (computed, info) {
                view.progress_percent = Some(percent);
                let label = info_status.unwrap_or("Processing...");
                let rounded = percent.round();
                view.message = match (&info.eta, &info.rate) {
                    (Some(_), Some(rate)) => format!("{label} ({rounded}%) [{rate}]"),
                    _ => format!("{label} ({rounded}%)"),
                };
                view.eta = info.eta.clone();
            }
        }
        TaskState::Success => {
            view.stage_label = "Complete".into();
            view.icon = Icon::CheckCircle;
            view.step = StepChange::Activate(Step::Complete);
            view.progress_percent = Some(COMPLETE_PERCENT);
            view.message = "Processing complete!".into();
            view.tone = MessageTone::Success;
            view.outcome = Some(TaskOutcome::Success);
        }
        TaskState::Failure => {
            view.stage_label = "Failed".into();
            view.icon = Icon::Warning;
            view.step = StepChange::Reset;
            let reason = payload.status.as_deref().unwrap_or("unknown error");
            view.message = format!("Processing failed: {reason}");
            view.tone = MessageTone::Error;
            view.outcome = Some(TaskOutcome::Failure);
        }
        TaskState::Revoked | TaskState::Retry => {
            view.message = "Task interrupted".into();
            view.outcome = Some(TaskOutcome::Interrupted);
        }
        TaskState::Other(_) => {
            view.step = StepChange::Activate(Step::Prepare);
        }
    }

    view
}

fn base_message(payload: &StatusPayload) -> String {
    let info_status = payload.info.as_ref().and_then(|info| info.status.as_deref());
    match (&payload.state, info_status) {
        (TaskState::Progress, Some(status)) => status.to_owned(),
        _ => payload
            .status
            .clone()
            .unwrap_or_else(|| DEFAULT_MESSAGE.to_owned()),
    }
}
