use crate::interpret::{Icon, MessageTone, Step};
use crate::results::ResultsView;
use crate::state::{Phase, StepState, SubmitLabel};
use crate::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressView {
    pub percent: f64,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepView {
    pub step: Step,
    pub state: StepState,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub task_id: Option<TaskId>,
    pub stage_label: String,
    pub icon: Option<Icon>,
    pub message: String,
    pub tone: MessageTone,
    pub progress: ProgressView,
    pub eta: Option<String>,
    pub steps: Vec<StepView>,
    pub submit_enabled: bool,
    pub submit_label: SubmitLabel,
    /// `Some` while the results area is visible.
    pub results: Option<ResultsView>,
    pub dirty: bool,
}

impl AppViewModel {
    pub fn active_step(&self) -> Option<Step> {
        self.steps
            .iter()
            .find(|view| view.state == StepState::Active)
            .map(|view| view.step)
    }
}
