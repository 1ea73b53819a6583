//! Tracker core: pure task-lifecycle state machine and view-model helpers.
mod effect;
pub mod highlight;
mod interpret;
mod msg;
mod payload;
mod progress;
mod results;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use interpret::{
    interpret, Icon, LifecycleView, MessageTone, Step, StepChange, TaskOutcome, COMPLETE_PERCENT,
    PENDING_PERCENT, STARTED_PERCENT, STEP_COUNT,
};
pub use msg::{Msg, PollFailure, SelectedFile};
pub use payload::{ProgressInfo, StatusPayload, TaskId, TaskState};
pub use progress::{format_eta, ProgressSample, ProgressTracker, MAX_SAMPLES};
pub use results::{
    download_name, Playback, ResultsView, StatsBody, StatsSection, VideoSection,
    PLAYBACK_WARNING, STATS_UNAVAILABLE,
};
pub use state::{AppState, Phase, StepState, SubmitLabel, INITIAL_MESSAGE, UPLOADED_PERCENT};
pub use update::update;
pub use view_model::{AppViewModel, ProgressView, StepView};
