use std::path::PathBuf;
use std::sync::Once;

use tracker_core::{
    update, AppState, Effect, MessageTone, Msg, Phase, SelectedFile, Step, StepState,
    SubmitLabel,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tracker_logging::initialize_for_tests);
}

fn clip(size_bytes: u64) -> SelectedFile {
    SelectedFile {
        path: PathBuf::from("/videos/match.mp4"),
        name: "match.mp4".to_string(),
        size_bytes,
    }
}

fn step_state(state: &AppState, step: Step) -> StepState {
    state
        .view()
        .steps
        .iter()
        .find(|view| view.step == step)
        .map(|view| view.state)
        .unwrap()
}

#[test]
fn submit_without_file_is_a_local_error() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::SubmitClicked { file: None });
    let view = state.view();

    assert!(effects.is_empty());
    assert_eq!(view.stage_label, "Error");
    assert_eq!(view.message, "Please select a video file first.");
    assert!(view.submit_enabled);
    assert_eq!(view.phase, Phase::Idle);
}

#[test]
fn submit_with_empty_file_is_a_local_error() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::SubmitClicked {
            file: Some(clip(0)),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.view().stage_label, "Error");
    assert!(state.view().submit_enabled);
}

#[test]
fn submit_starts_upload_and_disables_control() {
    init_logging();
    let (mut state, effects) = update(
        AppState::new(),
        Msg::SubmitClicked {
            file: Some(clip(1024)),
        },
    );
    let view = state.view();

    assert_eq!(
        effects,
        vec![Effect::Upload {
            path: PathBuf::from("/videos/match.mp4")
        }]
    );
    assert_eq!(view.stage_label, "Uploading");
    assert!(!view.submit_enabled);
    assert_eq!(view.submit_label, SubmitLabel::Uploading);
    assert!(view.progress.visible);
    assert_eq!(view.progress.percent, 0.0);
    assert_eq!(view.active_step(), Some(Step::Upload));
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
}

#[test]
fn submit_is_ignored_while_uploading() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::SubmitClicked {
            file: Some(clip(1024)),
        },
    );
    let (state, effects) = update(state, Msg::SubmitClicked { file: None });

    assert!(effects.is_empty());
    assert_eq!(state.view().stage_label, "Uploading");
}

#[test]
fn upload_success_starts_polling_at_ten_percent() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::SubmitClicked {
            file: Some(clip(1024)),
        },
    );
    let (state, effects) = update(
        state,
        Msg::UploadSucceeded {
            task_id: "abc123".to_string(),
        },
    );
    let view = state.view();

    assert_eq!(
        effects,
        vec![Effect::StartPolling {
            task_id: "abc123".to_string()
        }]
    );
    assert_eq!(view.stage_label, "Preparing");
    assert_eq!(view.progress.percent, 10.0);
    assert_eq!(view.task_id.as_deref(), Some("abc123"));
    assert_eq!(view.phase, Phase::Polling);
    assert_eq!(step_state(&state, Step::Upload), StepState::Completed);
    assert_eq!(step_state(&state, Step::Prepare), StepState::Active);
    assert_eq!(step_state(&state, Step::Analyze), StepState::Pending);
}

#[test]
fn upload_failure_reports_server_message_and_reenables_submit() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::SubmitClicked {
            file: Some(clip(1024)),
        },
    );
    let (state, effects) = update(
        state,
        Msg::UploadFailed {
            message: "disk full".to_string(),
        },
    );
    let view = state.view();

    assert!(effects.is_empty());
    assert_eq!(view.stage_label, "Failed");
    assert_eq!(view.message, "Upload failed: disk full");
    assert_eq!(view.tone, MessageTone::Error);
    assert!(view.submit_enabled);
    assert!(!view.progress.visible);
    assert!(view.steps.iter().all(|s| s.state == StepState::Pending));
    assert!(state.is_settled());
}

#[test]
fn new_submit_stops_previous_polling() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::WatchRequested {
            task_id: "old".to_string(),
        },
    );
    assert!(state.is_polling());

    let (state, effects) = update(
        state,
        Msg::SubmitClicked {
            file: Some(clip(10)),
        },
    );

    assert_eq!(
        effects,
        vec![
            Effect::StopPolling,
            Effect::Upload {
                path: PathBuf::from("/videos/match.mp4")
            }
        ]
    );
    assert_eq!(state.task_id(), None);
}

#[test]
fn late_upload_result_is_ignored() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::UploadSucceeded {
            task_id: "ghost".to_string(),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.task_id(), None);
}
