use std::path::PathBuf;
use std::sync::Once;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use tracker_core::{
    update, AppState, Effect, Icon, MessageTone, Msg, Phase, PollFailure, ProgressInfo,
    SelectedFile, StatusPayload, Step, StepState, TaskState,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tracker_logging::initialize_for_tests);
}

fn polling(task_id: &str) -> AppState {
    let file = SelectedFile {
        path: PathBuf::from("clip.mp4"),
        name: "clip.mp4".to_string(),
        size_bytes: 42,
    };
    let (state, _) = update(AppState::new(), Msg::SubmitClicked { file: Some(file) });
    let (state, _) = update(
        state,
        Msg::UploadSucceeded {
            task_id: task_id.to_string(),
        },
    );
    state
}

fn status(state: AppState, task_id: &str, payload: StatusPayload) -> (AppState, Vec<Effect>) {
    status_at(state, task_id, payload, Instant::now())
}

fn status_at(
    state: AppState,
    task_id: &str,
    payload: StatusPayload,
    at: Instant,
) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::StatusReceived {
            task_id: task_id.to_string(),
            payload,
            at,
        },
    )
}

fn progress(current: f64, total: f64, status: &str) -> StatusPayload {
    StatusPayload {
        info: Some(ProgressInfo {
            current: Some(current),
            total: Some(total),
            status: Some(status.to_string()),
            ..ProgressInfo::default()
        }),
        ..StatusPayload::new(TaskState::Progress)
    }
}

#[test]
fn full_run_from_queue_to_results() {
    init_logging();
    let state = polling("abc123");

    let (state, effects) = status(state, "abc123", StatusPayload::new(TaskState::Pending));
    assert!(effects.is_empty());
    assert_eq!(state.view().stage_label, "Queued");
    assert_eq!(state.view().progress.percent, 5.0);

    let (state, effects) = status(
        state,
        "abc123",
        progress(40.0, 200.0, "Analyzing frame 40/200"),
    );
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.progress.percent, 20.0);
    assert_eq!(view.message, "Analyzing frame 40/200 (20%)");
    assert_eq!(view.active_step(), Some(Step::Analyze));

    let payload = StatusPayload {
        result_video: Some("/files/out.mp4".to_string()),
        result_stats: Some("/files/out.json".to_string()),
        ..StatusPayload::new(TaskState::Success)
    };
    let (state, effects) = status(state, "abc123", payload);
    assert_eq!(
        effects,
        vec![
            Effect::StopPolling,
            Effect::ProbeVideo {
                url: "/files/out.mp4".to_string()
            },
            Effect::FetchStats {
                url: "/files/out.json".to_string()
            },
        ]
    );
    let view = state.view();
    assert_eq!(view.phase, Phase::Idle);
    assert_eq!(view.progress.percent, 100.0);
    assert_eq!(view.tone, MessageTone::Success);
    assert_eq!(view.icon, Some(Icon::CheckCircle));
    assert!(view.submit_enabled);
    let results = view.results.expect("results visible");
    assert_eq!(results.video.unwrap().download_name, "out.mp4");
    assert_eq!(results.stats.unwrap().download_name, "out.json");
    assert!(!state.is_settled());
}

#[test]
fn started_without_info_forces_fifteen_percent() {
    init_logging();
    let (state, _) = status(
        polling("t"),
        "t",
        StatusPayload::new(TaskState::Started),
    );
    assert_eq!(state.view().progress.percent, 15.0);
    assert_eq!(state.view().stage_label, "Started");
}

#[test]
fn success_ignores_info_for_progress() {
    init_logging();
    let mut payload = progress(1.0, 10.0, "odd");
    payload.state = TaskState::Success;
    let (state, _) = status(polling("t"), "t", payload);
    assert_eq!(state.view().progress.percent, 100.0);
}

#[test]
fn failure_stops_polling_and_keeps_results_area_empty() {
    init_logging();
    let payload = StatusPayload {
        status: Some("Processing failed due to an internal error: ValueError".to_string()),
        ..StatusPayload::new(TaskState::Failure)
    };
    let (state, effects) = status(polling("t"), "t", payload);
    let view = state.view();

    assert_eq!(effects, vec![Effect::StopPolling]);
    assert_eq!(view.stage_label, "Failed");
    assert_eq!(
        view.message,
        "Processing failed: Processing failed due to an internal error: ValueError"
    );
    assert_eq!(view.tone, MessageTone::Error);
    assert_eq!(view.results, Some(Default::default()));
    assert!(view.steps.iter().all(|s| s.state == StepState::Pending));
    assert!(view.submit_enabled);
    assert!(state.is_settled());
}

#[test]
fn revoked_is_an_interruption() {
    init_logging();
    let (state, effects) = status(polling("t"), "t", StatusPayload::new(TaskState::Revoked));
    let view = state.view();

    assert_eq!(effects, vec![Effect::StopPolling]);
    assert_eq!(view.stage_label, "REVOKED");
    assert_eq!(view.message, "Task interrupted");
    assert_eq!(view.results, None);
    assert!(view.submit_enabled);
}

#[test]
fn unknown_state_keeps_polling() {
    init_logging();
    let (state, effects) = status(
        polling("t"),
        "t",
        StatusPayload::new(TaskState::Other("SCHEDULED".to_string())),
    );

    assert!(effects.is_empty());
    assert!(state.is_polling());
    assert_eq!(state.view().stage_label, "SCHEDULED");
}

#[test]
fn http_error_terminates_polling_and_restores_submit() {
    init_logging();
    let (state, effects) = update(
        polling("t"),
        Msg::StatusFailed {
            task_id: "t".to_string(),
            failure: PollFailure::HttpStatus(500),
        },
    );
    let view = state.view();

    assert_eq!(effects, vec![Effect::StopPolling]);
    assert_eq!(view.stage_label, "Error");
    assert_eq!(
        view.message,
        "Error checking status. Please try again later."
    );
    assert!(view.submit_enabled);
    assert!(!view.progress.visible);
    assert_eq!(view.eta, None);
    assert!(view.steps.iter().all(|s| s.state == StepState::Pending));
}

#[test]
fn decode_error_terminates_polling() {
    init_logging();
    let (state, effects) = update(
        polling("t"),
        Msg::StatusFailed {
            task_id: "t".to_string(),
            failure: PollFailure::Decode("expected value".to_string()),
        },
    );

    assert_eq!(effects, vec![Effect::StopPolling]);
    assert_eq!(
        state.view().message,
        "Error checking status. See the log for details."
    );
    assert!(state.view().submit_enabled);
}

#[test]
fn responses_for_superseded_task_are_discarded() {
    init_logging();
    let state = polling("new");
    let before = state.clone();

    let (state, effects) = status(state, "old", StatusPayload::new(TaskState::Success));
    assert!(effects.is_empty());
    assert_eq!(state, before);

    let (state, effects) = update(
        state,
        Msg::StatusFailed {
            task_id: "old".to_string(),
            failure: PollFailure::HttpStatus(404),
        },
    );
    assert!(effects.is_empty());
    assert!(state.is_polling());
}

#[test]
fn responses_after_terminal_state_are_discarded() {
    init_logging();
    let (state, _) = status(polling("t"), "t", StatusPayload::new(TaskState::Revoked));
    let (state, effects) = status(state, "t", StatusPayload::new(TaskState::Pending));

    assert!(effects.is_empty());
    assert_eq!(state.view().stage_label, "REVOKED");
}

#[test]
fn fallback_eta_comes_from_progress_history() {
    init_logging();
    let t0 = Instant::now();
    let state = polling("t");

    let (state, _) = status_at(state, "t", progress(10.0, 100.0, "Analyzing"), t0);
    assert_eq!(state.view().eta, None);

    let (state, _) = status_at(
        state,
        "t",
        progress(20.0, 100.0, "Analyzing"),
        t0 + Duration::from_secs(2),
    );
    // 5 units/s, 80 left.
    assert_eq!(state.view().eta.as_deref(), Some("00:16"));

    let (state, _) = status_at(
        state,
        "t",
        progress(20.0, 100.0, "Analyzing"),
        t0 + Duration::from_secs(4),
    );
    assert_eq!(state.view().eta, None);
    assert_eq!(state.tracker().len(), 3);
}

#[test]
fn server_eta_bypasses_tracker() {
    init_logging();
    let mut payload = progress(30.0, 100.0, "Analyzing frame 30/100");
    if let Some(info) = payload.info.as_mut() {
        info.eta = Some("01:10".to_string());
        info.rate = Some("4.2 it/s".to_string());
    }
    let (state, _) = status(polling("t"), "t", payload);
    let view = state.view();

    assert_eq!(view.eta.as_deref(), Some("01:10"));
    assert_eq!(view.message, "Analyzing frame 30/100 (30%) [4.2 it/s]");
    assert!(state.tracker().is_empty());
}

#[test]
fn teardown_stops_polling() {
    init_logging();
    let (state, effects) = update(polling("t"), Msg::Teardown);

    assert_eq!(effects, vec![Effect::StopPolling]);
    assert!(!state.is_polling());
    assert!(state.view().submit_enabled);

    let (_, effects) = update(state, Msg::Teardown);
    assert!(effects.is_empty());
}

#[test]
fn watch_attaches_to_existing_task() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::WatchRequested {
            task_id: "resume-1".to_string(),
        },
    );

    assert_eq!(
        effects,
        vec![Effect::StartPolling {
            task_id: "resume-1".to_string()
        }]
    );
    assert!(state.is_polling());
    assert_eq!(state.view().active_step(), Some(Step::Prepare));
}

#[test]
fn queued_and_started_bars_ignore_info_counts() {
    init_logging();
    let with_counts = |state| StatusPayload {
        state,
        ..progress(80.0, 100.0, "Loading model")
    };

    let (state, _) = status(polling("t"), "t", with_counts(TaskState::Pending));
    assert_eq!(state.view().progress.percent, 5.0);

    let (state, _) = status(state, "t", with_counts(TaskState::Started));
    assert_eq!(state.view().progress.percent, 15.0);
    assert!(state.tracker().is_empty());
}
