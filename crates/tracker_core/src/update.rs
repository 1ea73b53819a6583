use std::time::Instant;

use crate::interpret::{interpret, LifecycleView, TaskOutcome};
use crate::progress::format_eta;
use crate::{AppState, Effect, Msg, Phase, SelectedFile, StatusPayload, TaskState};

const NO_FILE_MESSAGE: &str = "Please select a video file first.";
const EMPTY_FILE_MESSAGE: &str = "The selected file is empty.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::SubmitClicked { file } => submit(&mut state, file),
        Msg::UploadSucceeded { task_id } => {
            if state.phase() != Phase::Uploading {
                return (state, Vec::new());
            }
            state.begin_polling(task_id.clone(), "Video uploaded. Processing started...");
            vec![Effect::StartPolling { task_id }]
        }
        Msg::UploadFailed { message } => {
            if state.phase() != Phase::Uploading {
                return (state, Vec::new());
            }
            state.fail_upload(&message);
            Vec::new()
        }
        Msg::WatchRequested { task_id } => {
            let mut effects = stop_if_polling(&state);
            state.reset();
            state.begin_polling(task_id.clone(), "Checking task status...");
            effects.push(Effect::StartPolling { task_id });
            effects
        }
        Msg::StatusReceived {
            task_id,
            payload,
            at,
        } => {
            if !state.accepts_status(&task_id) {
                return (state, Vec::new());
            }
            apply_status(&mut state, &payload, at)
        }
        Msg::StatusFailed { task_id, failure } => {
            if !state.accepts_status(&task_id) {
                return (state, Vec::new());
            }
            state.fail_polling(&failure);
            vec![Effect::StopPolling]
        }
        Msg::VideoProbed { url, ok } => {
            state.apply_video_probe(&url, ok);
            Vec::new()
        }
        Msg::StatsLoaded { url, result } => {
            state.apply_stats(&url, result);
            Vec::new()
        }
        Msg::Teardown => {
            let effects = stop_if_polling(&state);
            if state.is_polling() {
                state.finish_polling();
            }
            effects
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn submit(state: &mut AppState, file: Option<SelectedFile>) -> Vec<Effect> {
    if state.phase() == Phase::Uploading {
        // Submit control is disabled while an upload is in flight.
        return Vec::new();
    }

    let mut effects = stop_if_polling(state);
    state.reset();

    match file {
        None => state.fail_validation(NO_FILE_MESSAGE),
        Some(file) if file.size_bytes == 0 => state.fail_validation(EMPTY_FILE_MESSAGE),
        Some(file) => {
            state.begin_upload();
            effects.push(Effect::Upload { path: file.path });
        }
    }
    effects
}

fn stop_if_polling(state: &AppState) -> Vec<Effect> {
    if state.is_polling() {
        vec![Effect::StopPolling]
    } else {
        Vec::new()
    }
}

fn apply_status(state: &mut AppState, payload: &StatusPayload, at: Instant) -> Vec<Effect> {
    let mut view = interpret(payload);
    fill_fallback_eta(state, payload, &mut view, at);
    state.apply_lifecycle(&view);

    match view.outcome {
        Some(TaskOutcome::Success) => {
            state.finish_polling();
            let results = state.show_results(payload);
            let mut effects = vec![Effect::StopPolling];
            if let Some(video) = &results.video {
                effects.push(Effect::ProbeVideo {
                    url: video.url.clone(),
                });
            }
            if let Some(stats) = &results.stats {
                effects.push(Effect::FetchStats {
                    url: stats.url.clone(),
                });
            }
            effects
        }
        Some(TaskOutcome::Failure) => {
            state.finish_polling();
            state.show_empty_results();
            vec![Effect::StopPolling]
        }
        Some(TaskOutcome::Interrupted) => {
            state.finish_polling();
            vec![Effect::StopPolling]
        }
        None => Vec::new(),
    }
}

/// Feeds the progress tracker when the server reports progress without an ETA.
fn fill_fallback_eta(
    state: &mut AppState,
    payload: &StatusPayload,
    view: &mut LifecycleView,
    at: Instant,
) {
    if payload.state != TaskState::Progress || view.eta.is_some() {
        return;
    }
    let Some(info) = payload.info.as_ref() else {
        return;
    };
    let (Some(current), Some(total)) = (info.current, info.total) else {
        return;
    };
    if info.percent().is_none() {
        return;
    }
    let tracker = state.tracker_mut();
    tracker.record(at, current);
    view.eta = tracker.estimate(total).map(format_eta);
}
