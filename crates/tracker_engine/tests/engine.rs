use std::fs;
use std::io::Write;
use std::time::{Duration, Instant};

use serde_json::json;
use tempfile::{NamedTempFile, TempDir};
use tracker_core::TaskState;
use tracker_engine::{ApiSettings, EngineEvent, EngineHandle};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine_for(server: &MockServer) -> EngineHandle {
    tracker_logging::initialize_for_tests();
    let settings = ApiSettings {
        base_url: server.uri(),
        poll_interval: Duration::from_millis(20),
        ..ApiSettings::default()
    };
    EngineHandle::new(settings).expect("engine")
}

/// Waits for the next event without blocking the test runtime.
async fn next_event(engine: &EngineHandle) -> EngineEvent {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(event) = engine.try_recv() {
            return event;
        }
        assert!(Instant::now() < deadline, "timed out waiting for engine event");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn upload_then_poll_to_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"task_id": "abc123"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "state": "SUCCESS",
            "result_video": "/files/abc123_processed.mp4",
            "result_stats": "/files/abc123_stats.json"
        })))
        .mount(&server)
        .await;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"video").unwrap();
    let engine = engine_for(&server);

    engine.upload(file.path());
    match next_event(&engine).await {
        EngineEvent::UploadCompleted { result } => assert_eq!(result.unwrap(), "abc123"),
        other => panic!("unexpected event {other:?}"),
    }

    engine.start_polling("abc123");
    match next_event(&engine).await {
        EngineEvent::Status {
            task_id, result, ..
        } => {
            assert_eq!(task_id, "abc123");
            let payload = result.unwrap();
            assert_eq!(payload.state, TaskState::Success);
            assert_eq!(
                payload.result_stats.as_deref(),
                Some("/files/abc123_stats.json")
            );
        }
        other => panic!("unexpected event {other:?}"),
    }

    // Terminal state ends the loop; nothing else arrives.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(engine.try_recv().is_none());
}

#[tokio::test]
async fn results_are_checked_fetched_and_saved() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/files/out.mp4"))
        .respond_with(ResponseTemplate::new(200).insert_header("Content-Type", "video/mp4"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/out.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"players": 22})))
        .mount(&server)
        .await;
    let engine = engine_for(&server);

    engine.probe_video("/files/out.mp4");
    match next_event(&engine).await {
        EngineEvent::VideoProbed { url, result } => {
            assert_eq!(url, "/files/out.mp4");
            assert!(result.unwrap().is_playable());
        }
        other => panic!("unexpected event {other:?}"),
    }

    engine.fetch_stats("/files/out.json");
    match next_event(&engine).await {
        EngineEvent::StatsFetched { url, result } => {
            assert_eq!(url, "/files/out.json");
            assert_eq!(result.unwrap(), json!({"players": 22}));
        }
        other => panic!("unexpected event {other:?}"),
    }

    let dir = TempDir::new().unwrap();
    engine.save_artifact("/files/out.json", dir.path().join("saved"), "out.json");
    match next_event(&engine).await {
        EngineEvent::ArtifactSaved { result, .. } => {
            let saved = result.unwrap();
            assert_eq!(saved, dir.path().join("saved").join("out.json"));
            let body: serde_json::Value =
                serde_json::from_slice(&fs::read(saved).unwrap()).unwrap();
            assert_eq!(body, json!({"players": 22}));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn stop_polling_silences_the_loop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/t9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "PENDING"})))
        .mount(&server)
        .await;
    let engine = engine_for(&server);

    engine.start_polling("t9");
    assert!(matches!(
        next_event(&engine).await,
        EngineEvent::Status { .. }
    ));
    engine.stop_polling();
    tokio::time::sleep(Duration::from_millis(50)).await;
    while engine.try_recv().is_some() {}

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(engine.try_recv().is_none());
}
