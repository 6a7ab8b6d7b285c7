//! End-to-end session scenarios against a scripted backend, under a paused
//! tokio clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use choreo_client::{endpoints, BackendCall, ScriptedBackend};
use choreo_core::{CanvasSize, ClockVideo, FeedbackLogEntry, PlaybackMode, ReferenceVideo};
use choreo_overlay::{OverlayConfig, RasterCanvas, RenderOutcome};
use choreo_session::{
    CountdownStep, DanceProps, DanceSession, KeypointStatus, SessionCallbacks, SessionConfig,
    SessionEvent, SessionState,
};

const KEYPOINTS: &[u8] = br#"[{"0": [0.5, 0.5, 0.0]}, {"0": [0.4, 0.5, 0.0], "11": null}]"#;

fn overlay_config() -> OverlayConfig {
    OverlayConfig {
        canvas_width: 38,
        canvas_height: 64,
        ..OverlayConfig::default()
    }
}

async fn mount_with(
    backend: Arc<ScriptedBackend>,
    props: DanceProps,
    callbacks: SessionCallbacks,
) -> (DanceSession, Arc<ClockVideo>) {
    let config = overlay_config();
    let video = Arc::new(ClockVideo::new(config.canvas_size(), Some(60.0)));
    let session = DanceSession::mount(
        backend,
        video.clone(),
        Box::new(RasterCanvas::new(CanvasSize::new(38, 64))),
        props,
        callbacks,
        SessionConfig::default(),
        &config,
    )
    .await;
    (session, video)
}

async fn mount(backend: Arc<ScriptedBackend>) -> (DanceSession, Arc<ClockVideo>) {
    mount_with(backend, DanceProps::default(), SessionCallbacks::noop()).await
}

async fn settle() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_start_counts_down_then_plays() {
    let backend = Arc::new(ScriptedBackend::new().with_keypoints_json(KEYPOINTS));
    let (session, video) = mount(backend.clone()).await;
    let mut events = session.subscribe();

    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(session.button_label(), "Play");
    session.start().await.unwrap();
    assert_eq!(session.countdown_label(), Some("3"));

    tokio::time::sleep(Duration::from_secs(5)).await;

    let mut states = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::StateChanged(state) = event {
            states.push(state);
        }
    }
    assert_eq!(
        states,
        vec![
            SessionState::CountingDown(CountdownStep::Count3),
            SessionState::CountingDown(CountdownStep::Count2),
            SessionState::CountingDown(CountdownStep::Count1),
            SessionState::CountingDown(CountdownStep::Go),
            SessionState::Playing,
        ]
    );
    assert_eq!(backend.count_start_processing(), 1);
    assert!(video.is_playing());
    assert_eq!(session.button_label(), "Restart");
}

#[tokio::test(start_paused = true)]
async fn test_countdown_timing() {
    let backend = Arc::new(ScriptedBackend::new());
    let (session, _video) = mount(backend).await;
    let mut state = session.watch_state();

    session.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(2900)).await;
    assert_eq!(*state.borrow_and_update(), SessionState::CountingDown(CountdownStep::Count1));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(*state.borrow_and_update(), SessionState::CountingDown(CountdownStep::Go));

    // GO held 800ms, then 300ms settle before playback starts
    tokio::time::sleep(Duration::from_millis(900)).await;
    assert_eq!(*state.borrow_and_update(), SessionState::CountingDown(CountdownStep::Go));
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(*state.borrow_and_update(), SessionState::Playing);
}

#[tokio::test(start_paused = true)]
async fn test_restart_yields_fresh_log() {
    let backend = Arc::new(ScriptedBackend::new().with_feedback("Perfect!"));
    let (session, _video) = mount(backend.clone()).await;

    session.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(6500)).await;
    backend.set_feedback("Raise your arms");
    tokio::time::sleep(Duration::from_secs(1)).await;
    settle().await;

    let log = session.log();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0], FeedbackLogEntry::new(0, "Perfect!"));
    assert_eq!(log[1].feedback.as_str(), "Raise your arms");
    assert_eq!(log[1].elapsed_seconds, 3);

    session.start().await.unwrap();
    assert!(session.log().is_empty());
    assert_eq!(session.state(), SessionState::CountingDown(CountdownStep::Count3));
    assert!(session.is_polling());
    assert!(session.is_drawing());

    // Unchanged backend feedback is logged again in the new attempt
    tokio::time::sleep(Duration::from_millis(1100)).await;
    settle().await;
    assert_eq!(session.log(), vec![FeedbackLogEntry::new(0, "Raise your arms")]);

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(session.state(), SessionState::Playing);
    assert_eq!(backend.count_start_processing(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_restarts_keep_one_poller_and_one_overlay_loop() {
    let backend = Arc::new(ScriptedBackend::new().with_feedback("Perfect!"));
    let (session, _video) = mount(backend.clone()).await;

    session.start().await.unwrap();
    for _ in 0..3 {
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(session.state(), SessionState::Playing);
        session.start().await.unwrap();
    }

    tokio::time::sleep(Duration::from_millis(500)).await;
    let polls = backend.count(&BackendCall::Feedback);
    let ticks = session.overlay_stats().ticks;

    tokio::time::sleep(Duration::from_secs(10)).await;
    // One fetch per second and one draw per 16ms tick
    assert_eq!(backend.count(&BackendCall::Feedback) - polls, 10);
    let drawn = session.overlay_stats().ticks - ticks;
    assert!((624..=626).contains(&drawn), "overlay ticked {} times", drawn);
}

#[tokio::test(start_paused = true)]
async fn test_failed_restart_from_playing_ends_attempt() {
    let backend = Arc::new(ScriptedBackend::new().with_feedback("Lift arms"));
    let (session, video) = mount(backend.clone()).await;

    session.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(session.state(), SessionState::Playing);

    backend.fail_endpoint(endpoints::START_PROCESSING);
    session.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(session.state(), SessionState::Ended);
    assert!(!video.is_playing());
    assert!(session.error_banner().unwrap().contains("/start_processing"));
    assert_eq!(session.button_label(), "Restart");
    assert!(session.end().await.is_err());

    backend.recover_endpoint(endpoints::START_PROCESSING);
    session.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(session.state(), SessionState::Playing);
    assert!(video.is_playing());
}

#[tokio::test(start_paused = true)]
async fn test_elapsed_measured_from_playing_entry() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.queue_feedback([
        Some("Pose Not Detected"),
        Some("Pose Not Detected"),
        Some("Pose Not Detected"),
        Some("Pose Not Detected"),
        Some("Pose Not Detected"),
        Some("Perfect!"),
        Some("Perfect!"),
        Some("Move your hips"),
    ]);
    let (session, _video) = mount(backend).await;

    session.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(8500)).await;
    settle().await;

    // Playing starts at 4.1s; polls land on whole seconds
    let times: Vec<u64> = session.log().iter().map(|e| e.elapsed_seconds).collect();
    assert_eq!(times, vec![0, 2, 4]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_polls_show_placeholder() {
    let backend = Arc::new(ScriptedBackend::new().with_feedback("Perfect!"));
    let (session, _video) = mount(backend.clone()).await;

    tokio::time::sleep(Duration::from_millis(1500)).await;
    settle().await;
    assert_eq!(session.feedback().text, "Perfect!");
    assert_eq!(session.log().len(), 1);

    backend.fail_feedback();
    tokio::time::sleep(Duration::from_secs(3)).await;
    settle().await;

    let display = session.feedback();
    assert_eq!(display.text, "Waiting for connection...");
    assert_eq!(display.consecutive_failures, 3);
    assert_eq!(session.log().len(), 1);
    assert!(session.error_banner().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_teardown_ignores_in_flight_response() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .with_feedback("Perfect!")
            .with_feedback_latency(Duration::from_secs(2)),
    );
    let (session, video) = mount(backend.clone()).await;

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(backend.count(&BackendCall::Feedback), 1);

    session.teardown();
    tokio::time::sleep(Duration::from_secs(5)).await;
    settle().await;

    assert!(session.log().is_empty());
    assert_eq!(backend.count(&BackendCall::Feedback), 1);
    assert!(!session.is_polling());
    assert!(!session.is_drawing());
    assert!(!video.is_playing());
}

#[tokio::test(start_paused = true)]
async fn test_drop_cancels_activities() {
    let backend = Arc::new(ScriptedBackend::new());
    let (session, _video) = mount(backend.clone()).await;
    session.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    drop(session);

    let polls = backend.count(&BackendCall::Feedback);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(backend.count(&BackendCall::Feedback), polls);
    assert_eq!(backend.count_start_processing(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_end_hands_log_to_callback() {
    let received: Arc<Mutex<Option<Vec<FeedbackLogEntry>>>> = Arc::default();
    let sink = received.clone();
    let callbacks = SessionCallbacks::new(move |log| *sink.lock().unwrap() = Some(log), || {});

    let backend = Arc::new(ScriptedBackend::new().with_feedback("Perfect!"));
    let (session, video) = mount_with(backend.clone(), DanceProps::default(), callbacks).await;

    assert!(session.end().await.is_err());
    session.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(6)).await;

    let log = session.end().await.unwrap();
    assert_eq!(session.state(), SessionState::Ended);
    assert!(!video.is_playing());
    assert_eq!(received.lock().unwrap().as_ref(), Some(&log));
    assert_eq!(log.len(), 1);

    let tail: Vec<BackendCall> = backend.control_calls().into_iter().rev().take(2).collect();
    assert_eq!(tail, vec![BackendCall::ResetFeedback, BackendCall::StopProcessing]);

    // Restart from Ended
    session.start().await.unwrap();
    assert!(session.log().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_practice() {
    let practiced = Arc::new(AtomicUsize::new(0));
    let counter = practiced.clone();
    let callbacks = SessionCallbacks::new(
        |_| {},
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        },
    );

    let backend = Arc::new(ScriptedBackend::new());
    let (session, _video) = mount_with(backend.clone(), DanceProps::default(), callbacks).await;

    backend.fail_endpoint(endpoints::RESET_FEEDBACK);
    assert!(session.practice().await.is_err());
    assert_eq!(practiced.load(Ordering::SeqCst), 0);
    assert!(session.error_banner().is_some());

    backend.recover_endpoint(endpoints::RESET_FEEDBACK);
    session.practice().await.unwrap();
    assert_eq!(practiced.load(Ordering::SeqCst), 1);
    assert!(session.error_banner().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_slow_practice_session() {
    let backend = Arc::new(ScriptedBackend::new());
    let props = DanceProps {
        video_id: Some("super_shy".into()),
        mode: PlaybackMode::Slow,
    };
    let (session, video) = mount_with(backend.clone(), props, SessionCallbacks::noop()).await;
    assert_eq!(session.video_id(), "super_shy");

    session.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(video.playback_rate(), 0.5);
    assert_eq!(backend.count(&BackendCall::StartProcessing(PlaybackMode::Slow)), 1);
    assert_eq!(backend.count(&BackendCall::Keypoints("super_shy".into())), 1);
}

#[tokio::test(start_paused = true)]
async fn test_start_failure_sets_banner() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.fail_endpoint(endpoints::START_PROCESSING);
    let (session, _video) = mount(backend.clone()).await;

    session.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.error_banner().unwrap().contains("/start_processing"));
    assert_eq!(session.button_label(), "Play");

    backend.recover_endpoint(endpoints::START_PROCESSING);
    session.start().await.unwrap();
    assert!(session.error_banner().is_none());
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(session.state(), SessionState::Playing);
}

#[tokio::test(start_paused = true)]
async fn test_keypoint_loading() {
    let backend = Arc::new(ScriptedBackend::new().with_keypoints_json(KEYPOINTS));
    let (session, video) = mount(backend).await;
    assert_eq!(session.video_id(), "hot_to_go");
    assert_eq!(session.keypoint_status(), KeypointStatus::Loaded { frames: 2 });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(
        session.overlay_stats().last_outcome,
        Some(RenderOutcome::Markers {
            frame_index: 0,
            drawn: 1
        })
    );

    // Past the two keypoint frames only the video is drawn
    video.seek(1.0);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(
        session.overlay_stats().last_outcome,
        Some(RenderOutcome::FrameOnly { frame_index: 30 })
    );
}

#[tokio::test(start_paused = true)]
async fn test_keypoint_failures_disable_overlay() {
    let backend = Arc::new(ScriptedBackend::new().with_keypoints_json(b"{\"frames\": 1}"));
    let (session, _video) = mount(backend).await;
    match session.keypoint_status() {
        KeypointStatus::Unavailable { hint } => assert!(hint.contains("could not be read")),
        other => panic!("unexpected status {:?}", other),
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(session.overlay_stats().markers_drawn, 0);
    assert!(session.overlay_stats().ticks > 0);

    let (missing, _video) = mount(Arc::new(ScriptedBackend::new())).await;
    match missing.keypoint_status() {
        KeypointStatus::Unavailable { hint } => assert!(hint.contains("could not be fetched")),
        other => panic!("unexpected status {:?}", other),
    }

    let props = DanceProps {
        video_id: Some("dance/../secret".into()),
        mode: PlaybackMode::Normal,
    };
    let backend = Arc::new(ScriptedBackend::new().with_keypoints_json(KEYPOINTS));
    let (invalid, _video) = mount_with(backend, props, SessionCallbacks::noop()).await;
    match invalid.keypoint_status() {
        KeypointStatus::Unavailable { hint } => assert!(hint.contains("not a valid video id")),
        other => panic!("unexpected status {:?}", other),
    }
}
