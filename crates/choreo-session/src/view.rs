//! Mounted dance session.
//!
//! [`DanceSession`] is what a screen mounts: it wires the state machine,
//! the feedback poller and the overlay loop to one backend, one reference
//! video and one canvas, and tears all of them down together.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

use choreo_client::Backend;
use choreo_core::{
    Error, FeedbackLogEntry, GroundTruthStore, PlaybackMode, ReferenceVideo, Result, SessionId,
};
use choreo_overlay::{
    LoopStats, OverlayCanvas, OverlayConfig, OverlayLoop, OverlayRenderer, OverlaySurface,
};

use crate::clock::SessionClock;
use crate::config::SessionConfig;
use crate::log::FeedbackLog;
use crate::machine::SessionMachine;
use crate::poller::{FeedbackDisplay, FeedbackPoller};
use crate::state::{SessionEvent, SessionState};

/// Inputs of a mounted session
#[derive(Debug, Clone, Default)]
pub struct DanceProps {
    /// Reference video; the configured default when `None`
    pub video_id: Option<String>,
    pub mode: PlaybackMode,
}

type EndCallback = Box<dyn Fn(Vec<FeedbackLogEntry>) + Send + Sync>;
type PracticeCallback = Box<dyn Fn() + Send + Sync>;

/// Hooks into the surrounding screen flow
pub struct SessionCallbacks {
    on_end: EndCallback,
    on_practice: PracticeCallback,
}

impl SessionCallbacks {
    pub fn new<E, P>(on_end: E, on_practice: P) -> Self
    where
        E: Fn(Vec<FeedbackLogEntry>) + Send + Sync + 'static,
        P: Fn() + Send + Sync + 'static,
    {
        Self {
            on_end: Box::new(on_end),
            on_practice: Box::new(on_practice),
        }
    }

    pub fn noop() -> Self {
        Self::new(|_| {}, || {})
    }
}

/// Whether the overlay has reference keypoints to draw
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeypointStatus {
    Loading,
    Loaded { frames: usize },
    /// Overlay shows video only; `hint` tells the user how to recover
    Unavailable { hint: String },
}

pub struct DanceSession {
    id: SessionId,
    video_id: String,
    backend: Arc<dyn Backend>,
    video: Arc<dyn ReferenceVideo>,
    machine: SessionMachine,
    poller: Mutex<FeedbackPoller>,
    overlay: Mutex<OverlayLoop>,
    keypoints: Mutex<KeypointStatus>,
    callbacks: SessionCallbacks,
    torn_down: AtomicBool,
}

impl DanceSession {
    /// Mount a session: start polling and drawing, then load the reference
    /// keypoints. A keypoint failure leaves the overlay drawing video only.
    pub async fn mount(
        backend: Arc<dyn Backend>,
        video: Arc<dyn ReferenceVideo>,
        canvas: Box<dyn OverlayCanvas>,
        props: DanceProps,
        callbacks: SessionCallbacks,
        session_config: SessionConfig,
        overlay_config: &OverlayConfig,
    ) -> Self {
        let id = SessionId::new();
        let video_id = props
            .video_id
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| session_config.default_video_id.clone());

        let clock = Arc::new(Mutex::new(SessionClock::new()));
        let log = Arc::new(Mutex::new(FeedbackLog::new()));

        let mut poller = FeedbackPoller::new(
            backend.clone(),
            clock.clone(),
            log.clone(),
            session_config.poll_interval(),
            &session_config.placeholder,
        );

        let mut surface = OverlaySurface::new();
        surface.attach_video(video.clone());
        surface.attach_canvas(canvas);
        let renderer = Arc::new(OverlayRenderer::new(
            Arc::new(GroundTruthStore::empty()),
            overlay_config,
        ));
        let mut overlay = OverlayLoop::new(
            renderer,
            surface.shared(),
            Duration::from_millis(overlay_config.tick_ms),
        );

        let machine = SessionMachine::new(
            backend.clone(),
            video.clone(),
            session_config,
            props.mode,
            clock,
            log,
        );

        poller.start();
        overlay.start();
        tracing::info!(session = %id, video_id = %video_id, mode = ?props.mode, "dance session mounted");

        let session = Self {
            id,
            video_id,
            backend,
            video,
            machine,
            poller: Mutex::new(poller),
            overlay: Mutex::new(overlay),
            keypoints: Mutex::new(KeypointStatus::Loading),
            callbacks,
            torn_down: AtomicBool::new(false),
        };
        session.reload_keypoints().await;
        session
    }

    /// Fetch the reference keypoints and hand them to the overlay.
    pub async fn reload_keypoints(&self) -> KeypointStatus {
        *self.keypoints.lock() = KeypointStatus::Loading;
        let status = match self.backend.keypoints(&self.video_id).await {
            Ok(store) => {
                let frames = store.len();
                self.overlay.lock().renderer().set_store(Arc::new(store));
                tracing::info!(session = %self.id, frames, "reference keypoints loaded");
                KeypointStatus::Loaded { frames }
            }
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "reference keypoints unavailable");
                self.overlay
                    .lock()
                    .renderer()
                    .set_store(Arc::new(GroundTruthStore::empty()));
                let hint = match e {
                    Error::DataFormat(_) => format!(
                        "Keypoints for '{}' could not be read; re-run processing for this video and reload",
                        self.video_id
                    ),
                    Error::InvalidVideoId(_) => format!(
                        "'{}' is not a valid video id; pick a processed video",
                        self.video_id
                    ),
                    e if e.is_network() => format!(
                        "Keypoints for '{}' could not be fetched; check the backend and reload",
                        self.video_id
                    ),
                    _ => format!("Keypoints for '{}' are unavailable; reload to retry", self.video_id),
                };
                KeypointStatus::Unavailable { hint }
            }
        };
        *self.keypoints.lock() = status.clone();
        status
    }

    /// Start or restart the attempt.
    ///
    /// On restart the poller and overlay loop are cancelled and
    /// re-established, and the log and clock start from empty.
    pub async fn start(&self) -> Result<()> {
        if self.torn_down.load(Ordering::SeqCst) {
            return Err(Error::InvalidTransition {
                state: "torn down".to_string(),
                action: "start",
            });
        }
        self.machine
            .start_with(|| {
                self.poller.lock().restart();
                self.overlay.lock().restart();
            })
            .await
    }

    /// End the attempt and hand its log to the end callback.
    pub async fn end(&self) -> Result<Vec<FeedbackLogEntry>> {
        let entries = self.machine.end().await?;
        (self.callbacks.on_end)(entries.clone());
        Ok(entries)
    }

    /// Reset backend feedback and switch to practice.
    pub async fn practice(&self) -> Result<()> {
        self.machine.clear_error();
        if let Err(e) = self.backend.reset_feedback().await {
            self.machine.set_error("start practice", &e);
            return Err(e);
        }
        tracing::info!(session = %self.id, "switching to practice");
        (self.callbacks.on_practice)();
        Ok(())
    }

    /// Cancel every timer and in-flight request and pause the video.
    pub fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.machine.cancel_countdown();
        self.poller.lock().stop();
        self.overlay.lock().stop();
        self.video.pause();
        tracing::info!(session = %self.id, "dance session torn down");
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn state(&self) -> SessionState {
        self.machine.state()
    }

    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.machine.watch()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.machine.subscribe()
    }

    pub fn button_label(&self) -> &'static str {
        self.machine.button_label()
    }

    pub fn countdown_label(&self) -> Option<&'static str> {
        self.state().countdown_label()
    }

    pub fn feedback(&self) -> FeedbackDisplay {
        self.poller.lock().display()
    }

    pub fn error_banner(&self) -> Option<String> {
        self.machine.error()
    }

    pub fn keypoint_status(&self) -> KeypointStatus {
        self.keypoints.lock().clone()
    }

    /// Keypoints the overlay is drawing from; empty until loaded
    pub fn reference_keypoints(&self) -> Arc<GroundTruthStore> {
        self.overlay.lock().renderer().store()
    }

    pub fn log(&self) -> Vec<FeedbackLogEntry> {
        self.machine.log_snapshot()
    }

    /// Annotated webcam stream to show next to the reference video
    pub fn webcam_feed_url(&self) -> String {
        self.backend.video_feed_url()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.lock().is_running()
    }

    pub fn is_drawing(&self) -> bool {
        self.overlay.lock().is_running()
    }

    pub fn overlay_stats(&self) -> LoopStats {
        self.overlay.lock().stats()
    }
}

impl Drop for DanceSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
