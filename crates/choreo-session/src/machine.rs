//! Session state machine.
//!
//! Every transition goes through [`SessionMachine`]: the countdown runs as a
//! single cancellable task with one timer per step, and the entry into
//! `Playing` performs the backend handshake before the clock starts.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use choreo_client::Backend;
use choreo_core::{Error, FeedbackLogEntry, PlaybackMode, ReferenceVideo, Result};

use crate::clock::SessionClock;
use crate::config::SessionConfig;
use crate::log::FeedbackLog;
use crate::state::{CountdownStep, SessionEvent, SessionState};

const EVENT_CAPACITY: usize = 64;

struct MachineInner {
    backend: Arc<dyn Backend>,
    video: Arc<dyn ReferenceVideo>,
    config: SessionConfig,
    mode: PlaybackMode,
    clock: Arc<Mutex<SessionClock>>,
    log: Arc<Mutex<FeedbackLog>>,
    state: watch::Sender<SessionState>,
    events: broadcast::Sender<SessionEvent>,
    has_played: AtomicBool,
    /// Set while an action awaits the backend
    busy: AtomicBool,
    error: Mutex<Option<String>>,
}

impl MachineInner {
    fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    fn transition(&self, next: SessionState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            tracing::info!(from = %previous, to = %next, "session state changed");
            let _ = self.events.send(SessionEvent::StateChanged(next));
        }
    }

    fn fail(&self, action: &str, error: &Error) {
        tracing::error!(action, %error, "session action failed");
        let message = format!("Failed to {}: {}", action, error);
        *self.error.lock() = Some(message.clone());
        let _ = self.events.send(SessionEvent::Error(message));
    }

    async fn run_countdown(&self) {
        let mut step = Some(CountdownStep::FIRST);
        while let Some(current) = step {
            self.transition(SessionState::CountingDown(current));
            tokio::time::sleep(current.hold(&self.config)).await;
            step = current.next();
        }
    }

    /// State to fall back to when playback could not be entered. The video
    /// is paused and processing stopped by then, so an earlier attempt is
    /// over.
    fn settled_state(&self) -> SessionState {
        if self.has_played.load(Ordering::SeqCst) {
            SessionState::Ended
        } else {
            SessionState::Idle
        }
    }

    /// Rewind, restart backend processing, then play and start the clock.
    async fn enter_playing(&self) -> Result<()> {
        self.video.pause();
        self.video.seek(0.0);

        self.backend.stop_processing().await?;
        tokio::time::sleep(self.config.settle()).await;
        self.backend.start_processing(self.mode).await?;

        self.video.set_playback_rate(self.mode.playback_rate());
        self.video.play()?;

        self.clock.lock().reset();
        self.has_played.store(true, Ordering::SeqCst);
        self.transition(SessionState::Playing);
        Ok(())
    }
}

/// Owns the session state and clock and drives backend calls at each
/// transition.
pub struct SessionMachine {
    inner: Arc<MachineInner>,
    countdown: Mutex<Option<JoinHandle<()>>>,
}

impl SessionMachine {
    pub fn new(
        backend: Arc<dyn Backend>,
        video: Arc<dyn ReferenceVideo>,
        config: SessionConfig,
        mode: PlaybackMode,
        clock: Arc<Mutex<SessionClock>>,
        log: Arc<Mutex<FeedbackLog>>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(MachineInner {
                backend,
                video,
                config,
                mode,
                clock,
                log,
                state,
                events,
                has_played: AtomicBool::new(false),
                busy: AtomicBool::new(false),
                error: Mutex::new(None),
            }),
            countdown: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.state()
    }

    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub fn has_played(&self) -> bool {
        self.inner.has_played.load(Ordering::SeqCst)
    }

    /// "Play" before the first attempt, "Restart" afterwards
    pub fn button_label(&self) -> &'static str {
        if self.has_played() {
            "Restart"
        } else {
            "Play"
        }
    }

    /// Message of the most recent failed action
    pub fn error(&self) -> Option<String> {
        self.inner.error.lock().clone()
    }

    pub fn set_error(&self, action: &str, error: &Error) {
        self.inner.fail(action, error);
    }

    pub fn clear_error(&self) {
        self.inner.error.lock().take();
    }

    pub fn log_snapshot(&self) -> Vec<FeedbackLogEntry> {
        self.inner.log.lock().to_vec()
    }

    pub async fn start(&self) -> Result<()> {
        self.start_with(|| {}).await
    }

    /// Begin (or restart) an attempt.
    ///
    /// Saved frames are cleared first; if that fails the state is left
    /// untouched. `before_countdown` runs once the backend has accepted the
    /// start, right before the log and clock are cleared.
    pub async fn start_with<F>(&self, before_countdown: F) -> Result<()>
    where
        F: FnOnce() + Send,
    {
        let previous = self.state();
        if previous.is_counting_down() {
            return Err(Error::InvalidTransition {
                state: previous.to_string(),
                action: "start",
            });
        }
        let _guard = self.acquire("start")?;
        self.clear_error();

        if let Err(e) = self.inner.backend.clear_saved_frames().await {
            self.inner.fail("start", &e);
            return Err(e);
        }

        self.cancel_countdown();
        before_countdown();
        self.inner.log.lock().clear();
        self.inner.clock.lock().clear();
        tracing::info!(mode = ?self.inner.mode, restart = previous != SessionState::Idle, "starting countdown");

        // The first step is visible before this returns
        self.inner
            .transition(SessionState::CountingDown(CountdownStep::FIRST));
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            inner.run_countdown().await;
            if let Err(e) = inner.enter_playing().await {
                inner.fail("start playback", &e);
                inner.transition(inner.settled_state());
            }
        });
        *self.countdown.lock() = Some(handle);
        Ok(())
    }

    /// Finish the attempt and return its log.
    pub async fn end(&self) -> Result<Vec<FeedbackLogEntry>> {
        let state = self.state();
        if !state.is_playing() {
            return Err(Error::InvalidTransition {
                state: state.to_string(),
                action: "end",
            });
        }
        let _guard = self.acquire("end")?;

        self.inner.video.pause();
        let result = async {
            self.inner.backend.stop_processing().await?;
            self.inner.backend.reset_feedback().await
        }
        .await;
        if let Err(e) = result {
            self.inner.fail("end session", &e);
            return Err(e);
        }

        let entries = self.log_snapshot();
        self.inner.transition(SessionState::Ended);
        tracing::info!(entries = entries.len(), "session ended");
        let _ = self.inner.events.send(SessionEvent::Ended(entries.clone()));
        Ok(entries)
    }

    /// Abort a pending countdown or playback handshake.
    pub fn cancel_countdown(&self) {
        if let Some(handle) = self.countdown.lock().take() {
            handle.abort();
        }
    }

    fn acquire(&self, action: &'static str) -> Result<BusyGuard<'_>> {
        if self.inner.busy.swap(true, Ordering::SeqCst) {
            return Err(Error::InvalidTransition {
                state: "busy".to_string(),
                action,
            });
        }
        Ok(BusyGuard(&self.inner.busy))
    }
}

impl Drop for SessionMachine {
    fn drop(&mut self) {
        self.cancel_countdown();
    }
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
