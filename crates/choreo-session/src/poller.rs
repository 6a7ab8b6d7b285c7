//! Feedback poller.
//!
//! One repeating timer per run. Every tick spawns a `/feedback` fetch
//! without waiting for the previous one; responses are applied through a
//! shared "last seen" value, so the timer never needs to be rebuilt when
//! feedback changes.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};

use choreo_client::Backend;
use choreo_core::{FeedbackCategory, FeedbackSample, Result};

use crate::clock::SessionClock;
use crate::log::FeedbackLog;

/// What the feedback panel currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackDisplay {
    pub text: String,
    pub category: FeedbackCategory,
    /// `true` while the placeholder is shown instead of backend feedback
    pub waiting: bool,
    pub consecutive_failures: u32,
}

impl FeedbackDisplay {
    fn placeholder(text: &str) -> Self {
        Self {
            text: text.to_string(),
            category: FeedbackCategory::Neutral,
            waiting: true,
            consecutive_failures: 0,
        }
    }
}

#[derive(Debug)]
struct PollState {
    /// Bumped on every stop; responses from older runs are dropped
    epoch: u64,
    next_seq: u64,
    applied_seq: u64,
    last_seen: Option<FeedbackSample>,
    display: FeedbackDisplay,
}

/// Everything a poll response is applied to
#[derive(Clone)]
struct PollTarget {
    state: Arc<Mutex<PollState>>,
    clock: Arc<Mutex<SessionClock>>,
    log: Arc<Mutex<FeedbackLog>>,
    placeholder: Arc<str>,
}

impl PollTarget {
    fn next_seq(&self) -> u64 {
        let mut state = self.state.lock();
        state.next_seq += 1;
        state.next_seq
    }

    fn apply(&self, epoch: u64, seq: u64, result: Result<FeedbackSample>) {
        let mut state = self.state.lock();
        if state.epoch != epoch || seq <= state.applied_seq {
            tracing::trace!(epoch, seq, "discarding stale feedback response");
            return;
        }
        state.applied_seq = seq;

        match result {
            Ok(sample) => {
                state.display = FeedbackDisplay {
                    text: sample.as_str().to_string(),
                    category: sample.category(),
                    waiting: false,
                    consecutive_failures: 0,
                };
                if state.last_seen.as_ref() == Some(&sample) {
                    return;
                }
                let elapsed = self.clock.lock().elapsed_seconds();
                tracing::debug!(elapsed, feedback = %sample, "feedback changed");
                state.last_seen = Some(sample.clone());
                self.log.lock().append(elapsed, sample);
            }
            Err(e) => {
                let failures = state.display.consecutive_failures + 1;
                tracing::warn!(failures, error = %e, "feedback poll failed");
                state.display = FeedbackDisplay {
                    consecutive_failures: failures,
                    ..FeedbackDisplay::placeholder(&self.placeholder)
                };
            }
        }
    }
}

/// Samples backend feedback on a fixed period and appends transitions to
/// the session log.
pub struct FeedbackPoller {
    backend: Arc<dyn Backend>,
    target: PollTarget,
    interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl FeedbackPoller {
    pub fn new(
        backend: Arc<dyn Backend>,
        clock: Arc<Mutex<SessionClock>>,
        log: Arc<Mutex<FeedbackLog>>,
        interval: Duration,
        placeholder: &str,
    ) -> Self {
        Self {
            backend,
            target: PollTarget {
                state: Arc::new(Mutex::new(PollState {
                    epoch: 0,
                    next_seq: 0,
                    applied_seq: 0,
                    last_seen: None,
                    display: FeedbackDisplay::placeholder(placeholder),
                })),
                clock,
                log,
                placeholder: Arc::from(placeholder),
            },
            interval,
            handle: None,
        }
    }

    /// Spawn the poll timer; the first fetch happens one period from now.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        let backend = self.backend.clone();
        let target = self.target.clone();
        let period = self.interval;
        let epoch = target.state.lock().epoch;

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // Dropped with this task, which aborts fetches still in flight
            let mut in_flight = JoinSet::new();

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let seq = target.next_seq();
                        let backend = backend.clone();
                        in_flight.spawn(async move { (seq, backend.feedback().await) });
                    }
                    Some(joined) = in_flight.join_next() => {
                        if let Ok((seq, result)) = joined {
                            target.apply(epoch, seq, result);
                        }
                    }
                }
            }
        }));
        tracing::debug!(epoch, period_ms = period.as_millis() as u64, "feedback poller started");
    }

    /// Cancel the timer and every fetch in flight.
    pub fn stop(&mut self) {
        self.target.state.lock().epoch += 1;
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("feedback poller stopped");
        }
    }

    /// Stop, forget the last seen feedback, and start again.
    pub fn restart(&mut self) {
        self.stop();
        {
            let mut state = self.target.state.lock();
            state.last_seen = None;
            state.applied_seq = state.next_seq;
            state.display = FeedbackDisplay::placeholder(&self.target.placeholder);
        }
        self.start();
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn display(&self) -> FeedbackDisplay {
        self.target.state.lock().display.clone()
    }

    #[cfg(test)]
    fn epoch(&self) -> u64 {
        self.target.state.lock().epoch
    }
}

impl Drop for FeedbackPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use choreo_client::{BackendCall, ScriptedBackend};

    struct Fixture {
        backend: Arc<ScriptedBackend>,
        clock: Arc<Mutex<SessionClock>>,
        log: Arc<Mutex<FeedbackLog>>,
        poller: FeedbackPoller,
    }

    fn fixture(backend: ScriptedBackend) -> Fixture {
        let backend = Arc::new(backend);
        let clock = Arc::new(Mutex::new(SessionClock::new()));
        let log = Arc::new(Mutex::new(FeedbackLog::new()));
        let poller = FeedbackPoller::new(
            backend.clone(),
            clock.clone(),
            log.clone(),
            Duration::from_secs(1),
            "Waiting for connection...",
        );
        Fixture {
            backend,
            clock,
            log,
            poller,
        }
    }

    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_logs_transitions_only() {
        let mut f = fixture(ScriptedBackend::new().with_feedback("Perfect!"));
        f.backend
            .queue_feedback([Some("Pose Not Detected"), Some("Pose Not Detected"), Some("Raise your arms")]);
        f.clock.lock().reset();
        f.poller.start();

        tokio::time::sleep(Duration::from_millis(4500)).await;
        settle().await;

        let log = f.log.lock().to_vec();
        let texts: Vec<&str> = log.iter().map(|e| e.feedback.as_str()).collect();
        assert_eq!(texts, vec!["Pose Not Detected", "Raise your arms", "Perfect!"]);
        let times: Vec<u64> = log.iter().map(|e| e.elapsed_seconds).collect();
        assert_eq!(times, vec![1, 3, 4]);
        assert_eq!(f.backend.count(&BackendCall::Feedback), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_shows_placeholder() {
        let mut f = fixture(ScriptedBackend::new().with_feedback("Perfect!"));
        f.poller.start();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        settle().await;
        assert_eq!(f.poller.display().text, "Perfect!");

        f.backend.fail_feedback();
        tokio::time::sleep(Duration::from_secs(3)).await;
        settle().await;

        let display = f.poller.display();
        assert!(display.waiting);
        assert_eq!(display.text, "Waiting for connection...");
        assert_eq!(display.consecutive_failures, 3);
        assert_eq!(f.log.lock().len(), 1);

        // Same feedback after recovery is shown but not logged again
        f.backend.set_feedback("Perfect!");
        tokio::time::sleep(Duration::from_secs(1)).await;
        settle().await;
        assert_eq!(f.poller.display().text, "Perfect!");
        assert_eq!(f.log.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetches_overlap() {
        let mut f = fixture(ScriptedBackend::new().with_feedback_latency(Duration::from_millis(2500)));
        f.backend.queue_feedback([Some("A"), Some("B"), Some("C")]);
        f.poller.start();

        // Ticks at 1s, 2s, 3s fire while earlier fetches are still pending
        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert_eq!(f.backend.count(&BackendCall::Feedback), 3);
        tokio::time::sleep(Duration::from_secs(3)).await;
        settle().await;

        let texts: Vec<String> = f.log.lock().entries().iter().map(|e| e.feedback.to_string()).collect();
        assert_eq!(&texts[..3], &["A", "B", "C"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_discards_in_flight() {
        let mut f = fixture(ScriptedBackend::new().with_feedback_latency(Duration::from_secs(2)));
        f.poller.start();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(f.backend.count(&BackendCall::Feedback), 1);

        f.poller.stop();
        tokio::time::sleep(Duration::from_secs(5)).await;
        settle().await;

        assert!(f.log.lock().is_empty());
        assert_eq!(f.backend.count(&BackendCall::Feedback), 1);
        assert!(!f.poller.is_running());
        assert_eq!(f.poller.epoch(), 1);
    }
}
