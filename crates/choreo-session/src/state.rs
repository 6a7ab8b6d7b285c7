//! Session states and events.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use choreo_core::FeedbackLogEntry;

use crate::config::SessionConfig;

/// One stage of the pre-play countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CountdownStep {
    Count3,
    Count2,
    Count1,
    Go,
}

impl CountdownStep {
    pub const FIRST: CountdownStep = CountdownStep::Count3;

    /// Following step, `None` after GO.
    pub fn next(self) -> Option<CountdownStep> {
        match self {
            CountdownStep::Count3 => Some(CountdownStep::Count2),
            CountdownStep::Count2 => Some(CountdownStep::Count1),
            CountdownStep::Count1 => Some(CountdownStep::Go),
            CountdownStep::Go => None,
        }
    }

    /// How long this step stays on screen
    pub fn hold(self, config: &SessionConfig) -> Duration {
        match self {
            CountdownStep::Go => config.go_hold(),
            _ => config.countdown_step(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CountdownStep::Count3 => "3",
            CountdownStep::Count2 => "2",
            CountdownStep::Count1 => "1",
            CountdownStep::Go => "GO",
        }
    }
}

/// Lifecycle state of a dance session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum SessionState {
    #[default]
    Idle,
    CountingDown(CountdownStep),
    Playing,
    Ended,
}

impl SessionState {
    pub fn is_counting_down(&self) -> bool {
        matches!(self, SessionState::CountingDown(_))
    }

    pub fn is_playing(&self) -> bool {
        *self == SessionState::Playing
    }

    /// Countdown text to overlay on the video, if any
    pub fn countdown_label(&self) -> Option<&'static str> {
        match self {
            SessionState::CountingDown(step) => Some(step.label()),
            _ => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::CountingDown(step) => write!(f, "counting down ({})", step.label()),
            SessionState::Playing => write!(f, "playing"),
            SessionState::Ended => write!(f, "ended"),
        }
    }
}

/// Notification published by the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged(SessionState),
    /// A user action failed; the message is shown on the error banner
    Error(String),
    /// The attempt finished with this log
    Ended(Vec<FeedbackLogEntry>),
}
