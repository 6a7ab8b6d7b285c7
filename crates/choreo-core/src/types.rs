//! Fundamental types for the Choreo session engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of one mounted dance session (used for tracing only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Feedback category derived from the backend classification string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedbackCategory {
    /// Pose matches the reference ("Perfect!")
    Positive,
    /// No body detected in the webcam frame
    Neutral,
    /// Anything else: the dancer should correct something
    Corrective,
}

impl FeedbackCategory {
    /// Classify a raw backend string by substring.
    pub fn classify(text: &str) -> Self {
        if text.contains("Perfect") {
            FeedbackCategory::Positive
        } else if text.contains("Pose Not Detected") {
            FeedbackCategory::Neutral
        } else {
            FeedbackCategory::Corrective
        }
    }

    /// Display colour (hex RGB) used for feedback text and timeline segments
    pub fn color(&self) -> &'static str {
        match self {
            FeedbackCategory::Positive => "#2ecc71",
            FeedbackCategory::Neutral => "#95a5a6",
            FeedbackCategory::Corrective => "#f39c12",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            FeedbackCategory::Positive => "feedback-perfect",
            FeedbackCategory::Neutral => "feedback-neutral",
            FeedbackCategory::Corrective => "feedback-warning",
        }
    }
}

/// Opaque classification string produced by the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackSample(String);

impl FeedbackSample {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn category(&self) -> FeedbackCategory {
        FeedbackCategory::classify(&self.0)
    }
}

impl From<&str> for FeedbackSample {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for FeedbackSample {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl fmt::Display for FeedbackSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One feedback transition recorded during a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackLogEntry {
    /// Whole seconds since the most recent playback start
    #[serde(rename = "time")]
    pub elapsed_seconds: u64,
    pub feedback: FeedbackSample,
}

impl FeedbackLogEntry {
    pub fn new(elapsed_seconds: u64, feedback: impl Into<FeedbackSample>) -> Self {
        Self {
            elapsed_seconds,
            feedback: feedback.into(),
        }
    }

    pub fn category(&self) -> FeedbackCategory {
        self.feedback.category()
    }
}

/// Playback speed of a dance attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    #[default]
    Normal,
    /// Half-speed practice
    Slow,
}

impl PlaybackMode {
    pub fn playback_rate(&self) -> f64 {
        match self {
            PlaybackMode::Normal => 1.0,
            PlaybackMode::Slow => 0.5,
        }
    }

    /// Value of the `mode` query parameter sent to `start_processing`
    pub fn query_value(&self) -> Option<&'static str> {
        match self {
            PlaybackMode::Normal => None,
            PlaybackMode::Slow => Some("slow"),
        }
    }
}
