//! Session timing configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Hold of each numbered countdown step (milliseconds)
    pub countdown_step_ms: u64,

    /// Hold of the GO step (milliseconds)
    pub go_hold_ms: u64,

    /// Pause between stopping and restarting backend processing (milliseconds)
    pub settle_ms: u64,

    /// Feedback poll period (milliseconds)
    pub poll_interval_ms: u64,

    /// Feedback shown while the backend is unreachable
    pub placeholder: String,

    /// Reference video used when none is given
    pub default_video_id: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            countdown_step_ms: 1000,
            go_hold_ms: 800,
            settle_ms: 300,
            poll_interval_ms: 1000,
            placeholder: "Waiting for connection...".to_string(),
            default_video_id: "hot_to_go".to_string(),
        }
    }
}

impl SessionConfig {
    pub fn countdown_step(&self) -> Duration {
        Duration::from_millis(self.countdown_step_ms)
    }

    pub fn go_hold(&self) -> Duration {
        Duration::from_millis(self.go_hold_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
