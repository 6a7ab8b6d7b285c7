//! Analytics configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Pair log entries with the backend's saved user-pose frames
    pub fetch_saved_frames: bool,

    /// Ask the backend for a natural-language summary
    pub humanize: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            fetch_saved_frames: true,
            humanize: true,
        }
    }
}
