//! Overlay configuration.

use serde::{Deserialize, Serialize};

use choreo_core::CanvasSize;

use crate::renderer::FrameIndexing;

/// Overlay renderer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Canvas width in pixels
    pub canvas_width: u32,

    /// Canvas height in pixels
    pub canvas_height: u32,

    /// Keypoint marker radius in pixels
    pub marker_radius: i32,

    /// Marker colour as RGBA
    pub marker_color: [u8; 4],

    /// Playback time to keypoint frame mapping
    pub indexing: FrameIndexing,

    /// Display tick period (milliseconds)
    pub tick_ms: u64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            canvas_width: 380,
            canvas_height: 640,
            marker_radius: 5,
            marker_color: [255, 45, 85, 255],
            indexing: FrameIndexing::default(),
            tick_ms: 16,
        }
    }
}

impl OverlayConfig {
    pub fn canvas_size(&self) -> CanvasSize {
        CanvasSize::new(self.canvas_width, self.canvas_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OverlayConfig::default();
        assert_eq!(config.canvas_size(), CanvasSize::new(380, 640));
        assert_eq!(config.marker_radius, 5);
        assert_eq!(config.indexing, FrameIndexing::FixedRate { fps: 30.0 });
    }

    #[test]
    fn test_partial_override() {
        let config: OverlayConfig = serde_json::from_str(
            r#"{"marker_radius": 8, "indexing": {"kind": "duration_normalized"}}"#,
        )
        .unwrap();
        assert_eq!(config.marker_radius, 8);
        assert_eq!(config.indexing, FrameIndexing::DurationNormalized);
        assert_eq!(config.tick_ms, 16);
    }
}
