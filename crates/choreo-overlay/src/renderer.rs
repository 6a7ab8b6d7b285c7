//! Per-tick overlay rendering.

use image::Rgba;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use choreo_core::{CanvasSize, GroundTruthStore, NormalizedPoint, ReferenceVideo, DEFAULT_SAMPLE_RATE};

use crate::canvas::OverlayCanvas;
use crate::config::OverlayConfig;

/// How a playback time selects a keypoint frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameIndexing {
    /// `floor(t * fps)`
    FixedRate { fps: f64 },
    /// `floor(t / duration * len)`; fixed-rate at the store's sample rate
    /// while the duration is unknown
    DurationNormalized,
}

impl Default for FrameIndexing {
    fn default() -> Self {
        FrameIndexing::FixedRate {
            fps: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl FrameIndexing {
    /// Frame index for `current_time`. Non-finite times map to `-1`, which
    /// is never a valid index.
    pub fn frame_index(&self, current_time: f64, duration: Option<f64>, store: &GroundTruthStore) -> i64 {
        if !current_time.is_finite() {
            return -1;
        }
        match *self {
            FrameIndexing::FixedRate { fps } => (current_time * fps).floor() as i64,
            FrameIndexing::DurationNormalized => match duration {
                Some(d) if d.is_finite() && d > 0.0 => {
                    (current_time / d * store.len() as f64).floor() as i64
                }
                _ => store.index_at(current_time),
            },
        }
    }
}

/// What a single tick drew
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Nothing drawn: canvas or video missing, or no frame available
    Skipped,
    /// Video frame drawn; index outside the keypoint sequence
    FrameOnly { frame_index: i64 },
    /// Video frame plus one marker per present joint
    Markers { frame_index: i64, drawn: usize },
}

impl RenderOutcome {
    pub fn markers_drawn(&self) -> usize {
        match self {
            RenderOutcome::Markers { drawn, .. } => *drawn,
            _ => 0,
        }
    }
}

/// Paints the reference frame and its ground-truth markers.
///
/// The keypoint store can be swapped while a loop is running, so markers
/// appear as soon as a late keypoint fetch completes.
pub struct OverlayRenderer {
    store: RwLock<Arc<GroundTruthStore>>,
    indexing: FrameIndexing,
    marker_radius: i32,
    marker_color: Rgba<u8>,
}

impl OverlayRenderer {
    pub fn new(store: Arc<GroundTruthStore>, config: &OverlayConfig) -> Self {
        Self {
            store: RwLock::new(store),
            indexing: config.indexing,
            marker_radius: config.marker_radius.max(1),
            marker_color: Rgba(config.marker_color),
        }
    }

    pub fn set_store(&self, store: Arc<GroundTruthStore>) {
        tracing::debug!(frames = store.len(), "overlay keypoints replaced");
        *self.store.write() = store;
    }

    pub fn store(&self) -> Arc<GroundTruthStore> {
        self.store.read().clone()
    }

    /// Whether a marker at `point` would touch the canvas at all.
    fn reaches_canvas(&self, size: CanvasSize, point: NormalizedPoint) -> bool {
        let p = size.project(point);
        let reach = self.marker_radius as f64;
        (-reach..=size.width as f64 + reach).contains(&p.x)
            && (-reach..=size.height as f64 + reach).contains(&p.y)
    }

    /// Draw one tick.
    pub fn render(&self, video: &dyn ReferenceVideo, canvas: &mut dyn OverlayCanvas) -> RenderOutcome {
        if !video.is_ready() {
            return RenderOutcome::Skipped;
        }
        let Some(frame) = video.current_frame() else {
            return RenderOutcome::Skipped;
        };
        canvas.draw_video_frame(&frame);

        let store = self.store();
        let frame_index = self
            .indexing
            .frame_index(video.current_time(), video.duration(), &store);

        let Some(ground_truth) = store.frame(frame_index) else {
            return RenderOutcome::FrameOnly { frame_index };
        };

        let size = canvas.size();
        let mut drawn = 0;
        for (_, point) in ground_truth.joints() {
            if !self.reaches_canvas(size, point) {
                continue;
            }
            canvas.fill_circle(size.project_pixel(point), self.marker_radius, self.marker_color);
            drawn += 1;
        }
        RenderOutcome::Markers { frame_index, drawn }
    }
}
