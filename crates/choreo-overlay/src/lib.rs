//! # Choreo-Overlay
//!
//! Paints the reference video and its ground-truth keypoints onto a canvas,
//! frame-synchronously and without the backend.
//!
//! ## Per-tick contract
//!
//! 1. Draw the current video frame into the fixed-size canvas
//! 2. `frame_index = floor(current_time * 30)` (see [`FrameIndexing`])
//! 3. If the index is inside the keypoint sequence, draw one filled circle
//!    per joint at `(x * width, y * height)`; otherwise draw the frame only
//!
//! [`OverlayLoop`] repeats this on every display tick until it is stopped
//! or dropped.

pub mod animation;
pub mod canvas;
pub mod config;
pub mod renderer;

pub use animation::*;
pub use canvas::*;
pub use config::*;
pub use renderer::*;
