//! # Choreo-Client
//!
//! Client side of the pose-feedback backend.
//!
//! ## Endpoints
//!
//! - `GET /feedback` - current feedback classification
//! - `GET /start_processing[?mode=slow]` - begin scoring webcam frames
//! - `GET /stop_processing` - stop scoring
//! - `GET /reset_feedback` - reset the backend's feedback state
//! - `POST /clear_saved_frames` - purge captured frames from a prior attempt
//! - `GET /video_feed` - MJPEG stream of the annotated webcam
//! - `GET /keypoints/{video_id}-keypoints.json` - ground-truth keypoints
//! - `GET /list_saved_frames` - captured user-pose screenshots
//! - `POST /humanize_feedback` - natural-language session summary
//! - `POST /process_tiktok` - ingest a new reference video

pub mod backend;
pub mod http;
pub mod messages;

#[cfg(feature = "mock")]
pub mod mock;

pub use backend::*;
pub use http::*;
pub use messages::*;

#[cfg(feature = "mock")]
pub use mock::*;
