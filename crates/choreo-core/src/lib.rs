//! # Choreo-Core
//!
//! Core types and utilities for the Choreo dance-mirroring session engine.
//!
//! - [`keypoints`]: the ground-truth keypoint store for a reference video
//! - [`types`]: feedback samples, categories and log entries
//! - [`media`]: the reference video seam used by the renderer and the
//!   session state machine
//! - [`geometry`]: normalised-to-pixel projection

pub mod error;
pub mod geometry;
pub mod keypoints;
pub mod media;
pub mod types;

pub use error::{Error, Result};
pub use geometry::*;
pub use keypoints::*;
pub use media::*;
pub use types::*;
