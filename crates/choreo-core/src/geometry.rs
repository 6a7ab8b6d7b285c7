//! Geometric utilities for mapping normalised keypoints onto a canvas.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// 2-D coordinate relative to the video dimensions, nominally in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_nalgebra(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }
}

/// Pixel dimensions of a drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Scale a normalised point to pixel space: `(x * width, y * height)`.
    pub fn project(&self, point: NormalizedPoint) -> Point2<f64> {
        let p = point.to_nalgebra();
        Point2::new(p.x * self.width as f64, p.y * self.height as f64)
    }

    /// Project and round to integer pixel coordinates for raster drawing.
    pub fn project_pixel(&self, point: NormalizedPoint) -> (i32, i32) {
        let p = self.project(point);
        (p.x.round() as i32, p.y.round() as i32)
    }
}
