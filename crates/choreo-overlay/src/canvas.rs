//! Drawing surfaces for the overlay.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_circle_mut;
use std::path::Path;

use choreo_core::{CanvasSize, Error, Result, VideoFrame};

/// Surface the overlay renderer paints onto
pub trait OverlayCanvas: Send {
    fn size(&self) -> CanvasSize;

    /// Replace the canvas contents with `frame`, scaled to the canvas size.
    fn draw_video_frame(&mut self, frame: &VideoFrame);

    fn fill_circle(&mut self, center: (i32, i32), radius: i32, color: Rgba<u8>);
}

/// In-memory RGBA canvas
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    image: RgbaImage,
}

impl RasterCanvas {
    pub fn new(size: CanvasSize) -> Self {
        Self {
            image: RgbaImage::new(size.width, size.height),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Encode the current contents as PNG.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| Error::Serialization(format!("failed to write {}: {}", path.display(), e)))
    }
}

impl OverlayCanvas for RasterCanvas {
    fn size(&self) -> CanvasSize {
        CanvasSize::new(self.image.width(), self.image.height())
    }

    fn draw_video_frame(&mut self, frame: &VideoFrame) {
        let (width, height) = self.image.dimensions();
        if frame.dimensions() == (width, height) {
            self.image.copy_from_slice(frame.as_raw());
        } else {
            let scaled = imageops::resize(frame, width, height, FilterType::Triangle);
            imageops::replace(&mut self.image, &scaled, 0, 0);
        }
    }

    fn fill_circle(&mut self, center: (i32, i32), radius: i32, color: Rgba<u8>) {
        draw_filled_circle_mut(&mut self.image, center, radius, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_is_scaled_to_canvas() {
        let mut canvas = RasterCanvas::new(CanvasSize::new(20, 40));
        let frame = RgbaImage::from_pixel(10, 10, Rgba([10, 200, 30, 255]));
        canvas.draw_video_frame(&frame);

        assert_eq!(canvas.image().dimensions(), (20, 40));
        assert_eq!(*canvas.image().get_pixel(19, 39), Rgba([10, 200, 30, 255]));
    }

    #[test]
    fn test_circle_stays_in_bounds() {
        let mut canvas = RasterCanvas::new(CanvasSize::new(8, 8));
        let red = Rgba([255, 0, 0, 255]);
        // Partly off-canvas circles are clipped
        canvas.fill_circle((0, 0), 3, red);
        canvas.fill_circle((100, 100), 3, red);

        assert_eq!(*canvas.image().get_pixel(0, 0), red);
        assert_eq!(*canvas.image().get_pixel(7, 7), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlay.png");

        let mut canvas = RasterCanvas::new(CanvasSize::new(4, 4));
        canvas.fill_circle((2, 2), 1, Rgba([0, 0, 255, 255]));
        canvas.save_png(&path).unwrap();

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 4));
        assert_eq!(*decoded.get_pixel(2, 2), Rgba([0, 0, 255, 255]));
    }
}
