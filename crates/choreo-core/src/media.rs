//! Reference video seam.
//!
//! The session state machine controls playback (play/pause/seek) and the
//! overlay renderer reads the playhead and the current frame. Both go
//! through [`ReferenceVideo`] so the engine never depends on a concrete
//! player.

use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::geometry::CanvasSize;

/// Decoded RGBA frame of the reference video
pub type VideoFrame = RgbaImage;

/// Playback handle for the reference dance video
pub trait ReferenceVideo: Send + Sync {
    /// Playhead position in seconds
    fn current_time(&self) -> f64;

    /// Total length in seconds, if known
    fn duration(&self) -> Option<f64>;

    /// Whether a frame is available for drawing
    fn is_ready(&self) -> bool;

    fn is_playing(&self) -> bool;

    /// Start playback; may be rejected (e.g. autoplay policy)
    fn play(&self) -> Result<()>;

    fn pause(&self);

    fn seek(&self, seconds: f64);

    fn set_playback_rate(&self, rate: f64);

    fn playback_rate(&self) -> f64;

    /// Frame at the current playhead
    fn current_frame(&self) -> Option<VideoFrame>;
}

#[derive(Debug)]
struct ClockState {
    /// Playhead at the last anchor
    base: f64,
    /// Wall-clock instant playback resumed, `None` while paused
    anchor: Option<Instant>,
    rate: f64,
}

/// Reference video driven by the runtime clock.
///
/// Produces flat frames with a progress bar; used for headless runs and
/// tests where no decoder is available. Time comes from `tokio::time`, so
/// paused-clock tests control it exactly.
pub struct ClockVideo {
    state: Mutex<ClockState>,
    size: CanvasSize,
    duration: Option<f64>,
    background: Rgba<u8>,
    playback_blocked: AtomicBool,
}

impl ClockVideo {
    pub fn new(size: CanvasSize, duration: Option<f64>) -> Self {
        Self {
            state: Mutex::new(ClockState {
                base: 0.0,
                anchor: None,
                rate: 1.0,
            }),
            size,
            duration,
            background: Rgba([24, 24, 32, 255]),
            playback_blocked: AtomicBool::new(false),
        }
    }

    /// Make subsequent `play()` calls fail, as a browser autoplay policy would.
    pub fn block_playback(&self, blocked: bool) {
        self.playback_blocked.store(blocked, Ordering::SeqCst);
    }

    fn position(&self, state: &ClockState) -> f64 {
        let running = state
            .anchor
            .map(|a| a.elapsed().as_secs_f64() * state.rate)
            .unwrap_or(0.0);
        let t = state.base + running;
        match self.duration {
            Some(d) => t.min(d),
            None => t,
        }
    }
}

impl ReferenceVideo for ClockVideo {
    fn current_time(&self) -> f64 {
        let state = self.state.lock();
        self.position(&state)
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn is_playing(&self) -> bool {
        self.state.lock().anchor.is_some()
    }

    fn play(&self) -> Result<()> {
        if self.playback_blocked.load(Ordering::SeqCst) {
            return Err(Error::MediaPlayback(
                "play() was rejected by the playback policy".to_string(),
            ));
        }
        let mut state = self.state.lock();
        if state.anchor.is_none() {
            state.anchor = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&self) {
        let mut state = self.state.lock();
        state.base = self.position(&state);
        state.anchor = None;
    }

    fn seek(&self, seconds: f64) {
        let mut state = self.state.lock();
        let upper = self.duration.unwrap_or(f64::MAX);
        state.base = seconds.clamp(0.0, upper);
        if state.anchor.is_some() {
            state.anchor = Some(Instant::now());
        }
    }

    fn set_playback_rate(&self, rate: f64) {
        let mut state = self.state.lock();
        state.base = self.position(&state);
        if state.anchor.is_some() {
            state.anchor = Some(Instant::now());
        }
        state.rate = rate;
    }

    fn playback_rate(&self) -> f64 {
        self.state.lock().rate
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        let progress = match self.duration {
            Some(d) if d > 0.0 => (self.current_time() / d).clamp(0.0, 1.0),
            _ => 0.0,
        };
        let bar_end = (progress * self.size.width as f64) as u32;
        let bar_top = self.size.height.saturating_sub(4);
        let background = self.background;
        Some(RgbaImage::from_fn(self.size.width, self.size.height, |x, y| {
            if y >= bar_top && x < bar_end {
                Rgba([220, 60, 120, 255])
            } else {
                background
            }
        }))
    }
}
