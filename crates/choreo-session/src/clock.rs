//! Session clock.

use tokio::time::Instant;

/// Origin of every elapsed value in the feedback log.
///
/// Set when playback begins; until then elapsed time is zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionClock {
    origin: Option<Instant>,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting from now.
    pub fn reset(&mut self) {
        self.origin = Some(Instant::now());
    }

    /// Forget the origin.
    pub fn clear(&mut self) {
        self.origin = None;
    }

    /// Whole seconds since the origin, rounded to nearest.
    pub fn elapsed_seconds(&self) -> u64 {
        self.origin
            .map(|o| o.elapsed().as_secs_f64().round() as u64)
            .unwrap_or(0)
    }
}
