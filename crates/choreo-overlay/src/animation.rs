//! Self-scheduling overlay loop.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use choreo_core::ReferenceVideo;

use crate::canvas::OverlayCanvas;
use crate::renderer::{OverlayRenderer, RenderOutcome};

/// The video and canvas the overlay draws with, attached explicitly.
#[derive(Default)]
pub struct OverlaySurface {
    video: Option<Arc<dyn ReferenceVideo>>,
    canvas: Option<Box<dyn OverlayCanvas>>,
}

/// Surface shared between the loop and its owner
pub type SharedSurface = Arc<Mutex<OverlaySurface>>;

impl OverlaySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedSurface {
        Arc::new(Mutex::new(self))
    }

    pub fn attach_video(&mut self, video: Arc<dyn ReferenceVideo>) {
        self.video = Some(video);
    }

    pub fn attach_canvas(&mut self, canvas: Box<dyn OverlayCanvas>) {
        self.canvas = Some(canvas);
    }

    /// Draw one tick; skipped unless both handles are attached.
    pub fn render(&mut self, renderer: &OverlayRenderer) -> RenderOutcome {
        match (&self.video, &mut self.canvas) {
            (Some(video), Some(canvas)) => renderer.render(video.as_ref(), canvas.as_mut()),
            _ => RenderOutcome::Skipped,
        }
    }
}

/// Counters kept by a running [`OverlayLoop`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub ticks: u64,
    pub skipped: u64,
    pub markers_drawn: u64,
    pub last_outcome: Option<RenderOutcome>,
}

impl LoopStats {
    fn record(&mut self, outcome: RenderOutcome) {
        self.ticks += 1;
        if outcome == RenderOutcome::Skipped {
            self.skipped += 1;
        }
        self.markers_drawn += outcome.markers_drawn() as u64;
        self.last_outcome = Some(outcome);
    }
}

/// Repeats [`OverlaySurface::render`] on every display tick.
///
/// The task is aborted by [`stop`](Self::stop), by [`restart`](Self::restart)
/// before the new one is spawned, and on drop. Each tick reads the video's
/// current position, so a restarted loop picks up wherever the video is.
pub struct OverlayLoop {
    renderer: Arc<OverlayRenderer>,
    surface: SharedSurface,
    tick: Duration,
    stats: Arc<Mutex<LoopStats>>,
    handle: Option<JoinHandle<()>>,
}

impl OverlayLoop {
    pub fn new(renderer: Arc<OverlayRenderer>, surface: SharedSurface, tick: Duration) -> Self {
        Self {
            renderer,
            surface,
            tick: tick.max(Duration::from_millis(1)),
            stats: Arc::new(Mutex::new(LoopStats::default())),
            handle: None,
        }
    }

    /// Spawn the loop; a no-op while it is already running.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        let renderer = self.renderer.clone();
        let surface = self.surface.clone();
        let stats = self.stats.clone();
        let tick = self.tick;

        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let outcome = surface.lock().render(&renderer);
                stats.lock().record(outcome);
            }
        }));
        tracing::debug!(tick_ms = tick.as_millis() as u64, "overlay loop started");
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!("overlay loop stopped");
        }
    }

    pub fn restart(&mut self) {
        self.stop();
        *self.stats.lock() = LoopStats::default();
        self.start();
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn stats(&self) -> LoopStats {
        *self.stats.lock()
    }

    pub fn renderer(&self) -> &Arc<OverlayRenderer> {
        &self.renderer
    }
}

impl Drop for OverlayLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
