//! Frame statistics
//!
//! [`FrameTimer`] measures the gap between successive renders;
//! [`RenderStats`] combines it with bucket sizes and backend counters.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Snapshot exposed by `LayeredRenderer::stats`
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderStats {
    /// Instantaneous frames per second, 0 before the second frame
    pub fps: f64,
    /// Seconds between the last two renders
    pub frame_time: f64,
    pub triangles: u64,
    pub draw_calls: u32,
    pub opaque_count: usize,
    pub transparent_count: usize,
}

/// Measures time between successive frames
#[derive(Clone, Debug, Default)]
pub struct FrameTimer {
    last: Option<Instant>,
    frame_time: Duration,
    frames: u64,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame at `now` and return the delta to the previous one
    pub fn tick(&mut self, now: Instant) -> Duration {
        if let Some(last) = self.last {
            self.frame_time = now.saturating_duration_since(last);
        }
        self.last = Some(now);
        self.frames += 1;
        self.frame_time
    }

    pub fn frame_time(&self) -> Duration {
        self.frame_time
    }

    pub fn fps(&self) -> f64 {
        let secs = self.frame_time.as_secs_f64();
        if secs > 0.0 {
            1.0 / secs
        } else {
            0.0
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
