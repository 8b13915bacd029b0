//! Frame timing and delta time.
//!
//! [`Time`] is updated by the window loop at the start of each frame. The
//! viewer reads the clamped delta so a stalled frame (window drag, debugger
//! break) cannot fling an in-flight piece past its target.

use std::time::{Duration, Instant};

/// Frame timing state, owned by the window loop.
#[derive(Clone, Copy)]
pub struct Time {
    /// When the current frame started.
    frame_start: Instant,
    /// Duration of the previous frame, unclamped.
    delta: Duration,
    /// Upper bound applied by [`Time::delta_secs`].
    max_delta: Duration,
    frame_count: u64,
}

impl Time {
    pub fn new(max_delta_secs: f32) -> Self {
        Self {
            frame_start: Instant::now(),
            delta: Duration::ZERO,
            max_delta: Duration::from_secs_f32(max_delta_secs.max(0.0)),
            frame_count: 0,
        }
    }

    /// Call at the start of each frame to update timing.
    pub fn update(&mut self) {
        let now = Instant::now();
        self.advance(now - self.frame_start);
        self.frame_start = now;
    }

    fn advance(&mut self, delta: Duration) {
        self.delta = delta;
        self.frame_count += 1;
    }

    /// Delta time in seconds, clamped to the configured maximum.
    pub fn delta_secs(&self) -> f32 {
        self.delta.min(self.max_delta).as_secs_f32()
    }

    /// Number of frames started so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
