//! Frame timing.
//!
//! [`Time`] is advanced once at the top of every frame by the
//! [`Application`](crate::app::Application) and read by layers through their
//! frame context. It either follows the wall clock or, for headless runs and
//! tests, advances by a fixed step so results are reproducible.

use std::time::{Duration, Instant};

/// Weight of the newest frame in the smoothed FPS estimate.
const FPS_SMOOTHING: f32 = 0.1;

#[derive(Debug, Clone, Copy)]
enum Clock {
    Wall { frame_start: Instant },
    Fixed { step: Duration },
}

#[derive(Debug, Clone, Copy)]
pub struct Time {
    clock: Clock,
    /// Longest delta reported, so a stall (debugger, window drag) doesn't
    /// produce one huge step.
    max_delta: Duration,
    delta: Duration,
    elapsed: Duration,
    frame_count: u64,
    smoothed_fps: f32,
}

impl Time {
    /// Wall-clock timing starting now.
    pub fn new() -> Self {
        Self::with_clock(Clock::Wall {
            frame_start: Instant::now(),
        })
    }

    /// Every frame advances by exactly `step`.
    pub fn fixed(step: Duration) -> Self {
        Self::with_clock(Clock::Fixed { step })
    }

    fn with_clock(clock: Clock) -> Self {
        Self {
            clock,
            max_delta: Duration::from_millis(250),
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            smoothed_fps: 0.0,
        }
    }

    pub fn with_max_delta(mut self, max_delta: Duration) -> Self {
        self.max_delta = max_delta;
        self
    }

    /// Start a new frame.
    pub(crate) fn update(&mut self) {
        let raw = match &mut self.clock {
            Clock::Wall { frame_start } => {
                let now = Instant::now();
                let raw = now - *frame_start;
                *frame_start = now;
                raw
            }
            Clock::Fixed { step } => *step,
        };
        self.delta = raw.min(self.max_delta);
        self.elapsed += self.delta;
        self.frame_count += 1;

        let secs = self.delta.as_secs_f32();
        if secs > 0.0 {
            let fps = 1.0 / secs;
            self.smoothed_fps = if self.smoothed_fps == 0.0 {
                fps
            } else {
                self.smoothed_fps + (fps - self.smoothed_fps) * FPS_SMOOTHING
            };
        }
    }

    /// Duration of the current frame's step.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Sum of all deltas so far.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Frames started so far, including the current one.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// FPS from the last delta alone.
    pub fn fps(&self) -> f32 {
        let secs = self.delta.as_secs_f32();
        if secs > 0.0 { 1.0 / secs } else { 0.0 }
    }

    /// Exponentially smoothed FPS, steadier for on-screen display.
    pub fn smoothed_fps(&self) -> f32 {
        self.smoothed_fps
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
