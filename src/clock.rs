//! Frame timing.
//!
//! The animation itself advances a fixed amount per frame, so the clock is
//! only used for bookkeeping: FPS reporting and pausing while the window is
//! hidden.

use std::time::{Duration, Instant};

/// Frame counter with a periodically refreshed FPS estimate.
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last_frame: Instant,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    paused: bool,
    pause_elapsed: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused: false,
            pause_elapsed: Duration::ZERO,
        }
    }

    /// Record a frame. Returns `true` when the FPS estimate was refreshed.
    pub fn tick(&mut self) -> bool {
        if self.paused {
            self.delta_secs = 0.0;
            return false;
        }

        let now = Instant::now();
        self.delta_secs = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
            return true;
        }
        false
    }

    /// Running time, excluding paused spans.
    pub fn elapsed(&self) -> Duration {
        let paused_now = if self.paused {
            self.last_frame.elapsed()
        } else {
            Duration::ZERO
        };
        self.start.elapsed().saturating_sub(self.pause_elapsed + paused_now)
    }

    /// Seconds between the last two ticks.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Frames ticked since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume after [`pause`](Self::pause). The paused span does not count
    /// toward delta or FPS.
    pub fn resume(&mut self) {
        if self.paused {
            let now = Instant::now();
            self.pause_elapsed += now.duration_since(self.last_frame);
            self.last_frame = now;
            self.fps_update_time = now;
            self.fps_frame_count = self.frame_count;
            self.paused = false;
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
