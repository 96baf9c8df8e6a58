use std::thread;
use std::time::{Duration, Instant};

use clap::ValueEnum;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PacingMode {
    /// Busy-wait until the frame deadline; precise, but burns a core
    Spin,
    /// Sleep until the frame deadline
    Sleep,
}

/// Caps the frame rate by waiting out the rest of each frame's interval
#[derive(Clone, Copy, Debug)]
pub struct FramePacer {
    interval: Option<Duration>,
    mode: PacingMode,
}

impl FramePacer {
    /// A non-positive or non-finite `framerate` disables pacing
    pub fn new(framerate: f32, mode: PacingMode) -> FramePacer {
        let interval = (framerate.is_finite() && framerate > 0.0).then(|| Duration::from_secs_f32(1.0 / framerate));
        FramePacer { interval, mode }
    }

    pub fn deadline(&self, frame_start: Instant) -> Option<Instant> {
        self.interval.map(|interval| frame_start + interval)
    }

    pub fn wait(&self, frame_start: Instant) {
        let Some(deadline) = self.deadline(frame_start) else {
            return;
        };
        match self.mode {
            PacingMode::Spin => {
                while Instant::now() < deadline {
                    std::hint::spin_loop();
                }
            }
            PacingMode::Sleep => {
                let now = Instant::now();
                if deadline > now {
                    thread::sleep(deadline - now);
                }
            }
        }
    }
}

/// Counts frames and reports a rate once at least a second has passed
#[derive(Debug)]
pub struct FpsCounter {
    window_start: Instant,
    frames: u32,
}

impl FpsCounter {
    pub fn new(now: Instant) -> FpsCounter {
        FpsCounter { window_start: now, frames: 0 }
    }

    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        self.frames += 1;
        let elapsed = now.duration_since(self.window_start);
        if elapsed < Duration::from_secs(1) {
            return None;
        }
        let fps = self.frames as f64 / elapsed.as_secs_f64();
        self.window_start = now;
        self.frames = 0;
        Some(fps)
    }
}
