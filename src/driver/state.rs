use std::sync::atomic::{AtomicBool, Ordering};

use crate::geometry::Vec3;
use crate::scene::{Camera, Sensitivity};
use crate::sync::SharedCell;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub fps: f64,
    pub frame: u64,
}

/// Everything the event, physics and render threads exchange
#[derive(Debug)]
pub struct SharedState {
    pub camera: SharedCell<Camera>,
    /// Movement in camera space: x right, y up, z forward, in units per second
    pub velocity: SharedCell<Vec3>,
    pub cursor_locked: SharedCell<bool>,
    pub sensitivity: SharedCell<Sensitivity>,
    pub pending_resize: SharedCell<Option<(i32, i32)>>,
    pub stats: SharedCell<FrameStats>,
    screenshot_requested: AtomicBool,
    stop: AtomicBool,
}

impl SharedState {
    pub fn new(camera: Camera, sensitivity: Sensitivity) -> SharedState {
        SharedState {
            camera: SharedCell::new(camera),
            velocity: SharedCell::new(Vec3::zero()),
            cursor_locked: SharedCell::new(false),
            sensitivity: SharedCell::new(sensitivity),
            pending_resize: SharedCell::new(None),
            stats: SharedCell::new(FrameStats::default()),
            screenshot_requested: AtomicBool::new(false),
            stop: AtomicBool::new(false),
        }
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    pub fn request_screenshot(&self) {
        self.screenshot_requested.store(true, Ordering::Release);
    }

    /// True once per request
    pub fn take_screenshot_request(&self) -> bool {
        self.screenshot_requested.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screenshot_request_is_consumed_once() {
        let state = SharedState::new(Camera::default(), Sensitivity::default());
        assert!(!state.take_screenshot_request());
        state.request_screenshot();
        state.request_screenshot();
        assert!(state.take_screenshot_request());
        assert!(!state.take_screenshot_request());
    }

    #[test]
    fn stop_flag_latches() {
        let state = SharedState::new(Camera::default(), Sensitivity::default());
        assert!(!state.should_stop());
        state.request_stop();
        assert!(state.should_stop());
    }
}
