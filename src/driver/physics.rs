use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use super::state::SharedState;
use crate::geometry::Vec3;
use crate::scene::Camera;

/// Move `camera` by a camera-space `velocity` for `dt` seconds
pub fn step(mut camera: Camera, velocity: Vec3, dt: f32) -> Camera {
    let world = camera.right() * velocity.0 + camera.up() * velocity.1 + camera.forward() * velocity.2;
    camera.position += world * dt;
    camera
}

/// Integrate camera movement at `tick_rate` Hz until the stop flag is raised
pub fn run(state: Arc<SharedState>, tick_rate: f32) {
    let tick = Duration::from_secs_f32(1.0 / tick_rate.max(1.0));
    let mut last = Instant::now();
    debug!("physics thread running at {tick_rate} Hz");

    while !state.should_stop() {
        let now = Instant::now();
        let dt = (now - last).as_secs_f32();
        last = now;

        let velocity = state.velocity.get();
        if !velocity.near_zero() {
            state.camera.modify(|camera| step(camera, velocity, dt));
        }

        if let Some(remaining) = tick.checked_sub(now.elapsed()) {
            thread::sleep(remaining);
        }
    }
    debug!("physics thread stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_motion_follows_view_direction() {
        let mut camera = Camera::default();
        camera.set_rotation(90.0, 0.0);
        let moved = step(camera, Vec3(0.0, 0.0, 2.0), 0.5);
        assert!((moved.position - camera.forward()).length() < 1e-5);
    }

    #[test]
    fn strafing_uses_right_axis() {
        let camera = Camera::new(Vec3(1.0, 2.0, 3.0), 70.0);
        let moved = step(camera, Vec3(3.0, 0.0, 0.0), 1.0);
        assert!((moved.position - (camera.position + camera.right() * 3.0)).length() < 1e-5);
        assert_eq!(moved.rotation(), camera.rotation());
    }

    #[test]
    fn stops_when_flag_is_raised() {
        let state = Arc::new(SharedState::new(Camera::default(), Default::default()));
        state.velocity.assign(Vec3(0.0, 0.0, 1.0));
        let handle = {
            let state = Arc::clone(&state);
            thread::spawn(move || run(state, 200.0))
        };
        thread::sleep(Duration::from_millis(50));
        state.request_stop();
        handle.join().unwrap();
        assert!(state.camera.get().position.2 > 0.0);
    }
}
