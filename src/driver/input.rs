use winit::keyboard::KeyCode;

use crate::geometry::Vec3;

const SENSITIVITY_STEP: f32 = 1.25;

/// What a key press means to the driver
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KeyAction {
    Move(Direction),
    ToggleCursorLock,
    ScaleSensitivity(f32),
    Screenshot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
}

pub fn key_action(key: KeyCode) -> Option<KeyAction> {
    let action = match key {
        KeyCode::KeyW => KeyAction::Move(Direction::Forward),
        KeyCode::KeyS => KeyAction::Move(Direction::Back),
        KeyCode::KeyA => KeyAction::Move(Direction::Left),
        KeyCode::KeyD => KeyAction::Move(Direction::Right),
        KeyCode::Space => KeyAction::Move(Direction::Up),
        KeyCode::ShiftLeft => KeyAction::Move(Direction::Down),
        KeyCode::Escape => KeyAction::ToggleCursorLock,
        KeyCode::BracketLeft => KeyAction::ScaleSensitivity(1.0 / SENSITIVITY_STEP),
        KeyCode::BracketRight => KeyAction::ScaleSensitivity(SENSITIVITY_STEP),
        KeyCode::F12 => KeyAction::Screenshot,
        _ => return None,
    };
    Some(action)
}

/// Movement keys currently held
#[derive(Clone, Copy, Debug, Default)]
pub struct HeldKeys {
    forward: bool,
    back: bool,
    left: bool,
    right: bool,
    up: bool,
    down: bool,
}

impl HeldKeys {
    pub fn set(&mut self, direction: Direction, pressed: bool) {
        let held = match direction {
            Direction::Forward => &mut self.forward,
            Direction::Back => &mut self.back,
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
            Direction::Up => &mut self.up,
            Direction::Down => &mut self.down,
        };
        *held = pressed;
    }

    /// Camera-space velocity (x right, y up, z forward); opposite keys cancel
    pub fn velocity(&self, speed: f32) -> Vec3 {
        let axis = |positive: bool, negative: bool| (positive as i32 - negative as i32) as f32;
        let direction = Vec3(
            axis(self.right, self.left),
            axis(self.up, self.down),
            axis(self.forward, self.back),
        );
        Vec3::normalized(direction) * speed
    }
}
