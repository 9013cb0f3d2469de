// Raw input vocabulary and the closed key-code mapping.

use sync_protocol::Direction;

/// Platform key code (DOM `keyCode` numbering).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const SPACE: KeyCode = KeyCode(32);
    pub const ARROW_LEFT: KeyCode = KeyCode(37);
    pub const ARROW_UP: KeyCode = KeyCode(38);
    pub const ARROW_RIGHT: KeyCode = KeyCode(39);
    pub const ARROW_DOWN: KeyCode = KeyCode(40);
    pub const A: KeyCode = KeyCode(65);
    pub const D: KeyCode = KeyCode(68);
    pub const S: KeyCode = KeyCode(83);
    pub const W: KeyCode = KeyCode(87);
    pub const Z: KeyCode = KeyCode(90);

    /// Keys outside the mapping are ignored.
    pub fn direction(self) -> Option<Direction> {
        match self {
            KeyCode::ARROW_LEFT | KeyCode::A => Some(Direction::Left),
            KeyCode::ARROW_RIGHT | KeyCode::D => Some(Direction::Right),
            KeyCode::ARROW_UP | KeyCode::W => Some(Direction::Up),
            KeyCode::ARROW_DOWN | KeyCode::S => Some(Direction::Down),
            KeyCode::SPACE | KeyCode::Z => Some(Direction::Attack),
            _ => None,
        }
    }
}

/// One raw hardware key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
}

/// Edge-detection memory: which tracked keys are currently held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    pub left_is_down: bool,
    pub right_is_down: bool,
}
