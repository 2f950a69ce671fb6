use super::error::{InputDispatchError, InputResult};
use super::types::{InputDriver, KeyCode, MouseButton, NamedKey, PointerProbe};
use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};

/// Input driver for the local desktop session via `enigo`.
pub struct DesktopInput {
    enigo: Enigo,
}

impl DesktopInput {
    pub fn new() -> InputResult<Self> {
        let enigo =
            Enigo::new(&Settings::default()).map_err(|e| InputDispatchError::Unavailable {
                description: e.to_string(),
            })?;
        Ok(Self { enigo })
    }

    fn key_event(&mut self, key: KeyCode, direction: Direction) -> InputResult<()> {
        self.enigo
            .key(to_enigo_key(key), direction)
            .map_err(|e| InputDispatchError::KeyFailed {
                key,
                description: e.to_string(),
            })
    }
}

fn to_enigo_key(key: KeyCode) -> Key {
    match key {
        KeyCode::Char(c) => Key::Unicode(c),
        KeyCode::Named(named) => match named {
            NamedKey::Escape => Key::Escape,
            NamedKey::Enter => Key::Return,
            NamedKey::Space => Key::Space,
            NamedKey::Tab => Key::Tab,
            NamedKey::Backspace => Key::Backspace,
            NamedKey::Up => Key::UpArrow,
            NamedKey::Down => Key::DownArrow,
            NamedKey::Left => Key::LeftArrow,
            NamedKey::Right => Key::RightArrow,
            NamedKey::F1 => Key::F1,
            NamedKey::F2 => Key::F2,
            NamedKey::F3 => Key::F3,
            NamedKey::F4 => Key::F4,
            NamedKey::F5 => Key::F5,
            NamedKey::F6 => Key::F6,
            NamedKey::F7 => Key::F7,
            NamedKey::F8 => Key::F8,
            NamedKey::F9 => Key::F9,
            NamedKey::F10 => Key::F10,
            NamedKey::F11 => Key::F11,
            NamedKey::F12 => Key::F12,
        },
    }
}

impl InputDriver for DesktopInput {
    fn move_to(&mut self, x: i32, y: i32) -> InputResult<()> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| InputDispatchError::MoveFailed {
                x,
                y,
                description: e.to_string(),
            })
    }

    fn click(&mut self, button: MouseButton) -> InputResult<()> {
        let button = match button {
            MouseButton::Left => Button::Left,
            MouseButton::Right => Button::Right,
            MouseButton::Middle => Button::Middle,
        };
        self.enigo
            .button(button, Direction::Click)
            .map_err(|e| InputDispatchError::ButtonFailed {
                description: e.to_string(),
            })
    }

    fn key_down(&mut self, key: KeyCode) -> InputResult<()> {
        self.key_event(key, Direction::Press)
    }

    fn key_up(&mut self, key: KeyCode) -> InputResult<()> {
        self.key_event(key, Direction::Release)
    }
}

impl PointerProbe for DesktopInput {
    fn pointer_position(&mut self) -> InputResult<(i32, i32)> {
        self.enigo
            .location()
            .map_err(|e| InputDispatchError::LocationFailed {
                description: e.to_string(),
            })
    }
}
