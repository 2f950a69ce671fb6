// Input types and the OS boundary traits
use super::error::InputResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Non-character keys that actions and hotkeys can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum NamedKey {
    #[strum(to_string = "escape", serialize = "esc")]
    Escape,
    #[strum(to_string = "enter", serialize = "return")]
    Enter,
    Space,
    Tab,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
}

/// A key as written in profiles and on the command line: either a named
/// key (`esc`, `f8`) or a single character (`f`, `i`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum KeyCode {
    Named(NamedKey),
    Char(char),
}

impl FromStr for KeyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(KeyCode::Char(c.to_ascii_lowercase()));
        }
        NamedKey::from_str(trimmed)
            .map(KeyCode::Named)
            .map_err(|_| format!("unknown key '{trimmed}'"))
    }
}

impl TryFrom<String> for KeyCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyCode> for String {
    fn from(key: KeyCode) -> Self {
        key.to_string()
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyCode::Named(named) => write!(f, "{named}"),
            KeyCode::Char(c) => write!(f, "{c}"),
        }
    }
}

impl From<NamedKey> for KeyCode {
    fn from(key: NamedKey) -> Self {
        KeyCode::Named(key)
    }
}

/// OS input capabilities used by the dispatcher.
pub trait InputDriver {
    fn move_to(&mut self, x: i32, y: i32) -> InputResult<()>;
    /// Press and release `button` at the current pointer position.
    fn click(&mut self, button: MouseButton) -> InputResult<()>;
    fn key_down(&mut self, key: KeyCode) -> InputResult<()>;
    fn key_up(&mut self, key: KeyCode) -> InputResult<()>;
}

/// Pointer sampling for the failsafe poller.
pub trait PointerProbe {
    fn pointer_position(&mut self) -> InputResult<(i32, i32)>;
}
