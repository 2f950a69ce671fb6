//! Input actions bound to UI states. Actions are configuration only and are
//! never mutated at runtime.

use super::types::{KeyCode, MouseButton};
use serde::{Deserialize, Serialize};

/// Pointer jitter applied to clicks unless a binding overrides it.
pub const DEFAULT_JITTER_PX: u32 = 3;
/// How long a key stays down for a plain key press.
pub const DEFAULT_KEY_HOLD_MS: u64 = 60;

fn default_jitter() -> u32 {
    DEFAULT_JITTER_PX
}

fn default_key_hold() -> u64 {
    DEFAULT_KEY_HOLD_MS
}

/// Where a click lands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClickTarget {
    /// Center of the region the template matched
    #[default]
    MatchCenter,
    /// Fixed frame-relative pixel
    Point { x: u32, y: u32 },
    /// Wherever the pointer currently is, without moving it
    Pointer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Click {
        #[serde(default)]
        target: ClickTarget,
        #[serde(default = "default_jitter")]
        jitter_px: u32,
        #[serde(default)]
        button: MouseButton,
        #[serde(default)]
        settle_ms: u64,
    },
    Key {
        key: KeyCode,
        #[serde(default = "default_key_hold")]
        hold_ms: u64,
        #[serde(default)]
        settle_ms: u64,
    },
    Sequence {
        steps: Vec<Action>,
    },
}

impl Action {
    /// Left click on the matched region's center with the default jitter.
    pub fn click_match(settle_ms: u64) -> Self {
        Action::Click {
            target: ClickTarget::MatchCenter,
            jitter_px: DEFAULT_JITTER_PX,
            button: MouseButton::Left,
            settle_ms,
        }
    }

    /// Left click in place, used for in-dungeon click spam.
    pub fn click_in_place(settle_ms: u64) -> Self {
        Action::Click {
            target: ClickTarget::Pointer,
            jitter_px: 0,
            button: MouseButton::Left,
            settle_ms,
        }
    }

    pub fn press(key: impl Into<KeyCode>, settle_ms: u64) -> Self {
        Action::Key {
            key: key.into(),
            hold_ms: DEFAULT_KEY_HOLD_MS,
            settle_ms,
        }
    }

    pub fn hold(key: impl Into<KeyCode>, hold_ms: u64, settle_ms: u64) -> Self {
        Action::Key {
            key: key.into(),
            hold_ms,
            settle_ms,
        }
    }

    pub fn sequence(steps: Vec<Action>) -> Self {
        Action::Sequence { steps }
    }

    /// Short label for logs and events
    pub fn describe(&self) -> String {
        match self {
            Action::Click { target, button, .. } => match target {
                ClickTarget::MatchCenter => format!("{button:?} click on match"),
                ClickTarget::Point { x, y } => format!("{button:?} click at ({x},{y})"),
                ClickTarget::Pointer => format!("{button:?} click in place"),
            },
            Action::Key { key, hold_ms, .. } => {
                if *hold_ms > DEFAULT_KEY_HOLD_MS {
                    format!("hold '{key}' for {hold_ms}ms")
                } else {
                    format!("press '{key}'")
                }
            }
            Action::Sequence { steps } => steps
                .iter()
                .map(Action::describe)
                .collect::<Vec<_>>()
                .join(" -> "),
        }
    }
}
