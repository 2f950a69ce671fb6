// Operator control: global hotkeys and the pointer failsafe.
// Both run on their own OS threads and only ever write the signal slot.
use super::channels::SignalSlot;
use super::types::ControlSignal;
use crate::input::{DesktopInput, KeyCode, NamedKey, PointerProbe};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const FAILSAFE_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Top-left corner of the primary display
pub const DEFAULT_FAILSAFE_RECT: ScreenRect = ScreenRect {
    x: 0,
    y: 0,
    width: 5,
    height: 5,
};

/// Rectangle in desktop coordinates (monitors left of or above the primary
/// display have negative origins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ScreenRect {
    pub fn contains(&self, px: i32, py: i32) -> bool {
        let (px, py) = (px as i64, py as i64);
        let (x, y) = (self.x as i64, self.y as i64);
        px >= x && px < x + self.width as i64 && py >= y && py < y + self.height as i64
    }
}

impl fmt::Display for ScreenRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

impl FromStr for ScreenRect {
    type Err = String;

    /// Parses `x,y,width,height`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [x, y, width, height] = parts.as_slice() else {
            return Err(format!("expected x,y,width,height but got '{s}'"));
        };
        let rect = ScreenRect {
            x: x.parse().map_err(|e| format!("bad x '{x}': {e}"))?,
            y: y.parse().map_err(|e| format!("bad y '{y}': {e}"))?,
            width: width.parse().map_err(|e| format!("bad width '{width}': {e}"))?,
            height: height
                .parse()
                .map_err(|e| format!("bad height '{height}': {e}"))?,
        };
        if rect.width == 0 || rect.height == 0 {
            return Err(format!("failsafe region '{s}' is empty"));
        }
        Ok(rect)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyBindings {
    pub start: KeyCode,
    /// Toggles between Pause and Resume
    pub pause: KeyCode,
    pub stop: KeyCode,
}

impl Default for HotkeyBindings {
    fn default() -> Self {
        Self {
            start: NamedKey::F8.into(),
            pause: NamedKey::F9.into(),
            stop: NamedKey::F10.into(),
        }
    }
}

/// Turns key presses into control signals.
#[derive(Debug, Clone)]
pub struct HotkeyMapper {
    bindings: HotkeyBindings,
    paused: bool,
}

impl HotkeyMapper {
    pub fn new(bindings: HotkeyBindings) -> Self {
        Self {
            bindings,
            paused: false,
        }
    }

    pub fn on_key(&mut self, key: KeyCode) -> Option<ControlSignal> {
        if key == self.bindings.start {
            self.paused = false;
            Some(ControlSignal::Start)
        } else if key == self.bindings.pause {
            self.paused = !self.paused;
            Some(if self.paused {
                ControlSignal::Pause
            } else {
                ControlSignal::Resume
            })
        } else if key == self.bindings.stop {
            self.paused = false;
            Some(ControlSignal::Stop)
        } else {
            None
        }
    }
}

/// Reports whether the pointer is inside the forbidden rectangle.
pub struct FailsafeMonitor {
    rect: ScreenRect,
    slot: Arc<SignalSlot>,
    inside: bool,
}

impl FailsafeMonitor {
    pub fn new(rect: ScreenRect, slot: Arc<SignalSlot>) -> Self {
        Self {
            rect,
            slot,
            inside: false,
        }
    }

    /// Returns true when `position` is inside the rectangle.
    pub fn sample(&mut self, position: (i32, i32)) -> bool {
        let inside = self.rect.contains(position.0, position.1);
        if inside && !self.inside {
            log::warn!(
                "🛑 Failsafe: pointer at ({}, {}) entered {}",
                position.0,
                position.1,
                self.rect
            );
        } else if !inside && self.inside {
            log::info!("Failsafe: pointer left {}", self.rect);
        }
        self.slot.report_pointer(inside);
        self.inside = inside;
        inside
    }

    /// Sample `probe` every `interval` until shutdown is requested.
    pub fn poll<P: PointerProbe>(&mut self, probe: &mut P, interval: Duration) {
        let mut reported = false;
        while !self.slot.is_shutdown() {
            match probe.pointer_position() {
                Ok(position) => {
                    self.sample(position);
                    reported = false;
                }
                Err(e) if !reported => {
                    log::error!("❌ Failsafe cannot read pointer: {e}");
                    reported = true;
                }
                Err(_) => {}
            }
            thread::sleep(interval);
        }
        log::debug!("Failsafe poller exiting");
    }
}

/// Handles to the control threads.
pub struct ControlChannel {
    _hotkeys: JoinHandle<()>,
    failsafe: Option<JoinHandle<()>>,
}

impl ControlChannel {
    /// Start the hotkey listener and, when `failsafe` is set, the pointer poller.
    pub fn spawn(
        slot: Arc<SignalSlot>,
        hotkeys: HotkeyBindings,
        failsafe: Option<ScreenRect>,
    ) -> std::io::Result<Self> {
        let hotkey_slot = slot.clone();
        let hotkeys_handle = thread::Builder::new()
            .name("hotkeys".to_string())
            .spawn(move || listen_hotkeys(hotkey_slot, hotkeys))?;

        let failsafe_handle = match failsafe {
            Some(rect) => {
                let poll_slot = slot;
                Some(
                    thread::Builder::new()
                        .name("failsafe".to_string())
                        .spawn(move || {
                            // enigo handles stay on the thread that created them
                            match DesktopInput::new() {
                                Ok(mut probe) => FailsafeMonitor::new(rect, poll_slot)
                                    .poll(&mut probe, FAILSAFE_POLL_INTERVAL),
                                Err(e) => log::error!("❌ Failsafe disabled: {e}"),
                            }
                        })?,
                )
            }
            None => {
                log::warn!("⚠️ Failsafe region disabled");
                None
            }
        };

        Ok(Self {
            _hotkeys: hotkeys_handle,
            failsafe: failsafe_handle,
        })
    }

    /// Wait for the failsafe poller after shutdown was requested. The hotkey
    /// listener blocks in the OS hook and ends with the process.
    pub fn join(self) {
        if let Some(handle) = self.failsafe
            && handle.join().is_err()
        {
            log::error!("❌ Failsafe thread panicked");
        }
    }
}

fn listen_hotkeys(slot: Arc<SignalSlot>, bindings: HotkeyBindings) {
    log::info!(
        "⌨️ Hotkeys: {} start, {} pause/resume, {} stop",
        bindings.start,
        bindings.pause,
        bindings.stop
    );
    let mut mapper = HotkeyMapper::new(bindings);
    let result = rdev::listen(move |event| {
        if let rdev::EventType::KeyPress(key) = event.event_type
            && let Some(code) = key_code_from_rdev(key)
            && let Some(signal) = mapper.on_key(code)
        {
            log::info!("⌨️ {code} -> {signal}");
            slot.publish(signal);
        }
    });
    if let Err(e) = result {
        log::error!("❌ Global hotkey listener failed: {e:?}");
    }
}

fn key_code_from_rdev(key: rdev::Key) -> Option<KeyCode> {
    use rdev::Key as K;
    let named = match key {
        K::Escape => NamedKey::Escape,
        K::Return => NamedKey::Enter,
        K::Space => NamedKey::Space,
        K::Tab => NamedKey::Tab,
        K::Backspace => NamedKey::Backspace,
        K::UpArrow => NamedKey::Up,
        K::DownArrow => NamedKey::Down,
        K::LeftArrow => NamedKey::Left,
        K::RightArrow => NamedKey::Right,
        K::F1 => NamedKey::F1,
        K::F2 => NamedKey::F2,
        K::F3 => NamedKey::F3,
        K::F4 => NamedKey::F4,
        K::F5 => NamedKey::F5,
        K::F6 => NamedKey::F6,
        K::F7 => NamedKey::F7,
        K::F8 => NamedKey::F8,
        K::F9 => NamedKey::F9,
        K::F10 => NamedKey::F10,
        K::F11 => NamedKey::F11,
        K::F12 => NamedKey::F12,
        other => return char_from_rdev(other).map(KeyCode::Char),
    };
    Some(KeyCode::Named(named))
}

fn char_from_rdev(key: rdev::Key) -> Option<char> {
    use rdev::Key as K;
    let c = match key {
        K::KeyA => 'a',
        K::KeyB => 'b',
        K::KeyC => 'c',
        K::KeyD => 'd',
        K::KeyE => 'e',
        K::KeyF => 'f',
        K::KeyG => 'g',
        K::KeyH => 'h',
        K::KeyI => 'i',
        K::KeyJ => 'j',
        K::KeyK => 'k',
        K::KeyL => 'l',
        K::KeyM => 'm',
        K::KeyN => 'n',
        K::KeyO => 'o',
        K::KeyP => 'p',
        K::KeyQ => 'q',
        K::KeyR => 'r',
        K::KeyS => 's',
        K::KeyT => 't',
        K::KeyU => 'u',
        K::KeyV => 'v',
        K::KeyW => 'w',
        K::KeyX => 'x',
        K::KeyY => 'y',
        K::KeyZ => 'z',
        K::Num0 => '0',
        K::Num1 => '1',
        K::Num2 => '2',
        K::Num3 => '3',
        K::Num4 => '4',
        K::Num5 => '5',
        K::Num6 => '6',
        K::Num7 => '7',
        K::Num8 => '8',
        K::Num9 => '9',
        _ => return None,
    };
    Some(c)
}
