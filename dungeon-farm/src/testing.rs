//! Fakes and image helpers shared by the unit tests

use crate::capture::{CaptureError, CaptureResult, Frame, FrameSource, MonitorIndex, MonitorInfo};
use crate::input::{InputDispatchError, InputDriver, InputResult, KeyCode, MouseButton};
use image::{GrayImage, Luma};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub fn frame_from(image: GrayImage) -> Frame {
    Frame::new(image, 1, (0, 0))
}

pub fn frame_filled(width: u32, height: u32, value: u8) -> Frame {
    frame_from(GrayImage::from_pixel(width, height, Luma([value])))
}

/// Deterministic noise texture; different seeds are uncorrelated.
pub fn pattern(width: u32, height: u32, seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    GrayImage::from_fn(width, height, |_, _| Luma([rng.gen_range(0..=255u8)]))
}

/// Copy `patch` into `canvas` with its top-left corner at (x, y).
pub fn stamp(canvas: &mut GrayImage, patch: &GrayImage, x: u32, y: u32) {
    for (px, py, pixel) in patch.enumerate_pixels() {
        canvas.put_pixel(x + px, y + py, *pixel);
    }
}

/// Frame source that replays a script. The last entry repeats forever.
#[derive(Clone)]
pub struct ScriptedFrames {
    script: Arc<Mutex<VecDeque<CaptureResult<GrayImage>>>>,
    last: Arc<Mutex<Option<GrayImage>>>,
    width: u32,
    height: u32,
    origin: (i32, i32),
    captures: Arc<Mutex<u64>>,
}

impl ScriptedFrames {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            last: Arc::new(Mutex::new(None)),
            width,
            height,
            origin: (0, 0),
            captures: Arc::new(Mutex::new(0)),
        }
    }

    /// Place the captured area on the desktop, as a game window would be
    pub fn at_origin(mut self, x: i32, y: i32) -> Self {
        self.origin = (x, y);
        self
    }

    pub fn then_frame(self, image: GrayImage) -> Self {
        self.script.lock().unwrap().push_back(Ok(image));
        self
    }

    pub fn then_error(self) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(CaptureError::CaptureFailed {
                index: 1,
                description: "display went away".to_string(),
            }));
        self
    }

    /// Capture calls so far, shared by every clone
    pub fn captures(&self) -> u64 {
        *self.captures.lock().unwrap()
    }
}

impl FrameSource for ScriptedFrames {
    fn monitors(&self) -> CaptureResult<Vec<MonitorInfo>> {
        Ok(vec![MonitorInfo {
            index: 1,
            name: "scripted".to_string(),
            x: 0,
            y: 0,
            width: self.width,
            height: self.height,
            is_primary: true,
        }])
    }

    fn capture(&mut self, monitor: MonitorIndex) -> CaptureResult<Frame> {
        *self.captures.lock().unwrap() += 1;
        if monitor != 1 {
            return Err(CaptureError::InvalidMonitor {
                index: monitor,
                available: 1,
            });
        }
        let next = self.script.lock().unwrap().pop_front();
        let image = match next {
            Some(Ok(image)) => {
                *self.last.lock().unwrap() = Some(image.clone());
                image
            }
            Some(Err(e)) => return Err(e),
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| GrayImage::new(self.width, self.height)),
        };
        Ok(Frame::new(image, monitor, self.origin))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Move(i32, i32),
    Click,
    KeyDown(KeyCode),
    KeyUp(KeyCode),
}

/// Input driver that records instead of touching the OS.
#[derive(Debug, Default)]
pub struct RecordingInput {
    events: Vec<InputEvent>,
    attempts: usize,
    fail: bool,
}

impl RecordingInput {
    /// Every call fails after being counted
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }

    pub fn clicks(&self) -> usize {
        self.events
            .iter()
            .filter(|e| **e == InputEvent::Click)
            .count()
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    fn record(&mut self, event: InputEvent) -> InputResult<()> {
        self.attempts += 1;
        if self.fail {
            return Err(match event {
                InputEvent::Move(x, y) => InputDispatchError::MoveFailed {
                    x,
                    y,
                    description: "recording driver set to fail".to_string(),
                },
                InputEvent::Click => InputDispatchError::ButtonFailed {
                    description: "recording driver set to fail".to_string(),
                },
                InputEvent::KeyDown(key) | InputEvent::KeyUp(key) => {
                    InputDispatchError::KeyFailed {
                        key,
                        description: "recording driver set to fail".to_string(),
                    }
                }
            });
        }
        self.events.push(event);
        Ok(())
    }
}

impl InputDriver for RecordingInput {
    fn move_to(&mut self, x: i32, y: i32) -> InputResult<()> {
        self.record(InputEvent::Move(x, y))
    }

    fn click(&mut self, _button: MouseButton) -> InputResult<()> {
        self.record(InputEvent::Click)
    }

    fn key_down(&mut self, key: KeyCode) -> InputResult<()> {
        self.record(InputEvent::KeyDown(key))
    }

    fn key_up(&mut self, key: KeyCode) -> InputResult<()> {
        self.record(InputEvent::KeyUp(key))
    }
}
