// Core capture types and traits
use super::error::{CaptureError, CaptureResult};
use image::GrayImage;
use serde::Serialize;
use std::time::Instant;

/// Display index as the operator sees it: 1 is the first attached monitor.
pub type MonitorIndex = usize;

/// One captured screen image. Matching works on luma, so the frame only
/// keeps the grayscale conversion.
#[derive(Debug, Clone)]
pub struct Frame {
    image: GrayImage,
    monitor: MonitorIndex,
    origin: (i32, i32),
    captured_at: Instant,
}

impl Frame {
    pub fn new(image: GrayImage, monitor: MonitorIndex, origin: (i32, i32)) -> Self {
        Self {
            image,
            monitor,
            origin,
            captured_at: Instant::now(),
        }
    }

    pub fn with_origin(mut self, origin: (i32, i32)) -> Self {
        self.origin = origin;
        self
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn monitor(&self) -> MonitorIndex {
        self.monitor
    }

    /// Top-left corner of the captured monitor or window in desktop coordinates
    pub fn origin(&self) -> (i32, i32) {
        self.origin
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Translate a frame-relative pixel into desktop coordinates for input.
    pub fn to_desktop(&self, x: u32, y: u32) -> (i32, i32) {
        (self.origin.0 + x as i32, self.origin.1 + y as i32)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorInfo {
    pub index: MonitorIndex,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub is_primary: bool,
}

/// Anything that can produce frames for the bot: real displays or test fixtures.
pub trait FrameSource {
    fn monitors(&self) -> CaptureResult<Vec<MonitorInfo>>;

    fn dimensions(&self, monitor: MonitorIndex) -> CaptureResult<(u32, u32)> {
        let monitors = self.monitors()?;
        let available = monitors.len();
        monitors
            .into_iter()
            .find(|m| m.index == monitor)
            .map(|m| (m.width, m.height))
            .ok_or(CaptureError::InvalidMonitor {
                index: monitor,
                available,
            })
    }

    fn capture(&mut self, monitor: MonitorIndex) -> CaptureResult<Frame>;
}
