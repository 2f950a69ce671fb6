use super::error::{CaptureError, CaptureResult};
use super::types::{Frame, FrameSource, MonitorIndex, MonitorInfo};
use super::window::{WindowInfo, find_window};
use image::{DynamicImage, RgbaImage};
use xcap::{Monitor, Window, XCapError};

/// Frame source backed by the OS display buffer via `xcap`.
///
/// Captures the whole monitor, or only the game window when bound to a
/// window title. The window is looked up on every capture so it may move
/// between ticks.
#[derive(Debug, Default)]
pub struct ScreenCapture {
    window_title: Option<String>,
}

impl ScreenCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the first visible window whose title contains `title` (any case).
    pub fn bound_to(window_title: Option<String>) -> Self {
        Self {
            window_title: window_title.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn window_title(&self) -> Option<&str> {
        self.window_title.as_deref()
    }

    fn monitor(index: MonitorIndex) -> CaptureResult<Monitor> {
        let monitors = Monitor::all().map_err(|e| CaptureError::EnumerationFailed {
            description: e.to_string(),
        })?;
        let available = monitors.len();
        if index == 0 || index > available {
            return Err(CaptureError::InvalidMonitor { index, available });
        }
        monitors
            .into_iter()
            .nth(index - 1)
            .ok_or(CaptureError::InvalidMonitor { index, available })
    }

    fn window(title: &str) -> CaptureResult<(Window, WindowInfo)> {
        let windows = Window::all().map_err(|e| CaptureError::EnumerationFailed {
            description: e.to_string(),
        })?;
        // Windows that refuse to describe themselves cannot be the game
        let mut described: Vec<(Window, WindowInfo)> = windows
            .into_iter()
            .filter_map(|w| describe_window(&w).ok().map(|info| (w, info)))
            .collect();
        let index = find_window(described.iter().map(|(_, info)| info), title).ok_or_else(|| {
            CaptureError::WindowNotFound {
                title: title.to_string(),
            }
        })?;
        Ok(described.swap_remove(index))
    }

    /// Capture the bound window or the monitor, with its desktop origin.
    fn grab(&self, index: MonitorIndex) -> CaptureResult<(RgbaImage, (i32, i32))> {
        match &self.window_title {
            Some(title) => {
                let (window, info) = Self::window(title)?;
                let image = window
                    .capture_image()
                    .map_err(|e| window_failed(title, e))?;
                log::trace!("🪟 Window '{}' at ({}, {})", info.title, info.x, info.y);
                Ok((image, (info.x, info.y)))
            }
            None => {
                let monitor = Self::monitor(index)?;
                let origin = (
                    monitor.x().map_err(|e| failed(index, e))?,
                    monitor.y().map_err(|e| failed(index, e))?,
                );
                let image = monitor.capture_image().map_err(|e| failed(index, e))?;
                Ok((image, origin))
            }
        }
    }

    /// Full-colour capture, used by the screenshot mode to produce template material.
    pub fn capture_rgba(&self, index: MonitorIndex) -> CaptureResult<RgbaImage> {
        self.grab(index).map(|(image, _)| image)
    }
}

impl FrameSource for ScreenCapture {
    fn monitors(&self) -> CaptureResult<Vec<MonitorInfo>> {
        let monitors = Monitor::all().map_err(|e| CaptureError::EnumerationFailed {
            description: e.to_string(),
        })?;
        monitors
            .iter()
            .enumerate()
            .map(|(i, m)| describe(i + 1, m))
            .collect()
    }

    fn dimensions(&self, monitor: MonitorIndex) -> CaptureResult<(u32, u32)> {
        match &self.window_title {
            Some(title) => Self::window(title).map(|(_, info)| (info.width, info.height)),
            None => {
                let m = Self::monitor(monitor)?;
                Ok((
                    m.width().map_err(|e| failed(monitor, e))?,
                    m.height().map_err(|e| failed(monitor, e))?,
                ))
            }
        }
    }

    fn capture(&mut self, index: MonitorIndex) -> CaptureResult<Frame> {
        let start = std::time::Instant::now();
        let (rgba, origin) = self.grab(index)?;
        let gray = DynamicImage::ImageRgba8(rgba).to_luma8();
        log::trace!(
            "📸 Captured {}x{} at ({}, {}) in {}ms",
            gray.width(),
            gray.height(),
            origin.0,
            origin.1,
            start.elapsed().as_millis()
        );
        Ok(Frame::new(gray, index, origin))
    }
}

fn failed(index: MonitorIndex, e: XCapError) -> CaptureError {
    CaptureError::CaptureFailed {
        index,
        description: e.to_string(),
    }
}

fn window_failed(title: &str, e: XCapError) -> CaptureError {
    CaptureError::WindowCaptureFailed {
        title: title.to_string(),
        description: e.to_string(),
    }
}

fn describe(index: MonitorIndex, monitor: &Monitor) -> CaptureResult<MonitorInfo> {
    Ok(MonitorInfo {
        index,
        name: monitor.name().map_err(|e| failed(index, e))?,
        x: monitor.x().map_err(|e| failed(index, e))?,
        y: monitor.y().map_err(|e| failed(index, e))?,
        width: monitor.width().map_err(|e| failed(index, e))?,
        height: monitor.height().map_err(|e| failed(index, e))?,
        is_primary: monitor.is_primary().map_err(|e| failed(index, e))?,
    })
}

fn describe_window(window: &Window) -> Result<WindowInfo, XCapError> {
    Ok(WindowInfo {
        title: window.title()?,
        x: window.x()?,
        y: window.y()?,
        width: window.width()?,
        height: window.height()?,
        is_minimized: window.is_minimized()?,
    })
}
