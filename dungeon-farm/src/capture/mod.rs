// Capture module - screen frames for the perception loop
// This module abstracts reading a display into an in-memory frame so the
// automation engine can run against real monitors, a single game window or
// scripted test frames.

pub mod error;
pub mod screen;
pub mod types;
pub mod window;

// Re-export the main types for easy access
pub use error::{CaptureError, CaptureResult};
pub use screen::ScreenCapture;
pub use types::{Frame, FrameSource, MonitorIndex, MonitorInfo};
pub use window::WindowInfo;
