use thiserror::Error;

/// A specialized `Result` type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// The error type for reading frames off a display.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Monitor {index} is not attached ({available} display(s) found, indices start at 1)")]
    InvalidMonitor { index: usize, available: usize },

    #[error("Failed to enumerate displays: {description}")]
    EnumerationFailed { description: String },

    #[error("Screen capture failed on monitor {index}: {description}")]
    CaptureFailed { index: usize, description: String },

    #[error("No visible window title contains '{title}'")]
    WindowNotFound { title: String },

    #[error("Capturing window '{title}' failed: {description}")]
    WindowCaptureFailed { title: String, description: String },
}
