use super::types::KeyCode;
use thiserror::Error;

/// A specialized `Result` type for input dispatch.
pub type InputResult<T> = Result<T, InputDispatchError>;

/// The error type for OS input calls. Never retried by the dispatcher.
#[derive(Debug, Error)]
pub enum InputDispatchError {
    #[error("Input backend unavailable: {description}")]
    Unavailable { description: String },

    #[error("Pointer move to ({x}, {y}) failed: {description}")]
    MoveFailed { x: i32, y: i32, description: String },

    #[error("Mouse button event failed: {description}")]
    ButtonFailed { description: String },

    #[error("Key event for '{key}' failed: {description}")]
    KeyFailed { key: KeyCode, description: String },

    #[error("Pointer location unavailable: {description}")]
    LocationFailed { description: String },

    #[error("Click targets the match center but the binding produced no match region")]
    MissingMatchRegion,
}
