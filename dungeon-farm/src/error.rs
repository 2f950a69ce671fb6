use crate::capture::CaptureError;
use crate::game_automation::ConfigError;
use crate::input::InputDispatchError;
use thiserror::Error;

/// Top-level error for the command line entry points.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Input error: {0}")]
    Input(#[from] InputDispatchError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
