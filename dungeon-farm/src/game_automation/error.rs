// Configuration errors. Every one of these prevents a run from starting.
use crate::capture::CaptureError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load template {path:?}: {description}")]
    Load { path: PathBuf, description: String },

    #[error(
        "Template '{name}' is {template_width}x{template_height} but its search region is only {region_width}x{region_height}"
    )]
    TemplateSize {
        name: String,
        template_width: u32,
        template_height: u32,
        region_width: u32,
        region_height: u32,
    },

    #[error("Unknown state '{state}' for variant {variant}")]
    UnknownState { state: String, variant: String },

    #[error("Unknown named region '{name}'")]
    UnknownRegion { name: String },

    #[error("Fractional region ({x}, {y}, {width}, {height}) must lie within 0.0..=1.0")]
    InvalidFraction {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },

    #[error("Template '{name}' threshold {threshold} must be in (0, 1]")]
    InvalidThreshold { name: String, threshold: f32 },

    #[error("No bindings configured for variant {variant}")]
    NoBindings { variant: String },

    #[error("Failed to read profile {path:?}: {source}")]
    ProfileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid profile {path:?}: {source}")]
    ProfileParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Tick interval must be greater than zero")]
    ZeroInterval,

    #[error("Display check failed: {0}")]
    Capture(#[from] CaptureError),
}
