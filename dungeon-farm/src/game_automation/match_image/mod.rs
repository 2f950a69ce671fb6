//! Image matching module for desktop game automation
//!
//! Template loading, zero-mean normalized cross-correlation, search regions,
//! and the resolver that turns per-template scores into one UI state.

pub mod config;
pub mod matcher;
pub mod region;
pub mod resolver;
pub mod template;


// Re-export main types and functions
pub use config::MatchConfig;
pub use matcher::{MatchRegion, MatchResult, TemplateMatcher};
pub use region::{RegionManager, RegionSpec, SearchRegion};
pub use resolver::{Resolution, StateResolver};
pub use template::Template;
