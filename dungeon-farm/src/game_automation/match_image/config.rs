//! Configuration for image matching operations

#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Threshold for bindings that do not set their own (0.0 to 1.0]
    pub default_threshold: f32,
    /// Search margin around a region embedded in a template file name (±N pixels)
    pub patch_search_margin: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            default_threshold: 0.8,
            patch_search_margin: 10,
        }
    }
}
