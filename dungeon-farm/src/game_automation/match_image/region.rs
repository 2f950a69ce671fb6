//! Search region management for targeted template matching

use crate::game_automation::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pixel rectangle inside a captured frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub name: String,
}

impl SearchRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32, name: String) -> Self {
        Self {
            x,
            y,
            width,
            height,
            name,
        }
    }

    /// Create a full-screen region
    pub fn full_screen(screen_width: u32, screen_height: u32) -> Self {
        Self::new(0, 0, screen_width, screen_height, "full_screen".to_string())
    }

    /// Parse region from filename format: template-[x,y,width,height].png
    /// The region is returned as written, without clipping.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let region_str = Self::extract_region_string(filename)?;
        Self::parse_region_coordinates(&region_str)
    }

    /// Extract region string from filename (e.g., "[300,1682,50,50]")
    fn extract_region_string(filename: &str) -> Option<String> {
        if let Some(start) = filename.find('[')
            && let Some(end) = filename.find(']')
            && end > start
        {
            return Some(filename[start + 1..end].to_string());
        }
        None
    }

    /// Parse coordinates from region string (e.g., "300,1682,50,50")
    fn parse_region_coordinates(region_str: &str) -> Option<SearchRegion> {
        let parts: Vec<&str> = region_str.split(',').collect();
        if parts.len() == 4
            && let (Ok(x), Ok(y), Ok(width), Ok(height)) = (
                parts[0].trim().parse::<u32>(),
                parts[1].trim().parse::<u32>(),
                parts[2].trim().parse::<u32>(),
                parts[3].trim().parse::<u32>(),
            )
        {
            return Some(SearchRegion::new(
                x,
                y,
                width,
                height,
                format!("parsed_{}_{}_{}_{}", x, y, width, height),
            ));
        }
        None
    }

    /// Clip region to screen boundaries
    pub fn clip_to_screen(&self, screen_width: u32, screen_height: u32) -> SearchRegion {
        let mut region = self.clone();
        region.x = region.x.min(screen_width.saturating_sub(1));
        region.y = region.y.min(screen_height.saturating_sub(1));
        region.width = region.width.min(screen_width.saturating_sub(region.x));
        region.height = region.height.min(screen_height.saturating_sub(region.y));
        region
    }

    /// Grow the region by `margin` on every side, staying on screen
    pub fn expand(&self, margin: u32, screen_width: u32, screen_height: u32) -> SearchRegion {
        let x = self.x.saturating_sub(margin);
        let y = self.y.saturating_sub(margin);
        let right = self
            .x
            .saturating_add(self.width)
            .saturating_add(margin)
            .min(screen_width);
        let bottom = self
            .y
            .saturating_add(self.height)
            .saturating_add(margin)
            .min(screen_height);
        SearchRegion::new(
            x,
            y,
            right.saturating_sub(x),
            bottom.saturating_sub(y),
            format!("{}+{}", self.name, margin),
        )
    }
}

/// How a profile expresses where a template is expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegionSpec {
    /// Absolute pixels on the captured monitor
    Pixels {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    /// Fractions of the monitor size, all in 0.0..=1.0
    Fraction {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    /// One of the presets in `RegionManager`
    Named { name: String },
}

impl RegionSpec {
    pub fn fraction(x: f32, y: f32, width: f32, height: f32) -> Self {
        RegionSpec::Fraction {
            x,
            y,
            width,
            height,
        }
    }

    pub fn named(name: &str) -> Self {
        RegionSpec::Named {
            name: name.to_string(),
        }
    }

    pub fn resolve(&self, regions: &RegionManager) -> Result<SearchRegion, ConfigError> {
        let (w, h) = regions.screen_size();
        match self {
            RegionSpec::Pixels {
                x,
                y,
                width,
                height,
            } => Ok(SearchRegion::new(*x, *y, *width, *height, "pixels".to_string())
                .clip_to_screen(w, h)),
            RegionSpec::Fraction {
                x,
                y,
                width,
                height,
            } => {
                let in_range = |v: f32| (0.0..=1.0).contains(&v);
                if !(in_range(*x) && in_range(*y) && in_range(*width) && in_range(*height)) {
                    return Err(ConfigError::InvalidFraction {
                        x: *x,
                        y: *y,
                        width: *width,
                        height: *height,
                    });
                }
                Ok(SearchRegion::new(
                    (x * w as f32) as u32,
                    (y * h as f32) as u32,
                    (width * w as f32) as u32,
                    (height * h as f32) as u32,
                    format!("fraction_{x}_{y}_{width}_{height}"),
                )
                .clip_to_screen(w, h))
            }
            RegionSpec::Named { name } => {
                regions
                    .get_region(name)
                    .cloned()
                    .ok_or_else(|| ConfigError::UnknownRegion { name: name.clone() })
            }
        }
    }
}

/// Manager for predefined search regions on a desktop game screen
pub struct RegionManager {
    regions: HashMap<String, SearchRegion>,
    screen_width: u32,
    screen_height: u32,
}

impl RegionManager {
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        let mut manager = Self {
            regions: HashMap::new(),
            screen_width,
            screen_height,
        };
        manager.add_common_regions();
        manager
    }

    /// Quadrants, center and the strips where game menus usually live
    fn add_common_regions(&mut self) {
        let w = self.screen_width;
        let h = self.screen_height;

        let presets = [
            ("top_left", 0, 0, w / 2, h / 2),
            ("top_right", w / 2, 0, w - w / 2, h / 2),
            ("bottom_left", 0, h / 2, w / 2, h - h / 2),
            ("bottom_right", w / 2, h / 2, w - w / 2, h - h / 2),
            ("center", w / 4, h / 4, w / 2, h / 2),
            ("top_strip", 0, 0, w, h / 8),
            ("bottom_strip", 0, h * 7 / 8, w, h - h * 7 / 8),
            // Dialog buttons and the queue widget in most MMO lobbies
            ("dialog_buttons", w / 4, h / 2, w / 2, h / 3),
            ("lower_right_cluster", w / 2, h * 3 / 4, w / 2, h / 4),
        ];
        for (name, x, y, width, height) in presets {
            self.add_region(name, SearchRegion::new(x, y, width, height, name.to_string()));
        }
    }

    pub fn add_region(&mut self, name: &str, region: SearchRegion) {
        self.regions.insert(name.to_string(), region);
    }

    pub fn get_region(&self, name: &str) -> Option<&SearchRegion> {
        self.regions.get(name)
    }

    pub fn screen_size(&self) -> (u32, u32) {
        (self.screen_width, self.screen_height)
    }
}
