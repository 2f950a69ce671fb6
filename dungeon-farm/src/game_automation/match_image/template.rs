//! Template loading and the statistics the matcher needs

use super::region::SearchRegion;
use crate::game_automation::error::ConfigError;
use image::GrayImage;
use std::path::{Path, PathBuf};

/// Reference image for one UI element. Loaded once and immutable afterwards.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    pub path: PathBuf,
    pub search_region: Option<SearchRegion>,
    pub threshold: f32,
    image: GrayImage,
    mean: f64,
    centered_norm: f64,
}

impl Template {
    pub fn from_image(
        name: impl Into<String>,
        image: GrayImage,
        search_region: Option<SearchRegion>,
        threshold: f32,
    ) -> Self {
        let n = (image.width() as u64 * image.height() as u64).max(1) as f64;
        let (sum, sum_sq) = image.as_raw().iter().fold((0u64, 0u64), |(s, sq), &p| {
            let p = p as u64;
            (s + p, sq + p * p)
        });
        let mean = sum as f64 / n;
        // sum((t - mean)^2) == sum(t^2) - sum(t)^2 / n
        let centered = (sum_sq as f64 - (sum as f64 * sum as f64) / n).max(0.0);

        Self {
            name: name.into(),
            path: PathBuf::new(),
            search_region,
            threshold,
            image,
            mean,
            centered_norm: centered.sqrt(),
        }
    }

    /// Load a template file.
    ///
    /// A file named like `btn_match-[812,940,120,40].png` carries its own
    /// region. When the file is a full screenshot the patch is cropped out of
    /// it; either way the search defaults to that rectangle widened by
    /// `patch_margin`. An explicit `search_region` always wins.
    pub fn load(
        path: &Path,
        search_region: Option<SearchRegion>,
        threshold: f32,
        patch_margin: u32,
        screen: (u32, u32),
    ) -> Result<Self, ConfigError> {
        let decoded = image::open(path).map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            description: e.to_string(),
        })?;
        let mut gray = decoded.to_luma8();

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        let mut default_region = None;
        if let Some(patch) = SearchRegion::from_filename(&name) {
            let (Some(right), Some(bottom)) = (
                patch.x.checked_add(patch.width),
                patch.y.checked_add(patch.height),
            ) else {
                return Err(ConfigError::Load {
                    path: path.to_path_buf(),
                    description: format!(
                        "region [{},{},{},{}] in file name is out of range",
                        patch.x, patch.y, patch.width, patch.height
                    ),
                });
            };
            if gray.width() > patch.width || gray.height() > patch.height {
                if right > gray.width() || bottom > gray.height() {
                    return Err(ConfigError::Load {
                        path: path.to_path_buf(),
                        description: format!(
                            "crop region [{},{},{},{}] exceeds image bounds ({}x{})",
                            patch.x,
                            patch.y,
                            patch.width,
                            patch.height,
                            gray.width(),
                            gray.height()
                        ),
                    });
                }
                log::debug!(
                    "✂️ Cropping template '{}' from {}x{} to [{},{},{},{}]",
                    name,
                    gray.width(),
                    gray.height(),
                    patch.x,
                    patch.y,
                    patch.width,
                    patch.height
                );
                gray = image::imageops::crop_imm(&gray, patch.x, patch.y, patch.width, patch.height)
                    .to_image();
            }
            default_region = Some(patch.expand(patch_margin, screen.0, screen.1));
        }

        let mut template = Self::from_image(name, gray, search_region.or(default_region), threshold);
        template.path = path.to_path_buf();
        if template.is_flat() {
            log::warn!(
                "⚠️ Template '{}' has no contrast and will never match",
                template.name
            );
        }
        Ok(template)
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Root of the summed squared deviation from the mean
    pub fn centered_norm(&self) -> f64 {
        self.centered_norm
    }

    pub fn is_flat(&self) -> bool {
        self.centered_norm < f64::EPSILON
    }

    /// The part of a `frame_width` x `frame_height` frame this template is searched in
    pub fn search_window(&self, frame_width: u32, frame_height: u32) -> SearchRegion {
        match &self.search_region {
            Some(region) => region.clip_to_screen(frame_width, frame_height),
            None => SearchRegion::full_screen(frame_width, frame_height),
        }
    }

    /// Configuration-time size check against the target screen
    pub fn check_fits(&self, screen: (u32, u32)) -> Result<(), ConfigError> {
        let window = self.search_window(screen.0, screen.1);
        let (width, height) = self.dimensions();
        if width == 0 || height == 0 || width > window.width || height > window.height {
            return Err(ConfigError::TemplateSize {
                name: self.name.clone(),
                template_width: width,
                template_height: height,
                region_width: window.width,
                region_height: window.height,
            });
        }
        Ok(())
    }
}
