//! Zero-mean normalized cross-correlation matcher
//!
//! Scores are the Pearson correlation between the template and each window
//! of the search area, clamped to `[0, 1]`. Window sums come from
//! summed-area tables; the cross term is accumulated exactly in integers so
//! repeated runs on the same bytes give the same score.

use super::template::Template;
use crate::capture::Frame;
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::template_matching::find_extremes;
use std::borrow::Cow;

/// Where a template matched, in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl MatchRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get tap coordinates at the center of this match
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}

/// Outcome of matching one template against one frame. The region is only
/// present when the confidence cleared the template's threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub template: String,
    pub confidence: f32,
    region: Option<MatchRegion>,
}

impl MatchResult {
    fn miss(template: &Template, confidence: f32) -> Self {
        Self {
            template: template.name.clone(),
            confidence,
            region: None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.region.is_some()
    }

    pub fn region(&self) -> Option<&MatchRegion> {
        self.region.as_ref()
    }
}

/// Summed-area tables for window sums and sums of squares.
struct WindowSums {
    stride: usize,
    sum: Vec<u64>,
    sum_sq: Vec<u64>,
}

impl WindowSums {
    fn new(image: &GrayImage) -> Self {
        let (w, h) = (image.width() as usize, image.height() as usize);
        let stride = w + 1;
        let mut sum = vec![0u64; stride * (h + 1)];
        let mut sum_sq = vec![0u64; stride * (h + 1)];
        let raw = image.as_raw();
        for y in 0..h {
            let mut row = 0u64;
            let mut row_sq = 0u64;
            for x in 0..w {
                let p = raw[y * w + x] as u64;
                row += p;
                row_sq += p * p;
                let idx = (y + 1) * stride + x + 1;
                sum[idx] = sum[idx - stride] + row;
                sum_sq[idx] = sum_sq[idx - stride] + row_sq;
            }
        }
        Self {
            stride,
            sum,
            sum_sq,
        }
    }

    fn window(&self, x: u32, y: u32, width: u32, height: u32) -> (u64, u64) {
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + width as usize, y0 + height as usize);
        let at = |table: &[u64], x: usize, y: usize| table[y * self.stride + x];
        let rect = |table: &[u64]| {
            at(table, x1, y1) + at(table, x0, y0) - at(table, x1, y0) - at(table, x0, y1)
        };
        (rect(&self.sum), rect(&self.sum_sq))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateMatcher;

impl TemplateMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Score `template` against `frame`, restricted to the template's search region.
    pub fn match_template(&self, frame: &Frame, template: &Template) -> MatchResult {
        let image = frame.image();
        let window = template.search_window(image.width(), image.height());
        let (tw, th) = template.dimensions();

        if tw == 0 || th == 0 || tw > window.width || th > window.height {
            // Only reachable when the display changed after loading
            log::warn!(
                "⚠️ Template '{}' ({}x{}) no longer fits its search window {}x{}",
                template.name,
                tw,
                th,
                window.width,
                window.height
            );
            return MatchResult::miss(template, 0.0);
        }

        let search: Cow<'_, GrayImage> =
            if window.x == 0 && window.y == 0 && (window.width, window.height) == image.dimensions() {
                Cow::Borrowed(image)
            } else {
                Cow::Owned(
                    image::imageops::crop_imm(image, window.x, window.y, window.width, window.height)
                        .to_image(),
                )
            };

        let scores = self.score_map(&search, template);
        let extremes = find_extremes(&scores);
        let confidence = extremes.max_value.clamp(0.0, 1.0);

        if confidence >= template.threshold {
            let (x, y) = extremes.max_value_location;
            log::debug!(
                "🎯 Template '{}' found at ({}, {}) with confidence {:.3}",
                template.name,
                window.x + x,
                window.y + y,
                confidence
            );
            MatchResult {
                template: template.name.clone(),
                confidence,
                region: Some(MatchRegion::new(window.x + x, window.y + y, tw, th)),
            }
        } else {
            log::trace!(
                "👀 Template '{}' best confidence {:.3} < {:.3}",
                template.name,
                confidence,
                template.threshold
            );
            MatchResult::miss(template, confidence)
        }
    }

    /// Correlation score for every placement of `template` inside `search`.
    /// Flat windows and flat templates score zero.
    pub fn score_map(
        &self,
        search: &GrayImage,
        template: &Template,
    ) -> ImageBuffer<Luma<f32>, Vec<f32>> {
        let (tw, th) = template.dimensions();
        let (sw, sh) = search.dimensions();
        let out_w = sw - tw + 1;
        let out_h = sh - th + 1;

        let sums = WindowSums::new(search);
        let n = (tw as u64 * th as u64) as f64;
        let t_mean = template.mean();
        let t_norm = template.centered_norm();
        let s_raw = search.as_raw();
        let t_raw = template.image().as_raw();
        let (sw, tw_us) = (sw as usize, tw as usize);

        ImageBuffer::from_fn(out_w, out_h, |x, y| {
            if template.is_flat() {
                return Luma([0.0]);
            }
            let (sum, sum_sq) = sums.window(x, y, tw, th);
            let window_var = sum_sq as f64 - (sum as f64 * sum as f64) / n;
            if window_var < 0.5 {
                return Luma([0.0]);
            }

            let mut cross = 0u64;
            for ty in 0..th as usize {
                let s_start = (y as usize + ty) * sw + x as usize;
                let s_row = &s_raw[s_start..s_start + tw_us];
                let t_row = &t_raw[ty * tw_us..(ty + 1) * tw_us];
                cross += s_row
                    .iter()
                    .zip(t_row)
                    .map(|(&a, &b)| a as u64 * b as u64)
                    .sum::<u64>();
            }

            // sum((t - mean_t) * s) == sum(t * s) - mean_t * sum(s)
            let numerator = cross as f64 - t_mean * sum as f64;
            Luma([(numerator / (t_norm * window_var.sqrt())) as f32])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{frame_from, frame_filled, pattern, stamp};

    #[test]
    fn test_self_match_is_perfect() {
        let img = pattern(40, 24, 3);
        let template = Template::from_image("self", img.clone(), None, 0.9);
        let result = TemplateMatcher::new().match_template(&frame_from(img), &template);
        assert!(result.confidence > 0.999, "got {}", result.confidence);
        assert_eq!(result.region(), Some(&MatchRegion::new(0, 0, 40, 24)));
    }

    #[test]
    fn test_finds_stamped_template_location() {
        let patch = pattern(16, 12, 11);
        let mut canvas = pattern(160, 90, 99);
        stamp(&mut canvas, &patch, 101, 37);
        let template = Template::from_image("patch", patch, None, 0.9);

        let result = TemplateMatcher::new().match_template(&frame_from(canvas), &template);
        assert!(result.is_match());
        assert_eq!(result.region(), Some(&MatchRegion::new(101, 37, 16, 12)));
        assert_eq!(result.region().unwrap().center(), (109, 43));
    }

    #[test]
    fn test_blank_frame_scores_zero() {
        let template = Template::from_image("t", pattern(20, 20, 5), None, 0.5);
        let result = TemplateMatcher::new().match_template(&frame_filled(100, 80, 128), &template);
        assert_eq!(result.confidence, 0.0);
        assert!(!result.is_match());
        assert!(result.region().is_none());
    }

    #[test]
    fn test_brightness_shift_keeps_score() {
        let patch = pattern(24, 16, 2);
        let brighter = GrayImage::from_fn(24, 16, |x, y| {
            Luma([patch.get_pixel(x, y)[0] / 2 + 100])
        });
        let template = Template::from_image("t", patch, None, 0.95);
        let result = TemplateMatcher::new().match_template(&frame_from(brighter), &template);
        assert!(result.confidence > 0.98, "got {}", result.confidence);
    }

    #[test]
    fn test_search_region_limits_where_matches_land() {
        use crate::game_automation::match_image::SearchRegion;

        let patch = pattern(10, 10, 8);
        let mut canvas = GrayImage::from_pixel(120, 60, Luma([0]));
        stamp(&mut canvas, &patch, 5, 5);
        stamp(&mut canvas, &patch, 90, 40);

        let right_half = SearchRegion::new(60, 0, 60, 60, "right".to_string());
        let template = Template::from_image("t", patch, Some(right_half), 0.9);
        let result = TemplateMatcher::new().match_template(&frame_from(canvas), &template);
        assert_eq!(result.region(), Some(&MatchRegion::new(90, 40, 10, 10)));
    }

    #[test]
    fn test_oversized_template_is_a_miss() {
        let template = Template::from_image("big", pattern(50, 50, 1), None, 0.5);
        let result = TemplateMatcher::new().match_template(&frame_from(pattern(30, 30, 1)), &template);
        assert!(!result.is_match());
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_flat_template_never_matches() {
        let flat = GrayImage::from_pixel(8, 8, Luma([200]));
        let template = Template::from_image("flat", flat.clone(), None, 0.1);
        assert!(template.is_flat());
        let result = TemplateMatcher::new().match_template(&frame_from(flat), &template);
        assert!(!result.is_match());
    }

    #[test]
    fn test_window_sums() {
        let img = GrayImage::from_fn(4, 3, |x, y| Luma([(x + y * 4) as u8]));
        let sums = WindowSums::new(&img);
        // pixels 5,6,9,10
        assert_eq!(sums.window(1, 1, 2, 2), (30, 25 + 36 + 81 + 100));
        assert_eq!(sums.window(0, 0, 4, 3).0, (0u64..12).sum::<u64>());
    }
}
