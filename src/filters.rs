// SPDX-License-Identifier: GPL-3.0-only

//! Visual filters for the live preview and captured photos
//!
//! Each filter mirrors a CSS filter function so that a capture looks the same
//! as it would on a canvas with `ctx.filter` set to [`FilterType::expression`].
//! Colour filters work per pixel in linear 0-1 space; blur is spatial and
//! works on the whole image.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Selectable filters, in display order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterType {
    /// No visual effect
    #[default]
    None,
    /// Warm brownish tint, `sepia(100%)`
    Sepia,
    /// Luminance only, `grayscale(100%)`
    Grayscale,
    /// Gaussian blur, `blur(2px)`
    Blur,
    /// Brighter image, `brightness(150%)`
    Brightness,
    /// Stronger contrast, `contrast(150%)`
    Contrast,
}

/// Standard deviation of the blur filter in source pixels
const BLUR_SIGMA_PX: f32 = 2.0;
/// Multiplier used by the brightness filter
const BRIGHTNESS_FACTOR: f32 = 1.5;
/// Multiplier used by the contrast filter
const CONTRAST_FACTOR: f32 = 1.5;

impl FilterType {
    /// All filters in the order they are offered to the user
    pub const ALL: [FilterType; 6] = [
        FilterType::None,
        FilterType::Sepia,
        FilterType::Grayscale,
        FilterType::Blur,
        FilterType::Brightness,
        FilterType::Contrast,
    ];

    /// Display name for the filter bar
    pub fn display_name(&self) -> &'static str {
        match self {
            FilterType::None => "None",
            FilterType::Sepia => "Sepia",
            FilterType::Grayscale => "Grayscale",
            FilterType::Blur => "Blur",
            FilterType::Brightness => "Brightness",
            FilterType::Contrast => "Contrast",
        }
    }

    /// CSS filter expression this filter reproduces (empty for no effect)
    pub fn expression(&self) -> &'static str {
        match self {
            FilterType::None => "",
            FilterType::Sepia => "sepia(100%)",
            FilterType::Grayscale => "grayscale(100%)",
            FilterType::Blur => "blur(2px)",
            FilterType::Brightness => "brightness(150%)",
            FilterType::Contrast => "contrast(150%)",
        }
    }

    /// Look up a filter by its display name, case-insensitively
    pub fn from_name(name: &str) -> Option<FilterType> {
        Self::ALL
            .into_iter()
            .find(|f| f.display_name().eq_ignore_ascii_case(name))
    }

    /// Filter at a zero-based position in [`FilterType::ALL`]
    pub fn from_index(index: usize) -> Option<FilterType> {
        Self::ALL.get(index).copied()
    }
}

impl std::fmt::Display for FilterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Apply a filter to an image in place
///
/// `scale` is the ratio between this image and the native frame width. The
/// blur radius is multiplied by it so a downscaled preview blurs by the same
/// visual amount as the full resolution capture.
pub fn apply_filter(image: &mut RgbaImage, filter: FilterType, scale: f32) {
    match filter {
        FilterType::None => {}
        FilterType::Blur => {
            let sigma = (BLUR_SIGMA_PX * scale).max(0.1);
            *image = image::imageops::blur(image, sigma);
        }
        _ => {
            for pixel in image.pixels_mut() {
                let mut r = pixel[0] as f32 / 255.0;
                let mut g = pixel[1] as f32 / 255.0;
                let mut b = pixel[2] as f32 / 255.0;

                apply_filter_rgb(&mut r, &mut g, &mut b, filter);

                pixel[0] = (r.clamp(0.0, 1.0) * 255.0).round() as u8;
                pixel[1] = (g.clamp(0.0, 1.0) * 255.0).round() as u8;
                pixel[2] = (b.clamp(0.0, 1.0) * 255.0).round() as u8;
            }
        }
    }
}

/// Apply a colour filter to RGB values in-place
///
/// Spatial filters are a no-op here.
#[inline]
pub fn apply_filter_rgb(r: &mut f32, g: &mut f32, b: &mut f32, filter: FilterType) {
    match filter {
        FilterType::None | FilterType::Blur => {}

        FilterType::Sepia => {
            // W3C filter-effects sepia matrix at amount 1
            let (sr, sg, sb) = (*r, *g, *b);
            *r = (0.393 * sr + 0.769 * sg + 0.189 * sb).min(1.0);
            *g = (0.349 * sr + 0.686 * sg + 0.168 * sb).min(1.0);
            *b = (0.272 * sr + 0.534 * sg + 0.131 * sb).min(1.0);
        }

        FilterType::Grayscale => {
            let luminance = 0.2126 * *r + 0.7152 * *g + 0.0722 * *b;
            *r = luminance;
            *g = luminance;
            *b = luminance;
        }

        FilterType::Brightness => {
            *r = (*r * BRIGHTNESS_FACTOR).min(1.0);
            *g = (*g * BRIGHTNESS_FACTOR).min(1.0);
            *b = (*b * BRIGHTNESS_FACTOR).min(1.0);
        }

        FilterType::Contrast => {
            *r = ((*r - 0.5) * CONTRAST_FACTOR + 0.5).clamp(0.0, 1.0);
            *g = ((*g - 0.5) * CONTRAST_FACTOR + 0.5).clamp(0.0, 1.0);
            *b = ((*b - 0.5) * CONTRAST_FACTOR + 0.5).clamp(0.0, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    #[test]
    fn test_filter_list_order_and_default() {
        assert_eq!(FilterType::ALL.len(), 6);
        assert_eq!(FilterType::ALL[0], FilterType::default());
        assert_eq!(FilterType::default().expression(), "");
    }

    #[test]
    fn test_expressions() {
        assert_eq!(FilterType::Sepia.expression(), "sepia(100%)");
        assert_eq!(FilterType::Grayscale.expression(), "grayscale(100%)");
        assert_eq!(FilterType::Blur.expression(), "blur(2px)");
        assert_eq!(FilterType::Brightness.expression(), "brightness(150%)");
        assert_eq!(FilterType::Contrast.expression(), "contrast(150%)");
    }

    #[test]
    fn test_from_name() {
        assert_eq!(FilterType::from_name("sepia"), Some(FilterType::Sepia));
        assert_eq!(FilterType::from_name("GRAYSCALE"), Some(FilterType::Grayscale));
        assert_eq!(FilterType::from_name("vintage"), None);
    }

    #[test]
    fn test_none_leaves_pixels_untouched() {
        let mut img = solid(3, 2, [10, 20, 30, 255]);
        let before = img.clone();
        apply_filter(&mut img, FilterType::None, 1.0);
        assert_eq!(img, before);
    }

    #[test]
    fn test_grayscale_equalises_channels() {
        let mut img = solid(2, 2, [200, 40, 90, 255]);
        apply_filter(&mut img, FilterType::Grayscale, 1.0);
        let p = img.get_pixel(0, 0);
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
        assert_eq!(p[3], 255);
    }

    #[test]
    fn test_sepia_is_warm() {
        let mut img = solid(1, 1, [128, 128, 128, 255]);
        apply_filter(&mut img, FilterType::Sepia, 1.0);
        let p = img.get_pixel(0, 0);
        assert!(p[0] > p[1] && p[1] > p[2], "sepia should tint red > green > blue");
    }

    #[test]
    fn test_brightness_and_contrast() {
        let mut bright = solid(1, 1, [100, 100, 100, 255]);
        apply_filter(&mut bright, FilterType::Brightness, 1.0);
        assert_eq!(bright.get_pixel(0, 0)[0], 150);

        let mut mid = solid(1, 1, [128, 128, 128, 255]);
        apply_filter(&mut mid, FilterType::Contrast, 1.0);
        // Mid grey is the contrast pivot
        assert!((mid.get_pixel(0, 0)[0] as i32 - 128).abs() <= 1);

        let mut dark = solid(1, 1, [64, 64, 64, 255]);
        apply_filter(&mut dark, FilterType::Contrast, 1.0);
        assert!(dark.get_pixel(0, 0)[0] < 64);
    }

    #[test]
    fn test_blur_keeps_dimensions_and_spreads_edges() {
        let mut img = solid(16, 16, [0, 0, 0, 255]);
        for y in 0..16 {
            for x in 8..16 {
                img.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        apply_filter(&mut img, FilterType::Blur, 1.0);
        assert_eq!(img.dimensions(), (16, 16));
        let edge = img.get_pixel(7, 8)[0];
        assert!(edge > 0 && edge < 255, "edge pixel should be mixed, got {}", edge);
    }
}
