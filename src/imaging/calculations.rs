//! Pure calculation functions for filter parameters and edit geometry.
//!
//! All functions here are pure and testable without any images.

use super::params::{CropMargins, Intensity};

/// Gaussian blur radius for a filter intensity: `round(10 × intensity)`, at least 1.
///
/// ```
/// # use easel::imaging::{Intensity, calculations::blur_radius};
/// assert_eq!(blur_radius(Intensity::new(0.0)), 1);
/// assert_eq!(blur_radius(Intensity::new(0.46)), 5);
/// assert_eq!(blur_radius(Intensity::new(1.0)), 10);
/// ```
pub fn blur_radius(intensity: Intensity) -> u32 {
    ((10.0 * intensity.value()).round() as u32).max(1)
}

/// Sharpness enhancement factor for a filter intensity: `1 + 4 × intensity`.
pub fn sharpen_factor(intensity: Intensity) -> f32 {
    1.0 + 4.0 * intensity.value()
}

/// A pixel rectangle inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

fn percent_to_pixels(dimension: u32, percent: f32) -> u32 {
    (dimension as f64 * percent as f64 / 100.0).round() as u32
}

/// Convert percentage margins into a pixel crop box.
///
/// Returns `None` when the box would have zero area
/// (`left ≥ right` or `top ≥ bottom` once rounded to pixels).
pub fn crop_box(dimensions: (u32, u32), margins: &CropMargins) -> Option<PixelBox> {
    let (width, height) = dimensions;
    let left = percent_to_pixels(width, margins.left.value());
    let top = percent_to_pixels(height, margins.top.value());
    let right = percent_to_pixels(width, margins.right.value());
    let bottom = percent_to_pixels(height, margins.bottom.value());

    if left >= right || top >= bottom {
        return None;
    }
    Some(PixelBox {
        x: left,
        y: top,
        width: right - left,
        height: bottom - top,
    })
}

/// Canvas size that holds a `width × height` image rotated by `degrees`
/// without clipping any corner.
pub fn rotated_dimensions(width: u32, height: u32, degrees: f32) -> (u32, u32) {
    let radians = (degrees as f64).to_radians();
    let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
    let (w, h) = (width as f64, height as f64);
    // Absorb float noise so a quarter turn does not grow by a pixel
    let fit = |v: f64| ((v - 1e-6).ceil() as u32).max(1);
    (fit(w * cos + h * sin), fit(w * sin + h * cos))
}

/// Region presumed to hold the subject for background removal: the central
/// 80% of the image, a 10% margin on each side.
pub fn foreground_roi(width: u32, height: u32) -> PixelBox {
    PixelBox {
        x: width / 10,
        y: height / 10,
        width: width * 8 / 10,
        height: height * 8 / 10,
    }
}

/// Vignette mask value (255 = keep, 0 = black) for a pixel.
///
/// `255 − ⌊255 × (distance / radius)² × intensity⌋`, clamped to `[0, 255]`,
/// with the centre at `(⌊w/2⌋, ⌊h/2⌋)`. The caller guarantees `radius > 0`.
pub fn vignette_value(x: u32, y: u32, center: (u32, u32), radius: u32, intensity: f32) -> u8 {
    let dx = x as f64 - center.0 as f64;
    let dy = y as f64 - center.1 as f64;
    let ratio = (dx * dx + dy * dy).sqrt() / radius as f64;
    let falloff = (255.0 * ratio * ratio * intensity as f64).trunc();
    (255.0 - falloff).clamp(0.0, 255.0) as u8
}

/// Vignette radius: half the shorter side, in whole pixels.
pub fn vignette_radius(width: u32, height: u32) -> u32 {
    width.min(height) / 2
}
