//! Shared test utilities for the easel test suite.
//!
//! Small synthetic images with known pixel values, so tests can assert exact
//! outputs without fixture files.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let img = subject_on_background(60, [250, 250, 250], [20, 40, 200]);
//! let out = edits::remove_background(&img);
//! assert_eq!(out.to_rgba8().get_pixel(0, 0).0[3], 0);
//! ```

use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

// =========================================================================
// Image builders
// =========================================================================

/// Every pixel the same colour.
pub fn solid_rgb(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb)))
}

/// Every pixel the same colour and alpha.
pub fn solid_rgba(width: u32, height: u32, rgba: [u8; 4]) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(rgba)))
}

/// Red ramps left to right, green top to bottom, blue is their mix.
///
/// Every channel varies, so colour transforms show up in every pixel.
pub fn gradient_rgb(width: u32, height: u32) -> DynamicImage {
    let w = width.max(2) - 1;
    let h = height.max(2) - 1;
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / w) as u8;
        let g = (y * 255 / h) as u8;
        Rgb([r, g, ((r as u16 + g as u16) / 2) as u8])
    }))
}

/// Black and white squares of `cell` pixels.
pub fn checkerboard_rgb(width: u32, height: u32, cell: u32) -> DynamicImage {
    let cell = cell.max(1);
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    }))
}

/// A square subject covering the central 40% of a `size × size` background.
pub fn subject_on_background(size: u32, subject: [u8; 3], background: [u8; 3]) -> DynamicImage {
    let lo = size * 3 / 10;
    let hi = size * 7 / 10;
    DynamicImage::ImageRgb8(RgbImage::from_fn(size, size, |x, y| {
        if (lo..hi).contains(&x) && (lo..hi).contains(&y) {
            Rgb(subject)
        } else {
            Rgb(background)
        }
    }))
}

// =========================================================================
// Pixel comparisons
// =========================================================================

/// Largest per-channel difference between two same-sized images (RGBA view).
/// Panics if the sizes differ.
pub fn max_channel_diff(a: &DynamicImage, b: &DynamicImage) -> u8 {
    assert_eq!(
        (a.width(), a.height()),
        (b.width(), b.height()),
        "images differ in size"
    );
    a.to_rgba8()
        .as_raw()
        .iter()
        .zip(b.to_rgba8().as_raw())
        .map(|(x, y)| x.abs_diff(*y))
        .max()
        .unwrap_or(0)
}
