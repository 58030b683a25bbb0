//! Single-factor enhancers: brightness, contrast, saturation, sharpness.
//!
//! Each enhancer interpolates between a *degenerate* image and the input:
//! `degenerate + factor × (input − degenerate)`. A factor of 1.0 returns the
//! input, 0.0 returns the degenerate image, and values above 1.0 extrapolate
//! away from it (clamped to the channel range).
//!
//! | Enhancer | Degenerate image |
//! |---|---|
//! | brightness | black |
//! | contrast | flat grey at the mean luma |
//! | saturation | the luma of each pixel |
//! | sharpness | a 3×3 smoothed copy (edges kept as-is) |
//!
//! These are not commutative: contrast depends on the image mean, so the
//! order in which they are chained changes the result.

use super::pixels::{Canvas, clamp_channel, lerp, luma};
use image::DynamicImage;

fn scale(channel: u8, pivot: f32, factor: f32) -> u8 {
    clamp_channel(pivot + factor * (channel as f32 - pivot))
}

pub fn brightness(image: &DynamicImage, factor: f32) -> DynamicImage {
    let mut canvas = Canvas::from_image(image);
    canvas.map_rgb(|_, _, px| px.map(|c| scale(c, 0.0, factor)));
    canvas.into_image()
}

pub fn contrast(image: &DynamicImage, factor: f32) -> DynamicImage {
    let mut canvas = Canvas::from_image(image);
    let mean = canvas.mean_luma();
    canvas.map_rgb(|_, _, px| px.map(|c| scale(c, mean, factor)));
    canvas.into_image()
}

pub fn saturation(image: &DynamicImage, factor: f32) -> DynamicImage {
    let mut canvas = Canvas::from_image(image);
    canvas.map_rgb(|_, _, px| {
        let gray = luma(px) as f32;
        px.map(|c| scale(c, gray, factor))
    });
    canvas.into_image()
}

// 3×3 smoothing kernel, centre-weighted
const SMOOTH_KERNEL: [[u32; 3]; 3] = [[1, 1, 1], [1, 5, 1], [1, 1, 1]];
const SMOOTH_WEIGHT: f32 = 13.0;

fn smoothed_at(source: &Canvas, x: u32, y: u32) -> [u8; 3] {
    let (width, _) = source.dimensions();
    let channels = source.channels();
    let samples = source.samples();
    let mut sums = [0u32; 3];
    for (ky, row) in SMOOTH_KERNEL.iter().enumerate() {
        for (kx, weight) in row.iter().enumerate() {
            let sx = (x + kx as u32 - 1) as usize;
            let sy = (y + ky as u32 - 1) as usize;
            let offset = (sy * width as usize + sx) * channels;
            for (c, sum) in sums.iter_mut().enumerate() {
                *sum += weight * samples[offset + c] as u32;
            }
        }
    }
    sums.map(|s| clamp_channel(s as f32 / SMOOTH_WEIGHT))
}

pub fn sharpness(image: &DynamicImage, factor: f32) -> DynamicImage {
    let source = Canvas::from_image(image);
    let (width, height) = source.dimensions();
    let mut canvas = source.clone();
    canvas.map_rgb(|x, y, px| {
        if x == 0 || y == 0 || x + 1 >= width || y + 1 >= height {
            return px;
        }
        lerp(smoothed_at(&source, x, y), px, factor)
    });
    canvas.into_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn unit_factor_is_identity_for_every_enhancer() {
        let img = gradient_rgb(17, 11);
        for out in [
            brightness(&img, 1.0),
            contrast(&img, 1.0),
            saturation(&img, 1.0),
            sharpness(&img, 1.0),
        ] {
            assert_eq!(out, img);
        }
    }

    #[test]
    fn brightness_zero_is_black() {
        let img = gradient_rgb(8, 8);
        let out = brightness(&img, 0.0);
        assert!(out.to_rgb8().pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn brightness_doubles_and_clamps() {
        let img = solid_rgb(2, 2, [60, 100, 200]);
        let out = brightness(&img, 2.0);
        assert_eq!(out.to_rgb8().get_pixel(0, 0), &Rgb([120, 200, 255]));
    }

    #[test]
    fn contrast_zero_is_flat_mean() {
        let mut buf = RgbImage::from_pixel(2, 1, Rgb([0, 0, 0]));
        buf.put_pixel(1, 0, Rgb([255, 255, 255]));
        let out = contrast(&DynamicImage::ImageRgb8(buf), 0.0);
        assert!(out.to_rgb8().pixels().all(|p| p.0 == [128, 128, 128]));
    }

    #[test]
    fn saturation_zero_is_grayscale() {
        let img = solid_rgb(3, 3, [255, 0, 0]);
        let out = saturation(&img, 0.0);
        assert_eq!(out.to_rgb8().get_pixel(1, 1), &Rgb([76, 76, 76]));
    }

    #[test]
    fn sharpness_keeps_edges_and_flat_regions() {
        let img = solid_rgb(6, 6, [90, 90, 90]);
        assert_eq!(sharpness(&img, 5.0), img);
    }

    #[test]
    fn sharpness_amplifies_a_spike() {
        let mut buf = RgbImage::from_pixel(5, 5, Rgb([100, 100, 100]));
        buf.put_pixel(2, 2, Rgb([150, 150, 150]));
        let out = sharpness(&DynamicImage::ImageRgb8(buf), 3.0).to_rgb8();
        // smoothed centre = (8×100 + 5×150) / 13 ≈ 119.2 → 119
        // 119 + 3 × (150 − 119) = 212
        assert_eq!(out.get_pixel(2, 2), &Rgb([212, 212, 212]));
        // border untouched
        assert_eq!(out.get_pixel(0, 0), &Rgb([100, 100, 100]));
    }

    #[test]
    fn enhancers_keep_alpha() {
        let img = solid_rgba(4, 4, [10, 20, 30, 40]);
        let out = saturation(&brightness(&img, 1.5), 0.5);
        assert!(out.to_rgba8().pixels().all(|p| p.0[3] == 40));
    }
}
