//! Pixel-level helpers shared by the filter and edit engines.
//!
//! The engines work on a [`Canvas`]: 8-bit RGB, or 8-bit RGBA when the source
//! carries alpha. Alpha is never touched by the colour math; every helper
//! here reads and writes only the first three channels.
//!
//! Per-pixel loops run row-parallel on the rayon pool.

use image::{DynamicImage, RgbImage, RgbaImage};
use rayon::prelude::*;

/// ITU-R 601 luma, the integer form PIL uses for `L` conversion.
#[inline]
pub fn luma(rgb: [u8; 3]) -> u8 {
    let [r, g, b] = rgb.map(u32::from);
    ((r * 19595 + g * 38470 + b * 7471 + 0x8000) >> 16) as u8
}

/// Round and clamp a channel value into `u8`.
#[inline]
pub fn clamp_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Linear interpolation `from + t × (to − from)`, per channel.
#[inline]
pub fn lerp(from: [u8; 3], to: [u8; 3], t: f32) -> [u8; 3] {
    [0, 1, 2].map(|i| clamp_channel(from[i] as f32 + t * (to[i] as f32 - from[i] as f32)))
}

/// 8-bit working buffer with or without alpha.
#[derive(Debug, Clone, PartialEq)]
pub enum Canvas {
    Rgb(RgbImage),
    Rgba(RgbaImage),
}

impl Canvas {
    /// Convert any image into a working canvas, keeping alpha if it has one.
    pub fn from_image(image: &DynamicImage) -> Self {
        match image {
            DynamicImage::ImageRgb8(buf) => Canvas::Rgb(buf.clone()),
            DynamicImage::ImageRgba8(buf) => Canvas::Rgba(buf.clone()),
            other if other.color().has_alpha() => Canvas::Rgba(other.to_rgba8()),
            other => Canvas::Rgb(other.to_rgb8()),
        }
    }

    pub fn into_image(self) -> DynamicImage {
        match self {
            Canvas::Rgb(buf) => DynamicImage::ImageRgb8(buf),
            Canvas::Rgba(buf) => DynamicImage::ImageRgba8(buf),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Canvas::Rgb(buf) => buf.dimensions(),
            Canvas::Rgba(buf) => buf.dimensions(),
        }
    }

    pub fn channels(&self) -> usize {
        match self {
            Canvas::Rgb(_) => 3,
            Canvas::Rgba(_) => 4,
        }
    }

    pub fn samples(&self) -> &[u8] {
        match self {
            Canvas::Rgb(buf) => buf.as_raw().as_slice(),
            Canvas::Rgba(buf) => buf.as_raw().as_slice(),
        }
    }

    fn samples_mut(&mut self) -> &mut [u8] {
        match self {
            Canvas::Rgb(buf) => &mut **buf,
            Canvas::Rgba(buf) => &mut **buf,
        }
    }

    /// Rewrite the RGB of every pixel through `f(x, y, rgb)`.
    pub fn map_rgb<F>(&mut self, f: F)
    where
        F: Fn(u32, u32, [u8; 3]) -> [u8; 3] + Sync,
    {
        let (width, _) = self.dimensions();
        let channels = self.channels();
        let row_len = width as usize * channels;
        if row_len == 0 {
            return;
        }
        self.samples_mut()
            .par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.chunks_exact_mut(channels).enumerate() {
                    let out = f(x as u32, y as u32, [px[0], px[1], px[2]]);
                    px[..3].copy_from_slice(&out);
                }
            });
    }

    /// Rewrite every pixel from its own RGB and the RGB at the same position
    /// in `other` (which must have the same dimensions).
    pub fn zip_rgb<F>(&mut self, other: &Canvas, f: F)
    where
        F: Fn([u8; 3], [u8; 3]) -> [u8; 3] + Sync,
    {
        let channels = self.channels();
        let other_channels = other.channels();
        let other_samples = other.samples();
        self.samples_mut()
            .par_chunks_mut(channels)
            .zip(other_samples.par_chunks(other_channels))
            .for_each(|(px, theirs)| {
                let out = f([px[0], px[1], px[2]], [theirs[0], theirs[1], theirs[2]]);
                px[..3].copy_from_slice(&out);
            });
    }

    /// Mean luma over the whole image, rounded to an integer level.
    pub fn mean_luma(&self) -> f32 {
        let channels = self.channels();
        let samples = self.samples();
        let count = samples.len() / channels;
        if count == 0 {
            return 0.0;
        }
        let total: u64 = samples
            .par_chunks(channels)
            .map(|px| luma([px[0], px[1], px[2]]) as u64)
            .sum();
        (total as f64 / count as f64 + 0.5).floor() as f32
    }
}

/// Blend `original` towards `transformed` by `t` (0 = original, 1 = transformed).
///
/// The result keeps `original`'s alpha channel.
pub fn blend(original: &DynamicImage, transformed: &DynamicImage, t: f32) -> DynamicImage {
    let mut canvas = Canvas::from_image(original);
    let target = Canvas::from_image(transformed);
    canvas.zip_rgb(&target, |from, to| lerp(from, to, t));
    canvas.into_image()
}

/// Apply a per-pixel RGB function, returning a new image.
pub fn map_rgb<F>(image: &DynamicImage, f: F) -> DynamicImage
where
    F: Fn(u32, u32, [u8; 3]) -> [u8; 3] + Sync,
{
    let mut canvas = Canvas::from_image(image);
    canvas.map_rgb(f);
    canvas.into_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba};

    #[test]
    fn luma_matches_pil_weights() {
        assert_eq!(luma([0, 0, 0]), 0);
        assert_eq!(luma([255, 255, 255]), 255);
        assert_eq!(luma([255, 0, 0]), 76);
        assert_eq!(luma([0, 255, 0]), 150);
        assert_eq!(luma([0, 0, 255]), 29);
    }

    #[test]
    fn lerp_endpoints_are_exact() {
        let a = [10, 200, 33];
        let b = [250, 0, 99];
        assert_eq!(lerp(a, b, 0.0), a);
        assert_eq!(lerp(a, b, 1.0), b);
        assert_eq!(lerp([0, 0, 0], [100, 100, 100], 0.5), [50, 50, 50]);
    }

    #[test]
    fn canvas_keeps_alpha_and_promotes_luma() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4])));
        assert!(matches!(Canvas::from_image(&rgba), Canvas::Rgba(_)));

        let gray = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(2, 2, image::Luma([7])));
        match Canvas::from_image(&gray) {
            Canvas::Rgb(buf) => assert_eq!(buf.get_pixel(0, 0), &Rgb([7, 7, 7])),
            Canvas::Rgba(_) => panic!("luma image has no alpha"),
        }
    }

    #[test]
    fn map_rgb_passes_coordinates_and_preserves_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 2, Rgba([0, 0, 0, 77])));
        let out = map_rgb(&img, |x, y, _| [x as u8, y as u8, 9]);
        let buf = out.as_rgba8().unwrap();
        assert_eq!(buf.get_pixel(2, 1), &Rgba([2, 1, 9, 77]));
        assert_eq!(buf.get_pixel(0, 0), &Rgba([0, 0, 9, 77]));
    }

    #[test]
    fn blend_half_way() {
        let a = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([0, 100, 200])));
        let b = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([100, 100, 0])));
        let out = blend(&a, &b, 0.5);
        assert_eq!(out.as_rgb8().unwrap().get_pixel(1, 1), &Rgb([50, 100, 100]));
    }

    #[test]
    fn mean_luma_rounds() {
        let mut buf = RgbImage::from_pixel(2, 1, Rgb([0, 0, 0]));
        buf.put_pixel(1, 0, Rgb([255, 255, 255]));
        // (0 + 255) / 2 = 127.5 → 128
        assert_eq!(Canvas::Rgb(buf).mean_luma(), 128.0);
    }
}
