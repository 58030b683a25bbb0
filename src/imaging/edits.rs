//! Edit engine: geometric edits, colour correction and background removal.
//!
//! Like the filter engine, every public function here is fail-open: a
//! failure is logged and the input comes back unchanged.
//!
//! | Edit | Implementation |
//! |---|---|
//! | Crop | percentage margins → `DynamicImage::crop_imm` |
//! | Rotate | exact quarter turns are lossless; other angles use an imageproc bicubic warp onto an expanded canvas |
//! | Resize | `resize_exact` with `Lanczos3`, aspect ratio not preserved |
//! | Colour adjust | brightness → contrast → saturation enhancers |
//! | Background removal | GrabCut segmentation, then near-black → transparent |

use super::calculations::{crop_box, rotated_dimensions};
use super::enhance;
use super::error::{ImagingError, fail_open};
use super::params::{ColorAdjustment, CropMargins, EditSpec};
use super::segmentation;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::{debug, instrument};

/// Channel level below which a pixel counts as black for transparency.
const BLACK_THRESHOLD: u8 = 5;

/// Apply one edit. Never fails.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn apply(image: &DynamicImage, edit: &EditSpec) -> DynamicImage {
    match edit {
        EditSpec::Crop(margins) => crop(image, margins),
        EditSpec::Rotate { angle } => rotate(image, *angle),
        EditSpec::Resize { width, height } => resize(image, *width, *height),
        EditSpec::ColorAdjust(adjustment) => adjust_colors(image, adjustment),
        EditSpec::BackgroundRemoval => remove_background(image),
    }
}

/// Apply edits in order, each on the previous result.
pub fn apply_all(image: &DynamicImage, edits: &[EditSpec]) -> DynamicImage {
    edits
        .iter()
        .fold(image.clone(), |current, edit| apply(&current, edit))
}

/// Crop to the box between percentage margins.
///
/// A box of zero area (after rounding to pixels) leaves the image unchanged.
pub fn crop(image: &DynamicImage, margins: &CropMargins) -> DynamicImage {
    fail_open("crop", image, try_crop(image, margins))
}

pub(crate) fn try_crop(
    image: &DynamicImage,
    margins: &CropMargins,
) -> Result<DynamicImage, ImagingError> {
    let bounds = crop_box(image.dimensions(), margins).ok_or_else(|| {
        ImagingError::InvalidParameters(format!(
            "crop box {}%..{}% × {}%..{}% is empty",
            margins.left.value(),
            margins.right.value(),
            margins.top.value(),
            margins.bottom.value()
        ))
    })?;
    debug!(?bounds, "cropping");
    Ok(image.crop_imm(bounds.x, bounds.y, bounds.width, bounds.height))
}

/// Rotate counter-clockwise by `angle` degrees, growing the canvas so no
/// corner is clipped.
///
/// Newly exposed corners are transparent when the input has alpha, black
/// otherwise.
pub fn rotate(image: &DynamicImage, angle: f32) -> DynamicImage {
    fail_open("rotate", image, try_rotate(image, angle))
}

pub(crate) fn try_rotate(image: &DynamicImage, angle: f32) -> Result<DynamicImage, ImagingError> {
    if !angle.is_finite() {
        return Err(ImagingError::InvalidParameters(format!(
            "rotation angle must be finite, got {angle}"
        )));
    }
    let turn = angle.rem_euclid(360.0);
    // Quarter turns move pixels without resampling
    if turn == 0.0 {
        return Ok(image.clone());
    } else if turn == 90.0 {
        return Ok(image.rotate270());
    } else if turn == 180.0 {
        return Ok(image.rotate180());
    } else if turn == 270.0 {
        return Ok(image.rotate90());
    }

    let (width, height) = (image.width(), image.height());
    let (out_w, out_h) = rotated_dimensions(width, height, angle);
    let projection = Projection::translate(out_w as f32 / 2.0, out_h as f32 / 2.0)
        * Projection::rotate(-angle.to_radians())
        * Projection::translate(-(width as f32) / 2.0, -(height as f32) / 2.0);

    let source = image.to_rgba8();
    let mut rotated = RgbaImage::new(out_w, out_h);
    warp_into(
        &source,
        &projection,
        Interpolation::Bicubic,
        Rgba([0, 0, 0, 0]),
        &mut rotated,
    );
    debug!(angle, out_w, out_h, "rotated onto expanded canvas");

    let rotated = DynamicImage::ImageRgba8(rotated);
    if image.color().has_alpha() {
        Ok(rotated)
    } else {
        Ok(DynamicImage::ImageRgb8(rotated.to_rgb8()))
    }
}

/// Resize to exactly `width × height` with a Lanczos filter.
pub fn resize(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    fail_open("resize", image, try_resize(image, width, height))
}

pub(crate) fn try_resize(
    image: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<DynamicImage, ImagingError> {
    if width == 0 || height == 0 {
        return Err(ImagingError::InvalidParameters(format!(
            "target size must be positive, got {width}×{height}"
        )));
    }
    Ok(image.resize_exact(width, height, FilterType::Lanczos3))
}

/// Brightness, then contrast, then saturation. Factors of exactly 1.0 are
/// skipped.
pub fn adjust_colors(image: &DynamicImage, adjustment: &ColorAdjustment) -> DynamicImage {
    let mut out = image.clone();
    if !adjustment.brightness.is_identity() {
        out = enhance::brightness(&out, adjustment.brightness.value());
    }
    if !adjustment.contrast.is_identity() {
        out = enhance::contrast(&out, adjustment.contrast.value());
    }
    if !adjustment.saturation.is_identity() {
        out = enhance::saturation(&out, adjustment.saturation.value());
    }
    out
}

/// Cut the subject out of its background.
///
/// Returns RGBA: background pixels, and any pixel whose R, G and B are all
/// below 5, become fully transparent; everything else is opaque. Any input
/// alpha is discarded before segmentation.
pub fn remove_background(image: &DynamicImage) -> DynamicImage {
    fail_open("remove_background", image, try_remove_background(image))
}

pub(crate) fn try_remove_background(image: &DynamicImage) -> Result<DynamicImage, ImagingError> {
    let rgb = image.to_rgb8();
    let labels = segmentation::segment(&rgb)?;

    let mut out = RgbaImage::new(rgb.width(), rgb.height());
    for ((src, dst), label) in rgb.pixels().zip(out.pixels_mut()).zip(&labels) {
        let [r, g, b] = if label.is_foreground() { src.0 } else { [0, 0, 0] };
        *dst = if r < BLACK_THRESHOLD && g < BLACK_THRESHOLD && b < BLACK_THRESHOLD {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([r, g, b, 255])
        };
    }
    let kept = labels.iter().filter(|l| l.is_foreground()).count();
    debug!(kept, total = labels.len(), "background removed");
    Ok(DynamicImage::ImageRgba8(out))
}
