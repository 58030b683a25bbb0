//! Filter engine: stylistic whole-image transforms driven by one intensity.
//!
//! [`apply`] never fails. Any internal error is logged and the input image
//! comes back unchanged, so a caller cannot tell "no visible effect" from
//! "the filter failed" by looking at the result alone; the log is the only
//! place a failure shows up.
//!
//! | Kind | Full transform | Intensity |
//! |---|---|---|
//! | Sepia | fixed 3×3 colour matrix | blend factor |
//! | Grayscale | 601 luma on all three channels | blend factor |
//! | Blur | Gaussian blur | radius `round(10 × i)`, min 1 |
//! | Sharpen | sharpness enhancer | factor `1 + 4 × i` |
//! | Vintage | sepia → contrast 0.8 → brightness 0.9 → vignette | sepia blend and vignette depth |
//! | Noir, Vibrant, Pastel | none (logged, input returned) | ignored |
//!
//! Alpha passes through unchanged.

use super::calculations::{blur_radius, sharpen_factor, vignette_radius, vignette_value};
use super::enhance;
use super::error::{ImagingError, fail_open};
use super::params::{FilterKind, FilterSpec, Intensity};
use super::pixels::{self, luma};
use image::DynamicImage;
use tracing::{debug, instrument, warn};

const SEPIA_MATRIX: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

const VINTAGE_CONTRAST: f32 = 0.8;
const VINTAGE_BRIGHTNESS: f32 = 0.9;

/// Apply a filter, returning a new image. Never fails.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn apply(image: &DynamicImage, kind: FilterKind, intensity: Intensity) -> DynamicImage {
    fail_open(kind.name(), image, try_apply(image, kind, intensity))
}

/// [`apply`] for a [`FilterSpec`].
pub fn apply_spec(image: &DynamicImage, spec: &FilterSpec) -> DynamicImage {
    apply(image, spec.kind, spec.intensity)
}

/// Apply a filter by name. Unknown names are a logged no-op.
pub fn apply_named(image: &DynamicImage, name: &str, intensity: f32) -> DynamicImage {
    match name.parse::<FilterKind>() {
        Ok(kind) => apply(image, kind, Intensity::new(intensity)),
        Err(error) => {
            warn!(%error, "ignoring filter request");
            image.clone()
        }
    }
}

pub(crate) fn try_apply(
    image: &DynamicImage,
    kind: FilterKind,
    intensity: Intensity,
) -> Result<DynamicImage, ImagingError> {
    debug!(filter = kind.name(), intensity = intensity.value(), "applying filter");
    let t = intensity.value();
    match kind {
        FilterKind::None => Ok(image.clone()),
        FilterKind::Sepia => Ok(pixels::blend(image, &sepia_full(image), t)),
        FilterKind::Grayscale => Ok(pixels::blend(image, &grayscale_full(image), t)),
        FilterKind::Blur => Ok(blur(image, intensity)),
        FilterKind::Sharpen => Ok(enhance::sharpness(image, sharpen_factor(intensity))),
        FilterKind::Vintage => vintage(image, intensity),
        FilterKind::Noir | FilterKind::Vibrant | FilterKind::Pastel => {
            warn!(filter = kind.name(), "filter has no transform, image left unchanged");
            Ok(image.clone())
        }
    }
}

fn sepia_pixel(px: [u8; 3]) -> [u8; 3] {
    let rgb = px.map(|c| c as f32);
    SEPIA_MATRIX.map(|row| {
        let v = row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2];
        // truncating, like an unsigned 8-bit cast after clipping
        v.clamp(0.0, 255.0) as u8
    })
}

/// Sepia at full strength.
pub(crate) fn sepia_full(image: &DynamicImage) -> DynamicImage {
    pixels::map_rgb(image, |_, _, px| sepia_pixel(px))
}

/// Grayscale at full strength, still three channels.
pub(crate) fn grayscale_full(image: &DynamicImage) -> DynamicImage {
    pixels::map_rgb(image, |_, _, px| [luma(px); 3])
}

fn blur(image: &DynamicImage, intensity: Intensity) -> DynamicImage {
    let radius = blur_radius(intensity);
    let mut canvas = pixels::Canvas::from_image(image);
    let blurred = canvas.clone().into_image().blur(radius as f32);
    // colour from the blurred copy, alpha from the input
    canvas.zip_rgb(&pixels::Canvas::from_image(&blurred), |_, soft| soft);
    canvas.into_image()
}

fn vintage(image: &DynamicImage, intensity: Intensity) -> Result<DynamicImage, ImagingError> {
    let (width, height) = (image.width(), image.height());
    let radius = vignette_radius(width, height);
    if radius == 0 {
        return Err(ImagingError::InvalidParameters(format!(
            "vignette needs at least 2×2 pixels, got {width}×{height}"
        )));
    }

    let t = intensity.value();
    let toned = pixels::blend(image, &sepia_full(image), t);
    let toned = enhance::contrast(&toned, VINTAGE_CONTRAST);
    let toned = enhance::brightness(&toned, VINTAGE_BRIGHTNESS);

    let center = (width / 2, height / 2);
    Ok(pixels::map_rgb(&toned, |x, y, px| {
        let mask = vignette_value(x, y, center, radius, t) as u32;
        // composite over black through the mask
        px.map(|c| ((c as u32 * mask + 127) / 255) as u8)
    }))
}
