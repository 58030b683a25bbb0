//! Where images come from.
//!
//! The [`ImageSource`] trait is the seam to any text-to-image generator.
//! The only implementation shipped here is [`PlaceholderSource`], which
//! renders a deterministic gradient; [`obtain_images`] falls back to it when
//! a real source fails, so the pipeline always has something to work on.

use image::{DynamicImage, Rgb, RgbImage};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Generation request rejected: {0}")]
    InvalidRequest(String),
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Everything a generator needs to produce images.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub guidance_scale: f32,
    /// `None` lets the generator pick a random seed.
    pub seed: Option<u64>,
    /// Number of images to produce.
    pub count: u32,
}

impl GenerationRequest {
    pub fn validate(&self) -> Result<(), SourceError> {
        if self.width == 0 || self.height == 0 {
            return Err(SourceError::InvalidRequest(format!(
                "image size must be positive, got {}×{}",
                self.width, self.height
            )));
        }
        if self.count == 0 {
            return Err(SourceError::InvalidRequest(
                "count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// A text-to-image generator.
///
/// `Sync` so one source can serve parallel requests.
pub trait ImageSource: Sync {
    fn generate(&self, request: &GenerationRequest) -> Result<Vec<DynamicImage>, SourceError>;
}

/// Deterministic stand-in for a generator: every image is the same gradient.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderSource;

impl ImageSource for PlaceholderSource {
    fn generate(&self, request: &GenerationRequest) -> Result<Vec<DynamicImage>, SourceError> {
        request.validate()?;
        Ok((0..request.count)
            .map(|_| placeholder(request.width, request.height))
            .collect())
    }
}

/// Gradient with red rising left to right, green top to bottom and blue
/// along the diagonal.
pub fn placeholder(width: u32, height: u32) -> DynamicImage {
    let (w, h) = (width.max(1) as u64, height.max(1) as u64);
    DynamicImage::ImageRgb8(RgbImage::from_fn(w as u32, h as u32, |x, y| {
        let (x, y) = (x as u64, y as u64);
        Rgb([
            (255 * x / w) as u8,
            (255 * y / h) as u8,
            (255 * (x + y) / (w + h)) as u8,
        ])
    }))
}

/// Ask `source` for images, substituting placeholders if it fails.
pub fn obtain_images(source: &dyn ImageSource, request: &GenerationRequest) -> Vec<DynamicImage> {
    match source.generate(request) {
        Ok(images) if !images.is_empty() => images,
        Ok(_) => {
            warn!("source returned no images, using placeholders");
            fallback(request)
        }
        Err(error) => {
            warn!(%error, "source failed, using placeholders");
            fallback(request)
        }
    }
}

fn fallback(request: &GenerationRequest) -> Vec<DynamicImage> {
    (0..request.count.max(1))
        .map(|_| placeholder(request.width, request.height))
        .collect()
}
