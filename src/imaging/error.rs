//! Error type shared by the imaging modules, and the fail-open boundary.
//!
//! Every engine operation has an internal `try_*` form returning
//! [`ImagingError`]. The public entry points pass that result through
//! [`fail_open`], which logs the failure and hands back the input image, so
//! no error ever reaches a caller of the filter or edit engines.

use image::DynamicImage;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image codec error: {0}")]
    Codec(#[from] image::ImageError),
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("Segmentation failed: {0}")]
    Segmentation(String),
    #[error("Unknown filter: {0}")]
    UnknownFilter(String),
    #[error("Unknown export format: {0}")]
    UnknownFormat(String),
    #[error("Unknown edit: {0}")]
    UnknownEdit(String),
}

/// Unwrap an operation result, falling back to `input` on error.
///
/// The failure is reported on the log sink only; the caller always gets an
/// image back.
pub(crate) fn fail_open(
    operation: &str,
    input: &DynamicImage,
    result: Result<DynamicImage, ImagingError>,
) -> DynamicImage {
    match result {
        Ok(image) => image,
        Err(error) => {
            warn!(operation, %error, "operation failed, keeping input image");
            input.clone()
        }
    }
}
