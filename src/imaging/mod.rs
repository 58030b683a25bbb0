//! Image processing: filters, edits, export and image sources.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Filters** | per-pixel maps on rayon, `image::DynamicImage::blur` |
//! | **Enhancers** | brightness / contrast / saturation / sharpness, PIL-compatible |
//! | **Rotate** | `imageproc::geometric_transformations::warp_into` (bicubic) |
//! | **Resize** | `resize_exact` with Lanczos3 |
//! | **Background removal** | GrabCut: colour GMMs + Dinic max-flow |
//! | **Export** | `image` JPEG / PNG / GIF encoders |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for parameter and geometry math (unit testable)
//! - **Parameters**: Clamped value types and the filter / edit / export specs
//! - **Engines**: [`filters`] and [`edits`], both fail-open
//! - **I/O**: [`export`] to write results, [`source`] to obtain inputs

pub mod calculations;
pub mod edits;
mod enhance;
mod error;
pub mod export;
pub mod filters;
mod params;
mod pixels;
mod segmentation;
pub mod source;

pub use error::ImagingError;
pub use export::{Exporter, encode};
pub use params::{
    ColorAdjustment, CropMargins, EditSpec, ExportFormat, ExportSpec, Factor, FilterKind,
    FilterSpec, Intensity, Percent, Quality,
};
pub use source::{GenerationRequest, ImageSource, PlaceholderSource, SourceError, obtain_images};
