//! # Easel
//!
//! Post-processing for generated images. An image comes from a source (a
//! text-to-image generator, or the built-in placeholder), passes through at
//! most one stylistic filter and at most one edit, and is exported as JPEG,
//! PNG or GIF.
//!
//! ```text
//! source ──► filter ──► edit ──► export
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Filter and edit engines, background removal, export, image sources |
//! | [`workspace`] | The current / filtered / edited image triple and its precedence rules |
//! | [`config`] | `easel.toml` loading, validation, and merging over stock defaults |
//! | [`output`] | CLI output formatting and the JSON run report |
//!
//! # Design Decisions
//!
//! ## Fail-Open Engines
//!
//! Filters and edits always return an image. Bad parameters and images too
//! small for an operation log a warning and hand back the input unchanged.
//! Interactive callers always get something to show; the log is where
//! failures surface. Export is different: a failed write is an error the
//! caller must handle.
//!
//! ## PIL-Compatible Colour Math
//!
//! Luma uses the ITU-R 601 integer weights, and the brightness, contrast,
//! saturation and sharpness enhancers interpolate against the same degenerate
//! images PIL's `ImageEnhance` does. Chaining enhancers is not commutative,
//! and the colour-adjust edit fixes their order.
//!
//! ## Heuristic Background Removal
//!
//! Background removal assumes the subject sits in the central 80% of the
//! frame and clears everything GrabCut assigns to the border's colour model.
//! Near-black pixels are cleared too, so dark subjects lose detail. It is a
//! one-click convenience, not a matting tool.

pub mod config;
pub mod imaging;
pub mod output;
pub mod workspace;

#[cfg(test)]
pub(crate) mod test_helpers;
