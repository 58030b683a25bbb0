//! The current / filtered / edited image triple behind an editing session.
//!
//! ```text
//! set_current ──► current ──filter──► filtered ──edit──► edited
//!                    └───────────────edit (no filter)──────┘
//! ```
//!
//! Setting a new current image drops both derived images. A filter always
//! starts from the current image, so filters replace each other rather than
//! stack; an edit starts from the filtered image when there is one.
//! [`Workspace::display`] is what a front end shows and exports.

use crate::imaging::{EditSpec, FilterKind, FilterSpec, edits, filters};
use image::DynamicImage;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct Workspace {
    current: Option<DynamicImage>,
    filtered: Option<DynamicImage>,
    edited: Option<DynamicImage>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start over from `image`.
    pub fn set_current(&mut self, image: DynamicImage) {
        debug!(width = image.width(), height = image.height(), "new current image");
        self.current = Some(image);
        self.filtered = None;
        self.edited = None;
    }

    pub fn current(&self) -> Option<&DynamicImage> {
        self.current.as_ref()
    }

    pub fn filtered(&self) -> Option<&DynamicImage> {
        self.filtered.as_ref()
    }

    pub fn edited(&self) -> Option<&DynamicImage> {
        self.edited.as_ref()
    }

    /// Filter the current image. `None` clears the filtered image.
    ///
    /// Returns `false` when there is no current image to filter.
    pub fn apply_filter(&mut self, spec: &FilterSpec) -> bool {
        let Some(current) = &self.current else {
            return false;
        };
        self.filtered = match spec.kind {
            FilterKind::None => None,
            _ => Some(filters::apply_spec(current, spec)),
        };
        true
    }

    /// Edit the filtered image, or the current one when nothing is filtered.
    ///
    /// Returns `false` when there is no image to edit.
    pub fn apply_edit(&mut self, edit: &EditSpec) -> bool {
        let Some(base) = self.filtered.as_ref().or(self.current.as_ref()) else {
            return false;
        };
        self.edited = Some(edits::apply(base, edit));
        true
    }

    /// Most processed image: edited, else filtered, else current.
    pub fn display(&self) -> Option<&DynamicImage> {
        self.edited
            .as_ref()
            .or(self.filtered.as_ref())
            .or(self.current.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{CropMargins, Intensity};
    use crate::test_helpers::*;

    fn sepia() -> FilterSpec {
        FilterSpec::new(FilterKind::Sepia, 1.0)
    }

    #[test]
    fn empty_workspace_has_nothing_to_show() {
        let mut ws = Workspace::new();
        assert!(ws.display().is_none());
        assert!(!ws.apply_filter(&sepia()));
        assert!(!ws.apply_edit(&EditSpec::Rotate { angle: 90.0 }));
    }

    #[test]
    fn display_precedence() {
        let mut ws = Workspace::new();
        let img = gradient_rgb(20, 10);
        ws.set_current(img.clone());
        assert_eq!(ws.display(), Some(&img));

        ws.apply_filter(&sepia());
        assert_eq!(ws.display(), ws.filtered());

        ws.apply_edit(&EditSpec::Rotate { angle: 90.0 });
        assert_eq!(ws.display(), ws.edited());
        assert_eq!(ws.display().map(|i| (i.width(), i.height())), Some((10, 20)));
    }

    #[test]
    fn edit_reads_filtered_image() {
        let mut ws = Workspace::new();
        ws.set_current(gradient_rgb(8, 8));
        ws.apply_filter(&FilterSpec::new(FilterKind::Grayscale, 1.0));
        ws.apply_edit(&EditSpec::Crop(CropMargins::new(0.0, 0.0, 100.0, 100.0)));
        assert_eq!(ws.edited(), ws.filtered());
    }

    #[test]
    fn edit_without_filter_reads_current() {
        let mut ws = Workspace::new();
        let img = gradient_rgb(8, 8);
        ws.set_current(img.clone());
        ws.apply_edit(&EditSpec::Crop(CropMargins::new(0.0, 0.0, 100.0, 100.0)));
        assert_eq!(ws.edited(), Some(&img));
    }

    #[test]
    fn filters_replace_rather_than_stack() {
        let mut ws = Workspace::new();
        let img = gradient_rgb(8, 8);
        ws.set_current(img.clone());
        ws.apply_filter(&sepia());
        ws.apply_filter(&FilterSpec::new(FilterKind::Grayscale, 1.0));
        let expected = filters::apply(&img, FilterKind::Grayscale, Intensity::new(1.0));
        assert_eq!(ws.filtered(), Some(&expected));
    }

    #[test]
    fn none_filter_clears_filtered() {
        let mut ws = Workspace::new();
        ws.set_current(gradient_rgb(8, 8));
        ws.apply_filter(&sepia());
        assert!(ws.apply_filter(&FilterSpec::new(FilterKind::None, 0.5)));
        assert!(ws.filtered().is_none());
        assert_eq!(ws.display(), ws.current());
    }

    #[test]
    fn new_current_clears_derived_images() {
        let mut ws = Workspace::new();
        ws.set_current(gradient_rgb(8, 8));
        ws.apply_filter(&sepia());
        ws.apply_edit(&EditSpec::Rotate { angle: 180.0 });
        let next = solid_rgb(4, 4, [1, 2, 3]);
        ws.set_current(next.clone());
        assert!(ws.filtered().is_none());
        assert!(ws.edited().is_none());
        assert_eq!(ws.display(), Some(&next));
    }
}
