//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! Source: placeholder (2 images)
//!     Prompt: a lighthouse at dusk
//! Filter: sepia @ 0.50
//! Edit: rotate:90
//! Exported
//!     001 outputs/easel_20240309_140507.jpeg (768×768)
//!     002 outputs/easel_20240309_140508.jpeg (768×768)
//! ```
//!
//! `filter`, `edit` and `generate` print the same `Exported` block.
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure and do no I/O.

use crate::imaging::{EditSpec, ExportFormat, FilterSpec};
use image::DynamicImage;
use serde::Serialize;
use std::path::PathBuf;

/// One file written by an export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRecord {
    pub path: PathBuf,
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
}

impl ExportRecord {
    pub fn new(path: PathBuf, format: ExportFormat, image: &DynamicImage) -> Self {
        Self {
            path,
            format,
            width: image.width(),
            height: image.height(),
        }
    }
}

/// What a `run` did, in order. Also written as JSON by `run --report`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    /// `placeholder`, or the input file the run started from.
    pub source: String,
    pub prompt: Option<String>,
    pub filter: Option<FilterSpec>,
    pub edit: Option<EditSpec>,
    pub exports: Vec<ExportRecord>,
}

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// ```text
/// Exported
///     001 outputs/easel_20240309_140507.png (800×600)
/// ```
pub fn format_exports(exports: &[ExportRecord]) -> Vec<String> {
    if exports.is_empty() {
        return vec!["Nothing exported".to_string()];
    }
    let mut lines = vec!["Exported".to_string()];
    for (i, record) in exports.iter().enumerate() {
        lines.push(format!(
            "{}{} {} ({}×{})",
            indent(1),
            format_index(i + 1),
            record.path.display(),
            record.width,
            record.height
        ));
    }
    lines
}

pub fn print_exports(exports: &[ExportRecord]) {
    for line in format_exports(exports) {
        println!("{}", line);
    }
}

pub fn format_run_report(report: &RunReport) -> Vec<String> {
    let images = report.exports.len();
    let noun = if images == 1 { "image" } else { "images" };
    let mut lines = vec![format!("Source: {} ({} {})", report.source, images, noun)];
    if let Some(prompt) = &report.prompt {
        lines.push(format!("{}Prompt: {}", indent(1), prompt));
    }
    if let Some(filter) = &report.filter {
        lines.push(format!("Filter: {}", filter));
    }
    if let Some(edit) = &report.edit {
        lines.push(format!("Edit: {}", edit));
    }
    lines.extend(format_exports(&report.exports));
    lines
}

pub fn print_run_report(report: &RunReport) {
    for line in format_run_report(report) {
        println!("{}", line);
    }
}
