//! Foreground extraction by iterated graph cuts (GrabCut).
//!
//! The subject is assumed to sit inside the central rectangle returned by
//! [`foreground_roi`]. Everything outside it is fixed background; everything
//! inside starts as probable foreground. Each iteration:
//!
//! 1. assigns every pixel to the most likely component of its region's
//!    colour model
//! 2. refits the background and foreground mixtures
//! 3. builds a 4+4-neighbour graph whose terminal weights are the negative
//!    log-likelihoods under each model, and whose neighbour weights penalise
//!    cutting between similar colours
//! 4. relabels the probable pixels by the minimum cut
//!
//! Only probable labels move; fixed background never becomes foreground.

mod gmm;
mod maxflow;

use super::calculations::foreground_roi;
use super::error::ImagingError;
use gmm::{Color, Gmm};
use image::RgbImage;
use maxflow::FlowGraph;
use rayon::prelude::*;
use tracing::debug;

const ITERATIONS: usize = 5;

/// Smoothness weight between neighbouring pixels.
const GAMMA: f64 = 50.0;

/// Capacity that pins a fixed pixel to its terminal.
const LAMBDA: f64 = 9.0 * GAMMA;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Label {
    Background,
    Foreground,
    ProbableBackground,
    ProbableForeground,
}

impl Label {
    pub(crate) fn is_foreground(self) -> bool {
        matches!(self, Label::Foreground | Label::ProbableForeground)
    }

    fn is_fixed(self) -> bool {
        matches!(self, Label::Background | Label::Foreground)
    }
}

// Neighbour offsets looking back: left, up-left, up, up-right
const NEIGHBOURS: [(i64, i64); 4] = [(-1, 0), (-1, -1), (0, -1), (1, -1)];

fn colors(image: &RgbImage) -> Vec<Color> {
    image
        .pixels()
        .map(|p| p.0.map(f64::from))
        .collect()
}

fn diff_squared(a: &Color, b: &Color) -> f64 {
    (0..3).map(|i| (a[i] - b[i]) * (a[i] - b[i])).sum()
}

/// `1 / (2 × mean squared colour difference)` over all neighbour pairs.
fn beta(pixels: &[Color], width: usize, height: usize) -> f64 {
    let mut sum = 0.0;
    let mut pairs = 0usize;
    for y in 0..height {
        for x in 0..width {
            let here = &pixels[y * width + x];
            for (dx, dy) in NEIGHBOURS {
                if let Some(n) = neighbour(x, y, dx, dy, width, height) {
                    sum += diff_squared(here, &pixels[n]);
                    pairs += 1;
                }
            }
        }
    }
    if sum <= f64::EPSILON || pairs == 0 {
        0.0
    } else {
        1.0 / (2.0 * sum / pairs as f64)
    }
}

fn neighbour(x: usize, y: usize, dx: i64, dy: i64, width: usize, height: usize) -> Option<usize> {
    let nx = x as i64 + dx;
    let ny = y as i64 + dy;
    if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
        return None;
    }
    Some(ny as usize * width + nx as usize)
}

fn initial_labels(width: u32, height: u32) -> Vec<Label> {
    let roi = foreground_roi(width, height);
    let mut labels = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let inside = x >= roi.x && x < roi.x + roi.width && y >= roi.y && y < roi.y + roi.height;
            labels.push(if inside {
                Label::ProbableForeground
            } else {
                Label::Background
            });
        }
    }
    labels
}

fn split(pixels: &[Color], labels: &[Label]) -> (Vec<Color>, Vec<Color>) {
    let mut background = Vec::new();
    let mut foreground = Vec::new();
    for (px, label) in pixels.iter().zip(labels) {
        if label.is_foreground() {
            foreground.push(*px);
        } else {
            background.push(*px);
        }
    }
    (background, foreground)
}

/// Seed both mixtures by k-means over the initial labelling.
fn initial_models(pixels: &[Color], labels: &[Label]) -> Result<(Gmm, Gmm), ImagingError> {
    let (background, foreground) = split(pixels, labels);
    if background.is_empty() || foreground.is_empty() {
        return Err(ImagingError::Segmentation(format!(
            "need both background and foreground samples (got {} and {})",
            background.len(),
            foreground.len()
        )));
    }
    Ok((
        Gmm::fit(&background, &gmm::kmeans(&background)),
        Gmm::fit(&foreground, &gmm::kmeans(&foreground)),
    ))
}

/// Reassign every sample to its best component and refit.
///
/// A region that has lost all its pixels yields an empty model whose
/// likelihood is zero everywhere.
fn refit_models(pixels: &[Color], labels: &[Label], background: &Gmm, foreground: &Gmm) -> (Gmm, Gmm) {
    let (bgd_samples, fgd_samples) = split(pixels, labels);
    let bgd_assign: Vec<usize> = bgd_samples.iter().map(|c| background.best_component(c)).collect();
    let fgd_assign: Vec<usize> = fgd_samples.iter().map(|c| foreground.best_component(c)).collect();
    (
        Gmm::fit(&bgd_samples, &bgd_assign),
        Gmm::fit(&fgd_samples, &fgd_assign),
    )
}

fn neg_log(likelihood: f64) -> f64 {
    -likelihood.max(f64::MIN_POSITIVE).ln()
}

fn build_graph(
    pixels: &[Color],
    labels: &[Label],
    width: usize,
    height: usize,
    beta: f64,
    background: &Gmm,
    foreground: &Gmm,
) -> FlowGraph {
    let terminals: Vec<(f64, f64)> = pixels
        .par_iter()
        .zip(labels.par_iter())
        .map(|(px, label)| match label {
            Label::Background => (0.0, LAMBDA),
            Label::Foreground => (LAMBDA, 0.0),
            _ => (neg_log(background.likelihood(px)), neg_log(foreground.likelihood(px))),
        })
        .collect();

    let diagonal = GAMMA / std::f64::consts::SQRT_2;
    let mut graph = FlowGraph::new(pixels.len());
    for y in 0..height {
        for x in 0..width {
            let index = y * width + x;
            let (from_source, to_sink) = terminals[index];
            graph.add_terminal(index, from_source, to_sink);

            for (dx, dy) in NEIGHBOURS {
                if let Some(n) = neighbour(x, y, dx, dy, width, height) {
                    let gamma = if dx != 0 && dy != 0 { diagonal } else { GAMMA };
                    let w = gamma * (-beta * diff_squared(&pixels[index], &pixels[n])).exp();
                    graph.add_edge(index, n, w, w);
                }
            }
        }
    }
    graph
}

/// Label every pixel as foreground or background.
pub(crate) fn segment(image: &RgbImage) -> Result<Vec<Label>, ImagingError> {
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);
    let pixels = colors(image);
    let mut labels = initial_labels(width, height);
    let beta = beta(&pixels, w, h);

    let (mut background, mut foreground) = initial_models(&pixels, &labels)?;
    for iteration in 0..ITERATIONS {
        (background, foreground) = refit_models(&pixels, &labels, &background, &foreground);

        let mut graph = build_graph(&pixels, &labels, w, h, beta, &background, &foreground);
        let flow = graph.maxflow();
        let source_side = graph.source_side();

        let mut changed = 0usize;
        for (label, &fg) in labels.iter_mut().zip(&source_side) {
            if label.is_fixed() {
                continue;
            }
            let next = if fg {
                Label::ProbableForeground
            } else {
                Label::ProbableBackground
            };
            if *label != next {
                changed += 1;
            }
            *label = next;
        }
        debug!(iteration, flow, changed, "grabcut iteration");
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn subject_on_background(size: u32, subject: [u8; 3], background: [u8; 3]) -> RgbImage {
        let lo = size * 3 / 10;
        let hi = size * 7 / 10;
        RgbImage::from_fn(size, size, |x, y| {
            if (lo..hi).contains(&x) && (lo..hi).contains(&y) {
                Rgb(subject)
            } else {
                Rgb(background)
            }
        })
    }

    #[test]
    fn initial_labels_follow_roi() {
        let labels = initial_labels(10, 10);
        assert_eq!(labels[0], Label::Background);
        assert_eq!(labels[5 * 10 + 5], Label::ProbableForeground);
        assert_eq!(labels[9 * 10 + 9], Label::Background);
        assert_eq!(labels[10 + 1], Label::ProbableForeground);
    }

    #[test]
    fn beta_of_flat_image_is_zero() {
        let pixels = vec![[3.0, 3.0, 3.0]; 16];
        assert_eq!(beta(&pixels, 4, 4), 0.0);
    }

    #[test]
    fn tiny_image_has_no_foreground_samples() {
        // 1x1: ROI is 0x0, so every pixel is fixed background
        let img = RgbImage::from_pixel(1, 1, Rgb([10, 10, 10]));
        assert!(matches!(segment(&img), Err(ImagingError::Segmentation(_))));
    }

    #[test]
    fn separates_contrasting_subject() {
        let img = subject_on_background(40, [250, 250, 250], [20, 40, 200]);
        let labels = segment(&img).unwrap();
        assert!(labels[20 * 40 + 20].is_foreground());
        assert!(!labels[0].is_foreground());
        // Inside the ROI but on the background colour
        assert!(!labels[5 * 40 + 5].is_foreground());
    }

    #[test]
    fn fixed_background_never_flips() {
        let img = subject_on_background(30, [255, 0, 0], [255, 0, 0]);
        let labels = segment(&img).unwrap();
        let roi = foreground_roi(30, 30);
        for y in 0..30 {
            for x in 0..30 {
                if x < roi.x || y < roi.y {
                    assert_eq!(labels[(y * 30 + x) as usize], Label::Background);
                }
            }
        }
    }
}
