//! Full-covariance Gaussian mixture over RGB colours, plus the k-means used
//! to seed it.

pub(crate) const COMPONENTS: usize = 5;

const KMEANS_ITERATIONS: usize = 10;

/// Added to the covariance diagonal of a component whose samples are
/// (near-)collinear, so it stays invertible.
const VARIANCE_FLOOR: f64 = 0.01;

pub(crate) type Color = [f64; 3];

type Matrix = [[f64; 3]; 3];

fn determinant(m: &Matrix) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

fn inverse(m: &Matrix, det: f64) -> Matrix {
    [
        [
            (m[1][1] * m[2][2] - m[1][2] * m[2][1]) / det,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) / det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) / det,
        ],
        [
            (m[1][2] * m[2][0] - m[1][0] * m[2][2]) / det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) / det,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) / det,
        ],
        [
            (m[1][0] * m[2][1] - m[1][1] * m[2][0]) / det,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) / det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) / det,
        ],
    ]
}

fn squared_distance(a: &Color, b: &Color) -> f64 {
    (0..3).map(|i| (a[i] - b[i]) * (a[i] - b[i])).sum()
}

#[derive(Debug, Clone, Default)]
struct Component {
    weight: f64,
    mean: Color,
    inverse: Matrix,
    determinant: f64,
}

impl Component {
    /// Unweighted density, without the `(2π)^-3/2` constant.
    fn density(&self, color: &Color) -> f64 {
        if self.weight <= 0.0 {
            return 0.0;
        }
        let d = [
            color[0] - self.mean[0],
            color[1] - self.mean[1],
            color[2] - self.mean[2],
        ];
        let mut mahalanobis = 0.0;
        for (i, row) in self.inverse.iter().enumerate() {
            for (j, v) in row.iter().enumerate() {
                mahalanobis += d[i] * v * d[j];
            }
        }
        (-0.5 * mahalanobis).exp() / self.determinant.sqrt()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Gmm {
    components: [Component; COMPONENTS],
}

impl Gmm {
    /// Estimate the mixture from samples and their component assignments.
    ///
    /// Components with no samples get zero weight and never match.
    pub(crate) fn fit(samples: &[Color], assignments: &[usize]) -> Self {
        let mut sums = [[0.0f64; 3]; COMPONENTS];
        let mut products = [[[0.0f64; 3]; 3]; COMPONENTS];
        let mut counts = [0usize; COMPONENTS];

        for (color, &k) in samples.iter().zip(assignments) {
            counts[k] += 1;
            for i in 0..3 {
                sums[k][i] += color[i];
                for j in 0..3 {
                    products[k][i][j] += color[i] * color[j];
                }
            }
        }

        let total = samples.len().max(1) as f64;
        let components = std::array::from_fn(|k| {
            let n = counts[k];
            if n == 0 {
                return Component::default();
            }
            let n_f = n as f64;
            let mean = sums[k].map(|s| s / n_f);
            let mut covariance = [[0.0; 3]; 3];
            for i in 0..3 {
                for j in 0..3 {
                    covariance[i][j] = products[k][i][j] / n_f - mean[i] * mean[j];
                }
            }
            let mut det = determinant(&covariance);
            if det <= f64::EPSILON {
                for (i, row) in covariance.iter_mut().enumerate() {
                    row[i] += VARIANCE_FLOOR;
                }
                det = determinant(&covariance);
            }
            Component {
                weight: n_f / total,
                mean,
                inverse: inverse(&covariance, det),
                determinant: det,
            }
        });
        Self { components }
    }

    /// Weighted mixture likelihood of a colour.
    pub(crate) fn likelihood(&self, color: &Color) -> f64 {
        self.components
            .iter()
            .map(|c| c.weight * c.density(color))
            .sum()
    }

    /// Component with the highest density for this colour.
    pub(crate) fn best_component(&self, color: &Color) -> usize {
        let mut best = 0;
        let mut best_density = 0.0;
        for (k, component) in self.components.iter().enumerate() {
            let d = component.density(color);
            if d > best_density {
                best = k;
                best_density = d;
            }
        }
        best
    }

    #[cfg(test)]
    pub(crate) fn weights(&self) -> [f64; COMPONENTS] {
        std::array::from_fn(|k| self.components[k].weight)
    }
}

/// Cluster samples into at most [`COMPONENTS`] groups.
///
/// Seeding is deterministic: the first sample, then repeatedly the sample
/// farthest from every chosen centre. Identical samples yield fewer clusters.
pub(crate) fn kmeans(samples: &[Color]) -> Vec<usize> {
    let Some(first) = samples.first() else {
        return Vec::new();
    };

    let mut centers: Vec<Color> = vec![*first];
    let mut nearest: Vec<f64> = samples
        .iter()
        .map(|s| squared_distance(s, first))
        .collect();
    while centers.len() < COMPONENTS {
        let (index, farthest) = nearest
            .iter()
            .enumerate()
            .fold((0, 0.0), |best, (i, &d)| if d > best.1 { (i, d) } else { best });
        if farthest <= 0.0 {
            break;
        }
        let center = samples[index];
        for (n, s) in nearest.iter_mut().zip(samples) {
            *n = n.min(squared_distance(s, &center));
        }
        centers.push(center);
    }

    let mut labels = vec![0usize; samples.len()];
    for _ in 0..KMEANS_ITERATIONS {
        for (label, s) in labels.iter_mut().zip(samples) {
            *label = closest(&centers, s);
        }
        let mut sums = vec![[0.0f64; 3]; centers.len()];
        let mut counts = vec![0usize; centers.len()];
        for (&label, s) in labels.iter().zip(samples) {
            counts[label] += 1;
            for i in 0..3 {
                sums[label][i] += s[i];
            }
        }
        for ((center, sum), &count) in centers.iter_mut().zip(&sums).zip(&counts) {
            if count > 0 {
                *center = sum.map(|v| v / count as f64);
            }
        }
    }
    for (label, s) in labels.iter_mut().zip(samples) {
        *label = closest(&centers, s);
    }
    labels
}

fn closest(centers: &[Color], sample: &Color) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (k, c) in centers.iter().enumerate() {
        let d = squared_distance(c, sample);
        if d < best_distance {
            best = k;
            best_distance = d;
        }
    }
    best
}
