//! Weighted k-nearest-neighbor graph over feature rows.
//!
//! Each feature is a point in observation space. Its `k - 1` nearest
//! neighbors (the point itself counts toward `k`) are connected with a
//! UMAP-style fuzzy membership weight
//!
//! ```text
//! w(i, j) = exp(-(d(i, j) - rho_i) / sigma_i)
//! ```
//!
//! where `rho_i` is the distance to the nearest distinct neighbor and
//! `sigma_i` is calibrated so that the weights of row `i` sum to `log2(k)`.
//! The directed weights are symmetrized with the fuzzy union
//! `a + b - a * b`.

use std::collections::BTreeMap;

use petgraph::graph::{NodeIndex, UnGraph};

const SIGMA_ITERATIONS: usize = 64;
const SIGMA_TOLERANCE: f64 = 1e-5;
const MIN_SIGMA_SCALE: f64 = 1e-3;

/// Builds the symmetrized neighbor graph. Node `i` is row `i` of `points`.
///
/// `n_neighbors` includes the point itself and is capped at the number of points.
#[must_use]
pub fn knn_graph(points: &[Vec<f64>], n_neighbors: usize) -> UnGraph<(), f64> {
    let n = points.len();
    let k = n_neighbors.min(n).max(2);
    let mut graph = UnGraph::with_capacity(n, n * k);
    for _ in 0..n {
        graph.add_node(());
    }
    if n < 2 {
        return graph;
    }

    let neighbors = (0..n)
        .map(|i| nearest_neighbors(points, i, k - 1))
        .collect::<Vec<_>>();
    let mean_distance = mean(neighbors.iter().flatten().map(|&(_, d)| d));

    // (min, max) -> (weight min->max, weight max->min)
    let mut directed = BTreeMap::<(usize, usize), (f64, f64)>::new();
    for (i, row) in neighbors.iter().enumerate() {
        let rho = row
            .iter()
            .map(|&(_, d)| d)
            .find(|&d| d > 0.0)
            .unwrap_or(0.0);
        let sigma = smooth_sigma(row, rho, k, mean_distance);
        for &(j, d) in row {
            let w = membership(d, rho, sigma);
            let entry = directed.entry((i.min(j), i.max(j))).or_default();
            if i < j {
                entry.0 = w;
            } else {
                entry.1 = w;
            }
        }
    }

    for ((i, j), (a, b)) in directed {
        let w = a + b - a * b;
        if w > 0.0 {
            graph.add_edge(NodeIndex::new(i), NodeIndex::new(j), w);
        }
    }
    graph
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// The `count` nearest other points of `i`, closest first (ties by index).
fn nearest_neighbors(points: &[Vec<f64>], i: usize, count: usize) -> Vec<(usize, f64)> {
    let mut candidates = points
        .iter()
        .enumerate()
        .filter(|(j, _)| *j != i)
        .map(|(j, p)| (j, euclidean(&points[i], p)))
        .collect::<Vec<_>>();
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    candidates.truncate(count);
    candidates
}

#[expect(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0_usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

fn membership(d: f64, rho: f64, sigma: f64) -> f64 {
    let excess = d - rho;
    if excess <= 0.0 || sigma <= 0.0 {
        1.0
    } else {
        (-excess / sigma).exp()
    }
}

/// Bisection for the bandwidth that makes the row's weights sum to `log2(k)`.
#[expect(clippy::cast_precision_loss)]
fn smooth_sigma(row: &[(usize, f64)], rho: f64, k: usize, mean_distance: f64) -> f64 {
    let target = (k as f64).log2();
    let (mut lo, mut hi, mut mid) = (0.0, f64::INFINITY, 1.0);
    for _ in 0..SIGMA_ITERATIONS {
        let psum = row.iter().map(|&(_, d)| membership(d, rho, mid)).sum::<f64>();
        if (psum - target).abs() < SIGMA_TOLERANCE {
            break;
        }
        if psum > target {
            hi = mid;
            mid = (lo + hi) / 2.0;
        } else {
            lo = mid;
            mid = if hi == f64::INFINITY {
                mid * 2.0
            } else {
                (lo + hi) / 2.0
            };
        }
    }

    let floor = if rho > 0.0 {
        MIN_SIGMA_SCALE * mean(row.iter().map(|&(_, d)| d))
    } else {
        MIN_SIGMA_SCALE * mean_distance
    };
    mid.max(floor)
}
