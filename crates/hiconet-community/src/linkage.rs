//! Ward agglomerative clustering and flat cuts of the resulting dendrogram.
//!
//! [`ward`] builds the dendrogram with the nearest-neighbor chain algorithm
//! and the Lance-Williams update for Ward's criterion. [`Linkage::cut`] then
//! assigns flat cluster labels so that no cluster contains a merge above the
//! cut height.
//!
//! Leaves are numbered `0..n`. The `k`-th merge (in increasing height order)
//! creates cluster `n + k`.
//!
//! # Example
//!
//! ```
//! use hiconet_community::{distance::CondensedDistances, linkage::ward};
//!
//! // two tight pairs far apart on a line: 0, 1 and 10, 11
//! let points = [0.0_f64, 1.0, 10.0, 11.0];
//! let distances = CondensedDistances::from_fn(4, |i, j| (points[i] - points[j]).abs());
//! let linkage = ward(&distances);
//! assert_eq!(linkage.cut(2.0), vec![1, 1, 2, 2]);
//! assert_eq!(linkage.cut(100.0), vec![1, 1, 1, 1]);
//! ```

use crate::distance::{CondensedDistances, condensed_index};

/// One agglomeration step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    pub height: f64,
    /// Number of leaves under the new cluster.
    pub size: usize,
}

/// A full dendrogram over `n_leaves` items.
#[derive(Debug, Clone, PartialEq)]
pub struct Linkage {
    n_leaves: usize,
    merges: Vec<Merge>,
}

/// Runs Ward linkage on a condensed distance matrix.
#[must_use]
pub fn ward(distances: &CondensedDistances) -> Linkage {
    let n = distances.len();
    let mut d = distances.clone().into_values();
    // 0 marks a cluster that has been merged away
    let mut size = vec![1_usize; n];
    let mut raw = Vec::with_capacity(n.saturating_sub(1));
    let mut chain = Vec::<usize>::with_capacity(n);

    for _ in 1..n {
        if chain.is_empty() {
            let Some(first) = size.iter().position(|&s| s > 0) else {
                break;
            };
            chain.push(first);
        }

        let (x, y, height) = loop {
            let x = chain[chain.len() - 1];
            let previous = (chain.len() > 1).then(|| chain[chain.len() - 2]);
            let (mut y, mut current_min) = match previous {
                Some(p) => (p, d[condensed_index(n, x, p)]),
                None => (x, f64::INFINITY),
            };
            for (i, &ni) in size.iter().enumerate() {
                if ni == 0 || i == x {
                    continue;
                }
                let dist = d[condensed_index(n, x, i)];
                if dist < current_min {
                    current_min = dist;
                    y = i;
                }
            }
            if previous == Some(y) {
                break (x, y, current_min);
            }
            chain.push(y);
        };
        chain.truncate(chain.len() - 2);

        let (x, y) = (x.min(y), x.max(y));
        let (nx, ny) = (size[x], size[y]);
        raw.push(Merge {
            left: x,
            right: y,
            height,
            size: nx + ny,
        });
        size[x] = 0;
        size[y] = nx + ny;

        for (i, &ni) in size.iter().enumerate() {
            if ni == 0 || i == y {
                continue;
            }
            let xi = condensed_index(n, i, x);
            let yi = condensed_index(n, i, y);
            d[yi] = ward_update(d[xi], d[yi], height, nx, ny, ni);
        }
    }

    raw.sort_by(|a, b| a.height.total_cmp(&b.height));
    Linkage {
        n_leaves: n,
        merges: relabel(raw, n),
    }
}

#[expect(clippy::cast_precision_loss)]
fn ward_update(dxi: f64, dyi: f64, dxy: f64, nx: usize, ny: usize, ni: usize) -> f64 {
    let (nx, ny, ni) = (nx as f64, ny as f64, ni as f64);
    let t = 1.0 / (nx + ny + ni);
    ((ni + nx) * t * dxi * dxi + (ni + ny) * t * dyi * dyi - ni * t * dxy * dxy)
        .max(0.0)
        .sqrt()
}

/// Renames merge operands from "slot of the surviving cluster" to dendrogram ids.
fn relabel(raw: Vec<Merge>, n: usize) -> Vec<Merge> {
    let mut parent = (0..(2 * n).saturating_sub(1)).collect::<Vec<_>>();
    let find = |parent: &mut Vec<usize>, mut node: usize| {
        let mut root = node;
        while parent[root] != root {
            root = parent[root];
        }
        while parent[node] != root {
            let next = parent[node];
            parent[node] = root;
            node = next;
        }
        root
    };

    raw.into_iter()
        .enumerate()
        .map(|(k, merge)| {
            let a = find(&mut parent, merge.left);
            let b = find(&mut parent, merge.right);
            let id = n + k;
            parent[a] = id;
            parent[b] = id;
            Merge {
                left: a.min(b),
                right: a.max(b),
                ..merge
            }
        })
        .collect()
}

impl Linkage {
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.n_leaves
    }

    /// Merges sorted by non-decreasing height.
    #[must_use]
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Flat clusters such that every cluster's internal merges sit at or below
    /// `threshold`.
    ///
    /// Labels start at 1 and are assigned in left-to-right dendrogram order.
    #[must_use]
    pub fn cut(&self, threshold: f64) -> Vec<u32> {
        let n = self.n_leaves;
        let mut labels = vec![0_u32; n];
        if self.merges.is_empty() {
            for (label, next) in labels.iter_mut().zip(1..) {
                *label = next;
            }
            return labels;
        }

        // tallest merge under each dendrogram node
        let mut max_height = Vec::<f64>::with_capacity(self.merges.len());
        for merge in &self.merges {
            let mut h = merge.height;
            for child in [merge.left, merge.right] {
                if child >= n {
                    h = h.max(max_height[child - n]);
                }
            }
            max_height.push(h);
        }

        let mut n_clusters = 0_u32;
        let mut leader = None;
        let mut visited = vec![false; self.merges.len()];
        let mut stack = vec![n + self.merges.len() - 1];
        while let Some(&node) = stack.last() {
            let k = node - n;
            let Merge { left, right, .. } = self.merges[k];
            if leader.is_none() && max_height[k] <= threshold {
                leader = Some(k);
                n_clusters += 1;
            }
            if left >= n && !visited[left - n] {
                visited[left - n] = true;
                stack.push(left);
                continue;
            }
            if right >= n && !visited[right - n] {
                visited[right - n] = true;
                stack.push(right);
                continue;
            }
            for leaf in [left, right] {
                if leaf < n {
                    if leader.is_none() {
                        n_clusters += 1;
                    }
                    labels[leaf] = n_clusters;
                }
            }
            if leader == Some(k) {
                leader = None;
            }
            stack.pop();
        }
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(points: &[f64]) -> CondensedDistances {
        CondensedDistances::from_fn(points.len(), |i, j| (points[i] - points[j]).abs())
    }

    #[test]
    fn test_ward_heights() {
        let linkage = ward(&line(&[0.0, 1.0, 10.0, 11.0]));
        let merges = linkage.merges();
        assert_eq!(merges.len(), 3);
        assert!((merges[0].height - 1.0).abs() < 1e-12);
        assert!((merges[1].height - 1.0).abs() < 1e-12);
        assert_eq!((merges[0].left, merges[0].right), (0, 1));
        assert_eq!((merges[1].left, merges[1].right), (2, 3));
        assert_eq!((merges[2].left, merges[2].right), (4, 5));
        assert_eq!(merges[2].size, 4);
        // between-centroid distance 10, Ward height sqrt(2 * 2 * 2 / 4) * 10
        assert!((merges[2].height - 200.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_ward_three_points() {
        // 0 and 1 merge at 1; then 2 joins at
        // sqrt((2 * 4^2 + 2 * 3^2 - 1) / 3) = sqrt(49 / 3)
        let linkage = ward(&line(&[0.0, 1.0, 4.0]));
        let merges = linkage.merges();
        assert_eq!((merges[0].left, merges[0].right), (0, 1));
        assert_eq!((merges[1].left, merges[1].right), (2, 3));
        assert!((merges[1].height - (49.0_f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_cut_levels() {
        let linkage = ward(&line(&[0.0, 1.0, 10.0, 11.0, 30.0]));
        assert_eq!(linkage.cut(0.5), vec![1, 2, 3, 4, 5]);
        let mid = linkage.cut(2.0);
        assert_eq!(mid[0], mid[1]);
        assert_eq!(mid[2], mid[3]);
        assert_ne!(mid[0], mid[2]);
        assert_ne!(mid[4], mid[0]);
        assert_ne!(mid[4], mid[2]);
        assert_eq!(linkage.cut(1e6), vec![1; 5]);
    }

    #[test]
    fn test_single_leaf() {
        let linkage = ward(&line(&[3.0]));
        assert!(linkage.merges().is_empty());
        assert_eq!(linkage.cut(1.0), vec![1]);
    }
}
