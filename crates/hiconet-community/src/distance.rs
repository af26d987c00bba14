//! Condensed pairwise distances between feature rows.

use hiconet_society::FeatureMatrix;
use hiconet_stats::{correlation::pearson, descriptive::DescriptiveStats};

use crate::DetectError;

/// Upper-triangle distances between `n` items, stored row by row.
///
/// The distance between items `i < j` lives at
/// `n * i - i * (i + 1) / 2 + (j - i - 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CondensedDistances {
    n: usize,
    values: Vec<f64>,
}

impl CondensedDistances {
    /// Builds the condensed matrix by evaluating `distance(i, j)` for every `i < j`.
    pub fn from_fn(n: usize, mut distance: impl FnMut(usize, usize) -> f64) -> Self {
        let mut values = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                values.push(distance(i, j));
            }
        }
        Self { n, values }
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.n
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Distance between two distinct items.
    ///
    /// # Panics
    ///
    /// Panics if `i == j` or either index is out of range.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[condensed_index(self.n, i, j)]
    }

    pub(crate) fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Scales each pairwise correlation by the proximity of the two features
    /// along an auxiliary coordinate.
    ///
    /// With `r = 1 - d` and `w = 1 - |aux_i - aux_j| / range(aux)`, the new
    /// distance is `1 - w * r`. Features far apart on the coordinate end up
    /// near distance 1 whatever their correlation.
    pub fn weight_by_aux(&mut self, aux: &[f64]) -> Result<(), DetectError> {
        if aux.len() != self.n {
            return Err(DetectError::InvalidInput {
                reason: format!(
                    "auxiliary coordinate has {} values for {} features",
                    aux.len(),
                    self.n
                ),
            });
        }
        if aux.iter().any(|v| !v.is_finite()) {
            return Err(DetectError::InvalidInput {
                reason: "auxiliary coordinate contains a non-numeric value".to_owned(),
            });
        }
        let (min, max) = aux
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let range = max - min;
        if range <= 0.0 {
            return Err(DetectError::InsufficientData {
                reason: format!("auxiliary coordinate has zero range (every feature at {min})"),
            });
        }

        let mut k = 0;
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                let r = 1.0 - self.values[k];
                let w = 1.0 - (aux[i] - aux[j]).abs() / range;
                self.values[k] = 1.0 - w * r;
                k += 1;
            }
        }
        Ok(())
    }
}

pub(crate) fn condensed_index(n: usize, i: usize, j: usize) -> usize {
    assert_ne!(i, j, "no self-distance in a condensed matrix");
    let (i, j) = if i < j { (i, j) } else { (j, i) };
    n * i - i * (i + 1) / 2 + (j - i - 1)
}

/// Correlation distance `1 - r` between every pair of feature rows.
///
/// Fails when a feature has zero variance, since its correlation with anything
/// is undefined.
pub fn correlation_distances(matrix: &FeatureMatrix) -> Result<CondensedDistances, DetectError> {
    let rows = (0..matrix.n_features())
        .map(|row| matrix.feature_values(row))
        .collect::<Vec<_>>();
    for (row, values) in rows.iter().enumerate() {
        let constant = DescriptiveStats::new(values.iter().copied())
            .is_none_or(|stats| stats.is_constant());
        if constant {
            return Err(zero_variance(matrix, row));
        }
    }

    let mut failed = None;
    let distances = CondensedDistances::from_fn(rows.len(), |i, j| {
        pearson(&rows[i], &rows[j]).map_or_else(
            || {
                failed.get_or_insert(i);
                f64::NAN
            },
            |r| 1.0 - r,
        )
    });
    match failed {
        Some(row) => Err(zero_variance(matrix, row)),
        None => Ok(distances),
    }
}

fn zero_variance(matrix: &FeatureMatrix, row: usize) -> DetectError {
    DetectError::InsufficientData {
        reason: format!(
            "feature '{}' has zero variance across observations",
            matrix.feature_ids()[row]
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[Vec<f64>]) -> FeatureMatrix {
        let n_obs = rows[0].len();
        FeatureMatrix::from_rows(
            (0..rows.len()).map(|i| format!("f{i}")).collect(),
            (0..n_obs).map(|j| format!("o{j}")).collect(),
            rows,
        )
        .unwrap()
    }

    #[test]
    #[expect(clippy::cast_precision_loss)]
    fn test_condensed_layout() {
        let d = CondensedDistances::from_fn(4, |i, j| (10 * i + j) as f64);
        assert_eq!(d.values(), &[1.0, 2.0, 3.0, 12.0, 13.0, 23.0]);
        assert_eq!(d.get(2, 1), 12.0);
        assert_eq!(d.get(2, 3), 23.0);
    }

    #[test]
    fn test_correlation_distance_range() {
        let m = matrix(&[
            vec![1.0, 2.0, 3.0, 4.0],
            vec![2.0, 4.0, 6.0, 8.0],
            vec![4.0, 3.0, 2.0, 1.0],
        ]);
        let d = correlation_distances(&m).unwrap();
        assert!(d.get(0, 1).abs() < 1e-12);
        assert!((d.get(0, 2) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_variance_feature() {
        let m = matrix(&[
            vec![1.0, 2.0, 3.0],
            vec![5.0, 5.0, 5.0],
            vec![3.0, 1.0, 2.0],
        ]);
        let err = correlation_distances(&m).unwrap_err();
        assert!(err.to_string().contains("'f1'"), "{err}");
    }

    #[test]
    fn test_aux_weighting() {
        // r = 1 for all pairs
        let mut d = CondensedDistances::from_fn(3, |_, _| 0.0);
        d.weight_by_aux(&[0.0, 5.0, 10.0]).unwrap();
        assert!((d.get(0, 1) - 0.5).abs() < 1e-12);
        assert!((d.get(0, 2) - 1.0).abs() < 1e-12);
        assert!((d.get(1, 2) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_aux_zero_range() {
        let mut d = CondensedDistances::from_fn(3, |_, _| 0.5);
        let err = d.weight_by_aux(&[2.0, 2.0, 2.0]).unwrap_err();
        assert!(matches!(err, DetectError::InsufficientData { .. }));
        let err = d.weight_by_aux(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, DetectError::InvalidInput { .. }));
    }
}
