//! Coefficient of determination.

use nalgebra::DMatrix;

/// Coefficient of determination (R²), uniformly averaged over output columns.
///
/// For each column, `R² = 1 - SS_res / SS_tot`. A column with zero total sum of
/// squares (constant observed values) scores `1.0` when it is predicted exactly
/// and `0.0` otherwise, so the result is always finite for finite input.
///
/// Returns `None` when the two matrices differ in shape or are empty.
///
/// ```
/// use hiconet_stats::goodness_of_fit::r2_score;
/// use nalgebra::DMatrix;
///
/// let observed = DMatrix::from_row_slice(4, 1, &[1.0, 2.0, 3.0, 4.0]);
/// assert_eq!(r2_score(&observed, &observed), Some(1.0));
///
/// let mean_only = DMatrix::from_element(4, 1, 2.5);
/// assert_eq!(r2_score(&observed, &mean_only), Some(0.0));
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn r2_score(observed: &DMatrix<f64>, predicted: &DMatrix<f64>) -> Option<f64> {
    if observed.shape() != predicted.shape() || observed.is_empty() {
        return None;
    }
    let per_column = observed
        .column_iter()
        .zip(predicted.column_iter())
        .map(|(obs, pred)| {
            let mean = obs.mean();
            let ss_tot = obs.iter().map(|y| (y - mean).powi(2)).sum::<f64>();
            let ss_res = obs
                .iter()
                .zip(pred.iter())
                .map(|(y, y_hat)| (y - y_hat).powi(2))
                .sum::<f64>();
            if ss_tot > 0.0 {
                1.0 - ss_res / ss_tot
            } else if ss_res == 0.0 {
                1.0
            } else {
                0.0
            }
        })
        .sum::<f64>();
    Some(per_column / observed.ncols() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_average_over_columns() {
        let observed = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 2.0, 1.0, 3.0, 2.0]);
        // Column 0 predicted exactly, column 1 by its mean.
        let predicted = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 2.0, 1.0, 3.0, 1.0]);
        assert_eq!(r2_score(&observed, &predicted), Some(0.5));
    }

    #[test]
    fn test_constant_column() {
        let observed = DMatrix::from_element(3, 1, 5.0);
        let off = DMatrix::from_element(3, 1, 4.0);
        assert_eq!(r2_score(&observed, &observed), Some(1.0));
        assert_eq!(r2_score(&observed, &off), Some(0.0));
    }

    #[test]
    fn test_shape_mismatch() {
        let a = DMatrix::from_element(3, 1, 1.0);
        let b = DMatrix::from_element(3, 2, 1.0);
        assert_eq!(r2_score(&a, &b), None);
    }
}
