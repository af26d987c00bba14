//! Least-squares polynomial fitting.
//!
//! [`Polynomial::fit`] solves the Vandermonde least-squares problem through an
//! SVD of the column-scaled design matrix. Column scaling keeps the system well
//! conditioned when `x` spans a narrow range, and the singular-value cutoff
//! (`len(x) · ε` relative to the largest singular value) decides the numerical
//! rank. A rank-deficient system is reported as an error rather than returning
//! a minimum-norm polynomial that merely looks like a fit.

use nalgebra::{DMatrix, DVector};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum PolyFitError {
    #[display("x and y lengths differ ({x_len} vs {y_len})")]
    LengthMismatch { x_len: usize, y_len: usize },
    #[display("Need at least {needed} points to fit a degree-{degree} polynomial, got {got}")]
    TooFewPoints {
        degree: usize,
        needed: usize,
        got: usize,
    },
    #[display("Non-finite input value at position {index}")]
    NonFinite { index: usize },
    #[display("Design matrix is rank deficient (rank {rank}, need {needed})")]
    RankDeficient { rank: usize, needed: usize },
    #[display("Least-squares solve failed: {reason}")]
    Solve { reason: &'static str },
}

/// A polynomial with coefficients stored highest degree first.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    /// Creates a polynomial from coefficients ordered highest degree first.
    ///
    /// ```
    /// use hiconet_stats::polyfit::Polynomial;
    ///
    /// // 2x^2 + 3
    /// let poly = Polynomial::from_coefficients(vec![2.0, 0.0, 3.0]);
    /// assert_eq!(poly.evaluate(2.0), 11.0);
    /// ```
    #[must_use]
    pub fn from_coefficients(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    /// Fits a polynomial of the given degree to `(xs, ys)` by least squares.
    pub fn fit(xs: &[f64], ys: &[f64], degree: usize) -> Result<Self, PolyFitError> {
        if xs.len() != ys.len() {
            return Err(PolyFitError::LengthMismatch {
                x_len: xs.len(),
                y_len: ys.len(),
            });
        }
        let ncols = degree + 1;
        if xs.len() < ncols {
            return Err(PolyFitError::TooFewPoints {
                degree,
                needed: ncols,
                got: xs.len(),
            });
        }
        if let Some(index) = xs
            .iter()
            .chain(ys)
            .position(|v| !v.is_finite())
            .map(|i| i % xs.len())
        {
            return Err(PolyFitError::NonFinite { index });
        }

        let nrows = xs.len();
        let mut design = DMatrix::from_fn(nrows, ncols, |i, j| {
            let power = i32::try_from(degree - j).unwrap_or(i32::MAX);
            xs[i].powi(power)
        });
        let scales = design
            .column_iter()
            .map(|col| {
                let norm = col.norm();
                if norm > 0.0 { norm } else { 1.0 }
            })
            .collect::<Vec<_>>();
        for (j, scale) in scales.iter().enumerate() {
            design.column_mut(j).unscale_mut(*scale);
        }

        let svd = design.svd(true, true);
        #[expect(clippy::cast_precision_loss)]
        let cutoff = nrows as f64 * f64::EPSILON * svd.singular_values.max();
        let rank = svd.singular_values.iter().filter(|&&s| s > cutoff).count();
        if rank < ncols {
            return Err(PolyFitError::RankDeficient {
                rank,
                needed: ncols,
            });
        }

        let rhs = DVector::from_column_slice(ys);
        let solution = svd
            .solve(&rhs, cutoff)
            .map_err(|reason| PolyFitError::Solve { reason })?;
        let coefficients = solution
            .iter()
            .zip(&scales)
            .map(|(c, scale)| c / scale)
            .collect::<Vec<_>>();
        if let Some(index) = coefficients.iter().position(|c| !c.is_finite()) {
            return Err(PolyFitError::NonFinite { index });
        }
        Ok(Self { coefficients })
    }

    /// Coefficients ordered highest degree first.
    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Evaluates the polynomial at `x` (Horner's scheme).
    #[must_use]
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients.iter().fold(0.0, |acc, c| acc * x + c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_exact_cubic() {
        let xs = [-1.0, -0.5, 0.0, 0.25, 0.5, 0.9, 1.3];
        let ys = xs.map(|x| 0.5 * x * x * x - 2.0 * x * x + x - 4.0);
        let poly = Polynomial::fit(&xs, &ys, 3).unwrap();
        let expected = [0.5, -2.0, 1.0, -4.0];
        for (got, want) in poly.coefficients().iter().zip(expected) {
            assert!((got - want).abs() < 1e-8, "{got} vs {want}");
        }
    }

    #[test]
    fn test_least_squares_line() {
        // Symmetric noise around y = x cancels out.
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.1, 0.9, 2.1, 2.9];
        let poly = Polynomial::fit(&xs, &ys, 1).unwrap();
        assert!((poly.evaluate(1.5) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_too_few_points() {
        let err = Polynomial::fit(&[0.0, 1.0, 2.0], &[0.0, 1.0, 2.0], 3).unwrap_err();
        assert!(matches!(
            err,
            PolyFitError::TooFewPoints {
                needed: 4,
                got: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_identical_x_is_rank_deficient() {
        let xs = [0.4; 6];
        let ys = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let err = Polynomial::fit(&xs, &ys, 3).unwrap_err();
        assert!(matches!(err, PolyFitError::RankDeficient { .. }));
    }

    #[test]
    fn test_non_finite_input() {
        let err = Polynomial::fit(&[0.0, 1.0, f64::NAN], &[0.0, 1.0, 2.0], 1).unwrap_err();
        assert!(matches!(err, PolyFitError::NonFinite { index: 2 }));
    }
}
