//! Two-block partial least squares regression (PLS2).
//!
//! NIPALS in regression mode. Both blocks are centered and scaled to unit
//! sample standard deviation; for each latent component the leading pair of
//! weight vectors is found by power iteration, then both residual blocks are
//! deflated on the predictor scores. The fitted coefficients map raw predictor
//! values to raw response values.
//!
//! # Example
//!
//! ```
//! use hiconet_network::pls::Pls2;
//! use nalgebra::DMatrix;
//!
//! let x = DMatrix::from_fn(8, 3, |i, j| ((i * (j + 2)) % 5) as f64 + j as f64);
//! let y = DMatrix::from_fn(8, 2, |i, j| x[(i, 0)] * (j as f64 + 1.0) - x[(i, 2)]);
//! let fit = Pls2::new(3).fit(&x, &y)?;
//! let r2 = fit.score(&x, &y)?;
//! assert!(r2 > 0.999);
//! # Ok::<(), hiconet_network::pls::FitError>(())
//! ```

use hiconet_stats::{descriptive::DescriptiveStats, goodness_of_fit::r2_score};
use nalgebra::{DMatrix, DVector};

pub const DEFAULT_COMPONENTS: usize = 3;

const MAX_ITERATIONS: usize = 500;
const TOLERANCE: f64 = 1e-6;
const PINV_RCOND: f64 = 1e-15;

/// Reasons a single regression cannot be fitted or scored.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum FitError {
    #[display("predictor has {x_rows} rows but response has {y_rows}")]
    ShapeMismatch { x_rows: usize, y_rows: usize },
    #[display("need at least 2 samples, got {got}")]
    TooFewSamples { got: usize },
    #[display("{components} components requested for a predictor block of {columns} columns")]
    TooManyComponents { components: usize, columns: usize },
    #[display("no latent component could be extracted")]
    NoComponent,
    #[display("regression produced a non-finite value")]
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pls2 {
    pub n_components: usize,
}

impl Default for Pls2 {
    fn default() -> Self {
        Self::new(DEFAULT_COMPONENTS)
    }
}

/// A fitted PLS2 model.
#[derive(Debug, Clone)]
pub struct Pls2Fit {
    x_mean: Vec<f64>,
    y_mean: Vec<f64>,
    /// `predictors x responses`, in raw units of both blocks.
    coefficients: DMatrix<f64>,
    n_components: usize,
}

impl Pls2 {
    #[must_use]
    pub fn new(n_components: usize) -> Self {
        Self { n_components }
    }

    /// Fits `y` (samples x responses) on `x` (samples x predictors).
    pub fn fit(&self, x: &DMatrix<f64>, y: &DMatrix<f64>) -> Result<Pls2Fit, FitError> {
        let (n, p) = x.shape();
        if y.nrows() != n {
            return Err(FitError::ShapeMismatch {
                x_rows: n,
                y_rows: y.nrows(),
            });
        }
        if n < 2 {
            return Err(FitError::TooFewSamples { got: n });
        }
        if self.n_components == 0 || self.n_components > p {
            return Err(FitError::TooManyComponents {
                components: self.n_components,
                columns: p,
            });
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(FitError::NonFinite);
        }

        let (mut xk, x_mean, x_std) = standardize(x);
        let (mut yk, y_mean, y_std) = standardize(y);

        let mut weights = Vec::with_capacity(self.n_components);
        let mut x_loadings = Vec::with_capacity(self.n_components);
        let mut y_loadings = Vec::with_capacity(self.n_components);
        for k in 0..self.n_components {
            for mut column in yk.column_iter_mut() {
                if column.iter().all(|v| v.abs() < 10.0 * f64::EPSILON) {
                    column.fill(0.0);
                }
            }
            let Some(w) = first_x_weights(&xk, &yk) else {
                log::warn!(
                    "response residual is constant, keeping {k} of {} components",
                    self.n_components
                );
                break;
            };
            let t = &xk * &w;
            let tt = t.dot(&t);
            if tt.is_nan() || tt <= f64::EPSILON {
                log::warn!(
                    "predictor residual is exhausted, keeping {k} of {} components",
                    self.n_components
                );
                break;
            }
            let x_load = xk.transpose() * &t / tt;
            xk -= &t * x_load.transpose();
            let y_load = yk.transpose() * &t / tt;
            yk -= &t * y_load.transpose();

            weights.push(w);
            x_loadings.push(x_load);
            y_loadings.push(y_load);
        }
        if weights.is_empty() {
            return Err(FitError::NoComponent);
        }

        let w = DMatrix::from_columns(&weights);
        let pw = DMatrix::from_columns(&x_loadings).transpose() * &w;
        let svd = pw.svd(true, true);
        let cutoff = PINV_RCOND * svd.singular_values.max();
        let pw_inv = svd
            .pseudo_inverse(cutoff)
            .map_err(|_| FitError::NonFinite)?;
        let mut coefficients = w * pw_inv * DMatrix::from_columns(&y_loadings).transpose();
        for (j, mut column) in coefficients.column_iter_mut().enumerate() {
            column *= y_std[j];
        }
        for (i, mut row) in coefficients.row_iter_mut().enumerate() {
            row /= x_std[i];
        }
        if coefficients.iter().any(|v| !v.is_finite()) {
            return Err(FitError::NonFinite);
        }

        Ok(Pls2Fit {
            x_mean,
            y_mean,
            coefficients,
            n_components: weights.len(),
        })
    }
}

impl Pls2Fit {
    /// Number of latent components actually extracted.
    #[must_use]
    pub fn n_components(&self) -> usize {
        self.n_components
    }

    #[must_use]
    pub fn coefficients(&self) -> &DMatrix<f64> {
        &self.coefficients
    }

    /// Predicts the response block for `x`.
    ///
    /// # Panics
    ///
    /// Panics if `x` does not have as many columns as the fitted predictor block.
    #[must_use]
    pub fn predict(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let mut centered = x.clone();
        for (j, mut column) in centered.column_iter_mut().enumerate() {
            column.add_scalar_mut(-self.x_mean[j]);
        }
        let mut predicted = centered * &self.coefficients;
        for (j, mut column) in predicted.column_iter_mut().enumerate() {
            column.add_scalar_mut(self.y_mean[j]);
        }
        predicted
    }

    /// Coefficient of determination of the predictions for `x` against `y`,
    /// uniformly averaged over response columns.
    pub fn score(&self, x: &DMatrix<f64>, y: &DMatrix<f64>) -> Result<f64, FitError> {
        r2_score(y, &self.predict(x))
            .filter(|r2| r2.is_finite())
            .ok_or(FitError::NonFinite)
    }
}

/// Centers every column and scales it to unit sample standard deviation.
fn standardize(m: &DMatrix<f64>) -> (DMatrix<f64>, Vec<f64>, Vec<f64>) {
    let mut scaled = m.clone();
    let mut means = Vec::with_capacity(m.ncols());
    let mut stds = Vec::with_capacity(m.ncols());
    for mut column in scaled.column_iter_mut() {
        let (mean, std) = DescriptiveStats::new(column.iter().copied())
            .map_or((0.0, 1.0), |stats| (stats.mean, stats.sample_std_dev));
        let std = if std > 0.0 { std } else { 1.0 };
        for v in column.iter_mut() {
            *v = (*v - mean) / std;
        }
        means.push(mean);
        stds.push(std);
    }
    (scaled, means, stds)
}

/// Leading predictor weight vector of `xᵀy`, by power iteration.
///
/// Returns `None` when every response column is (numerically) zero or the
/// iteration degenerates.
fn first_x_weights(x: &DMatrix<f64>, y: &DMatrix<f64>) -> Option<DVector<f64>> {
    let eps = f64::EPSILON;
    let mut y_score = y
        .column_iter()
        .find(|column| column.iter().any(|v| v.abs() > eps))?
        .into_owned();

    let mut x_weights = DVector::zeros(x.ncols());
    let mut previous: Option<DVector<f64>> = None;
    for _ in 0..MAX_ITERATIONS {
        x_weights = x.transpose() * &y_score / y_score.dot(&y_score);
        let norm = x_weights.norm() + eps;
        x_weights /= norm;
        let x_score = x * &x_weights;
        let y_weights = y.transpose() * &x_score / x_score.dot(&x_score);
        y_score = y * &y_weights / (y_weights.dot(&y_weights) + eps);

        let converged = previous
            .as_ref()
            .is_some_and(|old| (&x_weights - old).norm_squared() < TOLERANCE);
        if converged || y.ncols() == 1 {
            break;
        }
        previous = Some(x_weights.clone());
    }
    x_weights.iter().all(|v| v.is_finite()).then_some(x_weights)
}
