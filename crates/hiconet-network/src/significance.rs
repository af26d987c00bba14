//! Tail-calibrated p-value estimates.
//!
//! The pooled null scores are sorted in descending order and the top half is
//! kept as the calibration tail. A cubic is fitted from score to
//! `log10(rank / N)` (rank from 1, `N` the full null size); a real score's
//! p-value is `10^cubic(score)`, clamped to `[0, 1]`.
//!
//! The cubic is evaluated for any score, including scores above the largest
//! null score, where it extrapolates.

use hiconet_stats::polyfit::Polynomial;

use crate::{NetworkError, permutation::NullDistribution};

/// Fewest calibration points accepted for the cubic.
pub const MIN_TAIL_POINTS: usize = 4;

const DEGREE: usize = 3;

/// Cubic map from association score to estimated `log10(p)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignificanceModel {
    polynomial: Polynomial,
    tail_len: usize,
}

impl SignificanceModel {
    /// Fits the model on the top half of `null`.
    ///
    /// Fails with [`NetworkError::InsufficientData`] when the tail is shorter
    /// than [`MIN_TAIL_POINTS`] or too degenerate to determine a cubic.
    #[expect(clippy::cast_precision_loss)]
    pub fn fit(null: &NullDistribution) -> Result<Self, NetworkError> {
        let mut sorted = null.scores().to_vec();
        sorted.sort_by(|a, b| b.total_cmp(a));
        let n = sorted.len();
        let tail_len = n / 2;
        if tail_len < MIN_TAIL_POINTS {
            return Err(NetworkError::InsufficientData {
                reason: format!(
                    "{n} null scores leave a calibration tail of {tail_len}, need at least {MIN_TAIL_POINTS}"
                ),
            });
        }

        let ranks = (1..=tail_len)
            .map(|rank| (rank as f64 / n as f64).log10())
            .collect::<Vec<_>>();
        let polynomial = Polynomial::fit(&sorted[..tail_len], &ranks, DEGREE).map_err(|err| {
            NetworkError::InsufficientData {
                reason: format!("cannot calibrate p-values on the null tail: {err}"),
            }
        })?;
        log::debug!(
            "significance cubic over {tail_len} tail scores: {:?}",
            polynomial.coefficients()
        );
        Ok(Self {
            polynomial,
            tail_len,
        })
    }

    #[must_use]
    pub fn polynomial(&self) -> &Polynomial {
        &self.polynomial
    }

    #[must_use]
    pub fn tail_len(&self) -> usize {
        self.tail_len
    }

    /// Estimated p-value of a real association score, always in `[0, 1]`.
    #[must_use]
    pub fn p_value(&self, score: f64) -> f64 {
        let p = 10_f64.powf(self.polynomial.evaluate(score));
        if p.is_nan() { 1.0 } else { p.clamp(0.0, 1.0) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[expect(clippy::cast_precision_loss)]
    fn uniform_null(n: usize) -> NullDistribution {
        NullDistribution::from_scores((0..n).map(|i| (i as f64 + 0.5) / n as f64).collect())
    }

    #[test]
    fn test_uniform_null_is_calibrated() {
        let model = SignificanceModel::fit(&uniform_null(400)).unwrap();
        assert_eq!(model.tail_len(), 200);
        // the fraction of null scores above s is about 1 - s
        let mut previous = 1.0;
        for score in [0.6, 0.8, 0.9, 0.95] {
            let p = model.p_value(score);
            assert!(
                (p.log10() - (1.0 - score).log10()).abs() < 0.15,
                "score {score}: p {p}"
            );
            assert!(p < previous);
            previous = p;
        }
    }

    #[test]
    fn test_p_values_are_clamped() {
        let model = SignificanceModel::fit(&uniform_null(100)).unwrap();
        for score in [-10.0, -1.0, 0.0, 0.5, 1.0, 5.0, f64::NAN] {
            let p = model.p_value(score);
            assert!((0.0..=1.0).contains(&p), "score {score}: p {p}");
        }
        assert_eq!(model.p_value(f64::NAN), 1.0);
    }

    #[test]
    fn test_short_tail_is_rejected() {
        let err = SignificanceModel::fit(&uniform_null(7)).unwrap_err();
        assert!(matches!(err, NetworkError::InsufficientData { .. }));
    }

    #[test]
    fn test_degenerate_tail_is_rejected() {
        let null = NullDistribution::from_scores(vec![0.3; 40]);
        let err = SignificanceModel::fit(&null).unwrap_err();
        assert!(matches!(err, NetworkError::InsufficientData { .. }));
    }
}
