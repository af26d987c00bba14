/// Percentile points of a score sample, evaluated once and looked up by point.
///
/// Values are interpolated linearly between the two closest ranks, so the 50th
/// percentile of an even-sized sample is the midpoint of its two middle values.
///
/// # Examples
///
/// ```
/// use hiconet_stats::percentiles::Percentiles;
///
/// let scores = [0.1, 0.4, 0.2, 0.3];
/// let percentiles = Percentiles::new(&scores, &[50.0, 100.0]);
///
/// assert!((percentiles.get(50.0).unwrap() - 0.25).abs() < 1e-12);
/// assert_eq!(percentiles.get(100.0), Some(0.4));
/// assert_eq!(percentiles.get(95.0), None);
/// ```
#[derive(Debug, Clone)]
pub struct Percentiles {
    points: Vec<(f64, f64)>,
}

impl Percentiles {
    /// Evaluates `points` (each in `0.0..=100.0`) over `values`.
    ///
    /// Non-finite values are ignored. Every point maps to `NaN` when no finite
    /// value remains.
    #[must_use]
    pub fn new(values: &[f64], points: &[f64]) -> Self {
        let mut sorted = values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);
        let points = points
            .iter()
            .map(|&p| (p, interpolated(&sorted, p)))
            .collect();
        Self { points }
    }

    /// Value at a precomputed percentile point.
    #[must_use]
    pub fn get(&self, point: f64) -> Option<f64> {
        self.points
            .iter()
            .find(|(p, _)| (p - point).abs() < 1e-9)
            .map(|(_, value)| *value)
    }

    /// `(point, value)` pairs in the order they were requested.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().copied()
    }
}

/// Linearly interpolated percentile of ascending `sorted` values.
///
/// `point` is clamped to `0.0..=100.0`. Returns `NaN` for an empty slice.
///
/// ```
/// use hiconet_stats::percentiles::interpolated;
///
/// let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(interpolated(&sorted, 50.0), 3.0);
/// assert_eq!(interpolated(&sorted, 25.0), 2.0);
/// assert_eq!(interpolated(&sorted, 75.0), 4.0);
/// assert!((interpolated(&sorted, 90.0) - 4.6).abs() < 1e-12);
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn interpolated(sorted: &[f64], point: f64) -> f64 {
    let Some(last) = sorted.len().checked_sub(1) else {
        return f64::NAN;
    };
    let rank = point.clamp(0.0, 100.0) / 100.0 * last as f64;
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(last);
    let frac = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Fraction of `values` greater than or equal to `score`.
///
/// Returns `NaN` for an empty slice.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn exceedance(values: &[f64], score: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let hits = values.iter().filter(|&&v| v >= score).count();
    hits as f64 / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignores_non_finite_scores() {
        let percentiles = Percentiles::new(&[f64::NAN, 3.0, 1.0, f64::INFINITY, 2.0], &[0.0, 50.0]);
        assert_eq!(percentiles.get(0.0), Some(1.0));
        assert_eq!(percentiles.get(50.0), Some(2.0));
    }

    #[test]
    fn test_empty_sample() {
        let percentiles = Percentiles::new(&[], &[50.0]);
        assert!(percentiles.get(50.0).unwrap().is_nan());
        assert!(exceedance(&[], 0.5).is_nan());
    }

    #[test]
    fn test_point_is_clamped() {
        let sorted = [10.0, 20.0];
        assert_eq!(interpolated(&sorted, -5.0), 10.0);
        assert_eq!(interpolated(&sorted, 150.0), 20.0);
        assert_eq!(interpolated(&[7.0], 99.0), 7.0);
    }

    #[test]
    fn test_exceedance_counts_ties() {
        let values = [0.1, 0.5, 0.5, 0.9];
        assert_eq!(exceedance(&values, 0.5), 0.75);
        assert_eq!(exceedance(&values, 1.0), 0.0);
    }
}
