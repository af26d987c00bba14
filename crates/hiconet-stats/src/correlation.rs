//! Pearson correlation.

/// Pearson product-moment correlation between two equally sized samples.
///
/// Returns `None` when the samples differ in length, hold fewer than two
/// values, or when either sample has zero variance (the correlation is
/// undefined there).
///
/// The result is clamped to `[-1.0, 1.0]` to absorb rounding.
///
/// ```
/// use hiconet_stats::correlation::pearson;
///
/// let a = [1.0, 2.0, 3.0, 4.0];
/// let b = [4.0, 3.0, 2.0, 1.0];
/// assert!((pearson(&a, &b).unwrap() + 1.0).abs() < 1e-12);
///
/// let flat = [1.0, 1.0, 1.0, 1.0];
/// assert_eq!(pearson(&a, &flat), None);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    if var_a <= 0.0 || var_b <= 0.0 {
        return None;
    }
    Some((cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0))
}
