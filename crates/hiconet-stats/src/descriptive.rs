/// Summary of one feature profile or score sample.
///
/// ```
/// use hiconet_stats::descriptive::DescriptiveStats;
///
/// let stats = DescriptiveStats::new([5.0, 2.0, 4.0, 1.0, 3.0]).unwrap();
/// assert_eq!((stats.min, stats.max), (1.0, 5.0));
/// assert_eq!(stats.mean, 3.0);
/// assert_eq!(stats.median, 3.0);
/// assert!(!stats.is_constant());
/// ```
#[derive(Debug, Clone)]
pub struct DescriptiveStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Population variance (`n` denominator).
    pub variance: f64,
    pub std_dev: f64,
    /// Sample standard deviation (`n - 1` denominator), `0.0` for a single value.
    pub sample_std_dev: f64,
}

impl DescriptiveStats {
    /// Summarizes `values`, or returns `None` when there are none.
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted = values.into_iter().collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted)
    }

    /// Summarizes values already in ascending order.
    ///
    /// # Panics
    ///
    /// Panics if `sorted` is not ascending.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted: &[f64]) -> Option<Self> {
        assert!(
            sorted.is_sorted_by(|a, b| a <= b),
            "summary input must be ascending"
        );
        let (&min, &max) = (sorted.first()?, sorted.last()?);
        let count = sorted.len();
        let n = count as f64;

        let mean = sorted.iter().sum::<f64>() / n;
        let mid = count / 2;
        let median = if count % 2 == 1 {
            sorted[mid]
        } else {
            f64::midpoint(sorted[mid - 1], sorted[mid])
        };
        let squared_dev = sorted.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>();
        let variance = squared_dev / n;
        let sample_std_dev = match count {
            1 => 0.0,
            _ => (squared_dev / (n - 1.0)).sqrt(),
        };

        Some(Self {
            count,
            min,
            max,
            mean,
            median,
            variance,
            std_dev: variance.sqrt(),
            sample_std_dev,
        })
    }

    /// Whether every value is identical, so the sample carries no variance.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.max - self.min == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values() {
        assert!(DescriptiveStats::new(Vec::<f64>::new()).is_none());
    }

    #[test]
    fn test_even_count_median_is_midpoint() {
        let stats = DescriptiveStats::new([4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.count, 4);
    }

    #[test]
    fn test_sample_std_dev() {
        let stats = DescriptiveStats::new([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
        assert!((stats.sample_std_dev - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_constant_profile() {
        let stats = DescriptiveStats::new([42.0]).unwrap();
        assert_eq!(stats.sample_std_dev, 0.0);
        assert!(stats.is_constant());
        assert!(DescriptiveStats::new([3.5, 3.5, 3.5]).unwrap().is_constant());
    }
}
