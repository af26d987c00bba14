//! Permutation null distribution of association scores.
//!
//! Synthetic blocks are drawn by pure value resampling: each synthetic column
//! holds `n_matched` values sampled without replacement from the flattened
//! value pool of one side's matrix. For every permutation, every community
//! size on side 1 is paired with every community size on side 2 and scored
//! exactly like a real community pair. All scores pool into one distribution,
//! whatever the sizes that produced them.
//!
//! Permutation `i` draws from its own `Pcg32` stream `i` under the run seed,
//! so the pooled scores do not depend on how permutations are spread across
//! worker threads.

use std::thread;

use hiconet_stats::{
    descriptive::DescriptiveStats,
    percentiles::{Percentiles, exceedance},
};
use nalgebra::DMatrix;
use rand::{Rng, seq::index};
use rand_pcg::Pcg32;

use crate::{pls::Pls2, scoring::association_score};

/// Scores of one null-model run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NullDistribution {
    scores: Vec<f64>,
    failed: usize,
}

impl NullDistribution {
    #[must_use]
    pub fn from_scores(scores: Vec<f64>) -> Self {
        Self { scores, failed: 0 }
    }

    /// Scores in generation order (permutation, then size pair).
    #[must_use]
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Synthetic regressions that failed and contributed no score.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }

    pub(crate) fn log_summary(&self) {
        if !log::log_enabled!(log::Level::Debug) {
            return;
        }
        let Some(stats) = DescriptiveStats::new(self.scores.iter().copied()) else {
            log::debug!("null distribution is empty ({} failed fits)", self.failed);
            return;
        };
        let percentiles = Percentiles::new(&self.scores, &[50.0, 95.0, 99.0]);
        let p = |q| percentiles.get(q).unwrap_or(f64::NAN);
        log::debug!(
            "null distribution: {} scores ({} failed fits), mean {:.4}, positive {:.3}, P50 {:.4}, P95 {:.4}, P99 {:.4}",
            stats.count,
            self.failed,
            stats.mean,
            exceedance(&self.scores, f64::MIN_POSITIVE),
            p(50.0),
            p(95.0),
            p(99.0),
        );
    }
}

/// Generates null scores for one pair of matrices.
#[derive(Debug, Clone)]
pub struct PermutationSampler<'a> {
    pub pool1: &'a [f64],
    pub pool2: &'a [f64],
    /// Distinct community sizes on side 1.
    pub sizes1: &'a [usize],
    /// Distinct community sizes on side 2.
    pub sizes2: &'a [usize],
    pub n_matched: usize,
    pub pls: Pls2,
}

impl PermutationSampler<'_> {
    /// Runs `num_permutations` permutations on up to `workers` threads.
    ///
    /// # Panics
    ///
    /// Panics if either pool holds fewer than `n_matched` values.
    #[must_use]
    pub fn generate(&self, num_permutations: usize, seed: u64, workers: usize) -> NullDistribution {
        assert!(
            self.pool1.len() >= self.n_matched && self.pool2.len() >= self.n_matched,
            "value pools must hold at least n_matched values"
        );
        let mut runs = vec![NullDistribution::default(); num_permutations];
        let chunk_len = num_permutations.div_ceil(workers.max(1)).max(1);
        thread::scope(|s| {
            for (chunk_index, chunk) in runs.chunks_mut(chunk_len).enumerate() {
                s.spawn(move || {
                    for (offset, run) in chunk.iter_mut().enumerate() {
                        let permutation = chunk_index * chunk_len + offset;
                        *run = self.permutation(seed, permutation);
                    }
                });
            }
        });

        let mut null = NullDistribution::default();
        for run in runs {
            null.scores.extend(run.scores);
            null.failed += run.failed;
        }
        null
    }

    fn permutation(&self, seed: u64, permutation: usize) -> NullDistribution {
        let mut rng = Pcg32::new(seed, permutation as u64);
        let mut run = NullDistribution::default();
        for &size1 in self.sizes1 {
            let block1 = random_block(self.pool1, self.n_matched, size1, &mut rng);
            for &size2 in self.sizes2 {
                let block2 = random_block(self.pool2, self.n_matched, size2, &mut rng);
                match association_score(&block1, &block2, self.pls) {
                    Ok(score) => run.scores.push(score),
                    Err(err) => {
                        log::trace!("permutation {permutation} ({size1}x{size2}): {err}");
                        run.failed += 1;
                    }
                }
            }
        }
        run
    }
}

/// `rows x cols` block whose columns are each sampled without replacement from `pool`.
fn random_block<R>(pool: &[f64], rows: usize, cols: usize, rng: &mut R) -> DMatrix<f64>
where
    R: Rng + ?Sized,
{
    let mut block = DMatrix::zeros(rows, cols);
    for mut column in block.column_iter_mut() {
        let picks = index::sample(rng, pool.len(), rows);
        for (value, pick) in column.iter_mut().zip(picks.iter()) {
            *value = pool[pick];
        }
    }
    block
}
