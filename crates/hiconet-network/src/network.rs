use std::collections::BTreeSet;

use hiconet_community::{CommunityId, Partition};
use hiconet_society::{FeatureMatrix, MatchPlan};
use rand::Rng as _;

use crate::{
    AssociationConfig, NetworkError,
    config::MIN_COMMUNITY_SIZE,
    permutation::PermutationSampler,
    pls::Pls2,
    scoring::association_score,
    significance::SignificanceModel,
};

/// A scored, significance-tested link between two communities.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AssociationEdge {
    pub community1: CommunityId,
    pub community2: CommunityId,
    pub score: f64,
    pub p_value: f64,
}

/// A qualifying community pair whose regression could not be fitted.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SkippedPair {
    pub community1: CommunityId,
    pub community2: CommunityId,
    pub reason: String,
}

/// Association edges between the communities of two societies.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct AssociationNetwork {
    /// Sorted by score, highest first.
    pub edges: Vec<AssociationEdge>,
    pub skipped: Vec<SkippedPair>,
}

impl AssociationNetwork {
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssociationEdge> {
        self.edges.iter()
    }
}

/// Builds association networks between the communities of two societies.
///
/// ```
/// use hiconet_community::{CommunityId, Partition};
/// use hiconet_network::{AssociationConfig, AssociationNetworkBuilder};
/// use hiconet_society::{FeatureMatrix, MatchPlan};
///
/// let ids = |prefix: &str, n: usize| (0..n).map(|i| format!("{prefix}{i}")).collect::<Vec<_>>();
/// let rows = |n: usize, shift: usize| {
///     (0..n)
///         .map(|f| (0..12).map(|o| ((o * (f + 3) + shift) % 7) as f64).collect())
///         .collect::<Vec<Vec<f64>>>()
/// };
/// let genes = FeatureMatrix::from_rows(ids("g", 3), ids("a", 12), &rows(3, 0))?;
/// let cells = FeatureMatrix::from_rows(ids("c", 4), ids("b", 12), &rows(4, 2))?;
/// let plan = MatchPlan::new(ids("a", 12), ids("b", 12));
///
/// let builder = AssociationNetworkBuilder::new(AssociationConfig {
///     seed: Some(1),
///     ..AssociationConfig::default()
/// });
/// let network = builder.build(
///     &Partition::from_labels(vec![CommunityId(0); 3]),
///     &Partition::from_labels(vec![CommunityId(0); 4]),
///     &genes,
///     &cells,
///     &plan,
/// )?;
/// assert_eq!(network.len(), 1);
/// assert!((0.0..=1.0).contains(&network.edges[0].p_value));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct AssociationNetworkBuilder {
    config: AssociationConfig,
}

impl AssociationNetworkBuilder {
    #[must_use]
    pub fn new(config: AssociationConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &AssociationConfig {
        &self.config
    }

    /// Scores every pair of qualifying communities and estimates the
    /// significance of each score against a permutation null.
    ///
    /// `communities1` partitions the rows of `matrix1`, `communities2` those of
    /// `matrix2`. Position `i` of the plan pairs an observation of `matrix1`
    /// with one of `matrix2`.
    pub fn build(
        &self,
        communities1: &Partition,
        communities2: &Partition,
        matrix1: &FeatureMatrix,
        matrix2: &FeatureMatrix,
        plan: &MatchPlan,
    ) -> Result<AssociationNetwork, NetworkError> {
        let (left, right) = (plan.observations1().len(), plan.observations2().len());
        if left != right {
            return Err(NetworkError::MismatchedSampleCount { left, right });
        }
        self.config.validate()?;
        check_partition(communities1, matrix1, 1)?;
        check_partition(communities2, matrix2, 2)?;
        let columns1 = resolve_columns(matrix1, plan.observations1())?;
        let columns2 = resolve_columns(matrix2, plan.observations2())?;

        let qualifying1 = communities1
            .with_min_size(MIN_COMMUNITY_SIZE)
            .collect::<Vec<_>>();
        let qualifying2 = communities2
            .with_min_size(MIN_COMMUNITY_SIZE)
            .collect::<Vec<_>>();
        if qualifying1.is_empty() || qualifying2.is_empty() {
            log::debug!(
                "no community pair to score ({} and {} communities of size >= {MIN_COMMUNITY_SIZE})",
                qualifying1.len(),
                qualifying2.len()
            );
            return Ok(AssociationNetwork::default());
        }

        let n_matched = left;
        if n_matched < self.config.min_matched_samples {
            return Err(NetworkError::InsufficientData {
                reason: format!(
                    "{n_matched} matched observations, need at least {}",
                    self.config.min_matched_samples
                ),
            });
        }

        let pls = Pls2::new(self.config.n_components);
        let mut scored = Vec::with_capacity(qualifying1.len() * qualifying2.len());
        let mut skipped = Vec::new();
        for &(community1, rows1) in &qualifying1 {
            let block1 = matrix1.observation_block(rows1, &columns1);
            for &(community2, rows2) in &qualifying2 {
                let block2 = matrix2.observation_block(rows2, &columns2);
                match association_score(&block1, &block2, pls) {
                    Ok(score) => scored.push((community1, community2, score)),
                    Err(err) => {
                        log::warn!("skipping community pair {community1} x {community2}: {err}");
                        skipped.push(SkippedPair {
                            community1,
                            community2,
                            reason: err.to_string(),
                        });
                    }
                }
            }
        }
        if scored.is_empty() {
            return Ok(AssociationNetwork {
                edges: Vec::new(),
                skipped,
            });
        }

        let model = self.null_model(&qualifying1, &qualifying2, matrix1, matrix2, n_matched)?;
        let mut edges = scored
            .into_iter()
            .map(|(community1, community2, score)| AssociationEdge {
                community1,
                community2,
                score,
                p_value: model.p_value(score),
            })
            .collect::<Vec<_>>();
        edges.sort_by(|a, b| b.score.total_cmp(&a.score));

        log::info!(
            "association network: {} edges, {} skipped pairs, {n_matched} matched observations",
            edges.len(),
            skipped.len()
        );
        Ok(AssociationNetwork { edges, skipped })
    }

    fn null_model(
        &self,
        qualifying1: &[(CommunityId, &[usize])],
        qualifying2: &[(CommunityId, &[usize])],
        matrix1: &FeatureMatrix,
        matrix2: &FeatureMatrix,
        n_matched: usize,
    ) -> Result<SignificanceModel, NetworkError> {
        let pool1 = matrix1.flattened_values();
        let pool2 = matrix2.flattened_values();
        for (side, pool) in [(1, &pool1), (2, &pool2)] {
            if pool.len() < n_matched {
                return Err(NetworkError::InsufficientData {
                    reason: format!(
                        "side {side} has {} values to resample, fewer than {n_matched} matched observations",
                        pool.len()
                    ),
                });
            }
        }
        let sizes1 = distinct_sizes(qualifying1);
        let sizes2 = distinct_sizes(qualifying2);

        let seed = self.config.seed.unwrap_or_else(|| rand::rng().random());
        let workers = self.config.worker_count();
        log::debug!(
            "null model: {} permutations over sizes {sizes1:?} x {sizes2:?}, seed {seed}, {workers} workers",
            self.config.num_permutations
        );
        let sampler = PermutationSampler {
            pool1: &pool1,
            pool2: &pool2,
            sizes1: &sizes1,
            sizes2: &sizes2,
            n_matched,
            pls: Pls2::new(self.config.n_components),
        };
        let null = sampler.generate(self.config.num_permutations, seed, workers);
        null.log_summary();
        SignificanceModel::fit(&null)
    }
}

fn distinct_sizes(communities: &[(CommunityId, &[usize])]) -> Vec<usize> {
    communities
        .iter()
        .map(|(_, members)| members.len())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn check_partition(
    partition: &Partition,
    matrix: &FeatureMatrix,
    side: u8,
) -> Result<(), NetworkError> {
    if partition.n_features() == matrix.n_features() {
        Ok(())
    } else {
        Err(NetworkError::InvalidInput {
            reason: format!(
                "side {side} partition covers {} features but the matrix has {}",
                partition.n_features(),
                matrix.n_features()
            ),
        })
    }
}

fn resolve_columns(matrix: &FeatureMatrix, ids: &[String]) -> Result<Vec<usize>, NetworkError> {
    ids.iter()
        .map(|id| {
            matrix
                .column_of(id)
                .ok_or_else(|| NetworkError::InvalidInput {
                    reason: format!("observation '{id}' is not a column of the data matrix"),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_sizes() {
        let (a, b, c) = ([0, 1, 2], [3, 4, 5], [6, 7, 8, 9]);
        let communities = [
            (CommunityId(0), &a[..]),
            (CommunityId(1), &c[..]),
            (CommunityId(2), &b[..]),
        ];
        assert_eq!(distinct_sizes(&communities), vec![3, 4]);
    }

    #[test]
    fn test_resolve_columns() {
        let matrix = FeatureMatrix::from_rows(
            vec!["f".into()],
            vec!["x".into(), "y".into()],
            &[vec![1.0, 2.0]],
        )
        .unwrap();
        assert_eq!(
            resolve_columns(&matrix, &["y".into(), "x".into()]).unwrap(),
            vec![1, 0]
        );
        let err = resolve_columns(&matrix, &["z".into()]).unwrap_err();
        assert!(err.to_string().contains("'z'"));
    }
}
