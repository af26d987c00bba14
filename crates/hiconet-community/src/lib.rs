//! Feature community detection.
//!
//! A community is a group of features (rows of a [`FeatureMatrix`]) with
//! similar profiles across observations. Three strategies are available, see
//! [`CommunityMethod`]:
//!
//! - **Correlation hierarchical** (`hcl`): Ward linkage on correlation distance
//!   `1 - r`, cut at height 2.
//! - **Aux-coordinate hierarchical** (`lcms_hcl`): like `hcl`, but each
//!   correlation is damped by how far apart the two features sit along an
//!   auxiliary coordinate (LC-MS retention time). Cut at height 3.
//! - **Graph modularity** (`leiden`): Leiden on a k-nearest-neighbor graph of
//!   the feature profiles.
//!
//! Every feature ends up in exactly one community. Community identifiers are
//! only meaningful within one [`Partition`].
//!
//! # Modules
//!
//! - [`distance`]: condensed correlation distances and aux-coordinate weighting
//! - [`linkage`]: Ward linkage and flat cuts
//! - [`knn_graph`]: fuzzy k-nearest-neighbor graph
//! - [`leiden`]: Leiden community detection
//!
//! # Example
//!
//! ```
//! use hiconet_community::{CommunityDetector, CommunityMethod};
//! use hiconet_society::FeatureMatrix;
//!
//! let up: [f64; 8] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
//! let down = up.map(|v| 9.0 - v);
//! let rows = [
//!     up.to_vec(),
//!     up.map(|v| v * 2.0 + 0.1).to_vec(),
//!     up.map(|v| v + (v * 3.0).sin() * 0.2).to_vec(),
//!     down.to_vec(),
//!     down.map(|v| v * 3.0).to_vec(),
//!     down.map(|v| v + (v * 5.0).cos() * 0.2).to_vec(),
//! ];
//! let matrix = FeatureMatrix::from_rows(
//!     (1..=6).map(|i| format!("f{i}")).collect(),
//!     (1..=8).map(|j| format!("o{j}")).collect(),
//!     &rows,
//! )?;
//!
//! let detector = CommunityDetector::default();
//! let partition = detector.detect(&matrix, None, CommunityMethod::CorrelationHierarchical)?;
//! assert_eq!(partition.len(), 2);
//! assert_eq!(partition.labels()[0], partition.labels()[2]);
//! assert_ne!(partition.labels()[0], partition.labels()[3]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use hiconet_society::{FeatureMatrix, Society};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;

use self::{distance::correlation_distances, knn_graph::knn_graph, leiden::Leiden, linkage::ward};

pub use self::{
    method::CommunityMethod,
    partition::{CommunityId, Partition},
};

pub mod distance;
pub mod knn_graph;
pub mod leiden;
pub mod linkage;
mod method;
mod partition;

/// Fewest features a society needs before communities are detected.
pub const MIN_FEATURES: usize = 3;

/// Errors raised by community detection.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum DetectError {
    #[display("invalid input: {reason}")]
    InvalidInput { reason: String },
    #[display("insufficient data: {reason}")]
    InsufficientData { reason: String },
    #[display("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },
}

/// Tuning knobs for [`CommunityDetector`].
///
/// Deserializes from a partial document; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorConfig {
    /// Method for [`CommunityDetector::detect_society`]. `None` picks one from
    /// the society's data type.
    pub method: Option<CommunityMethod>,
    /// Flat-cut height for the hierarchical methods. `None` uses 2 for `hcl`
    /// and 3 for `lcms_hcl`.
    pub distance_cut: Option<f64>,
    /// Neighborhood size of the Leiden graph, counting the feature itself.
    pub n_neighbors: usize,
    pub resolution: f64,
    pub randomness: f64,
    /// Seed for Leiden. `None` draws a fresh seed per run.
    pub seed: Option<u64>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            method: None,
            distance_cut: None,
            n_neighbors: 15,
            resolution: 1.0,
            randomness: 0.01,
            seed: None,
        }
    }
}

impl DetectorConfig {
    fn validate(&self) -> Result<(), DetectError> {
        let invalid = |reason: String| Err(DetectError::InvalidConfiguration { reason });
        if let Some(cut) = self.distance_cut.filter(|cut| !(cut.is_finite() && *cut > 0.0)) {
            return invalid(format!("distance cut must be positive, got {cut}"));
        }
        if self.n_neighbors < 2 {
            return invalid(format!(
                "n_neighbors must be at least 2, got {}",
                self.n_neighbors
            ));
        }
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return invalid(format!(
                "resolution must be positive, got {}",
                self.resolution
            ));
        }
        if !(self.randomness.is_finite() && self.randomness >= 0.0) {
            return invalid(format!(
                "randomness must be non-negative, got {}",
                self.randomness
            ));
        }
        Ok(())
    }
}

/// Partitions the features of a matrix into communities.
#[derive(Debug, Clone, Default)]
pub struct CommunityDetector {
    config: DetectorConfig,
}

impl CommunityDetector {
    #[must_use]
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detects communities among the rows of `matrix`.
    ///
    /// `aux` holds one coordinate per feature and is required by
    /// [`CommunityMethod::AuxCoordinateHierarchical`]; the other methods ignore it.
    pub fn detect(
        &self,
        matrix: &FeatureMatrix,
        aux: Option<&[f64]>,
        method: CommunityMethod,
    ) -> Result<Partition, DetectError> {
        self.config.validate()?;
        let n_features = matrix.n_features();
        if n_features < MIN_FEATURES {
            return Err(DetectError::InsufficientData {
                reason: format!(
                    "{n_features} features, community detection needs at least {MIN_FEATURES}"
                ),
            });
        }
        if matrix.n_observations() < 2 {
            return Err(DetectError::InsufficientData {
                reason: format!(
                    "{} observations, community detection needs at least 2",
                    matrix.n_observations()
                ),
            });
        }

        let labels = match method {
            CommunityMethod::CorrelationHierarchical => self.hierarchical(matrix, None, method)?,
            CommunityMethod::AuxCoordinateHierarchical => {
                let aux = aux.ok_or_else(|| DetectError::InvalidInput {
                    reason: format!("method '{method}' requires an auxiliary coordinate"),
                })?;
                self.hierarchical(matrix, Some(aux), method)?
            }
            CommunityMethod::GraphModularity => self.graph_modularity(matrix)?,
        };

        let partition = Partition::from_labels(labels);
        log::debug!(
            "{method}: {n_features} features in {} communities",
            partition.len()
        );
        Ok(partition)
    }

    /// Detects communities of a society with the configured method, or the
    /// default method for its data type.
    pub fn detect_society(&self, society: &Society) -> Result<Partition, DetectError> {
        let method = self
            .config
            .method
            .unwrap_or_else(|| CommunityMethod::default_for(society.data_type()));
        log::info!(
            "detecting communities of '{}' ({}) with {method}",
            society.name(),
            society.data_type()
        );
        self.detect(society.matrix(), society.aux_coordinate(), method)
    }

    fn hierarchical(
        &self,
        matrix: &FeatureMatrix,
        aux: Option<&[f64]>,
        method: CommunityMethod,
    ) -> Result<Vec<CommunityId>, DetectError> {
        let mut distances = correlation_distances(matrix)?;
        if let Some(aux) = aux {
            distances.weight_by_aux(aux)?;
        }
        let cut = self
            .config
            .distance_cut
            .or_else(|| method.default_distance_cut())
            .unwrap_or(2.0);
        let linkage = ward(&distances);
        Ok(linkage.cut(cut).into_iter().map(CommunityId).collect())
    }

    fn graph_modularity(&self, matrix: &FeatureMatrix) -> Result<Vec<CommunityId>, DetectError> {
        let points = (0..matrix.n_features())
            .map(|row| matrix.feature_values(row))
            .collect::<Vec<_>>();
        let graph = knn_graph(&points, self.config.n_neighbors);

        let seed = self.config.seed.unwrap_or_else(|| rand::rng().random());
        log::debug!(
            "leiden on {} nodes, {} edges, seed {seed}",
            graph.node_count(),
            graph.edge_count()
        );
        let leiden = Leiden {
            resolution: self.config.resolution,
            randomness: self.config.randomness,
        };
        let mut rng = Pcg32::seed_from_u64(seed);
        let labels = leiden.detect(&graph, &mut rng);
        log::trace!(
            "leiden modularity {:.4}",
            leiden::modularity(&graph, &labels, leiden.resolution)
        );
        labels
            .into_iter()
            .map(|label| {
                u32::try_from(label)
                    .map(CommunityId)
                    .map_err(|_| DetectError::InvalidInput {
                        reason: format!("community label {label} does not fit in 32 bits"),
                    })
            })
            .collect()
    }
}
