use crate::{NetworkError, pls::DEFAULT_COMPONENTS};

/// Communities smaller than this never take part in an association network.
pub const MIN_COMMUNITY_SIZE: usize = 3;

/// Policy for one association-network build.
///
/// Deserializes from a partial document; missing fields take their defaults.
///
/// ```
/// use hiconet_network::AssociationConfig;
///
/// let config = AssociationConfig {
///     num_permutations: 100,
///     seed: Some(42),
///     ..AssociationConfig::default()
/// };
/// assert_eq!(config.min_matched_samples, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssociationConfig {
    /// Permutations per pair of community sizes in the null distribution.
    pub num_permutations: usize,
    /// Fewest matched observation pairs a build accepts.
    pub min_matched_samples: usize,
    /// Latent components of each PLS2 regression.
    pub n_components: usize,
    /// Seed of the permutation generators. `None` draws a fresh seed per build.
    pub seed: Option<u64>,
    /// Worker threads for the permutations. `None` uses the available parallelism.
    pub workers: Option<usize>,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            num_permutations: 20,
            min_matched_samples: 10,
            n_components: DEFAULT_COMPONENTS,
            seed: None,
            workers: None,
        }
    }
}

impl AssociationConfig {
    pub(crate) fn validate(&self) -> Result<(), NetworkError> {
        if self.n_components == 0 || self.n_components > MIN_COMMUNITY_SIZE {
            return Err(NetworkError::InvalidConfiguration {
                reason: format!(
                    "n_components must be between 1 and {MIN_COMMUNITY_SIZE}, got {}",
                    self.n_components
                ),
            });
        }
        if self.workers == Some(0) {
            return Err(NetworkError::InvalidConfiguration {
                reason: "workers must be at least 1".to_owned(),
            });
        }
        Ok(())
    }

    pub(crate) fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(1, std::num::NonZero::get)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document() {
        let config: AssociationConfig =
            serde_json::from_str(r#"{"num_permutations": 50, "workers": 2}"#).unwrap();
        assert_eq!(config.num_permutations, 50);
        assert_eq!(config.workers, Some(2));
        assert_eq!(config.min_matched_samples, 10);
        assert_eq!(config.n_components, 3);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        assert!(serde_json::from_str::<AssociationConfig>(r#"{"permutations": 5}"#).is_err());
    }

    #[test]
    fn test_validate() {
        let zero_workers = AssociationConfig {
            workers: Some(0),
            ..AssociationConfig::default()
        };
        assert!(zero_workers.validate().is_err());
        let too_many_components = AssociationConfig {
            n_components: 4,
            ..AssociationConfig::default()
        };
        assert!(too_many_components.validate().is_err());
        assert!(AssociationConfig::default().validate().is_ok());
    }
}
