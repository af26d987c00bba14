//! Cross-society association networks between feature communities.
//!
//! For two societies measured on paired observations, every pair of
//! communities with at least [`MIN_COMMUNITY_SIZE`] members is scored by the
//! coefficient of determination of a PLS2 regression between their
//! observation-aligned blocks. Each score is then given an estimated p-value
//! from a permutation null model:
//!
//! 1. **Scoring** ([`scoring`], [`pls`]): narrow block predicts wide block,
//!    three latent components, R² on the fit data.
//! 2. **Null distribution** ([`permutation`]): synthetic blocks resampled from
//!    each matrix's value pool, for every pair of community sizes, pooled into
//!    one distribution.
//! 3. **Significance** ([`significance`]): cubic fit of `log10(rank / N)`
//!    against the top half of the null scores.
//! 4. **Assembly** ([`AssociationNetworkBuilder`]): edges sorted by score.
//!
//! [`NetworkCollection`] merges the networks of several society pairs and
//! selects the top edges across them.

pub use self::{
    config::{AssociationConfig, MIN_COMMUNITY_SIZE},
    merge::{NetworkCollection, RankedEdge},
    network::{AssociationEdge, AssociationNetwork, AssociationNetworkBuilder, SkippedPair},
};

mod config;
pub mod merge;
mod network;
pub mod permutation;
pub mod pls;
pub mod scoring;
pub mod significance;

/// Errors raised while building an association network.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum NetworkError {
    #[display("match plan pairs {left} observations with {right}")]
    MismatchedSampleCount { left: usize, right: usize },
    #[display("invalid input: {reason}")]
    InvalidInput { reason: String },
    #[display("insufficient data: {reason}")]
    InsufficientData { reason: String },
    #[display("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },
}
