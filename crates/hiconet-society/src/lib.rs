//! Data model shared by community detection and association-network construction.
//!
//! A **society** is one coherent data type (transcriptomics, antibody titers,
//! cell-population frequencies, metabolomics, ...) measured on a set of
//! observations. This crate holds the pieces an upstream loader hands to the
//! analytical engine:
//!
//! - [`FeatureMatrix`]: dense feature-by-observation values with row and column labels
//! - [`ObservationIndex`]: subject and timepoint annotation for each observation
//! - [`DataType`]: free-text data-type label (drives the default clustering method)
//! - [`Society`]: the bundle of the above plus an optional per-feature auxiliary
//!   coordinate (e.g. LC-MS retention time)
//! - [`MatchPlan`]: position-paired observation lists for one pair of societies
//!
//! Parsing files, cleaning missing values and fuzzy-matching annotation columns
//! all happen before these types are built.
//!
//! # Example
//!
//! ```
//! use hiconet_society::{FeatureMatrix, MatchPlan, Observation, ObservationIndex, Society};
//!
//! let matrix = FeatureMatrix::from_rows(
//!     vec!["f1".into(), "f2".into()],
//!     vec!["s1".into(), "s2".into(), "s3".into()],
//!     &[vec![1.0, 2.0, 3.0], vec![3.0, 1.0, 2.0]],
//! )?;
//! let index = ObservationIndex::new(vec![
//!     Observation::new("s1", "subj-a", "d0"),
//!     Observation::new("s2", "subj-b", "d0"),
//!     Observation::new("s3", "subj-c", "d7"),
//! ])?;
//! let genes = Society::new("genes", "transcriptomics", matrix, index);
//!
//! let plan = MatchPlan::pair_by_subject(&genes, "d0", &genes, "d0");
//! assert_eq!(plan.len(), Some(2));
//! # Ok::<(), hiconet_society::SocietyError>(())
//! ```

pub use self::{
    matrix::FeatureMatrix,
    matching::MatchPlan,
    observation::{Observation, ObservationIndex},
    society::{DataType, Society},
};

pub mod matching;
pub mod matrix;
pub mod observation;
pub mod society;

/// Errors raised while assembling society inputs.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum SocietyError {
    #[display(
        "matrix has {rows}x{cols} values but {feature_ids} feature ids and {observation_ids} observation ids"
    )]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        feature_ids: usize,
        observation_ids: usize,
    },
    #[display("row {row} has {got} values, expected {expected}")]
    RaggedRow {
        row: usize,
        got: usize,
        expected: usize,
    },
    #[display("non-numeric value for feature '{feature}' in observation '{observation}'")]
    NonNumeric {
        feature: String,
        observation: String,
    },
    #[display("duplicate observation id '{id}'")]
    DuplicateObservation { id: String },
    #[display("auxiliary coordinate has {got} values for {expected} features")]
    AuxLength { got: usize, expected: usize },
    #[display("non-numeric auxiliary coordinate for feature '{feature}'")]
    AuxNonNumeric { feature: String },
}
