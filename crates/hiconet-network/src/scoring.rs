//! Association score between two observation-aligned blocks.

use nalgebra::DMatrix;

use crate::pls::{FitError, Pls2};

/// Coefficient of determination of a PLS2 fit between two blocks whose rows
/// are the same matched observations.
///
/// The narrower block (fewer columns) is the predictor and the wider one the
/// response; on a tie `block1` predicts `block2`.
pub fn association_score(
    block1: &DMatrix<f64>,
    block2: &DMatrix<f64>,
    pls: Pls2,
) -> Result<f64, FitError> {
    let (x, y) = if block2.ncols() < block1.ncols() {
        (block2, block1)
    } else {
        (block1, block2)
    };
    pls.fit(x, y)?.score(x, y)
}
