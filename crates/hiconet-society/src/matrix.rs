use std::collections::HashMap;

use nalgebra::DMatrix;

use crate::SocietyError;

/// Dense feature-by-observation value table.
///
/// Rows are features and columns are observations. Every value is finite:
/// missing values are imputed upstream, and `NaN`/`±inf` are rejected at
/// construction.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    feature_ids: Vec<String>,
    observation_ids: Vec<String>,
    values: DMatrix<f64>,
    column_lookup: HashMap<String, usize>,
}

impl FeatureMatrix {
    /// Creates a matrix from labels and a `features x observations` value matrix.
    pub fn new(
        feature_ids: Vec<String>,
        observation_ids: Vec<String>,
        values: DMatrix<f64>,
    ) -> Result<Self, SocietyError> {
        let (rows, cols) = values.shape();
        if rows != feature_ids.len() || cols != observation_ids.len() {
            return Err(SocietyError::ShapeMismatch {
                rows,
                cols,
                feature_ids: feature_ids.len(),
                observation_ids: observation_ids.len(),
            });
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            // column-major storage
            let (row, col) = (pos % rows, pos / rows);
            return Err(SocietyError::NonNumeric {
                feature: feature_ids[row].clone(),
                observation: observation_ids[col].clone(),
            });
        }

        let mut column_lookup = HashMap::with_capacity(cols);
        for (col, id) in observation_ids.iter().enumerate() {
            if column_lookup.insert(id.clone(), col).is_some() {
                return Err(SocietyError::DuplicateObservation { id: id.clone() });
            }
        }

        Ok(Self {
            feature_ids,
            observation_ids,
            values,
            column_lookup,
        })
    }

    /// Creates a matrix from one value vector per feature row.
    pub fn from_rows(
        feature_ids: Vec<String>,
        observation_ids: Vec<String>,
        rows: &[Vec<f64>],
    ) -> Result<Self, SocietyError> {
        let expected = observation_ids.len();
        if let Some((row, values)) = rows
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != expected)
        {
            return Err(SocietyError::RaggedRow {
                row,
                got: values.len(),
                expected,
            });
        }
        let values = DMatrix::from_fn(rows.len(), expected, |i, j| rows[i][j]);
        Self::new(feature_ids, observation_ids, values)
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.values.nrows()
    }

    #[must_use]
    pub fn n_observations(&self) -> usize {
        self.values.ncols()
    }

    #[must_use]
    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    #[must_use]
    pub fn observation_ids(&self) -> &[String] {
        &self.observation_ids
    }

    /// The underlying `features x observations` values.
    #[must_use]
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Values of one feature across all observations.
    #[must_use]
    pub fn feature_values(&self, row: usize) -> Vec<f64> {
        self.values.row(row).iter().copied().collect()
    }

    /// Column index of an observation id.
    #[must_use]
    pub fn column_of(&self, observation_id: &str) -> Option<usize> {
        self.column_lookup.get(observation_id).copied()
    }

    /// Every value of the matrix, row by row.
    #[must_use]
    pub fn flattened_values(&self) -> Vec<f64> {
        self.values.transpose().as_slice().to_vec()
    }

    /// Slices `rows` (features) and `columns` (observations) and transposes the
    /// result, giving an `observations x features` block ready for regression.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    #[must_use]
    pub fn observation_block(&self, rows: &[usize], columns: &[usize]) -> DMatrix<f64> {
        DMatrix::from_fn(columns.len(), rows.len(), |i, j| {
            self.values[(rows[j], columns[i])]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}{i}")).collect()
    }

    #[test]
    fn test_rejects_non_numeric() {
        let err = FeatureMatrix::from_rows(
            ids("f", 2),
            ids("o", 3),
            &[vec![1.0, 2.0, 3.0], vec![1.0, f64::NAN, 3.0]],
        )
        .unwrap_err();
        match err {
            SocietyError::NonNumeric {
                feature,
                observation,
            } => {
                assert_eq!(feature, "f1");
                assert_eq!(observation, "o1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let err = FeatureMatrix::from_rows(
            ids("f", 2),
            ids("o", 3),
            &[vec![1.0, 2.0, 3.0], vec![1.0, 2.0]],
        )
        .unwrap_err();
        assert!(matches!(err, SocietyError::RaggedRow { row: 1, .. }));
    }

    #[test]
    fn test_rejects_duplicate_observations() {
        let err = FeatureMatrix::from_rows(
            ids("f", 1),
            vec!["a".into(), "b".into(), "a".into()],
            &[vec![1.0, 2.0, 3.0]],
        )
        .unwrap_err();
        assert!(matches!(err, SocietyError::DuplicateObservation { .. }));
    }

    #[test]
    fn test_flattened_values_are_row_major() {
        let matrix = FeatureMatrix::from_rows(
            ids("f", 2),
            ids("o", 3),
            &[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
        )
        .unwrap();
        assert_eq!(
            matrix.flattened_values(),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
    }

    #[test]
    fn test_observation_block_transposes() {
        let matrix = FeatureMatrix::from_rows(
            ids("f", 3),
            ids("o", 3),
            &[
                vec![1.0, 2.0, 3.0],
                vec![4.0, 5.0, 6.0],
                vec![7.0, 8.0, 9.0],
            ],
        )
        .unwrap();
        let block = matrix.observation_block(&[0, 2], &[2, 1]);
        assert_eq!(block.shape(), (2, 2));
        assert_eq!(block[(0, 0)], 3.0);
        assert_eq!(block[(0, 1)], 9.0);
        assert_eq!(block[(1, 0)], 2.0);
        assert_eq!(block[(1, 1)], 8.0);
        assert_eq!(matrix.column_of("o2"), Some(2));
        assert_eq!(matrix.column_of("missing"), None);
    }
}
