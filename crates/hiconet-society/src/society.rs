use crate::{FeatureMatrix, ObservationIndex, SocietyError};

/// Free-text data-type label (`"transcriptomics"`, `"HAI"`, `"metabolomics"`, ...).
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    derive_more::Display,
    derive_more::From,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct DataType(String);

impl DataType {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// LC-MS metabolomics carries a retention-time coordinate per feature.
    #[must_use]
    pub fn is_metabolomics(&self) -> bool {
        self.0.trim().eq_ignore_ascii_case("metabolomics")
    }
}

impl From<&str> for DataType {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

/// One data type measured on a set of observations.
#[derive(Debug, Clone)]
pub struct Society {
    name: String,
    data_type: DataType,
    matrix: FeatureMatrix,
    observations: ObservationIndex,
    aux_coordinate: Option<Vec<f64>>,
}

impl Society {
    pub fn new(
        name: impl Into<String>,
        data_type: impl Into<DataType>,
        matrix: FeatureMatrix,
        observations: ObservationIndex,
    ) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            matrix,
            observations,
            aux_coordinate: None,
        }
    }

    /// Attaches a per-feature auxiliary coordinate (e.g. retention time).
    pub fn with_aux_coordinate(mut self, aux: Vec<f64>) -> Result<Self, SocietyError> {
        let expected = self.matrix.n_features();
        if aux.len() != expected {
            return Err(SocietyError::AuxLength {
                got: aux.len(),
                expected,
            });
        }
        if let Some(row) = aux.iter().position(|v| !v.is_finite()) {
            return Err(SocietyError::AuxNonNumeric {
                feature: self.matrix.feature_ids()[row].clone(),
            });
        }
        self.aux_coordinate = Some(aux);
        Ok(self)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    #[must_use]
    pub fn matrix(&self) -> &FeatureMatrix {
        &self.matrix
    }

    #[must_use]
    pub fn observations(&self) -> &ObservationIndex {
        &self.observations
    }

    #[must_use]
    pub fn aux_coordinate(&self) -> Option<&[f64]> {
        self.aux_coordinate.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> FeatureMatrix {
        FeatureMatrix::from_rows(
            vec!["m1".into(), "m2".into()],
            vec!["o1".into(), "o2".into()],
            &[vec![1.0, 2.0], vec![2.0, 1.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_metabolomics_label() {
        assert!(DataType::from("Metabolomics").is_metabolomics());
        assert!(!DataType::from("transcriptomics").is_metabolomics());
    }

    #[test]
    fn test_aux_coordinate_validation() {
        let society = Society::new("metabolites", "metabolomics", matrix(), ObservationIndex::default());
        let err = society.clone().with_aux_coordinate(vec![1.0]).unwrap_err();
        assert!(matches!(err, SocietyError::AuxLength { got: 1, expected: 2 }));

        let err = society
            .clone()
            .with_aux_coordinate(vec![1.0, f64::INFINITY])
            .unwrap_err();
        assert!(matches!(err, SocietyError::AuxNonNumeric { .. }));

        let society = society.with_aux_coordinate(vec![120.5, 300.0]).unwrap();
        assert_eq!(society.aux_coordinate(), Some(&[120.5, 300.0][..]));
    }
}
