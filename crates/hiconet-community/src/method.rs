use std::str::FromStr;

use hiconet_society::DataType;

use crate::DetectError;

/// Community detection strategy.
///
/// Parsed from and displayed as the short selectors `hcl`, `lcms_hcl` and
/// `leiden`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    derive_more::Display,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum CommunityMethod {
    /// Ward linkage on correlation distance, cut at a fixed height.
    #[display("hcl")]
    #[serde(rename = "hcl")]
    CorrelationHierarchical,
    /// As [`CorrelationHierarchical`](Self::CorrelationHierarchical), with the
    /// correlation damped by distance along an auxiliary coordinate.
    #[display("lcms_hcl")]
    #[serde(rename = "lcms_hcl")]
    AuxCoordinateHierarchical,
    /// Leiden modularity optimization on a k-nearest-neighbor graph.
    #[display("leiden")]
    #[serde(rename = "leiden")]
    GraphModularity,
}

impl CommunityMethod {
    pub const ALL: [Self; 3] = [
        Self::CorrelationHierarchical,
        Self::AuxCoordinateHierarchical,
        Self::GraphModularity,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CorrelationHierarchical => "hcl",
            Self::AuxCoordinateHierarchical => "lcms_hcl",
            Self::GraphModularity => "leiden",
        }
    }

    /// Metabolomics gets the retention-time aware method, everything else Leiden.
    #[must_use]
    pub fn default_for(data_type: &DataType) -> Self {
        if data_type.is_metabolomics() {
            Self::AuxCoordinateHierarchical
        } else {
            Self::GraphModularity
        }
    }

    /// Default flat-cut height for the hierarchical methods.
    #[must_use]
    pub fn default_distance_cut(self) -> Option<f64> {
        match self {
            Self::CorrelationHierarchical => Some(2.0),
            Self::AuxCoordinateHierarchical => Some(3.0),
            Self::GraphModularity => None,
        }
    }
}

impl FromStr for CommunityMethod {
    type Err = DetectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| DetectError::InvalidConfiguration {
                reason: format!(
                    "unknown community detection method '{s}' (expected one of: {})",
                    Self::ALL.map(Self::as_str).join(", ")
                ),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selectors() {
        for method in CommunityMethod::ALL {
            assert_eq!(method.as_str().parse::<CommunityMethod>().unwrap(), method);
        }
        let err = "kmeans".parse::<CommunityMethod>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("kmeans"), "{message}");
        assert!(message.contains("hcl, lcms_hcl, leiden"), "{message}");
    }

    #[test]
    fn test_default_for_data_type() {
        assert_eq!(
            CommunityMethod::default_for(&DataType::from("metabolomics")),
            CommunityMethod::AuxCoordinateHierarchical
        );
        assert_eq!(
            CommunityMethod::default_for(&DataType::from("HAI")),
            CommunityMethod::GraphModularity
        );
    }

    #[test]
    fn test_serde_selectors() {
        let method: CommunityMethod = serde_json::from_str("\"lcms_hcl\"").unwrap();
        assert_eq!(method, CommunityMethod::AuxCoordinateHierarchical);
        assert_eq!(
            serde_json::to_string(&CommunityMethod::GraphModularity).unwrap(),
            "\"leiden\""
        );
    }
}
