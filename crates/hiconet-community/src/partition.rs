use std::collections::BTreeMap;

/// Identifier of one community within a single detection run.
///
/// Identifiers carry no meaning across runs or across societies.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Display,
    derive_more::From,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct CommunityId(pub u32);

/// A partition of the feature rows of one matrix into communities.
///
/// `labels[row]` is the community of each feature row, and `communities` maps
/// every community to its member rows in ascending order. Every row belongs to
/// exactly one community.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Partition {
    labels: Vec<CommunityId>,
    communities: BTreeMap<CommunityId, Vec<usize>>,
}

impl Partition {
    /// Builds a partition from one label per feature row.
    ///
    /// ```
    /// use hiconet_community::{CommunityId, Partition};
    ///
    /// let partition = Partition::from_labels([1, 2, 1, 1].map(CommunityId).to_vec());
    /// assert_eq!(partition.len(), 2);
    /// assert_eq!(partition.members(CommunityId(1)), Some(&[0, 2, 3][..]));
    /// ```
    #[must_use]
    pub fn from_labels(labels: Vec<CommunityId>) -> Self {
        let mut communities = BTreeMap::<_, Vec<_>>::new();
        for (row, label) in labels.iter().enumerate() {
            communities.entry(*label).or_default().push(row);
        }
        Self {
            labels,
            communities,
        }
    }

    /// Community of each feature row, in row order.
    #[must_use]
    pub fn labels(&self) -> &[CommunityId] {
        &self.labels
    }

    #[must_use]
    pub fn communities(&self) -> &BTreeMap<CommunityId, Vec<usize>> {
        &self.communities
    }

    #[must_use]
    pub fn members(&self, id: CommunityId) -> Option<&[usize]> {
        self.communities.get(&id).map(Vec::as_slice)
    }

    /// Number of communities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.communities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.labels.len()
    }

    /// Communities with at least `min_size` members, in identifier order.
    pub fn with_min_size(&self, min_size: usize) -> impl Iterator<Item = (CommunityId, &[usize])> {
        self.communities
            .iter()
            .filter(move |(_, members)| members.len() >= min_size)
            .map(|(id, members)| (*id, members.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_covers_all_rows() {
        let labels = [3, 1, 3, 2, 1, 3].map(CommunityId).to_vec();
        let partition = Partition::from_labels(labels);
        let mut seen = partition
            .communities()
            .values()
            .flatten()
            .copied()
            .collect::<Vec<_>>();
        seen.sort_unstable();
        assert_eq!(seen, (0..6).collect::<Vec<_>>());
        assert_eq!(partition.n_features(), 6);
    }

    #[test]
    fn test_with_min_size() {
        let labels = [0, 0, 0, 1, 1, 2].map(CommunityId).to_vec();
        let partition = Partition::from_labels(labels);
        let big = partition.with_min_size(2).map(|(id, _)| id).collect::<Vec<_>>();
        assert_eq!(big, vec![CommunityId(0), CommunityId(1)]);
    }

    #[test]
    fn test_serializes_member_lists() {
        let partition = Partition::from_labels([0, 1, 0].map(CommunityId).to_vec());
        let json = serde_json::to_value(&partition).unwrap();
        assert_eq!(json["labels"], serde_json::json!([0, 1, 0]));
        assert_eq!(json["communities"]["0"], serde_json::json!([0, 2]));
    }
}
