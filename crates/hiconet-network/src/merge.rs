//! Merging the networks of several society pairs into one ranked list.

use hiconet_community::CommunityId;

use crate::AssociationNetwork;

pub const DEFAULT_ALPHA: f64 = 0.05;
pub const DEFAULT_MIN_TOP: usize = 10;

/// An edge tagged with the name of the network it came from.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RankedEdge {
    pub network: String,
    pub community1: CommunityId,
    pub community2: CommunityId,
    pub score: f64,
    pub p_value: f64,
}

/// Named association networks, one per society pair.
#[derive(Debug, Clone, Default)]
pub struct NetworkCollection {
    networks: Vec<(String, AssociationNetwork)>,
}

impl NetworkCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a network under `name`, replacing any network of the same name.
    pub fn insert(&mut self, name: impl Into<String>, network: AssociationNetwork) {
        let name = name.into();
        match self.networks.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = network,
            None => self.networks.push((name, network)),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AssociationNetwork> {
        self.networks
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, network)| network)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.networks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AssociationNetwork)> {
        self.networks.iter().map(|(name, network)| (name.as_str(), network))
    }

    /// Every edge of every network, highest score first.
    ///
    /// Equal scores keep insertion order.
    #[must_use]
    pub fn ranked_edges(&self) -> Vec<RankedEdge> {
        let mut edges = self
            .networks
            .iter()
            .flat_map(|(name, network)| {
                network.edges.iter().map(|edge| RankedEdge {
                    network: name.clone(),
                    community1: edge.community1,
                    community2: edge.community2,
                    score: edge.score,
                    p_value: edge.p_value,
                })
            })
            .collect::<Vec<_>>();
        edges.sort_by(|a, b| b.score.total_cmp(&a.score));
        edges
    }

    /// The significant positive edges (`p < alpha`, `score > 0`) in rank order.
    ///
    /// When fewer than `min_top` edges qualify, the first `min_top` ranked
    /// edges are returned instead, significant or not.
    ///
    /// ```
    /// use hiconet_community::CommunityId;
    /// use hiconet_network::{AssociationEdge, AssociationNetwork, NetworkCollection};
    ///
    /// let edge = |score, p_value| AssociationEdge {
    ///     community1: CommunityId(0),
    ///     community2: CommunityId(1),
    ///     score,
    ///     p_value,
    /// };
    /// let mut collection = NetworkCollection::new();
    /// collection.insert(
    ///     "genes_d0_antibody_d28",
    ///     AssociationNetwork { edges: vec![edge(0.9, 0.01), edge(0.4, 0.3)], skipped: vec![] },
    /// );
    /// assert_eq!(collection.top_edges(0.05, 1).len(), 1);
    /// assert_eq!(collection.top_edges(0.05, 10).len(), 2);
    /// ```
    #[must_use]
    pub fn top_edges(&self, alpha: f64, min_top: usize) -> Vec<RankedEdge> {
        let ranked = self.ranked_edges();
        let significant = ranked
            .iter()
            .filter(|edge| edge.p_value < alpha && edge.score > 0.0)
            .cloned()
            .collect::<Vec<_>>();
        if significant.len() < min_top {
            ranked.into_iter().take(min_top).collect()
        } else {
            significant
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AssociationEdge;

    fn network(edges: &[(u32, u32, f64, f64)]) -> AssociationNetwork {
        AssociationNetwork {
            edges: edges
                .iter()
                .map(|&(c1, c2, score, p_value)| AssociationEdge {
                    community1: CommunityId(c1),
                    community2: CommunityId(c2),
                    score,
                    p_value,
                })
                .collect(),
            skipped: Vec::new(),
        }
    }

    #[test]
    fn test_ranked_across_networks() {
        let mut collection = NetworkCollection::new();
        collection.insert("a", network(&[(0, 0, 0.5, 0.2), (1, 0, 0.2, 0.6)]));
        collection.insert("b", network(&[(2, 3, 0.7, 0.01)]));
        let ranked = collection.ranked_edges();
        let order = ranked
            .iter()
            .map(|e| (e.network.as_str(), e.score))
            .collect::<Vec<_>>();
        assert_eq!(order, vec![("b", 0.7), ("a", 0.5), ("a", 0.2)]);
    }

    #[test]
    fn test_top_edges_prefers_significant_set() {
        let mut collection = NetworkCollection::new();
        let edges = (0..12)
            .map(|i| (i, 0, 0.9 - f64::from(i) * 0.01, 0.001))
            .chain([(20, 0, 0.95, 0.5), (21, 0, -0.1, 0.001)])
            .collect::<Vec<_>>();
        collection.insert("pair", network(&edges));
        let top = collection.top_edges(DEFAULT_ALPHA, DEFAULT_MIN_TOP);
        assert_eq!(top.len(), 12);
        assert!(top.iter().all(|e| e.p_value < DEFAULT_ALPHA && e.score > 0.0));
    }

    #[test]
    fn test_top_edges_falls_back_to_ranking() {
        let mut collection = NetworkCollection::new();
        collection.insert("pair", network(&[(0, 0, 0.3, 0.5), (1, 1, 0.6, 0.01)]));
        let top = collection.top_edges(DEFAULT_ALPHA, DEFAULT_MIN_TOP);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].score, 0.6);
    }

    #[test]
    fn test_insert_replaces_by_name() {
        let mut collection = NetworkCollection::new();
        collection.insert("pair", network(&[(0, 0, 0.3, 0.5)]));
        collection.insert("pair", AssociationNetwork::default());
        assert_eq!(collection.len(), 1);
        assert!(collection.get("pair").is_some_and(AssociationNetwork::is_empty));
    }
}
