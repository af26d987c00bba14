//! Leiden community detection on a weighted undirected graph.
//!
//! The quality function is modularity with a resolution parameter `γ`. Each
//! level runs three phases:
//!
//! 1. **Local moving**: nodes are visited from a queue and moved to the
//!    neighboring community with the largest quality gain. Neighbors of a moved
//!    node are queued again.
//! 2. **Refinement**: inside every community, nodes start as singletons and
//!    merge into well-connected sub-communities, picking among non-negative
//!    gains at random with probability proportional to `exp(gain / θ)`.
//! 3. **Aggregation**: every refined sub-community becomes one node, and the
//!    unrefined partition carries over as the starting point for the next level.
//!
//! The levels stop once local moving leaves every node in its own community.
//!
//! # Example
//!
//! ```
//! use hiconet_community::leiden::Leiden;
//! use petgraph::graph::UnGraph;
//! use rand::SeedableRng as _;
//!
//! // two triangles joined by one weak edge
//! let graph = UnGraph::<(), f64>::from_edges([
//!     (0, 1, 1.0), (1, 2, 1.0), (0, 2, 1.0),
//!     (3, 4, 1.0), (4, 5, 1.0), (3, 5, 1.0),
//!     (2, 3, 0.1),
//! ]);
//! let mut rng = rand_pcg::Pcg32::seed_from_u64(7);
//! let labels = Leiden::default().detect(&graph, &mut rng);
//! assert_eq!(labels[0], labels[1]);
//! assert_eq!(labels[0], labels[2]);
//! assert_eq!(labels[3], labels[5]);
//! assert_ne!(labels[0], labels[3]);
//! ```

use std::collections::{BTreeMap, VecDeque};

use petgraph::{graph::UnGraph, visit::EdgeRef as _};
use rand::{
    Rng,
    distr::{Distribution as _, weighted::WeightedIndex},
    seq::SliceRandom as _,
};

const MAX_LEVELS: usize = 64;

/// Parameters of the Leiden algorithm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leiden {
    /// Resolution `γ`; larger values yield more, smaller communities.
    pub resolution: f64,
    /// Randomness `θ` of the refinement phase. Zero makes refinement greedy.
    pub randomness: f64,
}

impl Default for Leiden {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            randomness: 0.01,
        }
    }
}

impl Leiden {
    /// Partitions the nodes of `graph`.
    ///
    /// Returns one community label per node. Labels run from 0 and are ordered
    /// by community size, largest first (ties broken by smallest member).
    pub fn detect<R>(&self, graph: &UnGraph<(), f64>, rng: &mut R) -> Vec<usize>
    where
        R: Rng + ?Sized,
    {
        let n = graph.node_count();
        let mut network = Network::from_graph(graph);
        if network.total <= 0.0 {
            return (0..n).collect();
        }

        // input node -> node of the current aggregate network
        let mut membership = (0..n).collect::<Vec<_>>();
        let mut community = (0..n).collect::<Vec<_>>();
        for level in 0..MAX_LEVELS {
            self.move_nodes(&network, &mut community, rng);
            let n_communities = renumber(&mut community);
            log::trace!(
                "leiden level {level}: {} nodes, {n_communities} communities",
                network.len()
            );
            if n_communities == network.len() {
                break;
            }

            let mut refined = self.refine(&network, &community, n_communities, rng);
            let mut n_refined = renumber(&mut refined);
            if n_refined == network.len() {
                // nothing merged during refinement
                refined.clone_from(&community);
                n_refined = n_communities;
            }

            let mut next_community = vec![0; n_refined];
            for (node, &sub) in refined.iter().enumerate() {
                next_community[sub] = community[node];
            }
            for m in &mut membership {
                *m = refined[*m];
            }
            network = network.aggregate(&refined, n_refined);
            community = next_community;
        }

        let labels = membership.iter().map(|&m| community[m]).collect();
        order_by_size(labels)
    }

    fn move_nodes<R>(&self, network: &Network, community: &mut [usize], rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let n = network.len();
        let mut community_degree = vec![0.0; n];
        let mut community_size = vec![0_usize; n];
        for (node, &c) in community.iter().enumerate() {
            community_degree[c] += network.degree[node];
            community_size[c] += 1;
        }
        let mut empty = (0..n)
            .filter(|&c| community_size[c] == 0)
            .collect::<Vec<_>>();

        let mut order = (0..n).collect::<Vec<_>>();
        order.shuffle(rng);
        let mut queue = VecDeque::from(order);
        let mut queued = vec![true; n];
        let mut links = Links::new(n);

        while let Some(v) = queue.pop_front() {
            queued[v] = false;
            let current = community[v];
            let kv = network.degree[v];
            for &(u, w) in &network.adjacency[v] {
                links.add(community[u], w);
            }

            community_degree[current] -= kv;
            community_size[current] -= 1;
            if community_size[current] == 0 {
                empty.push(current);
            }

            let scale = self.resolution * kv / network.total;
            let mut best = current;
            let mut best_gain = links.get(current) - scale * community_degree[current];
            for &c in links.touched() {
                let gain = links.get(c) - scale * community_degree[c];
                if gain > best_gain {
                    best = c;
                    best_gain = gain;
                }
            }
            if best_gain < 0.0 {
                if let Some(&c) = empty.last() {
                    best = c;
                }
            }
            if community_size[best] == 0 {
                // `best` is always the most recently emptied community here
                empty.pop();
            }

            community_degree[best] += kv;
            community_size[best] += 1;
            community[v] = best;
            links.clear();

            if best != current {
                for &(u, _) in &network.adjacency[v] {
                    if !queued[u] && community[u] != best {
                        queued[u] = true;
                        queue.push_back(u);
                    }
                }
            }
        }
    }

    fn refine<R>(
        &self,
        network: &Network,
        community: &[usize],
        n_communities: usize,
        rng: &mut R,
    ) -> Vec<usize>
    where
        R: Rng + ?Sized,
    {
        let n = network.len();
        let mut cluster_degree = vec![0.0; n_communities];
        for (node, &c) in community.iter().enumerate() {
            cluster_degree[c] += network.degree[node];
        }
        // weight from each node to the rest of its community
        let node_external = (0..n)
            .map(|v| {
                network.adjacency[v]
                    .iter()
                    .filter(|(u, _)| community[*u] == community[v])
                    .map(|(_, w)| w)
                    .sum::<f64>()
            })
            .collect::<Vec<_>>();

        let mut refined = (0..n).collect::<Vec<_>>();
        let mut refined_degree = network.degree.clone();
        let mut refined_size = vec![1_usize; n];
        let mut external = node_external.clone();

        let mut order = (0..n).collect::<Vec<_>>();
        order.shuffle(rng);
        let mut links = Links::new(n);
        let scale = self.resolution / network.total;

        for v in order {
            let own = refined[v];
            if refined_size[own] > 1 {
                continue;
            }
            let s = community[v];
            let kv = network.degree[v];
            let ks = cluster_degree[s];
            if node_external[v] < scale * kv * (ks - kv) {
                continue;
            }

            for &(u, w) in &network.adjacency[v] {
                if community[u] == s {
                    links.add(refined[u], w);
                }
            }
            refined_degree[own] -= kv;
            refined_size[own] -= 1;

            let mut candidates = vec![(own, 0.0)];
            for &r in links.touched() {
                let kr = refined_degree[r];
                if r == own || external[r] < scale * kr * (ks - kr) {
                    continue;
                }
                let gain = links.get(r) - scale * kv * kr;
                if gain >= 0.0 {
                    candidates.push((r, gain));
                }
            }
            let chosen = self.choose(&candidates, rng);

            refined_degree[chosen] += kv;
            refined_size[chosen] += 1;
            refined[v] = chosen;
            if chosen != own {
                external[chosen] += node_external[v] - 2.0 * links.get(chosen);
            }
            links.clear();
        }
        refined
    }

    fn choose<R>(&self, candidates: &[(usize, f64)], rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        let (best, max_gain) = candidates
            .iter()
            .copied()
            .fold((candidates[0].0, f64::NEG_INFINITY), |acc, (c, g)| {
                if g > acc.1 { (c, g) } else { acc }
            });
        if self.randomness <= 0.0 || candidates.len() == 1 {
            return best;
        }
        let weights = candidates
            .iter()
            .map(|&(_, g)| ((g - max_gain) / self.randomness).exp());
        match WeightedIndex::new(weights) {
            Ok(dist) => candidates[dist.sample(rng)].0,
            Err(_) => best,
        }
    }
}

/// Modularity of a labeling of `graph` at the given resolution.
#[must_use]
pub fn modularity(graph: &UnGraph<(), f64>, labels: &[usize], resolution: f64) -> f64 {
    let network = Network::from_graph(graph);
    if network.total <= 0.0 {
        return 0.0;
    }
    let n_labels = labels.iter().max().map_or(0, |m| m + 1);
    let mut internal = vec![0.0; n_labels];
    let mut degree = vec![0.0; n_labels];
    for v in 0..network.len() {
        let c = labels[v];
        degree[c] += network.degree[v];
        internal[c] += 2.0 * network.self_loops[v];
        for &(u, w) in &network.adjacency[v] {
            if labels[u] == c {
                internal[c] += w;
            }
        }
    }
    internal
        .iter()
        .zip(&degree)
        .map(|(&inside, &k)| {
            inside / network.total - resolution * (k / network.total) * (k / network.total)
        })
        .sum()
}

/// Weighted adjacency with self-loops kept apart.
#[derive(Debug, Clone)]
struct Network {
    adjacency: Vec<Vec<(usize, f64)>>,
    self_loops: Vec<f64>,
    degree: Vec<f64>,
    /// Sum of all degrees, i.e. twice the total edge weight.
    total: f64,
}

impl Network {
    fn from_graph(graph: &UnGraph<(), f64>) -> Self {
        let n = graph.node_count();
        let mut adjacency = vec![Vec::new(); n];
        let mut self_loops = vec![0.0; n];
        for edge in graph.edge_references() {
            let (a, b) = (edge.source().index(), edge.target().index());
            let w = *edge.weight();
            if a == b {
                self_loops[a] += w;
            } else {
                adjacency[a].push((b, w));
                adjacency[b].push((a, w));
            }
        }
        Self::new(adjacency, self_loops)
    }

    fn new(adjacency: Vec<Vec<(usize, f64)>>, self_loops: Vec<f64>) -> Self {
        let degree = adjacency
            .iter()
            .zip(&self_loops)
            .map(|(adj, s)| adj.iter().map(|(_, w)| w).sum::<f64>() + 2.0 * s)
            .collect::<Vec<f64>>();
        let total = degree.iter().sum();
        Self {
            adjacency,
            self_loops,
            degree,
            total,
        }
    }

    fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// Collapses every group of `membership` into a single node.
    fn aggregate(&self, membership: &[usize], n_groups: usize) -> Self {
        let mut self_loops = vec![0.0; n_groups];
        let mut weights = vec![BTreeMap::<usize, f64>::new(); n_groups];
        for (v, adj) in self.adjacency.iter().enumerate() {
            let cv = membership[v];
            self_loops[cv] += self.self_loops[v];
            for &(u, w) in adj {
                let cu = membership[u];
                if cu != cv {
                    *weights[cv].entry(cu).or_default() += w;
                } else if v < u {
                    self_loops[cv] += w;
                }
            }
        }
        let adjacency = weights
            .into_iter()
            .map(|row| row.into_iter().collect())
            .collect();
        Self::new(adjacency, self_loops)
    }
}

/// Scratch accumulator of edge weight from one node to each community.
struct Links {
    weight: Vec<f64>,
    seen: Vec<bool>,
    touched: Vec<usize>,
}

impl Links {
    fn new(n: usize) -> Self {
        Self {
            weight: vec![0.0; n],
            seen: vec![false; n],
            touched: Vec::new(),
        }
    }

    fn add(&mut self, community: usize, w: f64) {
        if !self.seen[community] {
            self.seen[community] = true;
            self.touched.push(community);
        }
        self.weight[community] += w;
    }

    fn get(&self, community: usize) -> f64 {
        self.weight[community]
    }

    fn touched(&self) -> &[usize] {
        &self.touched
    }

    fn clear(&mut self) {
        for c in self.touched.drain(..) {
            self.weight[c] = 0.0;
            self.seen[c] = false;
        }
    }
}

/// Relabels to `0..k` in order of first appearance; returns `k`.
fn renumber(labels: &mut [usize]) -> usize {
    let mut mapping = BTreeMap::new();
    for label in labels.iter_mut() {
        let next = mapping.len();
        *label = *mapping.entry(*label).or_insert(next);
    }
    mapping.len()
}

fn order_by_size(mut labels: Vec<usize>) -> Vec<usize> {
    let k = renumber(&mut labels);
    let mut size = vec![0_usize; k];
    let mut first = vec![usize::MAX; k];
    for (node, &label) in labels.iter().enumerate() {
        size[label] += 1;
        first[label] = first[label].min(node);
    }
    let mut order = (0..k).collect::<Vec<_>>();
    order.sort_by_key(|&c| (std::cmp::Reverse(size[c]), first[c]));
    let mut rank = vec![0; k];
    for (r, &c) in order.iter().enumerate() {
        rank[c] = r;
    }
    labels.iter().map(|&l| rank[l]).collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn two_cliques(size: u32) -> UnGraph<(), f64> {
        let mut edges = Vec::new();
        for offset in [0, size] {
            for i in 0..size {
                for j in (i + 1)..size {
                    edges.push((offset + i, offset + j, 1.0));
                }
            }
        }
        edges.push((size - 1, size, 0.05));
        UnGraph::from_edges(edges)
    }

    #[test]
    fn test_two_cliques() {
        let graph = two_cliques(5);
        let mut rng = Pcg32::seed_from_u64(1);
        let labels = Leiden::default().detect(&graph, &mut rng);
        assert!(labels[..5].iter().all(|&l| l == labels[0]));
        assert!(labels[5..].iter().all(|&l| l == labels[5]));
        assert_ne!(labels[0], labels[5]);
        assert!(modularity(&graph, &labels, 1.0) > 0.4);
    }

    #[test]
    fn test_same_seed_same_labels() {
        let graph = two_cliques(6);
        let run = |seed| {
            let mut rng = Pcg32::seed_from_u64(seed);
            Leiden::default().detect(&graph, &mut rng)
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_labels_ordered_by_size() {
        // a 6-clique followed by a separate triangle
        let mut edges = Vec::new();
        for i in 0..3 {
            for j in (i + 1)..3 {
                edges.push((i, j, 1.0));
            }
        }
        for i in 3..9 {
            for j in (i + 1)..9 {
                edges.push((i, j, 1.0));
            }
        }
        let graph = UnGraph::<(), f64>::from_edges(edges);
        let mut rng = Pcg32::seed_from_u64(3);
        let labels = Leiden::default().detect(&graph, &mut rng);
        assert_eq!(labels, vec![1, 1, 1, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_edgeless_graph() {
        let mut graph = UnGraph::<(), f64>::default();
        for _ in 0..3 {
            graph.add_node(());
        }
        let mut rng = Pcg32::seed_from_u64(0);
        assert_eq!(Leiden::default().detect(&graph, &mut rng), vec![0, 1, 2]);
    }

    #[test]
    fn test_aggregate_preserves_degree() {
        let network = Network::from_graph(&two_cliques(3));
        let merged = network.aggregate(&[0, 0, 0, 1, 1, 1], 2);
        assert!((merged.total - network.total).abs() < 1e-12);
        assert!((merged.self_loops[0] - 3.0).abs() < 1e-12);
        assert_eq!(merged.adjacency[0], vec![(1, 0.05)]);
    }

    #[test]
    fn test_renumber() {
        let mut labels = vec![7, 3, 7, 9];
        assert_eq!(renumber(&mut labels), 3);
        assert_eq!(labels, vec![0, 1, 0, 2]);
    }
}
