//! Internal weighted network and clustering state shared by all algorithms.

use crate::config::ModularityFunction;
use crate::error::{Error, Result};
use crate::graph::Graph;
use std::collections::HashMap;

/// Weighted network in the node-weight formulation of modularity.
///
/// Every algorithm optimizes
///
/// ```text
/// Q = (Σ_c [w_in(c) + self(c)] − γ' Σ_c W_c²) / (2m + self_total)
/// ```
///
/// where `w_in` counts each internal edge in both directions, `W_c` is the
/// summed node weight of cluster `c` and `γ'` the effective resolution.
/// Aggregated networks carry the edge weight that collapsed into their nodes
/// as `total_self_loops`.
#[derive(Debug, Clone)]
pub(crate) struct Network {
    pub(crate) n: usize,
    pub(crate) node_weight: Vec<f64>,
    pub(crate) first_neighbor: Vec<usize>,
    pub(crate) neighbor: Vec<usize>,
    pub(crate) edge_weight: Vec<f64>,
    pub(crate) total_self_loops: f64,
}

impl Network {
    /// Build the network for `graph` and the effective resolution.
    ///
    /// Standard modularity uses weighted degree (times node size) as node
    /// weight and rescales the resolution by `1 / 2m`. The alternative
    /// function uses node size alone with the raw resolution.
    pub(crate) fn from_graph(
        graph: &Graph,
        function: ModularityFunction,
        resolution: f64,
        node_sizes: Option<&[f64]>,
    ) -> Result<(Self, f64)> {
        let n = graph.node_count();
        if let Some(sizes) = node_sizes {
            if sizes.len() != n {
                return Err(Error::config(
                    "node_sizes",
                    format!("expected {n} entries, found {}", sizes.len()),
                ));
            }
        }
        let size = |i: usize| node_sizes.map_or(1.0, |s| s[i]);

        let node_weight: Vec<f64> = match function {
            ModularityFunction::Standard => (0..n).map(|i| graph.strength(i) * size(i)).collect(),
            ModularityFunction::Alternative => (0..n).map(size).collect(),
        };

        let network = Self {
            n,
            node_weight,
            first_neighbor: graph.raw_offsets().to_vec(),
            neighbor: graph.raw_neighbors().to_vec(),
            edge_weight: graph.raw_weights().to_vec(),
            total_self_loops: 0.0,
        };

        let effective = match function {
            ModularityFunction::Standard => {
                let norm = 2.0 * network.total_edge_weight() + network.total_self_loops;
                if norm > 0.0 {
                    resolution / norm
                } else {
                    resolution
                }
            }
            ModularityFunction::Alternative => resolution,
        };

        Ok((network, effective))
    }

    /// Neighbors of `node` with edge weights.
    #[inline]
    pub(crate) fn edges(&self, node: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.first_neighbor[node]..self.first_neighbor[node + 1];
        self.neighbor[range.clone()]
            .iter()
            .copied()
            .zip(self.edge_weight[range].iter().copied())
    }

    /// Sum of edge weights, each undirected edge counted once.
    pub(crate) fn total_edge_weight(&self) -> f64 {
        self.edge_weight.iter().sum::<f64>() / 2.0
    }

    /// Collapse each cluster into one node.
    ///
    /// Node weights add up; edges between clusters add up; edges inside a
    /// cluster become self-loop weight.
    pub(crate) fn reduce(&self, clustering: &Clustering) -> Network {
        let m = clustering.n_clusters;
        let mut node_weight = vec![0.0; m];
        let mut total_self_loops = self.total_self_loops;
        for i in 0..self.n {
            node_weight[clustering.cluster[i]] += self.node_weight[i];
        }

        let members = clustering.nodes_per_cluster();
        let mut first_neighbor = Vec::with_capacity(m + 1);
        first_neighbor.push(0);
        let mut neighbor = Vec::new();
        let mut edge_weight = Vec::new();

        // Dense accumulator indexed by target cluster, reset via `touched`.
        let mut acc = vec![0.0; m];
        let mut touched: Vec<usize> = Vec::new();

        for (c, nodes) in members.iter().enumerate() {
            for &i in nodes {
                for (j, w) in self.edges(i) {
                    let d = clustering.cluster[j];
                    if d == c {
                        total_self_loops += w;
                    } else {
                        if acc[d] == 0.0 {
                            touched.push(d);
                        }
                        acc[d] += w;
                    }
                }
            }
            touched.sort_unstable();
            for &d in &touched {
                neighbor.push(d);
                edge_weight.push(acc[d]);
                acc[d] = 0.0;
            }
            touched.clear();
            first_neighbor.push(neighbor.len());
        }

        Network {
            n: m,
            node_weight,
            first_neighbor,
            neighbor,
            edge_weight,
            total_self_loops,
        }
    }

    /// Induced subnetwork on `nodes` (ascending ids), keeping node weights.
    pub(crate) fn subnetwork(&self, nodes: &[usize], local: &mut [usize]) -> Network {
        for (pos, &i) in nodes.iter().enumerate() {
            local[i] = pos;
        }
        let inside = |j: usize| nodes.binary_search(&j).is_ok();

        let mut first_neighbor = Vec::with_capacity(nodes.len() + 1);
        first_neighbor.push(0);
        let mut neighbor = Vec::new();
        let mut edge_weight = Vec::new();
        for &i in nodes {
            for (j, w) in self.edges(i) {
                if inside(j) {
                    neighbor.push(local[j]);
                    edge_weight.push(w);
                }
            }
            first_neighbor.push(neighbor.len());
        }

        Network {
            n: nodes.len(),
            node_weight: nodes.iter().map(|&i| self.node_weight[i]).collect(),
            first_neighbor,
            neighbor,
            edge_weight,
            total_self_loops: 0.0,
        }
    }
}

/// Cluster assignment over the nodes of a [`Network`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Clustering {
    pub(crate) cluster: Vec<usize>,
    /// Upper bound on cluster ids in use (`cluster[i] < n_clusters`).
    pub(crate) n_clusters: usize,
}

impl Clustering {
    /// Every node in its own cluster.
    pub(crate) fn singletons(n: usize) -> Self {
        Self {
            cluster: (0..n).collect(),
            n_clusters: n,
        }
    }

    /// From arbitrary labels; ids are compacted in first-seen order.
    ///
    /// Memory is bounded by the number of distinct labels, not their values.
    pub(crate) fn from_labels(labels: &[usize]) -> Self {
        let mut ids: HashMap<usize, usize> = HashMap::new();
        let cluster = labels
            .iter()
            .map(|&label| {
                let next = ids.len();
                *ids.entry(label).or_insert(next)
            })
            .collect();
        Self {
            cluster,
            n_clusters: ids.len(),
        }
    }

    /// Number of nodes per cluster id.
    pub(crate) fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.n_clusters];
        for &c in &self.cluster {
            sizes[c] += 1;
        }
        sizes
    }

    /// Node ids per cluster, ascending.
    pub(crate) fn nodes_per_cluster(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.n_clusters];
        for (i, &c) in self.cluster.iter().enumerate() {
            members[c].push(i);
        }
        members
    }

    /// Drop empty cluster ids, renumbering in first-seen node order.
    pub(crate) fn compact(&mut self) {
        let mut map = vec![usize::MAX; self.n_clusters];
        let mut next = 0;
        for c in self.cluster.iter_mut() {
            if map[*c] == usize::MAX {
                map[*c] = next;
                next += 1;
            }
            *c = map[*c];
        }
        self.n_clusters = next;
    }

    /// Relabel through a clustering of this clustering's clusters.
    ///
    /// `coarse.cluster[c]` is the new cluster of every node now in `c`.
    pub(crate) fn merge(&mut self, coarse: &Clustering) {
        for c in self.cluster.iter_mut() {
            *c = coarse.cluster[*c];
        }
        self.n_clusters = coarse.n_clusters;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path4() -> Graph {
        Graph::from_edges(4, vec![(0, 1, 1.0), (1, 2, 2.0), (2, 3, 1.0)]).unwrap()
    }

    #[test]
    fn test_standard_node_weights_are_strengths() {
        let (net, res) =
            Network::from_graph(&path4(), ModularityFunction::Standard, 1.0, None).unwrap();
        assert_eq!(net.node_weight, vec![1.0, 3.0, 3.0, 1.0]);
        assert!((res - 1.0 / 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_alternative_node_weights_are_sizes() {
        let sizes = [1.0, 2.0, 1.0, 1.0];
        let (net, res) =
            Network::from_graph(&path4(), ModularityFunction::Alternative, 0.5, Some(&sizes))
                .unwrap();
        assert_eq!(net.node_weight, sizes.to_vec());
        assert_eq!(res, 0.5);
    }

    #[test]
    fn test_node_sizes_length_checked() {
        let err = Network::from_graph(&path4(), ModularityFunction::Standard, 1.0, Some(&[1.0]))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { name: "node_sizes", .. }));
    }

    #[test]
    fn test_reduce_moves_internal_weight_to_self_loops() {
        let (net, _) =
            Network::from_graph(&path4(), ModularityFunction::Standard, 1.0, None).unwrap();
        let clustering = Clustering::from_labels(&[0, 0, 1, 1]);
        let reduced = net.reduce(&clustering);

        assert_eq!(reduced.n, 2);
        assert_eq!(reduced.node_weight, vec![4.0, 4.0]);
        assert_eq!(reduced.edges(0).collect::<Vec<_>>(), vec![(1, 2.0)]);
        // Internal edges (0,1) and (2,3), each seen from both endpoints.
        assert_eq!(reduced.total_self_loops, 4.0);
        assert_eq!(
            2.0 * reduced.total_edge_weight() + reduced.total_self_loops,
            2.0 * net.total_edge_weight()
        );
    }

    #[test]
    fn test_subnetwork_keeps_internal_edges() {
        let (net, _) =
            Network::from_graph(&path4(), ModularityFunction::Standard, 1.0, None).unwrap();
        let mut local = vec![0; 4];
        let sub = net.subnetwork(&[1, 2, 3], &mut local);
        assert_eq!(sub.n, 3);
        assert_eq!(sub.node_weight, vec![3.0, 3.0, 1.0]);
        assert_eq!(sub.edges(0).collect::<Vec<_>>(), vec![(1, 2.0)]);
        assert_eq!(sub.edges(2).collect::<Vec<_>>(), vec![(1, 1.0)]);
    }

    #[test]
    fn test_from_labels_accepts_huge_ids() {
        let c = Clustering::from_labels(&[usize::MAX, 0, 1 << 40, usize::MAX]);
        assert_eq!(c.cluster, vec![0, 1, 2, 0]);
        assert_eq!(c.n_clusters, 3);
    }

    #[test]
    fn test_compact_and_merge() {
        let mut c = Clustering {
            cluster: vec![4, 2, 4, 0],
            n_clusters: 5,
        };
        c.compact();
        assert_eq!(c.cluster, vec![0, 1, 0, 2]);
        assert_eq!(c.n_clusters, 3);

        let coarse = Clustering {
            cluster: vec![1, 0, 1],
            n_clusters: 2,
        };
        c.merge(&coarse);
        assert_eq!(c.cluster, vec![1, 0, 1, 1]);
        assert_eq!(c.sizes(), vec![1, 3]);
    }
}
