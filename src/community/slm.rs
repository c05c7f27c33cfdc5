//! Smart local moving (SLM) algorithm.
//!
//! SLM (Waltman & van Eck 2013) keeps Louvain's aggregate-and-recurse shape
//! but changes what gets aggregated:
//!
//! 1. **Local moving** on the current network.
//! 2. **Sub-community search**: inside each community, start from singletons
//!    and run local moving on the community's induced subnetwork only.
//! 3. **Aggregation**: the sub-communities (not the communities) become the
//!    nodes of the reduced network, each initially assigned to the community
//!    it came from.
//! 4. **Recurse** with that non-trivial starting assignment.
//!
//! Because sub-communities can later move independently of their siblings,
//! SLM can split a community that local moving glued together; Louvain
//! cannot. Each move at a coarse level is restricted to communities adjacent
//! to the moving sub-community, so large graphs converge in few iterations.
//!
//! ## References
//!
//! Waltman & van Eck (2013). "A smart local moving algorithm for large-scale
//! modularity-based community detection." European Physical Journal B 86, 471.

use super::local_moving::local_moving;
use super::network::{Clustering, Network};
use super::traits::{search_builders, LocalSearch, SearchParams};
use rand::rngs::StdRng;

/// Smart local moving community detection.
#[derive(Debug, Clone)]
pub struct SmartLocalMoving {
    params: SearchParams,
}

impl SmartLocalMoving {
    /// Create a new SLM detector with default settings.
    pub fn new() -> Self {
        Self {
            params: SearchParams::default(),
        }
    }
}

search_builders!(SmartLocalMoving);

impl LocalSearch for SmartLocalMoving {
    fn improve(
        &self,
        network: &Network,
        clustering: &mut Clustering,
        resolution: f64,
        rng: &mut StdRng,
    ) -> bool {
        slm_level(network, clustering, resolution, rng)
    }
}

fn slm_level(
    network: &Network,
    clustering: &mut Clustering,
    resolution: f64,
    rng: &mut StdRng,
) -> bool {
    if network.n <= 1 {
        return false;
    }

    let mut update = local_moving(network, clustering, resolution, rng);

    if clustering.n_clusters < network.n {
        let members = clustering.nodes_per_cluster();
        let mut local = vec![0usize; network.n];

        // Split every community into sub-communities; `parent[s]` is the
        // community sub-community `s` came from.
        let mut refined = Clustering {
            cluster: vec![0; network.n],
            n_clusters: 0,
        };
        let mut parent: Vec<usize> = Vec::with_capacity(network.n);
        for (c, nodes) in members.iter().enumerate() {
            let sub = network.subnetwork(nodes, &mut local);
            let mut sub_clustering = Clustering::singletons(sub.n);
            let _ = local_moving(&sub, &mut sub_clustering, resolution, rng);

            for (pos, &i) in nodes.iter().enumerate() {
                refined.cluster[i] = refined.n_clusters + sub_clustering.cluster[pos];
            }
            refined.n_clusters += sub_clustering.n_clusters;
            parent.extend(std::iter::repeat(c).take(sub_clustering.n_clusters));
        }

        if refined.n_clusters < network.n {
            let reduced = network.reduce(&refined);
            let mut coarse = Clustering {
                cluster: parent,
                n_clusters: members.len(),
            };

            if slm_level(&reduced, &mut coarse, resolution, rng) {
                update = true;
            }
            refined.merge(&coarse);
            refined.compact();
            *clustering = refined;
        } else {
            // No community split into anything coarser than singletons:
            // aggregate the communities themselves so the network shrinks.
            let reduced = network.reduce(clustering);
            let mut coarse = Clustering::singletons(reduced.n);
            if slm_level(&reduced, &mut coarse, resolution, rng) {
                update = true;
                clustering.merge(&coarse);
            }
        }
    }

    update
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::CommunityDetection;
    use crate::graph::Graph;

    fn ring_of_cliques(cliques: usize, size: usize) -> Graph {
        let mut edges = Vec::new();
        for q in 0..cliques {
            let base = q * size;
            for a in 0..size {
                for b in (a + 1)..size {
                    edges.push((base + a, base + b, 1.0));
                }
            }
            let next = ((q + 1) % cliques) * size;
            edges.push((base + size - 1, next, 1.0));
        }
        Graph::from_edges(cliques * size, edges).unwrap()
    }

    #[test]
    fn test_slm_ring_of_cliques() {
        let g = ring_of_cliques(6, 5);
        let communities = SmartLocalMoving::new().with_seed(1).detect(&g).unwrap();

        assert_eq!(communities.len(), 30);
        for q in 0..6 {
            let base = q * 5;
            for i in 1..5 {
                assert_eq!(communities[base], communities[base + i]);
            }
        }
    }

    #[test]
    fn test_slm_keeps_isolated_nodes_apart() {
        let g = Graph::from_edges(5, vec![(0, 1, 1.0), (1, 2, 1.0), (0, 2, 1.0)]).unwrap();
        let communities = SmartLocalMoving::new().detect(&g).unwrap();
        assert_eq!(communities[0], communities[1]);
        assert_eq!(communities[1], communities[2]);
        assert_ne!(communities[3], communities[4]);
        assert_ne!(communities[3], communities[0]);
    }

    #[test]
    fn test_slm_deterministic() {
        let g = ring_of_cliques(4, 4);
        let a = SmartLocalMoving::new().with_seed(9).detect(&g).unwrap();
        let b = SmartLocalMoving::new().with_seed(9).detect(&g).unwrap();
        assert_eq!(a, b);
    }
}
