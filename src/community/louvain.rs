//! Louvain algorithm for community detection.
//!
//! Fast modularity optimization through local node moves and graph aggregation.
//!
//! ## The Algorithm (Blondel et al. 2008)
//!
//! Louvain is a multi-level, greedy modularity optimization algorithm:
//!
//! 1. **Phase 1 (Local Moving)**: Visit nodes in random order and move each
//!    to the neighboring community with highest modularity gain, until no
//!    move improves.
//!
//! 2. **Phase 2 (Aggregation)**: Build a meta-graph where communities become
//!    single nodes. Edge weights are sums of edges between communities.
//!    Self-loops represent internal community edges.
//!
//! 3. **Recurse**: Run phases 1-2 on the meta-graph while it keeps shrinking,
//!    then project the coarse partition back down.
//!
//! One call of this recursion is one *iteration*; the engine repeats
//! iterations from the previous result until nothing changes.
//!
//! ## Multilevel Refinement
//!
//! Plain Louvain never revisits a decision once nodes are aggregated, so a
//! node that joined a community early can get stuck there.
//! [`MultilevelLouvain`] re-runs local moving at every finer level after the
//! coarser level changed, letting individual nodes leave their super-node when
//! that strictly improves quality (Rotta & Noack 2011).
//!
//! ## References
//!
//! Blondel et al. (2008). "Fast unfolding of communities in large networks."
//! Journal of Statistical Mechanics: Theory and Experiment, P10008.
//!
//! Rotta & Noack (2011). "Multilevel local search algorithms for modularity
//! clustering." Journal of Experimental Algorithmics 16, 2.3.

use super::local_moving::local_moving;
use super::network::{Clustering, Network};
use super::traits::{search_builders, LocalSearch, SearchParams};
use rand::rngs::StdRng;

/// Louvain community detection algorithm.
#[derive(Debug, Clone)]
pub struct Louvain {
    params: SearchParams,
}

impl Louvain {
    /// Create a new Louvain detector with default settings.
    pub fn new() -> Self {
        Self {
            params: SearchParams::default(),
        }
    }
}

search_builders!(Louvain);

impl LocalSearch for Louvain {
    fn improve(
        &self,
        network: &Network,
        clustering: &mut Clustering,
        resolution: f64,
        rng: &mut StdRng,
    ) -> bool {
        louvain_level(network, clustering, resolution, rng, false)
    }
}

/// Louvain with multilevel refinement.
#[derive(Debug, Clone)]
pub struct MultilevelLouvain {
    params: SearchParams,
}

impl MultilevelLouvain {
    /// Create a new detector with default settings.
    pub fn new() -> Self {
        Self {
            params: SearchParams::default(),
        }
    }
}

search_builders!(MultilevelLouvain);

impl LocalSearch for MultilevelLouvain {
    fn improve(
        &self,
        network: &Network,
        clustering: &mut Clustering,
        resolution: f64,
        rng: &mut StdRng,
    ) -> bool {
        louvain_level(network, clustering, resolution, rng, true)
    }
}

fn louvain_level(
    network: &Network,
    clustering: &mut Clustering,
    resolution: f64,
    rng: &mut StdRng,
    refine: bool,
) -> bool {
    if network.n <= 1 {
        return false;
    }

    let mut update = local_moving(network, clustering, resolution, rng);

    if clustering.n_clusters < network.n {
        let reduced = network.reduce(clustering);
        let mut coarse = Clustering::singletons(reduced.n);

        if louvain_level(&reduced, &mut coarse, resolution, rng, refine) {
            update = true;
            clustering.merge(&coarse);
            if refine {
                let _ = local_moving(network, clustering, resolution, rng);
            }
        }
    }

    update
}
