//! Local moving: relocate single nodes while quality improves.
//!
//! For node `i` with weight `w_i`, moving into cluster `c` (with `i` already
//! removed from its own cluster) changes the unnormalized quality by
//!
//! ```text
//! Δ(i → c) = k_i,c − γ' · w_i · W_c
//! ```
//!
//! where `k_i,c` is the edge weight from `i` into `c` and `W_c` the summed node
//! weight of `c`. Only the difference between candidates matters, so the
//! constant "leave `i` alone in an empty cluster" option scores 0.

use super::network::{Clustering, Network};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::VecDeque;

/// Upper bound on full sweeps over the node order before giving up on
/// convergence. Only reachable through floating-point oscillation.
const MAX_SWEEPS: usize = 1_000;

/// Per-cluster bookkeeping for one local moving run.
struct Moves {
    cluster_weight: Vec<f64>,
    cluster_size: Vec<usize>,
    unused: Vec<usize>,
    edge_weight_per_cluster: Vec<f64>,
    neighboring: Vec<usize>,
}

impl Moves {
    fn new(network: &Network, clustering: &Clustering) -> Self {
        // Room for every node to end up alone.
        let cap = clustering.n_clusters.max(network.n);
        let mut cluster_weight = vec![0.0; cap];
        let mut cluster_size = vec![0usize; cap];
        for i in 0..network.n {
            let c = clustering.cluster[i];
            cluster_weight[c] += network.node_weight[i];
            cluster_size[c] += 1;
        }
        let unused = (0..cap).rev().filter(|&c| cluster_size[c] == 0).collect();

        Self {
            cluster_weight,
            cluster_size,
            unused,
            edge_weight_per_cluster: vec![0.0; cap],
            neighboring: Vec::new(),
        }
    }

    /// Accumulate `k_i,c` for every cluster adjacent to `node`.
    fn gather(&mut self, network: &Network, clustering: &Clustering, node: usize) {
        self.neighboring.clear();
        for (j, w) in network.edges(node) {
            let c = clustering.cluster[j];
            if self.edge_weight_per_cluster[c] == 0.0 {
                self.neighboring.push(c);
            }
            self.edge_weight_per_cluster[c] += w;
        }
    }

    fn remove(&mut self, node_weight: f64, c: usize) {
        self.cluster_weight[c] -= node_weight;
        self.cluster_size[c] -= 1;
        if self.cluster_size[c] == 0 {
            self.unused.push(c);
        }
    }

    fn insert(&mut self, node_weight: f64, c: usize) {
        self.cluster_weight[c] += node_weight;
        self.cluster_size[c] += 1;
    }

    /// Best adjacent cluster with a strictly positive gain, resetting the
    /// accumulators. The first candidate wins ties.
    fn best_adjacent(&mut self, node_weight: f64, resolution: f64) -> Option<(usize, f64)> {
        let mut best = None;
        let mut max_gain = 0.0;
        for &c in &self.neighboring {
            let gain = self.edge_weight_per_cluster[c]
                - node_weight * self.cluster_weight[c] * resolution;
            if gain > max_gain {
                best = Some((c, gain));
                max_gain = gain;
            }
            self.edge_weight_per_cluster[c] = 0.0;
        }
        best
    }
}

/// Greedy local moving over a random node permutation, cycling until every
/// node is stable. Returns whether any node moved.
pub(crate) fn local_moving(
    network: &Network,
    clustering: &mut Clustering,
    resolution: f64,
    rng: &mut StdRng,
) -> bool {
    let n = network.n;
    if n <= 1 {
        return false;
    }

    let mut moves = Moves::new(network, clustering);
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let mut update = false;
    let mut unstable = n;
    let mut pos = 0;
    let mut visits = 0;
    let max_visits = n.saturating_mul(MAX_SWEEPS);

    while unstable > 0 && visits < max_visits {
        let node = order[pos];
        let current = clustering.cluster[node];
        let w = network.node_weight[node];

        moves.gather(network, clustering, node);
        moves.remove(w, current);

        let best = match moves.best_adjacent(w, resolution) {
            Some((c, _)) => c,
            // Nothing beats being alone: the emptied own cluster, or a fresh one.
            None => moves.unused.pop().unwrap_or(current),
        };
        moves.insert(w, best);

        if best == current {
            unstable -= 1;
        } else {
            clustering.cluster[node] = best;
            unstable = n;
            update = true;
        }

        pos = if pos + 1 < n { pos + 1 } else { 0 };
        visits += 1;
    }

    if update {
        clustering.n_clusters = moves.cluster_size.len();
        clustering.compact();
    }
    update
}

/// Queue-based local moving: after a visit, only neighbors that left the
/// node's new cluster are revisited. Returns whether any node moved.
pub(crate) fn fast_local_moving(
    network: &Network,
    clustering: &mut Clustering,
    resolution: f64,
    rng: &mut StdRng,
) -> bool {
    let n = network.n;
    if n <= 1 {
        return false;
    }

    let mut moves = Moves::new(network, clustering);
    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);
    let mut queue: VecDeque<usize> = order.into_iter().collect();
    let mut in_queue = vec![true; n];

    let mut update = false;
    let mut visits = 0;
    let max_visits = n.saturating_mul(MAX_SWEEPS);

    while let Some(node) = queue.pop_front() {
        in_queue[node] = false;
        visits += 1;
        if visits > max_visits {
            break;
        }

        let current = clustering.cluster[node];
        let w = network.node_weight[node];

        moves.gather(network, clustering, node);
        moves.remove(w, current);

        // Staying put competes on equal terms; an adjacent cluster must do
        // strictly better.
        let stay = moves.edge_weight_per_cluster[current]
            - w * moves.cluster_weight[current] * resolution;
        let best = match moves.best_adjacent(w, resolution) {
            Some((c, gain)) if gain > stay && gain > 0.0 => c,
            _ if stay > 0.0 => current,
            _ => moves.unused.pop().unwrap_or(current),
        };
        moves.insert(w, best);

        if best != current {
            clustering.cluster[node] = best;
            update = true;
            for (j, _) in network.edges(node) {
                if !in_queue[j] && clustering.cluster[j] != best {
                    queue.push_back(j);
                    in_queue[j] = true;
                }
            }
        }
    }

    if update {
        clustering.n_clusters = moves.cluster_size.len();
        clustering.compact();
    }
    update
}
