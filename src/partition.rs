//! Singleton handling and deterministic cluster numbering.
//!
//! Optimizers return arbitrary contiguous ids. [`postprocess`] applies the
//! [`SingletonPolicy`] and then renumbers so that cluster 0 is the largest,
//! with ties going to the cluster holding the lowest node id. The output
//! depends only on the raw partition, never on the optimizer's numbering.

use crate::community::network::{Clustering, Network};
use crate::config::{ClusterConfig, SingletonPolicy};
use crate::error::{Error, Result};
use crate::graph::Graph;

/// Final cluster assignment: contiguous ids `0..k`, sorted by size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Partition {
    labels: Vec<usize>,
    n_clusters: usize,
}

impl Partition {
    /// Cluster id per node.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Consume into the label vector.
    pub fn into_labels(self) -> Vec<usize> {
        self.labels
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when the partition covers no nodes.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of clusters.
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Cluster sizes by id (non-increasing).
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &c in &self.labels {
            sizes[c] += 1;
        }
        sizes
    }

    /// Nodes of `cluster`, ascending.
    pub fn members(&self, cluster: usize) -> impl Iterator<Item = usize> + '_ {
        self.labels
            .iter()
            .enumerate()
            .filter(move |&(_, &c)| c == cluster)
            .map(|(i, _)| i)
    }

    /// Renumber arbitrary labels: size descending, then lowest member.
    pub(crate) fn renumbered(labels: &[usize]) -> Self {
        let clustering = Clustering::from_labels(labels);
        let sizes = clustering.sizes();

        // After first-seen compaction the lowest member of cluster `c` is
        // increasing in `c`, so a stable sort by size alone breaks ties by it.
        let mut order: Vec<usize> = (0..clustering.n_clusters).collect();
        order.sort_by(|&a, &b| sizes[b].cmp(&sizes[a]));

        let mut rank = vec![0; clustering.n_clusters];
        for (new, &old) in order.iter().enumerate() {
            rank[old] = new;
        }

        Self {
            labels: clustering.cluster.iter().map(|&c| rank[c]).collect(),
            n_clusters: clustering.n_clusters,
        }
    }
}

/// Apply the singleton policy of `config` to `raw` labels and renumber.
///
/// With [`SingletonPolicy::Merge`], singletons are visited in ascending node
/// order and each joins the adjacent cluster with the largest modularity gain
/// `k_v,c − γ'·w_v·W_c` (same quality function and node weights as the
/// optimizer). Ties prefer the larger connecting weight, then the lower
/// cluster id. A node without edges stays alone.
///
/// With [`SingletonPolicy::Isolate`], every singleton goes into one shared
/// cluster.
pub fn postprocess(graph: &Graph, raw: &[usize], config: &ClusterConfig) -> Result<Partition> {
    let n = graph.node_count();
    if raw.len() != n {
        return Err(Error::config(
            "labels",
            format!("has {} entries for {} nodes", raw.len(), n),
        ));
    }

    let mut clustering = Clustering::from_labels(raw);
    let singletons = clustering.sizes().iter().filter(|&&s| s == 1).count();

    match config.singletons {
        SingletonPolicy::Merge => merge_singletons(graph, &mut clustering, config)?,
        SingletonPolicy::Isolate => isolate_singletons(&mut clustering),
    }

    let partition = Partition::renumbered(&clustering.cluster);
    tracing::debug!(
        singletons,
        policy = ?config.singletons,
        clusters = partition.n_clusters(),
        "partition post-processed"
    );
    Ok(partition)
}

fn merge_singletons(
    graph: &Graph,
    clustering: &mut Clustering,
    config: &ClusterConfig,
) -> Result<()> {
    let (network, resolution) = Network::from_graph(
        graph,
        config.function,
        config.resolution,
        config.node_sizes.as_deref(),
    )?;

    let mut size = clustering.sizes();
    let mut weight = vec![0.0; clustering.n_clusters];
    for (i, &c) in clustering.cluster.iter().enumerate() {
        weight[c] += network.node_weight[i];
    }

    let mut to_cluster = vec![0.0; clustering.n_clusters];
    let mut neighboring: Vec<usize> = Vec::new();

    for v in 0..network.n {
        let own = clustering.cluster[v];
        if size[own] != 1 {
            continue;
        }

        neighboring.clear();
        for (j, w) in network.edges(v) {
            let c = clustering.cluster[j];
            if c == own {
                continue;
            }
            if to_cluster[c] == 0.0 {
                neighboring.push(c);
            }
            to_cluster[c] += w;
        }

        let w_v = network.node_weight[v];
        let mut best: Option<(usize, f64, f64)> = None;
        for &c in &neighboring {
            let k = to_cluster[c];
            let gain = k - resolution * w_v * weight[c];
            let better = match best {
                None => true,
                Some((bc, bg, bk)) => {
                    gain > bg || (gain == bg && (k > bk || (k == bk && c < bc)))
                }
            };
            if better {
                best = Some((c, gain, k));
            }
            to_cluster[c] = 0.0;
        }

        if let Some((target, _, _)) = best {
            clustering.cluster[v] = target;
            size[own] = 0;
            size[target] += 1;
            weight[own] -= w_v;
            weight[target] += w_v;
        }
    }
    Ok(())
}

fn isolate_singletons(clustering: &mut Clustering) {
    let sizes = clustering.sizes();
    let mut shared: Option<usize> = None;
    for c in clustering.cluster.iter_mut() {
        if sizes[*c] == 1 {
            *c = *shared.get_or_insert(*c);
        }
    }
}
