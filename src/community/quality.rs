//! Modularity quality function.

use super::network::{Clustering, Network};
use crate::config::ModularityFunction;
use crate::error::{Error, Result};
use crate::graph::Graph;

/// Quality of `clustering` on `network` at effective resolution `resolution`.
///
/// Normalized by `2m + self_total`, so on the input network under standard
/// modularity this is Newman–Girvan modularity (generalized by γ).
pub(crate) fn quality(network: &Network, clustering: &Clustering, resolution: f64) -> f64 {
    let mut q = network.total_self_loops;
    for i in 0..network.n {
        let c = clustering.cluster[i];
        q += network
            .edges(i)
            .filter(|&(j, _)| clustering.cluster[j] == c)
            .map(|(_, w)| w)
            .sum::<f64>();
    }

    let mut cluster_weight = vec![0.0; clustering.n_clusters];
    for i in 0..network.n {
        cluster_weight[clustering.cluster[i]] += network.node_weight[i];
    }
    q -= resolution * cluster_weight.iter().map(|w| w * w).sum::<f64>();

    let norm = 2.0 * network.total_edge_weight() + network.total_self_loops;
    if norm > 0.0 {
        q / norm
    } else {
        0.0
    }
}

/// Score a labeling of `graph` with the quality function the engine maximizes.
///
/// `labels[i]` is the cluster of node `i`; ids need not be contiguous.
///
/// # Errors
///
/// [`Error::Configuration`] if `labels` does not cover every node or
/// `resolution` is not positive.
///
/// ```rust
/// use commune::{modularity, Graph, ModularityFunction};
///
/// // Two disjoint edges: the natural split has Q = 0.5.
/// let g = Graph::from_edges(4, vec![(0, 1, 1.0), (2, 3, 1.0)]).unwrap();
/// let q = modularity(&g, &[0, 0, 1, 1], 1.0, ModularityFunction::Standard).unwrap();
/// assert!((q - 0.5).abs() < 1e-12);
/// ```
pub fn modularity(
    graph: &Graph,
    labels: &[usize],
    resolution: f64,
    function: ModularityFunction,
) -> Result<f64> {
    if labels.len() != graph.node_count() {
        return Err(Error::config(
            "labels",
            format!(
                "expected {} labels, found {}",
                graph.node_count(),
                labels.len()
            ),
        ));
    }
    if !(resolution > 0.0 && resolution.is_finite()) {
        return Err(Error::config("resolution", "must be positive and finite"));
    }

    let (network, effective) = Network::from_graph(graph, function, resolution, None)?;
    Ok(quality(&network, &Clustering::from_labels(labels), effective))
}
