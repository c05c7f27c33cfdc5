//! Entry points: graph in, finished partition out.

use crate::config::ClusterConfig;
use crate::engine;
use crate::error::Result;
use crate::graph::{snn_graph, Graph, NeighborGraph, SnnConfig};
use crate::partition::{postprocess, Partition};
use crate::spill;

/// Cluster a weighted graph.
///
/// Validates `config`, optimizes in this process or through the external
/// optimizer when [`crate::SpillConfig`] applies to the graph's size, then
/// applies the singleton policy and size-ordered numbering.
///
/// ```rust
/// use commune::{cluster, ClusterConfig, Graph};
///
/// let graph = Graph::from_edges(
///     6,
///     vec![(0, 1, 1.0), (1, 2, 1.0), (0, 2, 1.0), (3, 4, 1.0), (4, 5, 1.0), (3, 5, 1.0)],
/// )
/// .unwrap();
/// let partition = cluster(&graph, &ClusterConfig::new()).unwrap();
/// assert_eq!(partition.sizes(), vec![3, 3]);
/// ```
pub fn cluster(graph: &Graph, config: &ClusterConfig) -> Result<Partition> {
    config.validate(graph.node_count())?;

    let raw = match &config.spill {
        Some(spill) if spill.applies_to(graph.edge_count()) => {
            config.validate_spilled()?;
            match spill::run_external(graph, config, spill) {
                Ok(labels) => labels,
                Err(e) if spill.fallback_in_memory => {
                    tracing::warn!(error = %e, "external optimizer failed; optimizing in memory");
                    engine::optimize(graph, config)?.labels
                }
                Err(e) => return Err(e),
            }
        }
        _ => engine::optimize(graph, config)?.labels,
    };

    let partition = postprocess(graph, &raw, config)?;
    tracing::info!(
        nodes = partition.len(),
        clusters = partition.n_clusters(),
        "clustering finished"
    );
    Ok(partition)
}

/// Build the SNN graph of `neighbors` and cluster it.
///
/// The SNN graph lives only for the duration of this call.
pub fn cluster_neighbors(
    neighbors: &NeighborGraph,
    snn: &SnnConfig,
    config: &ClusterConfig,
) -> Result<Partition> {
    let graph = snn_graph(neighbors, snn)?;
    cluster(&graph, config)
}
