//! Community detection traits.

use super::network::{Clustering, Network};
use super::quality::quality;
use crate::config::ModularityFunction;
use crate::error::{Error, Result};
use crate::graph::Graph;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Trait for community detection algorithms.
pub trait CommunityDetection {
    /// Detect communities in a graph with one randomized start.
    ///
    /// Returns a mapping from node index to community ID. IDs are contiguous
    /// but otherwise in no particular order; see [`crate::cluster`] for
    /// multi-start optimization with size-ordered labels.
    fn detect(&self, graph: &Graph) -> Result<Vec<usize>>;

    /// Get the resolution parameter.
    fn resolution(&self) -> f64;
}

/// One improvement iteration of a modularity optimizer.
///
/// `resolution` is the effective resolution of the node-weight formulation
/// (see [`Network`]). Returns whether the clustering changed.
pub(crate) trait LocalSearch: Sync {
    fn improve(
        &self,
        network: &Network,
        clustering: &mut Clustering,
        resolution: f64,
        rng: &mut StdRng,
    ) -> bool;
}

/// Settings shared by every optimizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SearchParams {
    pub(crate) resolution: f64,
    pub(crate) function: ModularityFunction,
    pub(crate) max_iter: usize,
    pub(crate) seed: u64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            function: ModularityFunction::Standard,
            max_iter: 10,
            seed: 0,
        }
    }
}

/// Run `search` from singletons for up to `max_iter` iterations.
pub(crate) fn detect_with<S: LocalSearch>(
    search: &S,
    params: &SearchParams,
    graph: &Graph,
) -> Result<Vec<usize>> {
    if graph.node_count() == 0 {
        return Err(Error::malformed("graph has no nodes"));
    }
    if !(params.resolution > 0.0 && params.resolution.is_finite()) {
        return Err(Error::config("resolution", "must be positive and finite"));
    }

    let (network, resolution) =
        Network::from_graph(graph, params.function, params.resolution, None)?;
    let mut clustering = Clustering::singletons(network.n);
    let mut rng = StdRng::seed_from_u64(params.seed);

    for _ in 0..params.max_iter {
        if !search.improve(&network, &mut clustering, resolution, &mut rng) {
            break;
        }
    }
    tracing::trace!(
        quality = quality(&network, &clustering, resolution),
        clusters = clustering.n_clusters,
        "single start finished"
    );
    Ok(clustering.cluster)
}

/// Builder methods shared by the algorithm structs.
macro_rules! search_builders {
    ($ty:ident) => {
        impl $ty {
            /// Set resolution parameter.
            ///
            /// Higher values produce smaller communities.
            pub fn with_resolution(mut self, resolution: f64) -> Self {
                self.params.resolution = resolution;
                self
            }

            /// Set the modularity function.
            pub fn with_function(mut self, function: $crate::config::ModularityFunction) -> Self {
                self.params.function = function;
                self
            }

            /// Set maximum iterations.
            pub fn with_max_iter(mut self, max_iter: usize) -> Self {
                self.params.max_iter = max_iter;
                self
            }

            /// Set random seed.
            pub fn with_seed(mut self, seed: u64) -> Self {
                self.params.seed = seed;
                self
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $crate::community::CommunityDetection for $ty {
            fn detect(&self, graph: &$crate::graph::Graph) -> $crate::error::Result<Vec<usize>> {
                $crate::community::traits::detect_with(self, &self.params, graph)
            }

            fn resolution(&self) -> f64 {
                self.params.resolution
            }
        }
    };
}

pub(crate) use search_builders;
