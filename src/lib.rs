//! # commune
//!
//! Graph-based community detection: shared-nearest-neighbor graphs and
//! multi-start modularity optimization.
//!
//! The pipeline takes a k-nearest-neighbor graph (or any weighted graph),
//! builds SNN weights, optimizes modularity with one of four algorithms
//! (Louvain, Louvain with multilevel refinement, smart local moving, Leiden)
//! from several random starts, and returns a [`Partition`] with deterministic,
//! size-ordered cluster ids.
//!
//! ```rust
//! use commune::{cluster_neighbors, Algorithm, ClusterConfig, NeighborGraph, SnnConfig};
//!
//! // Each node lists itself and its two nearest neighbors.
//! let neighbors = NeighborGraph::new(vec![
//!     vec![0, 1, 2],
//!     vec![1, 0, 2],
//!     vec![2, 0, 1],
//!     vec![3, 4, 5],
//!     vec![4, 3, 5],
//!     vec![5, 4, 3],
//! ])
//! .unwrap();
//!
//! let config = ClusterConfig::new().with_algorithm(Algorithm::Leiden).with_seed(1);
//! let partition = cluster_neighbors(&neighbors, &SnnConfig::new(), &config).unwrap();
//! assert_eq!(partition.labels(), &[0, 0, 0, 1, 1, 1]);
//! ```
//!
//! **Default build** runs restarts and SNN construction on rayon (`parallel`)
//! and builds the `commune-optimize` binary used by the spill path (`cli`).
//! The library logs through `tracing` and never installs a subscriber.

pub mod community;
/// Invocation configuration.
pub mod config;
pub mod engine;
/// Error types used across `commune`.
pub mod error;
pub mod graph;
pub mod partition;
mod pipeline;
pub mod spill;

pub use config::{Algorithm, ClusterConfig, ModularityFunction, SingletonPolicy, SpillConfig};
pub use engine::{optimize, OptimizationOutcome};
pub use error::{Error, Result};
pub use graph::{snn_graph, Graph, NeighborGraph, SnnConfig, SnnWeight};
pub use partition::{postprocess, Partition};
pub use pipeline::{cluster, cluster_neighbors};

pub use community::{
    modularity, CommunityDetection, Leiden, Louvain, MultilevelLouvain, SmartLocalMoving,
};
