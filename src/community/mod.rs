//! Modularity-based community detection.
//!
//! Given a weighted graph, find natural groupings where nodes within groups
//! are densely connected, and connections between groups are sparse.
//!
//! ## The Modularity Objective
//!
//! Every algorithm here maximizes **modularity** Q, which compares the actual
//! edge weight within communities to the expected weight in a random graph
//! with the same degree sequence:
//!
//! ```text
//! Q = (1/2m) × Σ[A_ij - γ(k_i × k_j)/(2m)] × δ(c_i, c_j)
//! ```
//!
//! Where:
//! - m = total edge weight (sum of all edges)
//! - A_ij = edge weight between i and j
//! - k_i = weighted degree of node i
//! - γ = resolution parameter
//! - δ(c_i, c_j) = 1 if i and j are in same community
//!
//! The **alternative** function ([`ModularityFunction::Alternative`]) drops
//! the degree-based null model and charges every pair of nodes in a community
//! the same constant γ. That suits graphs whose weights are not comparable to a
//! configuration-model expectation.
//!
//! ## The Resolution Parameter γ
//!
//! The resolution parameter controls granularity:
//!
//! - **γ = 1**: Standard modularity
//! - **γ > 1**: Smaller communities (higher penalty for merging)
//! - **γ < 1**: Larger communities (lower penalty for merging)
//!
//! ## Algorithms
//!
//! | Algorithm | Local search | Aggregates | Connected communities |
//! |-----------|--------------|------------|-----------------------|
//! | [`Louvain`] | greedy local moving | communities | no |
//! | [`MultilevelLouvain`] | + re-moving at finer levels | communities | no |
//! | [`SmartLocalMoving`] | + sub-community search | sub-communities | no |
//! | [`Leiden`] | queue-based local moving | refined sub-communities | yes |
//!
//! All four are randomized (node visiting order) and fully deterministic for
//! a fixed seed.
//!
//! ## Usage
//!
//! ```rust
//! use commune::community::{CommunityDetection, Leiden};
//! use commune::Graph;
//!
//! let graph = Graph::from_edges(3, vec![(0, 1, 1.0), (1, 2, 1.0)]).unwrap();
//!
//! // Detect communities
//! let communities = Leiden::new().with_seed(7).detect(&graph).unwrap();
//! // communities[i] = community ID for node i
//! assert_eq!(communities.len(), 3);
//! ```
//!
//! For multiple restarts, singleton handling and size-ordered labels use
//! [`crate::cluster`].
//!
//! ## References
//!
//! - Traag, Waltman, van Eck (2019). "From Louvain to Leiden: guaranteeing
//!   well-connected communities." Scientific Reports 9, 5233.
//! - Waltman & van Eck (2013). "A smart local moving algorithm for large-scale
//!   modularity-based community detection." European Physical Journal B 86.
//! - Blondel et al. (2008). "Fast unfolding of communities in large networks."
//! - Newman & Girvan (2004). "Finding and evaluating community structure in networks."

mod leiden;
mod local_moving;
mod louvain;
pub(crate) mod network;
pub(crate) mod quality;
mod slm;
pub(crate) mod traits;

pub use leiden::Leiden;
pub use louvain::{Louvain, MultilevelLouvain};
pub use quality::modularity;
pub use slm::SmartLocalMoving;
pub use traits::CommunityDetection;

pub use crate::config::ModularityFunction;

use crate::config::Algorithm;
use traits::LocalSearch;

impl Algorithm {
    /// The optimizer implementing this variant.
    pub(crate) fn search(self) -> Box<dyn LocalSearch> {
        match self {
            Algorithm::Louvain => Box::new(Louvain::new()),
            Algorithm::MultilevelLouvain => Box::new(MultilevelLouvain::new()),
            Algorithm::SmartLocalMoving => Box::new(SmartLocalMoving::new()),
            Algorithm::Leiden => Box::new(Leiden::new()),
        }
    }
}
