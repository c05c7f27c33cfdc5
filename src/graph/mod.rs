//! Sparse weighted undirected graphs.
//!
//! [`Graph`] is the input of every clustering entry point. It stores a
//! symmetric adjacency in compressed sparse row (CSR) form: for node `i`,
//! `neighbors[offsets[i]..offsets[i + 1]]` are its neighbors in ascending
//! order, with matching `weights`. Memory is O(n + m), so graphs with tens of
//! millions of edges never touch a dense n×n matrix.
//!
//! ## Invariants
//!
//! - Node ids are dense: `0..n`.
//! - Weights are finite and strictly positive. A zero-weight edge is the same
//!   as no edge and is dropped at construction.
//! - No self-loops. Self-similarity carries no information for clustering, so
//!   `(i, i)` edges are dropped at construction.
//! - Every edge `(a, b, w)` is stored in both rows.
//!
//! ## Sources
//!
//! - [`Graph::from_edges`]: an explicit edge list.
//! - [`Graph::from_petgraph`]: any `petgraph` undirected graph.
//! - [`snn_graph`]: shared-nearest-neighbor weights from a [`NeighborGraph`].

mod snn;

pub use snn::{snn_graph, NeighborGraph, SnnConfig, SnnWeight};

use crate::error::{Error, Result};
use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;

/// Sparse weighted undirected graph over nodes `0..n`.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    n: usize,
    offsets: Vec<usize>,
    neighbors: Vec<usize>,
    weights: Vec<f64>,
}

impl Graph {
    /// A graph with `n` nodes and no edges.
    pub fn empty(n: usize) -> Self {
        Self {
            n,
            offsets: vec![0; n + 1],
            neighbors: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Build a graph from an undirected edge list.
    ///
    /// Each `(a, b, w)` is one undirected edge; orientation does not matter.
    /// Repeated pairs (in either orientation) are summed into one edge.
    /// Self-loops and zero weights are dropped.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedGraph`] if an endpoint is outside `0..n` or a weight
    /// is negative or not finite.
    pub fn from_edges<I>(n: usize, edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut canonical: Vec<(usize, usize, f64)> = Vec::new();
        for (a, b, w) in edges {
            if a >= n || b >= n {
                return Err(Error::malformed(format!(
                    "edge ({a}, {b}) references a node outside 0..{n}"
                )));
            }
            if !w.is_finite() || w < 0.0 {
                return Err(Error::malformed(format!(
                    "edge ({a}, {b}) has invalid weight {w}"
                )));
            }
            if a == b || w == 0.0 {
                continue;
            }
            canonical.push(if a < b { (a, b, w) } else { (b, a, w) });
        }

        canonical.sort_unstable_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));
        canonical.dedup_by(|next, kept| {
            if (next.0, next.1) == (kept.0, kept.1) {
                kept.2 += next.2;
                true
            } else {
                false
            }
        });

        Ok(Self::from_canonical(n, &canonical))
    }

    /// Build from sorted, deduplicated `(a, b, w)` with `a < b` and `w > 0`.
    pub(crate) fn from_canonical(n: usize, edges: &[(usize, usize, f64)]) -> Self {
        let mut degree = vec![0usize; n];
        for &(a, b, _) in edges {
            degree[a] += 1;
            degree[b] += 1;
        }

        let mut offsets = Vec::with_capacity(n + 1);
        offsets.push(0);
        for d in &degree {
            let last = offsets[offsets.len() - 1];
            offsets.push(last + d);
        }

        let total = offsets[n];
        let mut neighbors = vec![0usize; total];
        let mut weights = vec![0.0; total];
        let mut cursor: Vec<usize> = offsets[..n].to_vec();

        // Edges are sorted by (a, b), so filling row `a` with `b` and row `b`
        // with `a` in this order leaves every row sorted ascending.
        for &(a, b, w) in edges {
            neighbors[cursor[b]] = a;
            weights[cursor[b]] = w;
            cursor[b] += 1;
        }
        for &(a, b, w) in edges {
            neighbors[cursor[a]] = b;
            weights[cursor[a]] = w;
            cursor[a] += 1;
        }

        Self {
            n,
            offsets,
            neighbors,
            weights,
        }
    }

    /// Convert a `petgraph` undirected graph, mapping edge payloads to weights.
    ///
    /// Node `i` of the result is `NodeIndex::new(i)`.
    ///
    /// ```rust
    /// use commune::Graph;
    /// use petgraph::graph::UnGraph;
    ///
    /// let mut g = UnGraph::<(), f64>::new_undirected();
    /// let a = g.add_node(());
    /// let b = g.add_node(());
    /// g.add_edge(a, b, 0.5);
    ///
    /// let graph = Graph::from_petgraph(&g, |w| *w).unwrap();
    /// assert_eq!(graph.edge_weight(0, 1), 0.5);
    /// ```
    pub fn from_petgraph<N, E, F>(graph: &UnGraph<N, E>, weight: F) -> Result<Self>
    where
        F: Fn(&E) -> f64,
    {
        Self::from_edges(
            graph.node_count(),
            graph
                .edge_references()
                .map(|e| (e.source().index(), e.target().index(), weight(e.weight()))),
        )
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.n
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.neighbors.len() / 2
    }

    /// Neighbors of `node` with edge weights, ascending by neighbor id.
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.offsets[node]..self.offsets[node + 1];
        self.neighbors[range.clone()]
            .iter()
            .copied()
            .zip(self.weights[range].iter().copied())
    }

    /// Number of neighbors of `node`.
    pub fn degree(&self, node: usize) -> usize {
        self.offsets[node + 1] - self.offsets[node]
    }

    /// Sum of edge weights incident to `node`.
    pub fn strength(&self, node: usize) -> f64 {
        self.weights[self.offsets[node]..self.offsets[node + 1]]
            .iter()
            .sum()
    }

    /// Weight of edge `(a, b)`, or `0.0` if absent.
    pub fn edge_weight(&self, a: usize, b: usize) -> f64 {
        if a >= self.n || b >= self.n {
            return 0.0;
        }
        let row = &self.neighbors[self.offsets[a]..self.offsets[a + 1]];
        match row.binary_search(&b) {
            Ok(pos) => self.weights[self.offsets[a] + pos],
            Err(_) => 0.0,
        }
    }

    /// Each undirected edge once as `(a, b, w)` with `a < b`, sorted by `(a, b)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.n).flat_map(move |a| {
            self.neighbors(a)
                .filter(move |&(b, _)| b > a)
                .map(move |(b, w)| (a, b, w))
        })
    }

    /// Sum of all edge weights, each undirected edge counted once.
    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum::<f64>() / 2.0
    }

    pub(crate) fn raw_offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub(crate) fn raw_neighbors(&self) -> &[usize] {
        &self.neighbors
    }

    pub(crate) fn raw_weights(&self) -> &[f64] {
        &self.weights
    }
}
