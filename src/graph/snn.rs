//! Shared-nearest-neighbor (SNN) graphs.
//!
//! Bridges a precomputed k-nearest-neighbor search to community detection.
//! Two entities are similar when their neighborhoods overlap, regardless of
//! the raw distance between them:
//!
//! ```text
//! neighbor lists → overlap counts → SNN graph → modularity clustering
//! ```
//!
//! # Weights
//!
//! For neighbor sets `N(a)` and `N(b)` of size `k` and overlap
//! `o = |N(a) ∩ N(b)|`:
//!
//! - **Fraction**: `w = o / k`
//! - **Jaccard**: `w = o / (k + (k - o))`
//!
//! Both are 1 when the two sets coincide. By convention each row contains the
//! node itself (usually first, at distance 0), so two mutual neighbors always
//! overlap in at least two entries.
//!
//! Edges whose weight falls below [`SnnConfig::prune`] are dropped. A prune of
//! `1/15` is the common single-cell default; the default here keeps every
//! non-zero overlap.
//!
//! # Complexity
//!
//! Overlaps are counted through an inverted index (`v → {u : v ∈ N(u)}`), so
//! only pairs that share at least one neighbor are ever touched. With the
//! `parallel` feature rows are processed on the rayon pool.

use super::Graph;
use crate::error::{Error, Result};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Precomputed k-nearest-neighbor lists, one row of exactly `k` ids per node.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborGraph {
    n: usize,
    k: usize,
    /// Row-major `n × k` neighbor ids.
    indices: Vec<usize>,
    /// Row-major `n × k` distances, if known.
    distances: Option<Vec<f64>>,
}

impl NeighborGraph {
    /// Build from neighbor id rows.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedGraph`] if rows have different lengths, are empty,
    /// reference a node outside `0..n`, or repeat a neighbor.
    pub fn new(rows: Vec<Vec<usize>>) -> Result<Self> {
        let n = rows.len();
        let k = rows.first().map_or(0, Vec::len);
        if n > 0 && k == 0 {
            return Err(Error::malformed("neighbor rows must not be empty"));
        }

        let mut indices = Vec::with_capacity(n * k);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != k {
                return Err(Error::malformed(format!(
                    "node {i} has {} neighbors, expected {k}",
                    row.len()
                )));
            }
            for (pos, &j) in row.iter().enumerate() {
                if j >= n {
                    return Err(Error::malformed(format!(
                        "node {i} lists neighbor {j} outside 0..{n}"
                    )));
                }
                if row[..pos].contains(&j) {
                    return Err(Error::malformed(format!(
                        "node {i} lists neighbor {j} twice"
                    )));
                }
            }
            indices.extend_from_slice(row);
        }

        Ok(Self {
            n,
            k,
            indices,
            distances: None,
        })
    }

    /// Build from `(neighbor, distance)` rows; each row is sorted by distance.
    pub fn from_distances(rows: Vec<Vec<(usize, f64)>>) -> Result<Self> {
        let mut ids = Vec::with_capacity(rows.len());
        let mut dists = Vec::with_capacity(rows.len() * rows.first().map_or(0, Vec::len));
        for mut row in rows {
            if let Some((j, d)) = row.iter().find(|(_, d)| !d.is_finite() || *d < 0.0) {
                return Err(Error::malformed(format!(
                    "neighbor {j} has invalid distance {d}"
                )));
            }
            row.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
            ids.push(row.iter().map(|&(j, _)| j).collect());
            dists.extend(row.iter().map(|&(_, d)| d));
        }

        let mut graph = Self::new(ids)?;
        graph.distances = Some(dists);
        Ok(graph)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.n
    }

    /// Neighbors per node.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Neighbor ids of `node`.
    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.indices[node * self.k..(node + 1) * self.k]
    }

    /// Distances of `node`'s neighbors, aligned with [`neighbors`](Self::neighbors).
    pub fn distances(&self, node: usize) -> Option<&[f64]> {
        self.distances
            .as_ref()
            .map(|d| &d[node * self.k..(node + 1) * self.k])
    }

    /// The plain kNN adjacency as an unweighted (weight 1) undirected graph.
    ///
    /// `a`-`b` exists when either lists the other.
    pub fn knn_graph(&self) -> Graph {
        let mut pairs: Vec<(usize, usize)> = Vec::with_capacity(self.n * self.k);
        for a in 0..self.n {
            for &b in self.neighbors(a) {
                if a != b {
                    pairs.push(if a < b { (a, b) } else { (b, a) });
                }
            }
        }
        pairs.sort_unstable();
        pairs.dedup();

        let edges: Vec<(usize, usize, f64)> =
            pairs.into_iter().map(|(a, b)| (a, b, 1.0)).collect();
        Graph::from_canonical(self.n, &edges)
    }
}

/// How neighbor overlap becomes an edge weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnnWeight {
    /// `o / k`
    #[default]
    Fraction,
    /// `o / (2k - o)`
    Jaccard,
}

impl SnnWeight {
    fn weight(self, overlap: usize, k: usize) -> f64 {
        let o = overlap as f64;
        let k = k as f64;
        match self {
            SnnWeight::Fraction => o / k,
            SnnWeight::Jaccard => o / (k + (k - o)),
        }
    }
}

/// SNN construction options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnnConfig {
    /// Minimum weight for an edge to be kept (default `0.0`: any overlap).
    pub prune: f64,
    /// Weighting scheme (default [`SnnWeight::Fraction`]).
    pub weight: SnnWeight,
}

impl Default for SnnConfig {
    fn default() -> Self {
        Self {
            prune: 0.0,
            weight: SnnWeight::Fraction,
        }
    }
}

impl SnnConfig {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the prune threshold.
    pub fn with_prune(mut self, prune: f64) -> Self {
        self.prune = prune;
        self
    }

    /// Set the weighting scheme.
    pub fn with_weight(mut self, weight: SnnWeight) -> Self {
        self.weight = weight;
        self
    }
}

/// Build the SNN graph of a neighbor graph.
///
/// Pairs are emitted once with `a < b`; self pairs are skipped.
///
/// # Errors
///
/// [`Error::Configuration`] if `prune` is outside `[0, 1]`.
///
/// ```rust
/// use commune::{snn_graph, NeighborGraph, SnnConfig};
///
/// let nn = NeighborGraph::new(vec![vec![0, 1], vec![1, 0], vec![2, 1]]).unwrap();
/// let snn = snn_graph(&nn, &SnnConfig::default()).unwrap();
/// assert_eq!(snn.edge_weight(0, 1), 1.0);
/// assert_eq!(snn.edge_weight(1, 2), 0.5);
/// ```
pub fn snn_graph(neighbors: &NeighborGraph, config: &SnnConfig) -> Result<Graph> {
    if !(0.0..=1.0).contains(&config.prune) {
        return Err(Error::config("prune", "must lie in [0, 1]"));
    }

    let n = neighbors.node_count();
    let k = neighbors.k();

    // inverted[v] = nodes whose neighbor list contains v
    let mut inverted: Vec<Vec<usize>> = vec![Vec::new(); n];
    for u in 0..n {
        for &v in neighbors.neighbors(u) {
            inverted[v].push(u);
        }
    }

    let row = |counts: &mut Vec<usize>, touched: &mut Vec<usize>, a: usize| {
        for &v in neighbors.neighbors(a) {
            for &b in &inverted[v] {
                if b > a {
                    if counts[b] == 0 {
                        touched.push(b);
                    }
                    counts[b] += 1;
                }
            }
        }
        touched.sort_unstable();

        let mut out = Vec::with_capacity(touched.len());
        for &b in touched.iter() {
            let w = config.weight.weight(counts[b], k);
            counts[b] = 0;
            if w > 0.0 && w >= config.prune {
                out.push((a, b, w));
            }
        }
        touched.clear();
        out
    };

    #[cfg(feature = "parallel")]
    let rows: Vec<Vec<(usize, usize, f64)>> = (0..n)
        .into_par_iter()
        .map_init(
            || (vec![0usize; n], Vec::new()),
            |(counts, touched), a| row(counts, touched, a),
        )
        .collect();

    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Vec<(usize, usize, f64)>> = {
        let mut counts = vec![0usize; n];
        let mut touched = Vec::new();
        (0..n).map(|a| row(&mut counts, &mut touched, a)).collect()
    };

    let edges: Vec<(usize, usize, f64)> = rows.into_iter().flatten().collect();
    tracing::debug!(nodes = n, k, edges = edges.len(), "built SNN graph");
    Ok(Graph::from_canonical(n, &edges))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_groups() -> NeighborGraph {
        NeighborGraph::new(vec![
            vec![0, 1, 2],
            vec![1, 0, 2],
            vec![2, 1, 0],
            vec![3, 4, 5],
            vec![4, 3, 5],
            vec![5, 4, 3],
        ])
        .unwrap()
    }

    #[test]
    fn test_identical_neighborhoods_weight_one() {
        let snn = snn_graph(&two_groups(), &SnnConfig::default()).unwrap();
        assert_eq!(snn.edge_weight(0, 1), 1.0);
        assert_eq!(snn.edge_weight(3, 5), 1.0);
        assert_eq!(snn.edge_weight(0, 3), 0.0);
        assert_eq!(snn.edge_count(), 6);
    }

    #[test]
    fn test_jaccard_weights() {
        let nn = NeighborGraph::new(vec![vec![0, 1], vec![1, 2], vec![2, 1]]).unwrap();
        let config = SnnConfig::new().with_weight(SnnWeight::Jaccard);
        let snn = snn_graph(&nn, &config).unwrap();
        // N(0) ∩ N(1) = {1}: 1 / (2 + 1)
        assert!((snn.edge_weight(0, 1) - 1.0 / 3.0).abs() < 1e-12);
        // N(1) = N(2)
        assert_eq!(snn.edge_weight(1, 2), 1.0);
    }

    #[test]
    fn test_prune_threshold() {
        let nn = NeighborGraph::new(vec![
            vec![0, 1, 2, 3],
            vec![1, 0, 2, 3],
            vec![2, 4, 5, 6],
            vec![3, 0, 1, 2],
            vec![4, 5, 6, 2],
            vec![5, 4, 6, 2],
            vec![6, 4, 5, 2],
        ])
        .unwrap();
        let all = snn_graph(&nn, &SnnConfig::default()).unwrap();
        let pruned = snn_graph(&nn, &SnnConfig::new().with_prune(0.5)).unwrap();
        assert!(pruned.edge_count() < all.edge_count());
        for (_, _, w) in pruned.edges() {
            assert!(w >= 0.5);
        }
    }

    #[test]
    fn test_invalid_prune_rejected() {
        let err = snn_graph(&two_groups(), &SnnConfig::new().with_prune(1.5)).unwrap_err();
        assert!(matches!(err, Error::Configuration { name: "prune", .. }));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = NeighborGraph::new(vec![vec![0, 1], vec![1]]).unwrap_err();
        assert!(matches!(err, Error::MalformedGraph { .. }));
    }

    #[test]
    fn test_out_of_range_neighbor_rejected() {
        let err = NeighborGraph::new(vec![vec![0, 2], vec![1, 0]]).unwrap_err();
        assert!(matches!(err, Error::MalformedGraph { .. }));
    }

    #[test]
    fn test_duplicate_neighbor_rejected() {
        let err = NeighborGraph::new(vec![vec![0, 0], vec![1, 0]]).unwrap_err();
        assert!(matches!(err, Error::MalformedGraph { .. }));
    }

    #[test]
    fn test_from_distances_sorts_rows() {
        let nn = NeighborGraph::from_distances(vec![
            vec![(1, 0.5), (0, 0.0)],
            vec![(0, 0.5), (1, 0.0)],
        ])
        .unwrap();
        assert_eq!(nn.neighbors(0), &[0, 1]);
        assert_eq!(nn.distances(0), Some(&[0.0, 0.5][..]));
    }

    #[test]
    fn test_knn_graph_union() {
        let nn = NeighborGraph::new(vec![vec![0, 1], vec![1, 0], vec![2, 1]]).unwrap();
        let g = nn.knn_graph();
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.edge_weight(0, 1), 1.0);
        assert_eq!(g.edge_weight(1, 2), 1.0);
    }
}
