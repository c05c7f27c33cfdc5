//! Multi-start modularity optimization.
//!
//! [`optimize`] runs `n_start` independent randomized starts of the configured
//! algorithm against one shared, read-only network and keeps the partition
//! with the highest quality. Starts are ordered by index: ties go to the lower
//! index, so the result does not depend on which worker finishes first.
//!
//! Per-start seeds are drawn up front from a generator seeded with
//! `config.seed`, which makes a start's outcome independent of how many other
//! starts run or where they are scheduled.

use crate::community::network::{Clustering, Network};
use crate::community::quality::quality;
use crate::community::traits::LocalSearch;
use crate::config::ClusterConfig;
use crate::error::{Error, Result};
use crate::graph::Graph;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Raw result of the optimization engine.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationOutcome {
    /// Cluster id per node. Ids are contiguous but not size-ordered.
    pub labels: Vec<usize>,
    /// Quality of `labels` under the configured modularity function.
    pub quality: f64,
    /// Index of the winning start.
    pub start: usize,
    /// Starts that finished before the deadline.
    pub completed_starts: usize,
}

/// Final clustering and quality of one start, `None` if it hit the deadline.
type StartResult = Option<(Clustering, f64)>;

/// Seeds for every start, derived from the base seed.
pub(crate) fn start_seeds(seed: u64, n_start: usize) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n_start).map(|_| rng.random::<u64>()).collect()
}

/// Run the configured algorithm from `n_start` random starts.
///
/// Fails with a configuration error before any work when `config` is invalid
/// for `graph`, and with [`Error::Optimization`] when the timeout expires
/// before any start completes. A graph without edges is not an error: every
/// node ends up alone.
pub fn optimize(graph: &Graph, config: &ClusterConfig) -> Result<OptimizationOutcome> {
    let n = graph.node_count();
    config.validate(n)?;

    if n == 0 {
        return Ok(OptimizationOutcome {
            labels: Vec::new(),
            quality: 0.0,
            start: 0,
            completed_starts: config.n_start,
        });
    }

    let (network, resolution) = Network::from_graph(
        graph,
        config.function,
        config.resolution,
        config.node_sizes.as_deref(),
    )?;
    let initial = match &config.initial_membership {
        Some(labels) => Clustering::from_labels(labels),
        None => Clustering::singletons(n),
    };
    let search = config.algorithm.search();
    let seeds = start_seeds(config.seed, config.n_start);
    let deadline = config.timeout.map(|t| Instant::now() + t);

    tracing::debug!(
        nodes = n,
        edges = graph.edge_count(),
        algorithm = %config.algorithm,
        function = %config.function,
        starts = config.n_start,
        "optimizing"
    );

    let run = |(start, &seed): (usize, &u64)| {
        let result = run_start(
            search.as_ref(),
            &network,
            &initial,
            resolution,
            config.n_iter,
            seed,
            deadline,
        );
        match &result {
            Some((clustering, q)) => tracing::debug!(
                start,
                quality = q,
                clusters = clustering.n_clusters,
                "start finished"
            ),
            None => tracing::debug!(start, "start abandoned at deadline"),
        }
        result
    };

    let results = run_starts(&seeds, config.threads, run)?;
    let (start, clustering, quality, completed_starts) = select_best(results)?;
    tracing::info!(start, quality, clusters = clustering.n_clusters, "best start");

    Ok(OptimizationOutcome {
        labels: clustering.cluster,
        quality,
        start,
        completed_starts,
    })
}

/// Highest-quality finished start; the lower index wins ties.
///
/// Starts cut off by the deadline are skipped with a warning. If none
/// finished the invocation fails.
fn select_best(results: Vec<StartResult>) -> Result<(usize, Clustering, f64, usize)> {
    let n_start = results.len();
    let completed = results.iter().filter(|r| r.is_some()).count();
    let mut best: Option<(usize, Clustering, f64)> = None;
    for (start, result) in results.into_iter().enumerate() {
        let Some((clustering, q)) = result else {
            continue;
        };
        if best.as_ref().map_or(true, |(_, _, best_q)| q > *best_q) {
            best = Some((start, clustering, q));
        }
    }

    let Some((start, clustering, quality)) = best else {
        tracing::warn!(starts = n_start, "timeout expired before any start completed");
        return Err(Error::Optimization(format!(
            "none of {n_start} starts completed within the timeout"
        )));
    };
    if completed < n_start {
        tracing::warn!(
            completed,
            starts = n_start,
            "timeout expired; keeping the best completed start"
        );
    }
    Ok((start, clustering, quality, completed))
}

#[cfg(feature = "parallel")]
fn run_starts<F>(seeds: &[u64], threads: Option<usize>, run: F) -> Result<Vec<StartResult>>
where
    F: Fn((usize, &u64)) -> StartResult + Sync + Send,
{
    let collect = || seeds.par_iter().enumerate().map(&run).collect::<Vec<_>>();
    match threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| Error::Optimization(format!("worker pool: {e}")))?;
            Ok(pool.install(collect))
        }
        None => Ok(collect()),
    }
}

#[cfg(not(feature = "parallel"))]
fn run_starts<F>(seeds: &[u64], _threads: Option<usize>, run: F) -> Result<Vec<StartResult>>
where
    F: Fn((usize, &u64)) -> StartResult,
{
    Ok(seeds.iter().enumerate().map(run).collect())
}

/// One start: iterate until nothing changes or `n_iter` is reached.
///
/// Returns `None` when the deadline passes before the start is done.
fn run_start(
    search: &dyn LocalSearch,
    network: &Network,
    initial: &Clustering,
    resolution: f64,
    n_iter: usize,
    seed: u64,
    deadline: Option<Instant>,
) -> StartResult {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut clustering = initial.clone();

    for _ in 0..n_iter {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return None;
        }
        if !search.improve(network, &mut clustering, resolution, &mut rng) {
            break;
        }
    }

    let q = quality(network, &clustering, resolution);
    Some((clustering, q))
}
