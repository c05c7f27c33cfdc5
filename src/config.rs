//! Invocation configuration.
//!
//! [`ClusterConfig`] is an immutable value built with consuming `with_*`
//! setters and checked once by [`ClusterConfig::validate`] before any work
//! starts. Algorithm and modularity choices also parse from the integer codes
//! used by the out-of-process optimizer's command line.

use crate::error::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Quality function maximized by the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModularityFunction {
    /// Degree-normalized modularity (code 1).
    #[default]
    Standard,
    /// Constant null model: every pair of nodes in a community costs the
    /// resolution (code 2).
    Alternative,
}

impl ModularityFunction {
    /// Integer code understood by `commune-optimize --modularity`.
    pub fn code(self) -> u8 {
        match self {
            ModularityFunction::Standard => 1,
            ModularityFunction::Alternative => 2,
        }
    }
}

impl TryFrom<u8> for ModularityFunction {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            1 => Ok(ModularityFunction::Standard),
            2 => Ok(ModularityFunction::Alternative),
            other => Err(Error::config(
                "modularity",
                format!("unknown modularity function {other}, expected 1 or 2"),
            )),
        }
    }
}

impl FromStr for ModularityFunction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "standard" => Ok(ModularityFunction::Standard),
            "2" | "alternative" => Ok(ModularityFunction::Alternative),
            other => Err(Error::config(
                "modularity",
                format!("unknown modularity function '{other}'"),
            )),
        }
    }
}

impl fmt::Display for ModularityFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModularityFunction::Standard => "standard",
            ModularityFunction::Alternative => "alternative",
        })
    }
}

/// Optimization algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    /// Greedy local moving with aggregation (code 1).
    #[default]
    Louvain,
    /// Louvain with re-moving at finer levels (code 2).
    MultilevelLouvain,
    /// Smart local moving (code 3).
    SmartLocalMoving,
    /// Leiden: refinement guaranteeing connected communities (code 4).
    Leiden,
}

impl Algorithm {
    /// Integer code understood by `commune-optimize --algorithm`.
    pub fn code(self) -> u8 {
        match self {
            Algorithm::Louvain => 1,
            Algorithm::MultilevelLouvain => 2,
            Algorithm::SmartLocalMoving => 3,
            Algorithm::Leiden => 4,
        }
    }

    /// All variants in code order.
    pub const ALL: [Algorithm; 4] = [
        Algorithm::Louvain,
        Algorithm::MultilevelLouvain,
        Algorithm::SmartLocalMoving,
        Algorithm::Leiden,
    ];
}

impl TryFrom<u8> for Algorithm {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            1 => Ok(Algorithm::Louvain),
            2 => Ok(Algorithm::MultilevelLouvain),
            3 => Ok(Algorithm::SmartLocalMoving),
            4 => Ok(Algorithm::Leiden),
            other => Err(Error::config(
                "algorithm",
                format!("unknown algorithm {other}, expected 1..=4"),
            )),
        }
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "louvain" => Ok(Algorithm::Louvain),
            "2" | "multilevel" | "louvain-multilevel" => Ok(Algorithm::MultilevelLouvain),
            "3" | "slm" => Ok(Algorithm::SmartLocalMoving),
            "4" | "leiden" => Ok(Algorithm::Leiden),
            other => Err(Error::config("algorithm", format!("unknown algorithm '{other}'"))),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Algorithm::Louvain => "louvain",
            Algorithm::MultilevelLouvain => "multilevel",
            Algorithm::SmartLocalMoving => "slm",
            Algorithm::Leiden => "leiden",
        })
    }
}

/// What happens to communities of size one after optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SingletonPolicy {
    /// Move each singleton into the best neighboring cluster. Nodes without
    /// edges stay alone.
    #[default]
    Merge,
    /// Collect every singleton into one shared cluster.
    Isolate,
}

/// Out-of-process optimization settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SpillConfig {
    /// Optimizer executable (a `commune-optimize` build or compatible).
    pub program: PathBuf,
    /// Directory for the edge list and membership files.
    pub working_dir: PathBuf,
    /// Spill automatically when the graph has more edges than this.
    pub edge_threshold: Option<usize>,
    /// Write the edge list here instead of a fresh temporary file. Setting
    /// this always routes through the external optimizer.
    pub edge_file: Option<PathBuf>,
    /// Leave the edge list and membership files on disk.
    pub keep_files: bool,
    /// Kill the subprocess after this long.
    pub timeout: Option<Duration>,
    /// Run in memory if the subprocess fails instead of reporting the error.
    pub fallback_in_memory: bool,
}

impl SpillConfig {
    /// Spill settings for the given optimizer executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            working_dir: std::env::temp_dir(),
            edge_threshold: None,
            edge_file: None,
            keep_files: false,
            timeout: None,
            fallback_in_memory: false,
        }
    }

    /// Set the working directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Spill when the graph has more than `edges` edges.
    pub fn with_edge_threshold(mut self, edges: usize) -> Self {
        self.edge_threshold = Some(edges);
        self
    }

    /// Write the edge list to a fixed path.
    pub fn with_edge_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.edge_file = Some(path.into());
        self
    }

    /// Keep intermediate files for debugging.
    pub fn with_keep_files(mut self, keep: bool) -> Self {
        self.keep_files = keep;
        self
    }

    /// Set the subprocess timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fall back to the in-memory engine when the subprocess fails.
    pub fn with_fallback_in_memory(mut self, fallback: bool) -> Self {
        self.fallback_in_memory = fallback;
        self
    }

    /// Whether a graph with `edges` edges goes through the external optimizer.
    pub fn applies_to(&self, edges: usize) -> bool {
        self.edge_file.is_some() || self.edge_threshold.is_some_and(|t| edges > t)
    }
}

/// Configuration of one clustering invocation.
///
/// ```rust
/// use commune::{Algorithm, ClusterConfig};
///
/// let config = ClusterConfig::new()
///     .with_algorithm(Algorithm::Leiden)
///     .with_resolution(1.2)
///     .with_seed(42);
/// assert_eq!(config.n_start, 10);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterConfig {
    /// Resolution γ, strictly positive. Larger gives more, smaller clusters.
    pub resolution: f64,
    /// Optimizer variant.
    pub algorithm: Algorithm,
    /// Quality function.
    pub function: ModularityFunction,
    /// Number of independent randomized starts.
    pub n_start: usize,
    /// Maximum iterations per start.
    pub n_iter: usize,
    /// Base seed. Per-start seeds derive from it.
    pub seed: u64,
    /// Singleton handling after optimization.
    pub singletons: SingletonPolicy,
    /// Starting assignment instead of singletons.
    pub initial_membership: Option<Vec<usize>>,
    /// Per-node sizes for pre-aggregated nodes.
    pub node_sizes: Option<Vec<f64>>,
    /// Worker threads for the starts. `None` uses the rayon default.
    pub threads: Option<usize>,
    /// Budget for the whole invocation.
    pub timeout: Option<Duration>,
    /// Out-of-process optimization.
    pub spill: Option<SpillConfig>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            resolution: 0.8,
            algorithm: Algorithm::Louvain,
            function: ModularityFunction::Standard,
            n_start: 10,
            n_iter: 10,
            seed: 0,
            singletons: SingletonPolicy::Merge,
            initial_membership: None,
            node_sizes: None,
            threads: None,
            timeout: None,
            spill: None,
        }
    }
}

impl ClusterConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resolution.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the modularity function.
    pub fn with_function(mut self, function: ModularityFunction) -> Self {
        self.function = function;
        self
    }

    /// Set the number of random starts.
    pub fn with_n_start(mut self, n_start: usize) -> Self {
        self.n_start = n_start;
        self
    }

    /// Set the maximum iterations per start.
    pub fn with_n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }

    /// Set the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the singleton policy.
    pub fn with_singletons(mut self, policy: SingletonPolicy) -> Self {
        self.singletons = policy;
        self
    }

    /// Start every run from this assignment.
    pub fn with_initial_membership(mut self, membership: Vec<usize>) -> Self {
        self.initial_membership = Some(membership);
        self
    }

    /// Weight nodes by these sizes.
    pub fn with_node_sizes(mut self, sizes: Vec<f64>) -> Self {
        self.node_sizes = Some(sizes);
        self
    }

    /// Size of the worker pool.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Abort outstanding starts after this long.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enable the out-of-process optimizer.
    pub fn with_spill(mut self, spill: SpillConfig) -> Self {
        self.spill = Some(spill);
        self
    }

    /// Check every option against a graph with `n_nodes` nodes.
    pub fn validate(&self, n_nodes: usize) -> Result<()> {
        if !(self.resolution > 0.0 && self.resolution.is_finite()) {
            return Err(Error::config(
                "resolution",
                format!("must be positive and finite, got {}", self.resolution),
            ));
        }
        if self.n_start == 0 {
            return Err(Error::config("n_start", "at least one start is required"));
        }
        if self.n_iter == 0 {
            return Err(Error::config("n_iter", "at least one iteration is required"));
        }
        if self.threads == Some(0) {
            return Err(Error::config("threads", "worker pool cannot be empty"));
        }
        if let Some(membership) = &self.initial_membership {
            if membership.len() != n_nodes {
                return Err(Error::config(
                    "initial_membership",
                    format!("has {} entries for {} nodes", membership.len(), n_nodes),
                ));
            }
        }
        if let Some(sizes) = &self.node_sizes {
            if sizes.len() != n_nodes {
                return Err(Error::config(
                    "node_sizes",
                    format!("has {} entries for {} nodes", sizes.len(), n_nodes),
                ));
            }
            if sizes.iter().any(|s| !(s.is_finite() && *s >= 0.0)) {
                return Err(Error::config(
                    "node_sizes",
                    "sizes must be finite and non-negative",
                ));
            }
        }
        if let Some(spill) = &self.spill {
            if spill.program.as_os_str().is_empty() {
                return Err(Error::config("spill", "optimizer program path is empty"));
            }
        }
        Ok(())
    }

    /// Check the options the external optimizer cannot honor.
    ///
    /// Only relevant once a graph is actually spilled; in-memory runs accept
    /// both initial membership and node sizes alongside a spill config.
    pub(crate) fn validate_spilled(&self) -> Result<()> {
        if self.initial_membership.is_some() || self.node_sizes.is_some() {
            return Err(Error::config(
                "spill",
                "the external optimizer takes neither initial membership nor node sizes",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = ClusterConfig::new();
        assert_eq!(c.resolution, 0.8);
        assert_eq!(c.algorithm, Algorithm::Louvain);
        assert_eq!(c.function, ModularityFunction::Standard);
        assert_eq!((c.n_start, c.n_iter, c.seed), (10, 10, 0));
        assert_eq!(c.singletons, SingletonPolicy::Merge);
        assert!(c.validate(3).is_ok());
    }

    #[test]
    fn test_codes_round_trip() {
        for alg in Algorithm::ALL {
            assert_eq!(Algorithm::try_from(alg.code()).unwrap(), alg);
            assert_eq!(alg.to_string().parse::<Algorithm>().unwrap(), alg);
        }
        assert_eq!("2".parse::<ModularityFunction>().unwrap(), ModularityFunction::Alternative);
        assert!(Algorithm::try_from(5).is_err());
        assert!(ModularityFunction::try_from(0).is_err());
        assert!("kmeans".parse::<Algorithm>().is_err());
    }

    #[test]
    fn test_invalid_resolution() {
        for r in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = ClusterConfig::new().with_resolution(r).validate(3).unwrap_err();
            assert!(matches!(err, Error::Configuration { name: "resolution", .. }));
        }
    }

    #[test]
    fn test_zero_starts() {
        let err = ClusterConfig::new().with_n_start(0).validate(3).unwrap_err();
        assert!(matches!(err, Error::Configuration { name: "n_start", .. }));
    }

    #[test]
    fn test_membership_length() {
        let c = ClusterConfig::new().with_initial_membership(vec![0, 0]);
        assert!(c.validate(2).is_ok());
        assert!(c.validate(3).is_err());
    }

    #[test]
    fn test_spill_rejects_node_sizes_only_when_spilled() {
        let c = ClusterConfig::new()
            .with_node_sizes(vec![1.0; 3])
            .with_spill(SpillConfig::new("commune-optimize"));
        assert!(c.validate(3).is_ok());
        let err = c.validate_spilled().unwrap_err();
        assert!(matches!(err, Error::Configuration { name: "spill", .. }));
        assert!(ClusterConfig::new().validate_spilled().is_ok());
    }

    #[test]
    fn test_spill_applies() {
        let s = SpillConfig::new("x");
        assert!(!s.applies_to(1_000_000));
        let s = s.with_edge_threshold(10);
        assert!(!s.applies_to(10));
        assert!(s.applies_to(11));
        assert!(SpillConfig::new("x").with_edge_file("/tmp/e.txt").applies_to(0));
    }
}
