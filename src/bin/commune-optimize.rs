//! commune-optimize - out-of-process modularity optimizer.
//!
//! Reads a whitespace-separated edge list (`node_a node_b weight`), runs the
//! multi-start engine and writes one raw cluster id per line. This is the
//! program the spill path invokes; it can also be run by hand:
//!
//! ```text
//! commune-optimize --input edges.txt --output membership.txt --algorithm 4 --seed 7
//! ```

use clap::Parser;
use commune::spill::{read_edge_list, write_membership};
use commune::{optimize, Algorithm, ClusterConfig, ModularityFunction};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Modularity optimization over an edge-list file.
#[derive(Parser, Debug)]
#[command(name = "commune-optimize")]
#[command(version)]
struct Cli {
    /// Edge list, one `node_a node_b weight` per line.
    #[arg(long)]
    input: PathBuf,

    /// Membership output, one cluster id per line in node order.
    #[arg(long)]
    output: PathBuf,

    /// Node count (default: one past the largest id in the edge list).
    #[arg(long)]
    nodes: Option<usize>,

    /// Modularity function: 1 = standard, 2 = alternative.
    #[arg(long, default_value = "1")]
    modularity: ModularityFunction,

    /// Resolution parameter.
    #[arg(long, default_value_t = 0.8)]
    resolution: f64,

    /// Algorithm: 1 = Louvain, 2 = multilevel Louvain, 3 = SLM, 4 = Leiden.
    #[arg(long, default_value = "1")]
    algorithm: Algorithm,

    /// Number of random starts.
    #[arg(long, default_value_t = 10)]
    n_start: usize,

    /// Maximum iterations per start.
    #[arg(long, default_value_t = 10)]
    n_iter: usize,

    /// Base random seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Worker threads (default: one per core).
    #[arg(long)]
    threads: Option<usize>,

    /// Give up after this many seconds (fractions allowed).
    #[arg(long)]
    timeout_secs: Option<f64>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "optimization failed");
            eprintln!("commune-optimize: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> commune::Result<()> {
    let graph = read_edge_list(BufReader::new(File::open(&cli.input)?), cli.nodes)?;

    let mut config = ClusterConfig::new()
        .with_function(cli.modularity)
        .with_resolution(cli.resolution)
        .with_algorithm(cli.algorithm)
        .with_n_start(cli.n_start)
        .with_n_iter(cli.n_iter)
        .with_seed(cli.seed);
    if let Some(threads) = cli.threads {
        config = config.with_threads(threads);
    }
    if let Some(secs) = cli.timeout_secs {
        let timeout = Duration::try_from_secs_f64(secs)
            .map_err(|e| commune::Error::Configuration {
                name: "timeout",
                message: format!("{secs}: {e}"),
            })?;
        config = config.with_timeout(timeout);
    }

    tracing::info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        algorithm = %config.algorithm,
        "read edge list"
    );
    let outcome = optimize(&graph, &config)?;
    tracing::info!(
        quality = outcome.quality,
        start = outcome.start,
        "writing membership"
    );

    write_membership(&outcome.labels, File::create(&cli.output)?)
}
