//! Out-of-process optimization through plain-text files.
//!
//! Graphs too large to optimize in this process are written as an edge list
//! (`node_a node_b weight` per line, 0-indexed, no header), handed to an
//! optimizer executable, and its membership file (one cluster id per line, in
//! node order) is read back. The `commune-optimize` binary built from this
//! crate speaks the protocol and runs the same engine, so both paths produce
//! the same partition for the same seed.
//!
//! Every file lives under a unique name in the working directory and is
//! removed when the invocation ends, successfully or not, unless
//! [`SpillConfig::keep_files`] is set.

use crate::config::{ClusterConfig, SpillConfig};
use crate::error::{Error, Result};
use crate::graph::Graph;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempPath;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Write every edge once, canonical order, as `a b weight` lines.
///
/// Weights use the shortest representation that parses back to the same
/// `f64`, so [`read_edge_list`] restores the graph exactly.
pub fn write_edge_list<W: Write>(graph: &Graph, writer: W) -> Result<()> {
    let mut out = BufWriter::new(writer);
    for (a, b, w) in graph.edges() {
        writeln!(out, "{a} {b} {w}")?;
    }
    out.flush()?;
    Ok(())
}

/// Parse an edge list into a [`Graph`].
///
/// Blank lines and lines starting with `#` are skipped. With `nodes` unset
/// the node count is one past the largest id seen.
pub fn read_edge_list<R: BufRead>(reader: R, nodes: Option<usize>) -> Result<Graph> {
    let mut edges = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(a), Some(b), Some(w), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(Error::malformed(format!(
                "edge list line {}: expected 3 fields, got '{line}'",
                lineno + 1
            )));
        };
        let parse_id = |s: &str| {
            s.parse::<usize>().map_err(|e| {
                Error::malformed(format!("edge list line {}: node id '{s}': {e}", lineno + 1))
            })
        };
        let weight = w.parse::<f64>().map_err(|e| {
            Error::malformed(format!("edge list line {}: weight '{w}': {e}", lineno + 1))
        })?;
        edges.push((parse_id(a)?, parse_id(b)?, weight));
    }

    let n = nodes.unwrap_or_else(|| {
        edges
            .iter()
            .map(|&(a, b, _)| a.max(b) + 1)
            .max()
            .unwrap_or(0)
    });
    Graph::from_edges(n, edges)
}

/// Write one cluster id per line.
pub fn write_membership<W: Write>(labels: &[usize], writer: W) -> Result<()> {
    let mut out = BufWriter::new(writer);
    for label in labels {
        writeln!(out, "{label}")?;
    }
    out.flush()?;
    Ok(())
}

/// Read one cluster id per line, expecting exactly `nodes` lines.
///
/// Ids must be below `nodes`: a partition of `n` nodes never needs more than
/// `n` clusters. A membership file is the optimizer's output, so every defect
/// is reported as [`Error::ExternalProcess`].
pub fn read_membership<R: BufRead>(reader: R, nodes: usize) -> Result<Vec<usize>> {
    let mut labels = Vec::with_capacity(nodes);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let label = line.parse::<usize>().map_err(|e| {
            Error::external(format!("membership line {}: '{line}': {e}", lineno + 1))
        })?;
        if label >= nodes {
            return Err(Error::external(format!(
                "membership line {}: cluster id {label} out of range for {nodes} nodes",
                lineno + 1
            )));
        }
        labels.push(label);
    }
    if labels.len() != nodes {
        return Err(Error::external(format!(
            "membership has {} entries for {} nodes",
            labels.len(),
            nodes
        )));
    }
    Ok(labels)
}

/// Optimize `graph` with the external program named in `spill`.
///
/// Returns raw labels; singleton handling and renumbering happen in the
/// caller exactly as for the in-process engine.
pub fn run_external(
    graph: &Graph,
    config: &ClusterConfig,
    spill: &SpillConfig,
) -> Result<Vec<usize>> {
    config.validate_spilled()?;
    let edges = write_edges(graph, spill)?;
    let membership = tempfile::Builder::new()
        .prefix("commune-membership-")
        .suffix(".txt")
        .tempfile_in(&spill.working_dir)?
        .into_temp_path();

    tracing::debug!(
        program = %spill.program.display(),
        edges_file = %edges.display(),
        edges = graph.edge_count(),
        "spilling graph to external optimizer"
    );
    let result = invoke(graph.node_count(), config, spill, &edges, &membership);

    if spill.keep_files {
        let edges = edges.keep().map_err(|e| Error::Io(e.error))?;
        let membership = membership.keep().map_err(|e| Error::Io(e.error))?;
        tracing::info!(
            edges = %edges.display(),
            membership = %membership.display(),
            "kept spill files"
        );
    }
    result
}

/// Write the edge list to the configured file or a fresh one.
fn write_edges(graph: &Graph, spill: &SpillConfig) -> Result<TempPath> {
    match &spill.edge_file {
        Some(path) => {
            let file = File::create(path)?;
            // Owned from here on: removed on drop like a temporary file.
            let owned = TempPath::from_path(path);
            write_edge_list(graph, file)?;
            Ok(owned)
        }
        None => {
            let mut file = tempfile::Builder::new()
                .prefix("commune-edges-")
                .suffix(".txt")
                .tempfile_in(&spill.working_dir)?;
            write_edge_list(graph, file.as_file_mut())?;
            Ok(file.into_temp_path())
        }
    }
}

fn invoke(
    nodes: usize,
    config: &ClusterConfig,
    spill: &SpillConfig,
    edges: &Path,
    membership: &Path,
) -> Result<Vec<usize>> {
    let mut cmd = Command::new(&spill.program);
    cmd.arg("--input")
        .arg(edges)
        .arg("--output")
        .arg(membership)
        .args(["--nodes", &nodes.to_string()])
        .args(["--modularity", &config.function.code().to_string()])
        .args(["--resolution", &config.resolution.to_string()])
        .args(["--algorithm", &config.algorithm.code().to_string()])
        .args(["--n-start", &config.n_start.to_string()])
        .args(["--n-iter", &config.n_iter.to_string()])
        .args(["--seed", &config.seed.to_string()]);
    if let Some(threads) = config.threads {
        cmd.args(["--threads", &threads.to_string()]);
    }
    if let Some(timeout) = config.timeout {
        cmd.args(["--timeout-secs", &timeout.as_secs_f64().to_string()]);
    }
    cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| {
        Error::external(format!("failed to start {}: {e}", spill.program.display()))
    })?;

    // Drain stderr concurrently so a chatty child never blocks on a full pipe.
    let stderr = child.stderr.take().map(|mut pipe| {
        std::thread::spawn(move || {
            let mut text = String::new();
            let _ = pipe.read_to_string(&mut text);
            text
        })
    });

    let status = wait(&mut child, spill.timeout)?;
    let stderr = stderr
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();

    let Some(status) = status else {
        tracing::warn!(timeout = ?spill.timeout, "external optimizer timed out");
        return Err(Error::external(format!(
            "{} did not finish within {:?}",
            spill.program.display(),
            spill.timeout.unwrap_or_default()
        )));
    };
    if !status.success() {
        return Err(Error::external(format!(
            "{} exited with {status}: {}",
            spill.program.display(),
            stderr.trim()
        )));
    }

    let file = File::open(membership)
        .map_err(|e| Error::external(format!("membership file unreadable: {e}")))?;
    read_membership(BufReader::new(file), nodes)
}

/// Wait for `child`, killing it when `timeout` expires (`Ok(None)`).
fn wait(child: &mut Child, timeout: Option<Duration>) -> Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return Ok(Some(child.wait()?));
    };
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}
