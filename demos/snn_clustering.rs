use commune::{
    cluster, modularity, snn_graph, Algorithm, ClusterConfig, NeighborGraph, SnnConfig, SnnWeight,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Minimal end-to-end: distances -> kNN rows -> SNN graph -> clusters.
    //
    // Two obvious groups on a line. Neighbor search is out of scope for the
    // crate, so the demo brute-forces it.
    let points: Vec<f64> = vec![0.0, 0.1, 0.2, 0.3, 0.4, 10.0, 10.1, 10.2, 10.3, 10.4];
    let k = 4;

    let rows: Vec<Vec<(usize, f64)>> = points
        .iter()
        .map(|&p| {
            let mut row: Vec<(usize, f64)> = points
                .iter()
                .enumerate()
                .map(|(j, &q)| (j, (p - q).abs()))
                .collect();
            row.sort_by(|a, b| a.1.total_cmp(&b.1));
            row.truncate(k);
            row
        })
        .collect();
    let neighbors = NeighborGraph::from_distances(rows)?;

    let snn = SnnConfig::new()
        .with_weight(SnnWeight::Jaccard)
        .with_prune(1.0 / 15.0);
    let graph = snn_graph(&neighbors, &snn)?;

    println!(
        "n_nodes={} n_edges={}",
        graph.node_count(),
        graph.edge_count()
    );

    for algorithm in Algorithm::ALL {
        let config = ClusterConfig::new()
            .with_algorithm(algorithm)
            .with_resolution(0.8)
            .with_seed(1);
        let partition = cluster(&graph, &config)?;
        let q = modularity(&graph, partition.labels(), config.resolution, config.function)?;

        println!("{algorithm}: clusters={} quality={q:.4}", partition.n_clusters());
        for c in 0..partition.n_clusters() {
            println!("  cluster {}: {:?}", c, partition.members(c).collect::<Vec<_>>());
        }
    }

    Ok(())
}
