use commune::{
    cluster, cluster_neighbors, Algorithm, ClusterConfig, Error, Graph, ModularityFunction,
    NeighborGraph, SingletonPolicy, SnnConfig,
};

fn two_triangles() -> Graph {
    Graph::from_edges(
        6,
        vec![
            (0, 1, 1.0),
            (1, 2, 1.0),
            (0, 2, 1.0),
            (3, 4, 1.0),
            (4, 5, 1.0),
            (3, 5, 1.0),
        ],
    )
    .unwrap()
}

/// `cliques` cliques of `size` nodes in a ring, neighbors joined by one edge.
fn ring_of_cliques(cliques: usize, size: usize) -> Graph {
    let mut edges = Vec::new();
    for q in 0..cliques {
        let base = q * size;
        for a in 0..size {
            for b in (a + 1)..size {
                edges.push((base + a, base + b, 1.0));
            }
        }
        edges.push((base + size - 1, ((q + 1) % cliques) * size, 1.0));
    }
    Graph::from_edges(cliques * size, edges).unwrap()
}

#[test]
fn two_triangles_split_for_every_algorithm_and_seed() {
    let graph = two_triangles();
    for algorithm in Algorithm::ALL {
        for seed in 0..8 {
            let config = ClusterConfig::new().with_algorithm(algorithm).with_seed(seed);
            let partition = cluster(&graph, &config).unwrap();
            assert_eq!(partition.labels(), &[0, 0, 0, 1, 1, 1], "{algorithm} seed {seed}");
        }
    }
}

#[test]
fn isolated_node_stays_alone_next_to_clique() {
    let mut edges = Vec::new();
    for a in 0..4 {
        for b in (a + 1)..4 {
            edges.push((a, b, 1.0));
        }
    }
    let graph = Graph::from_edges(5, edges).unwrap();

    for algorithm in Algorithm::ALL {
        let config = ClusterConfig::new()
            .with_algorithm(algorithm)
            .with_singletons(SingletonPolicy::Merge);
        let partition = cluster(&graph, &config).unwrap();
        assert_eq!(partition.sizes(), vec![4, 1]);
        assert_eq!(partition.labels()[4], 1);
    }
}

#[test]
fn repeated_runs_are_identical() {
    let graph = ring_of_cliques(8, 5);
    for algorithm in Algorithm::ALL {
        let config = ClusterConfig::new()
            .with_algorithm(algorithm)
            .with_seed(1234)
            .with_resolution(1.0);
        let a = cluster(&graph, &config).unwrap();
        let b = cluster(&graph, &config).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn ring_of_cliques_recovers_every_clique() {
    let graph = ring_of_cliques(10, 5);
    for algorithm in Algorithm::ALL {
        let config = ClusterConfig::new().with_algorithm(algorithm).with_resolution(1.0);
        let partition = cluster(&graph, &config).unwrap();
        assert_eq!(partition.n_clusters(), 10, "{algorithm}");
        for q in 0..10 {
            let first = partition.labels()[q * 5];
            assert!((1..5).all(|i| partition.labels()[q * 5 + i] == first));
        }
    }
}

#[test]
fn higher_resolution_gives_at_least_as_many_clusters() {
    // Statistical over seeds: compare mean cluster counts.
    let graph = ring_of_cliques(12, 4);
    let mean_clusters = |resolution: f64| {
        let total: usize = (0..5)
            .map(|seed| {
                let config = ClusterConfig::new()
                    .with_resolution(resolution)
                    .with_seed(seed)
                    .with_n_start(2);
                cluster(&graph, &config).unwrap().n_clusters()
            })
            .sum();
        total as f64 / 5.0
    };
    let coarse = mean_clusters(0.05);
    let default = mean_clusters(1.0);
    let fine = mean_clusters(8.0);
    assert!(coarse <= default, "{coarse} > {default}");
    assert!(default <= fine, "{default} > {fine}");
}

#[test]
fn alternative_modularity_splits_triangles() {
    let config = ClusterConfig::new()
        .with_function(ModularityFunction::Alternative)
        .with_resolution(0.5);
    let partition = cluster(&two_triangles(), &config).unwrap();
    assert_eq!(partition.labels(), &[0, 0, 0, 1, 1, 1]);
}

#[test]
fn snn_pipeline_separates_neighbor_groups() {
    // Two groups of five; every node's 4 nearest neighbors are in its group.
    let rows = (0..10)
        .map(|i| {
            let base = (i / 5) * 5;
            let mut row = vec![i];
            row.extend((base..base + 5).filter(|&j| j != i).take(3));
            row
        })
        .collect();
    let neighbors = NeighborGraph::new(rows).unwrap();
    let partition =
        cluster_neighbors(&neighbors, &SnnConfig::new(), &ClusterConfig::new()).unwrap();
    assert_eq!(partition.sizes(), vec![5, 5]);
    assert!(partition.labels()[..5].iter().all(|&l| l == 0));
    assert!(partition.labels()[5..].iter().all(|&l| l == 1));
}

#[test]
fn node_id_equal_to_count_is_malformed() {
    let err = Graph::from_edges(3, vec![(0, 1, 1.0), (1, 3, 1.0)]).unwrap_err();
    assert!(matches!(err, Error::MalformedGraph { .. }));
}

#[test]
fn configuration_errors_come_first() {
    let graph = two_triangles();
    for config in [
        ClusterConfig::new().with_resolution(0.0),
        ClusterConfig::new().with_resolution(-2.0),
        ClusterConfig::new().with_n_start(0),
        ClusterConfig::new().with_initial_membership(vec![0; 5]),
    ] {
        assert!(matches!(cluster(&graph, &config), Err(Error::Configuration { .. })));
    }
}

#[test]
fn graph_without_edges_is_all_singletons() {
    let partition = cluster(&Graph::empty(4), &ClusterConfig::new()).unwrap();
    assert_eq!(partition.labels(), &[0, 1, 2, 3]);

    let config = ClusterConfig::new().with_singletons(SingletonPolicy::Isolate);
    let partition = cluster(&Graph::empty(4), &config).unwrap();
    assert_eq!(partition.labels(), &[0, 0, 0, 0]);
}
