use commune::{
    cluster, modularity, snn_graph, Algorithm, ClusterConfig, Graph, ModularityFunction,
    NeighborGraph, SingletonPolicy, SnnConfig, SnnWeight,
};
use proptest::prelude::*;

fn arb_graph() -> impl Strategy<Value = Graph> {
    (2usize..24).prop_flat_map(|n| {
        prop::collection::vec((0..n, 0..n, 0.0f64..5.0), 0..(3 * n)).prop_map(move |edges| {
            Graph::from_edges(n, edges).unwrap()
        })
    })
}

fn arb_algorithm() -> impl Strategy<Value = Algorithm> {
    prop::sample::select(Algorithm::ALL.to_vec())
}

/// Neighbor rows that list the node itself first, then `k - 1` distinct others.
fn arb_neighbors() -> impl Strategy<Value = NeighborGraph> {
    (3usize..16, 2usize..4).prop_flat_map(|(n, k)| {
        prop::collection::vec(prop::sample::subsequence((0..n).collect::<Vec<_>>(), k), n)
            .prop_map(move |picks| {
                let rows = picks
                    .into_iter()
                    .enumerate()
                    .map(|(i, mut row)| {
                        row.retain(|&j| j != i);
                        row.truncate(k - 1);
                        let mut out = vec![i];
                        out.extend(row);
                        // Pad with the lowest unused ids so every row has k entries.
                        let mut next = 0;
                        while out.len() < k {
                            if !out.contains(&next) {
                                out.push(next);
                            }
                            next += 1;
                        }
                        out
                    })
                    .collect();
                NeighborGraph::new(rows).unwrap()
            })
    })
}

proptest! {
    #[test]
    fn prop_labels_contiguous_and_size_sorted(
        graph in arb_graph(),
        algorithm in arb_algorithm(),
        seed in 0u64..1000
    ) {
        let config = ClusterConfig::new()
            .with_algorithm(algorithm)
            .with_n_start(2)
            .with_seed(seed);
        let partition = cluster(&graph, &config).unwrap();

        prop_assert_eq!(partition.len(), graph.node_count());
        let k = partition.n_clusters();
        for &l in partition.labels() {
            prop_assert!(l < k);
        }
        let sizes = partition.sizes();
        prop_assert!(sizes.iter().all(|&s| s > 0));
        prop_assert!(sizes.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn prop_deterministic(graph in arb_graph(), algorithm in arb_algorithm(), seed in 0u64..1000) {
        let config = ClusterConfig::new().with_algorithm(algorithm).with_n_start(3).with_seed(seed);
        prop_assert_eq!(cluster(&graph, &config).unwrap(), cluster(&graph, &config).unwrap());
    }

    #[test]
    fn prop_merge_leaves_only_edgeless_singletons(graph in arb_graph(), seed in 0u64..1000) {
        let config = ClusterConfig::new().with_seed(seed).with_n_start(2);
        let partition = cluster(&graph, &config).unwrap();
        let sizes = partition.sizes();
        for (node, &label) in partition.labels().iter().enumerate() {
            if sizes[label] == 1 {
                prop_assert_eq!(graph.degree(node), 0);
            }
        }
    }

    #[test]
    fn prop_isolate_keeps_at_most_one_singleton_cluster(graph in arb_graph(), seed in 0u64..1000) {
        let config = ClusterConfig::new()
            .with_seed(seed)
            .with_n_start(2)
            .with_singletons(SingletonPolicy::Isolate);
        let partition = cluster(&graph, &config).unwrap();
        prop_assert!(partition.sizes().iter().filter(|&&s| s == 1).count() <= 1);
    }

    #[test]
    fn prop_leiden_communities_connected(graph in arb_graph(), seed in 0u64..1000) {
        let config = ClusterConfig::new()
            .with_algorithm(Algorithm::Leiden)
            .with_seed(seed)
            .with_n_start(1)
            .with_singletons(SingletonPolicy::Isolate);
        let raw = commune::optimize(&graph, &config).unwrap().labels;

        // Every community must be reachable from its first member through
        // edges that stay inside the community.
        let n = graph.node_count();
        let mut seen = vec![false; n];
        let mut roots = std::collections::HashSet::new();
        for start in 0..n {
            if seen[start] {
                continue;
            }
            prop_assert!(roots.insert(raw[start]), "community {} is disconnected", raw[start]);
            let mut stack = vec![start];
            seen[start] = true;
            while let Some(v) = stack.pop() {
                for (u, _) in graph.neighbors(v) {
                    if !seen[u] && raw[u] == raw[v] {
                        seen[u] = true;
                        stack.push(u);
                    }
                }
            }
        }
    }

    #[test]
    fn prop_snn_weights_in_unit_interval(
        neighbors in arb_neighbors(),
        jaccard in any::<bool>()
    ) {
        let weight = if jaccard { SnnWeight::Jaccard } else { SnnWeight::Fraction };
        let graph = snn_graph(&neighbors, &SnnConfig::new().with_weight(weight)).unwrap();
        for (a, b, w) in graph.edges() {
            prop_assert!(a < b);
            prop_assert!(w > 0.0 && w <= 1.0);
            prop_assert_eq!(graph.edge_weight(b, a), w);
        }
    }

    #[test]
    fn prop_modularity_bounded(graph in arb_graph(), seed in 0u64..100) {
        let config = ClusterConfig::new().with_resolution(1.0).with_seed(seed).with_n_start(1);
        let outcome = commune::optimize(&graph, &config).unwrap();
        let q = modularity(&graph, &outcome.labels, 1.0, ModularityFunction::Standard).unwrap();
        prop_assert!(q <= 1.0 + 1e-9);
        prop_assert!((q - outcome.quality).abs() < 1e-9);
    }
}
