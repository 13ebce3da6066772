// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use dotflow::layout::{layout_graph, Approximation, LayoutConfig};
use dotflow::model::{Edge, Graph, NodeId};
use proptest::prelude::*;

fn nid(value: String) -> NodeId {
    NodeId::new(value).expect("node id")
}

/// `n` nodes with edges taken from `pairs` (indices wrapped into range).
fn build_graph(n: usize, pairs: &[(usize, usize)]) -> Graph {
    let mut graph = Graph::new();
    for idx in 0..n {
        graph.ensure_node(nid(format!("n{idx}")));
    }
    for &(a, b) in pairs {
        graph.add_edge(Edge::new(nid(format!("n{}", a % n)), nid(format!("n{}", b % n))));
    }
    graph
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn positions_are_always_finite(
        n in 1usize..200,
        pairs in prop::collection::vec((0usize..200, 0usize..200), 0..300),
        seed in prop::sample::select(vec![0u64, 1, 7, 42, 1337, u64::MAX]),
        barnes_hut in any::<bool>(),
    ) {
        let graph = build_graph(n, &pairs);
        let mut config = LayoutConfig::default().with_seed(seed).with_iterations(40);
        if barnes_hut {
            config = config.with_approximation(Approximation::barnes_hut());
        }
        let layout = layout_graph(&graph, &config);

        prop_assert_eq!(layout.positions().len(), n);
        for (id, point) in layout.positions() {
            prop_assert!(point.is_finite(), "{} at {:?}", id, point);
        }
    }

    #[test]
    fn same_seed_gives_identical_positions(
        n in 2usize..80,
        pairs in prop::collection::vec((0usize..80, 0usize..80), 1..120),
        seed in any::<u64>(),
    ) {
        let graph = build_graph(n, &pairs);
        let config = LayoutConfig::default().with_seed(seed).with_iterations(30);
        prop_assert_eq!(layout_graph(&graph, &config), layout_graph(&graph, &config));
    }
}

#[test]
fn single_node_is_placed_without_iterating() {
    let graph = build_graph(1, &[]);
    let layout = layout_graph(&graph, &LayoutConfig::default().with_seed(5));
    assert_eq!(layout.iterations_run(), 0);
    assert!(layout.position("n0").expect("n0").is_finite());
}

#[test]
fn two_connected_nodes_settle_near_the_ideal_length() {
    let graph = build_graph(2, &[(0, 1)]);
    let config = LayoutConfig::default().with_seed(9);
    let layout = layout_graph(&graph, &config);
    let a = layout.position("n0").expect("n0");
    let b = layout.position("n1").expect("n1");
    let distance = a.distance(b);
    assert!((distance - config.ideal_edge_length).abs() < 1.0, "distance {distance}");
}

#[test]
fn large_graph_with_isolated_nodes_stays_finite() {
    let pairs: Vec<(usize, usize)> = (0..150).map(|idx| (idx, idx + 1)).collect();
    let graph = build_graph(200, &pairs);
    let config = LayoutConfig::default()
        .with_seed(3)
        .with_iterations(60)
        .with_approximation(Approximation::barnes_hut());
    let layout = layout_graph(&graph, &config);
    assert!(layout.positions().values().all(|p| p.is_finite()));
}
