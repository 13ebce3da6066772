// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::graph::{Edge, Graph, ATTR_LABEL, ATTR_SHAPE};
use super::ids::NodeId;

fn nid(value: &str) -> NodeId {
    NodeId::new(value).expect("node id")
}

pub(crate) fn small_dag() -> Graph {
    let mut graph = Graph::new();

    graph.ensure_node(nid("a")).set_attribute(ATTR_LABEL, "A");
    graph.ensure_node(nid("b")).set_attribute(ATTR_LABEL, "B");
    graph.ensure_node(nid("c")).set_attribute(ATTR_SHAPE, "diamond");
    graph.ensure_node(nid("d")).set_attribute(ATTR_SHAPE, "ellipse");

    graph.add_edge(Edge::new(nid("a"), nid("b")));
    graph.add_edge(Edge::new(nid("a"), nid("c")));
    graph.add_edge(Edge::new_with(nid("b"), nid("d"), Some("done".to_owned()), true));
    graph.add_edge(Edge::new(nid("c"), nid("d")));

    graph
}

pub(crate) fn two_nodes_one_edge() -> Graph {
    let mut graph = Graph::new();
    graph.add_edge(Edge::new(nid("a"), nid("b")));
    graph
}

/// A ring of `n` nodes named `n0..n{n-1}`, plus `isolated` nodes without edges.
pub(crate) fn ring_with_isolated(n: usize, isolated: usize) -> Graph {
    let mut graph = Graph::new();
    for idx in 0..n {
        let next = (idx + 1) % n.max(1);
        if n > 1 {
            graph.add_edge(Edge::new(nid(&format!("n{idx}")), nid(&format!("n{next}"))));
        } else {
            graph.ensure_node(nid(&format!("n{idx}")));
        }
    }
    for idx in 0..isolated {
        graph.ensure_node(nid(&format!("iso{idx}")));
    }
    graph
}

/// Parallel edges and a self-loop.
pub(crate) fn multi_edges() -> Graph {
    let mut graph = Graph::new();
    graph.add_edge(Edge::new_with(nid("a"), nid("b"), Some("first".to_owned()), true));
    graph.add_edge(Edge::new_with(nid("a"), nid("b"), Some("second".to_owned()), true));
    graph.add_edge(Edge::new_with(nid("b"), nid("a"), None, false));
    graph.add_edge(Edge::new_with(nid("b"), nid("b"), Some("retry".to_owned()), true));
    graph
}
