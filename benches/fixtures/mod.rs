// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use std::fmt::Write as _;

use dotflow::model::{Edge, Graph, NodeId, ATTR_LABEL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DagParams {
    pub layers: usize,
    pub nodes_per_layer: usize,
    pub fanout: usize,
    pub cross_edges_per_node: usize,
    pub label_len: usize,
}

impl DagParams {
    pub const fn new(
        layers: usize,
        nodes_per_layer: usize,
        fanout: usize,
        cross_edges_per_node: usize,
        label_len: usize,
    ) -> Self {
        Self { layers, nodes_per_layer, fanout, cross_edges_per_node, label_len }
    }

    pub const fn node_count(self) -> usize {
        self.layers * self.nodes_per_layer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Small,
    Medium,
    Large,
    LargeLongLabels,
}

impl Case {
    pub const ALL: [Self; 4] = [Self::Small, Self::Medium, Self::Large, Self::LargeLongLabels];

    pub const fn id(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::LargeLongLabels => "large_long_labels",
        }
    }

    pub const fn params(self) -> DagParams {
        match self {
            Self::Small => DagParams::new(5, 6, 2, 0, 8),
            Self::Medium => DagParams::new(10, 20, 3, 1, 12),
            Self::Large => DagParams::new(25, 40, 3, 1, 12),
            Self::LargeLongLabels => DagParams::new(25, 40, 3, 1, 48),
        }
    }
}

fn repeat_to_len(prefix: &str, fill: char, target_len: usize) -> String {
    if prefix.len() >= target_len {
        return prefix[..target_len].to_owned();
    }
    let mut out = String::with_capacity(target_len);
    out.push_str(prefix);
    while out.len() < target_len {
        out.push(fill);
    }
    out
}

fn node_name(layer: usize, idx: usize) -> String {
    format!("l{layer:02}_n{idx:04}")
}

fn nid(name: String) -> NodeId {
    NodeId::new(name).expect("valid node id")
}

/// Deterministic layered graph.
///
/// - Edges go from one layer to the next, plus optional skips further down.
/// - Every node gets a label padded to `label_len`.
pub fn dag(params: DagParams) -> Graph {
    assert!(params.layers >= 2, "layers must be >= 2");
    assert!(params.nodes_per_layer >= 1, "nodes_per_layer must be >= 1");
    assert!(params.fanout >= 1, "fanout must be >= 1");

    let mut graph = Graph::new();
    for layer in 0..params.layers {
        for idx in 0..params.nodes_per_layer {
            let name = node_name(layer, idx);
            let label = repeat_to_len(&format!("Node_{name}"), 'x', params.label_len);
            graph.ensure_node(nid(name)).set_attribute(ATTR_LABEL, label);
        }
    }

    let fanout = params.fanout.min(params.nodes_per_layer);
    for layer in 0..params.layers - 1 {
        for idx in 0..params.nodes_per_layer {
            for k in 0..fanout {
                let to_idx = (idx + k) % params.nodes_per_layer;
                graph.add_edge(Edge::new(
                    nid(node_name(layer, idx)),
                    nid(node_name(layer + 1, to_idx)),
                ));
            }

            if layer + 2 >= params.layers {
                continue;
            }
            let max_target_layers = params.layers - (layer + 2);
            for k in 0..params.cross_edges_per_node {
                let target_layer = layer + 2 + (k % max_target_layers);
                let to_idx = (idx + 1 + k.saturating_mul(3)) % params.nodes_per_layer;
                graph.add_edge(Edge::new(
                    nid(node_name(layer, idx)),
                    nid(node_name(target_layer, to_idx)),
                ));
            }
        }
    }

    graph
}

pub fn fixture(case: Case) -> Graph {
    dag(case.params())
}

/// DSL source producing the same graph as [`dag`].
pub fn dsl_source(params: DagParams) -> String {
    let graph = dag(params);
    let mut out = String::new();
    for node in graph.nodes() {
        let _ = writeln!(out, "{} [label=\"{}\"]", node.id(), node.label());
    }
    for (idx, edge) in graph.edges().iter().enumerate() {
        if idx % 5 == 0 {
            let _ = writeln!(out, "{} -> {} : e{idx}", edge.from(), edge.to());
        } else {
            let _ = writeln!(out, "{} -> {}", edge.from(), edge.to());
        }
    }
    out
}

/// Cheap fingerprint so parse results are not optimized away.
pub fn checksum(graph: &Graph) -> u64 {
    let mut acc = 0u64;
    for node in graph.nodes() {
        acc = acc.wrapping_mul(131).wrapping_add(node.id().as_str().len() as u64);
        acc = acc.wrapping_mul(131).wrapping_add(node.attributes().len() as u64);
    }
    for edge in graph.edges() {
        acc = acc.wrapping_mul(131).wrapping_add(edge.from().as_str().len() as u64);
        acc = acc.wrapping_mul(131).wrapping_add(edge.to().as_str().len() as u64);
        acc = acc.wrapping_mul(131).wrapping_add(edge.label().map_or(0, str::len) as u64);
    }
    acc
}
