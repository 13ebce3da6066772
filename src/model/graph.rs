// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use smol_str::SmolStr;

use super::ids::{ClusterId, NodeId};
use super::point::Point;

/// String attributes attached to nodes, edges, and the graph itself.
///
/// Keys are unique; setting an existing key replaces only that key.
pub type Attributes = BTreeMap<SmolStr, String>;

pub const ATTR_LABEL: &str = "label";
pub const ATTR_SHAPE: &str = "shape";
pub const ATTR_KIND: &str = "kind";
pub const ATTR_STYLE: &str = "style";
pub const ATTR_CLUSTER: &str = "cluster";
pub const ATTR_POS: &str = "pos";

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    attributes: Attributes,
    position: Option<Point>,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Self { id, attributes: Attributes::new(), position: None }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Display text: the `label` attribute, falling back to the id.
    pub fn label(&self) -> &str {
        self.attribute(ATTR_LABEL).unwrap_or(self.id.as_str())
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn set_attribute(&mut self, key: impl Into<SmolStr>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Sets `key` only when the node does not carry it yet. Returns whether it was set.
    pub fn set_attribute_if_absent(
        &mut self,
        key: impl Into<SmolStr>,
        value: impl Into<String>,
    ) -> bool {
        let key = key.into();
        if self.attributes.contains_key(&key) {
            return false;
        }
        self.attributes.insert(key, value.into());
        true
    }

    pub fn merge_attributes(&mut self, attributes: Attributes) {
        self.attributes.extend(attributes);
    }

    pub fn position(&self) -> Option<Point> {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.position = Some(position);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    from: NodeId,
    to: NodeId,
    label: Option<String>,
    directed: bool,
    attributes: Attributes,
}

impl Edge {
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self { from, to, label: None, directed: true, attributes: Attributes::new() }
    }

    pub fn new_with(from: NodeId, to: NodeId, label: Option<String>, directed: bool) -> Self {
        Self { from, to, label, directed, attributes: Attributes::new() }
    }

    pub fn from(&self) -> &NodeId {
        &self.from
    }

    pub fn to(&self) -> &NodeId {
        &self.to
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn set_attribute(&mut self, key: impl Into<SmolStr>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn merge_attributes(&mut self, attributes: Attributes) {
        self.attributes.extend(attributes);
    }
}

/// A parsed graph: nodes in first-reference order, edges in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    index: BTreeMap<NodeId, usize>,
    edges: Vec<Edge>,
    attributes: Attributes,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        let idx = *self.index.get(id)?;
        self.nodes.get_mut(idx)
    }

    /// Index of `id` within [`Graph::nodes`].
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Returns the node for `id`, creating it with empty attributes when missing.
    pub fn ensure_node(&mut self, id: NodeId) -> &mut Node {
        let idx = match self.index.get(&id) {
            Some(&idx) => idx,
            None => {
                let idx = self.nodes.len();
                self.index.insert(id.clone(), idx);
                self.nodes.push(Node::new(id));
                idx
            }
        };
        &mut self.nodes[idx]
    }

    pub fn add_node(&mut self, id: NodeId) -> &mut Node {
        self.ensure_node(id)
    }

    /// Declares `id` (if needed) and merges `attributes` into it.
    pub fn merge_node_attributes(&mut self, id: NodeId, attributes: Attributes) -> &mut Node {
        let node = self.ensure_node(id);
        node.merge_attributes(attributes);
        node
    }

    /// Appends an edge, auto-creating both endpoints. Returns the edge index.
    pub fn add_edge(&mut self, edge: Edge) -> usize {
        self.ensure_node(edge.from.clone());
        self.ensure_node(edge.to.clone());
        self.edges.push(edge);
        self.edges.len() - 1
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn set_attribute(&mut self, key: impl Into<SmolStr>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn merge_attributes(&mut self, attributes: Attributes) {
        self.attributes.extend(attributes);
    }

    pub fn has_directed_edges(&self) -> bool {
        self.edges.iter().any(Edge::is_directed)
    }

    /// Groups node indices by their `cluster` attribute, in cluster-name order.
    ///
    /// Nodes whose `cluster` value is not a valid id are left ungrouped.
    pub fn clusters(&self) -> BTreeMap<ClusterId, Vec<usize>> {
        let mut clusters = BTreeMap::<ClusterId, Vec<usize>>::new();
        for (idx, node) in self.nodes.iter().enumerate() {
            let Some(name) = node.attribute(ATTR_CLUSTER) else {
                continue;
            };
            let Ok(cluster_id) = ClusterId::new(name) else {
                continue;
            };
            clusters.entry(cluster_id).or_default().push(idx);
        }
        clusters
    }
}
