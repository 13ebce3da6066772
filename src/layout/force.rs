// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use smallvec::SmallVec;

use super::config::{Approximation, AttractionModel, LayoutConfig};
use super::quadtree::{Interaction, QuadTree};
use crate::model::{Graph, NodeId, Point, ATTR_POS};

/// Below this many nodes the rayon fan-out costs more than it saves.
pub const PARALLEL_MIN_NODES: usize = 64;

/// Distances under this are treated as coincident.
const MIN_DISTANCE: f64 = 1e-6;
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;
const CANVAS_SCALE: f64 = 1.5;

/// Final node positions plus run metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphLayout {
    positions: BTreeMap<NodeId, Point>,
    seed: u64,
    iterations_run: usize,
    converged: bool,
}

impl GraphLayout {
    /// Wraps externally computed positions, e.g. ones read back from `pos` attributes.
    pub fn from_positions(positions: BTreeMap<NodeId, Point>) -> Self {
        Self { positions, seed: 0, iterations_run: 0, converged: true }
    }

    pub fn positions(&self) -> &BTreeMap<NodeId, Point> {
        &self.positions
    }

    pub fn position(&self, id: &str) -> Option<Point> {
        self.positions.get(id).copied()
    }

    /// Seed of the initial placement; pass it back in to reproduce the layout.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn iterations_run(&self) -> usize {
        self.iterations_run
    }

    /// Whether the run stopped early because displacements fell below the epsilon.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Writes the computed positions back onto `graph`'s nodes.
    pub fn apply_to(&self, graph: &mut Graph) {
        for (id, position) in &self.positions {
            if let Some(node) = graph.node_mut(id.as_str()) {
                node.set_position(*position);
            }
        }
    }
}

/// Computes a force-directed (Fruchterman-Reingold style) layout for `graph`.
///
/// Never fails: invalid config numbers fall back to defaults and non-finite displacements are
/// dropped for the iteration they occur in, so every returned position is finite. The same
/// graph, config and seed always produce bit-identical positions, with or without `parallel`.
pub fn layout_graph(graph: &Graph, config: &LayoutConfig) -> GraphLayout {
    let config = config.sanitized();
    let seed = config.seed.unwrap_or_else(rand::random);
    let ids = graph.nodes().iter().map(|node| node.id().clone()).collect::<Vec<_>>();

    let _span = tracing::debug_span!(
        "layout",
        nodes = ids.len(),
        edges = graph.edge_count(),
        seed,
        approximation = config.approximation.name(),
    )
    .entered();

    if ids.len() <= 1 {
        let positions = ids
            .into_iter()
            .map(|id| (id, initial_attribute_position(graph, 0).unwrap_or(Point::ORIGIN)))
            .collect();
        return GraphLayout { positions, seed, iterations_run: 0, converged: true };
    }

    let mut simulation = Simulation::new(graph, &config, seed);
    let (iterations_run, converged) = simulation.run(&ids);

    tracing::debug!(iterations_run, converged, "layout finished");
    let positions = ids.into_iter().zip(simulation.positions).collect();
    GraphLayout { positions, seed, iterations_run, converged }
}

fn initial_attribute_position(graph: &Graph, idx: usize) -> Option<Point> {
    let node = graph.nodes().get(idx)?;
    let raw = node.attribute(ATTR_POS)?;
    let parsed = Point::parse_pair(raw);
    if parsed.is_none() {
        tracing::warn!(node = %node.id(), value = raw, "ignoring unparsable pos attribute");
    }
    parsed
}

struct Simulation<'c> {
    config: &'c LayoutConfig,
    positions: Vec<Point>,
    /// Per node, the other endpoint of every incident non-loop edge (parallel edges repeat).
    neighbors: Vec<SmallVec<[usize; 4]>>,
    initial_temperature: f64,
}

impl<'c> Simulation<'c> {
    fn new(graph: &Graph, config: &'c LayoutConfig, seed: u64) -> Self {
        let n = graph.node_count();
        let side = canvas_side(n, config.ideal_edge_length);
        let half = side / 2.0;

        let mut rng = StdRng::seed_from_u64(seed);
        let mut positions = Vec::with_capacity(n);
        for idx in 0..n {
            // Draw for every node so fixed positions do not shift the random sequence.
            let random = Point::new(rng.random_range(-half..=half), rng.random_range(-half..=half));
            positions.push(initial_attribute_position(graph, idx).unwrap_or(random));
        }
        separate_coincident(&mut positions, config.ideal_edge_length);

        let mut neighbors = vec![SmallVec::new(); n];
        for edge in graph.edges().iter().filter(|edge| !edge.is_self_loop()) {
            let from = graph.node_index(edge.from().as_str());
            let to = graph.node_index(edge.to().as_str());
            let (Some(from), Some(to)) = (from, to) else {
                continue;
            };
            neighbors[from].push(to);
            neighbors[to].push(from);
        }

        Self {
            config,
            positions,
            neighbors,
            initial_temperature: config.initial_temperature.unwrap_or(side / 10.0),
        }
    }

    fn temperature(&self, iteration: usize) -> f64 {
        let progress = iteration as f64 / (self.config.iterations as f64 + 1.0);
        self.initial_temperature * (1.0 - progress)
    }

    /// Runs until the budget is spent or the simulation settles. Returns `(iterations, converged)`.
    fn run(&mut self, ids: &[NodeId]) -> (usize, bool) {
        let parallel = self.config.parallel && self.positions.len() >= PARALLEL_MIN_NODES;
        let mut rejected_total = 0usize;

        for iteration in 0..self.config.iterations {
            let temperature = self.temperature(iteration);
            let displacements = self.displacements(parallel);

            let mut max_step = 0.0f64;
            let mut rejected = 0usize;
            for (idx, displacement) in displacements.into_iter().enumerate() {
                let length = displacement.length();
                if !length.is_finite() {
                    if rejected_total + rejected == 0 {
                        tracing::warn!(node = %ids[idx], iteration, "rejected non-finite displacement");
                    }
                    rejected += 1;
                    continue;
                }
                let step = if length > temperature {
                    displacement * (temperature / length)
                } else {
                    displacement
                };
                let next = self.positions[idx] + step;
                if !next.is_finite() {
                    rejected += 1;
                    continue;
                }
                self.positions[idx] = next;
                max_step = max_step.max(step.length());
            }

            rejected_total += rejected;
            tracing::trace!(iteration, temperature, max_step, rejected, "layout iteration");

            // A node whose step was dropped has not settled.
            let settled = rejected == 0
                && self.config.convergence_epsilon.is_some_and(|epsilon| max_step < epsilon);
            if settled {
                if rejected_total > 0 {
                    tracing::warn!(rejected_total, "layout dropped non-finite displacements");
                }
                return (iteration + 1, true);
            }
        }

        if rejected_total > 0 {
            tracing::warn!(rejected_total, "layout dropped non-finite displacements");
        }
        (self.config.iterations, false)
    }

    /// Net displacement of every node against the current positions, in node order.
    fn displacements(&self, parallel: bool) -> Vec<Point> {
        let tree = match self.config.approximation {
            Approximation::Exact => None,
            Approximation::BarnesHut { theta } => Some((QuadTree::build(&self.positions), theta)),
        };
        let tree = tree.as_ref().map(|(tree, theta)| (tree, *theta));

        if parallel {
            (0..self.positions.len())
                .into_par_iter()
                .map(|idx| self.net_force(idx, tree))
                .collect()
        } else {
            (0..self.positions.len()).map(|idx| self.net_force(idx, tree)).collect()
        }
    }

    fn net_force(&self, idx: usize, tree: Option<(&QuadTree<'_>, f64)>) -> Point {
        let mut force = Point::ORIGIN;
        match tree {
            None => {
                for other in (0..self.positions.len()).filter(|&other| other != idx) {
                    force += self.repulsion(
                        idx,
                        Interaction { center: self.positions[other], mass: 1.0, body: Some(other) },
                    );
                }
            }
            Some((tree, theta)) => {
                tree.for_each_interaction(idx, theta, |interaction| {
                    force += self.repulsion(idx, interaction);
                });
            }
        }
        for &other in &self.neighbors[idx] {
            force += self.attraction(idx, other);
        }
        force
    }

    fn repulsion(&self, idx: usize, source: Interaction) -> Point {
        let delta = self.positions[idx] - source.center;
        let distance = delta.length();
        let (direction, distance) = if distance < MIN_DISTANCE {
            (pseudo_direction(idx, source.body), MIN_DISTANCE)
        } else {
            (delta * (1.0 / distance), distance)
        };
        let l = self.config.ideal_edge_length;
        let magnitude =
            self.config.repulsion_strength * l * l / distance.powf(self.config.repulsion_exponent);
        direction * (magnitude * source.mass)
    }

    fn attraction(&self, idx: usize, other: usize) -> Point {
        let delta = self.positions[other] - self.positions[idx];
        let distance = delta.length();
        if distance < MIN_DISTANCE {
            return Point::ORIGIN;
        }
        let l = self.config.ideal_edge_length;
        let magnitude = match self.config.attraction {
            AttractionModel::FruchtermanReingold => distance * distance / l,
            AttractionModel::Spring => distance - l,
            AttractionModel::Logarithmic => l * (distance / l).ln(),
        };
        delta * (magnitude / distance)
    }
}

fn canvas_side(n: usize, ideal_edge_length: f64) -> f64 {
    ideal_edge_length * (n as f64).sqrt().ceil() * CANVAS_SCALE
}

/// Unit vector for a coincident pair. Swapping the pair flips the sign, so both sides are
/// pushed apart.
fn pseudo_direction(idx: usize, other: Option<usize>) -> Point {
    let other = other.unwrap_or(usize::MAX);
    let (low, high) = if idx < other { (idx, other) } else { (other, idx) };
    let angle = GOLDEN_ANGLE * (low as f64 + 1.0) + (high % 1024) as f64;
    let sign = if idx < other { 1.0 } else { -1.0 };
    Point::new(angle.cos() * sign, angle.sin() * sign)
}

/// Spreads nodes that share an exact position along a golden-angle spiral.
fn separate_coincident(positions: &mut [Point], ideal_edge_length: f64) {
    let step = ideal_edge_length * 0.05;
    let mut seen: HashMap<(u64, u64), usize> = HashMap::with_capacity(positions.len());
    for position in positions.iter_mut() {
        // `+ 0.0` folds -0.0 into 0.0.
        let key = ((position.x + 0.0).to_bits(), (position.y + 0.0).to_bits());
        let count = seen.entry(key).or_insert(0);
        if *count > 0 {
            let k = *count as f64;
            let angle = GOLDEN_ANGLE * k;
            *position += Point::new(angle.cos(), angle.sin()) * (step * k.sqrt());
        }
        *count += 1;
    }
}
