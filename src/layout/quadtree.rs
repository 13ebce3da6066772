// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Barnes-Hut quadtree stored as an index arena.
//!
//! The tree is rebuilt from a position snapshot every iteration and only read afterwards, so
//! queries can run from many threads at once.

use smallvec::SmallVec;

use crate::model::Point;

/// Coincident bodies stop subdividing here and share one leaf.
const MAX_DEPTH: usize = 24;

type CellIdx = u32;

#[derive(Debug, Clone)]
struct Cell {
    /// Bottom-left corner of the square.
    min: Point,
    size: f64,
    depth: usize,
    mass: f64,
    center_of_mass: Point,
    children: Option<[CellIdx; 4]>,
    bodies: SmallVec<[usize; 2]>,
}

impl Cell {
    fn new(min: Point, size: f64, depth: usize) -> Self {
        Self {
            min,
            size,
            depth,
            mass: 0.0,
            center_of_mass: Point::ORIGIN,
            children: None,
            bodies: SmallVec::new(),
        }
    }

    fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x
            && p.x <= self.min.x + self.size
            && p.y >= self.min.y
            && p.y <= self.min.y + self.size
    }

    fn quadrant(&self, p: Point) -> usize {
        let half = self.size / 2.0;
        let east = p.x > self.min.x + half;
        let north = p.y > self.min.y + half;
        usize::from(east) | (usize::from(north) << 1)
    }
}

/// Something a body interacts with: another body, or an aggregated cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Interaction {
    pub(crate) center: Point,
    pub(crate) mass: f64,
    /// The other body's index when this is a single body.
    pub(crate) body: Option<usize>,
}

#[derive(Debug, Clone)]
pub(crate) struct QuadTree<'a> {
    positions: &'a [Point],
    cells: Vec<Cell>,
}

impl<'a> QuadTree<'a> {
    /// Builds the tree over `positions`. All positions must be finite.
    pub(crate) fn build(positions: &'a [Point]) -> Self {
        let mut tree = Self { positions, cells: Vec::with_capacity(positions.len() * 2 + 1) };
        let Some((min, size)) = bounding_square(positions) else {
            return tree;
        };
        tree.cells.push(Cell::new(min, size, 0));

        for body in 0..positions.len() {
            tree.insert(body);
        }
        tree.summarize();
        tree
    }

    fn insert(&mut self, body: usize) {
        let p = self.positions[body];
        let mut idx = 0usize;
        loop {
            if let Some(children) = self.cells[idx].children {
                idx = children[self.cells[idx].quadrant(p)] as usize;
                continue;
            }

            let cell = &self.cells[idx];
            if cell.bodies.is_empty() || cell.depth >= MAX_DEPTH {
                self.cells[idx].bodies.push(body);
                return;
            }

            self.subdivide(idx);
        }
    }

    fn subdivide(&mut self, idx: usize) {
        let Cell { min, size, depth, .. } = self.cells[idx];
        let half = size / 2.0;
        let first = self.cells.len() as CellIdx;
        for quadrant in 0..4 {
            let dx = if quadrant & 1 == 1 { half } else { 0.0 };
            let dy = if quadrant & 2 == 2 { half } else { 0.0 };
            self.cells.push(Cell::new(Point::new(min.x + dx, min.y + dy), half, depth + 1));
        }
        let children = [first, first + 1, first + 2, first + 3];

        let bodies = std::mem::take(&mut self.cells[idx].bodies);
        self.cells[idx].children = Some(children);
        for body in bodies {
            let quadrant = self.cells[idx].quadrant(self.positions[body]);
            self.cells[children[quadrant] as usize].bodies.push(body);
        }
    }

    /// Children always sit at higher indices than their parent, so one reverse sweep fills in
    /// every aggregate bottom-up.
    fn summarize(&mut self) {
        for idx in (0..self.cells.len()).rev() {
            let (mass, weighted) = match self.cells[idx].children {
                Some(children) => children.iter().fold((0.0, Point::ORIGIN), |(m, w), &child| {
                    let child = &self.cells[child as usize];
                    (m + child.mass, w + child.center_of_mass * child.mass)
                }),
                None => self.cells[idx]
                    .bodies
                    .iter()
                    .fold((0.0, Point::ORIGIN), |(m, w), &body| (m + 1.0, w + self.positions[body])),
            };
            let cell = &mut self.cells[idx];
            cell.mass = mass;
            cell.center_of_mass = if mass > 0.0 { weighted * (1.0 / mass) } else { Point::ORIGIN };
        }
    }

    /// Calls `visit` for everything `body` is repelled by.
    ///
    /// A cell is aggregated when `size / distance < theta` and `body` lies outside it; with
    /// `theta = 0` every other body is visited individually.
    pub(crate) fn for_each_interaction(
        &self,
        body: usize,
        theta: f64,
        mut visit: impl FnMut(Interaction),
    ) {
        if self.cells.is_empty() {
            return;
        }
        let p = self.positions[body];
        let mut stack: SmallVec<[CellIdx; 64]> = SmallVec::new();
        stack.push(0);

        while let Some(idx) = stack.pop() {
            let cell = &self.cells[idx as usize];
            if cell.mass == 0.0 {
                continue;
            }
            match cell.children {
                None => {
                    for &other in &cell.bodies {
                        if other != body {
                            visit(Interaction {
                                center: self.positions[other],
                                mass: 1.0,
                                body: Some(other),
                            });
                        }
                    }
                }
                Some(children) => {
                    let distance = p.distance(cell.center_of_mass);
                    if !cell.contains(p) && distance > 0.0 && cell.size / distance < theta {
                        visit(Interaction { center: cell.center_of_mass, mass: cell.mass, body: None });
                    } else {
                        // Reverse push keeps quadrant order on pop.
                        stack.extend(children.iter().rev().copied());
                    }
                }
            }
        }
    }

    #[cfg(test)]
    fn total_mass(&self) -> f64 {
        self.cells.first().map_or(0.0, |root| root.mass)
    }
}

/// Smallest axis-aligned square covering `positions`, or `None` when empty.
fn bounding_square(positions: &[Point]) -> Option<(Point, f64)> {
    let first = *positions.first()?;
    let (mut min, mut max) = (first, first);
    for p in &positions[1..] {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    let size = (max.x - min.x).max(max.y - min.y).max(1e-9);
    Some((min, size))
}
