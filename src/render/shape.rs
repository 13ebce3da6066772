// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use smallvec::SmallVec;

use super::text::text_width;
use crate::model::Point;

const PARALLELOGRAM_SKEW: f64 = 0.18;

/// Geometric node outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    #[default]
    Rect,
    Rounded,
    Ellipse,
    Circle,
    Diamond,
    Hexagon,
    Parallelogram,
    Triangle,
}

impl Shape {
    /// Parses a geometric shape name or alias (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let shape = match name.trim().to_ascii_lowercase().as_str() {
            "rect" | "rectangle" | "box" | "square" => Self::Rect,
            "rounded" | "round" | "roundrect" => Self::Rounded,
            "ellipse" | "oval" => Self::Ellipse,
            "circle" => Self::Circle,
            "diamond" | "rhombus" => Self::Diamond,
            "hexagon" => Self::Hexagon,
            "parallelogram" => Self::Parallelogram,
            "triangle" => Self::Triangle,
            _ => return None,
        };
        Some(shape)
    }
}

/// A node's outline placed on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NodeBox {
    pub(crate) shape: Shape,
    pub(crate) center: Point,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

impl NodeBox {
    /// Sizes the outline so `label` fits inside it.
    pub(crate) fn for_label(shape: Shape, center: Point, label: &str, font_size: f64) -> Self {
        let padding = font_size;
        let text_w = text_width(label, font_size).max(font_size);
        let base_w = text_w + 2.0 * padding;
        let base_h = font_size * 2.4;

        let (width, height) = match shape {
            Shape::Rect | Shape::Rounded => (base_w, base_h),
            Shape::Ellipse => (base_w * 1.3, base_h * 1.3),
            Shape::Circle => {
                let d = base_w.max(base_h) * 1.1;
                (d, d)
            }
            Shape::Diamond => (base_w * 1.6, base_h * 1.8),
            Shape::Hexagon => (base_w * 1.3, base_h),
            Shape::Parallelogram => (base_w * (1.0 + 2.0 * PARALLELOGRAM_SKEW), base_h),
            Shape::Triangle => (base_w * 2.0, base_h * 2.0),
        };
        Self { shape, center, width, height }
    }

    pub(crate) fn half_width(&self) -> f64 {
        self.width / 2.0
    }

    pub(crate) fn half_height(&self) -> f64 {
        self.height / 2.0
    }

    /// Outline vertices for polygonal shapes, clockwise in y-down coordinates.
    pub(crate) fn polygon(&self) -> Option<SmallVec<[Point; 6]>> {
        let Point { x: cx, y: cy } = self.center;
        let (hw, hh) = (self.half_width(), self.half_height());
        let points: SmallVec<[Point; 6]> = match self.shape {
            Shape::Diamond => SmallVec::from_slice(&[
                Point::new(cx, cy - hh),
                Point::new(cx + hw, cy),
                Point::new(cx, cy + hh),
                Point::new(cx - hw, cy),
            ]),
            Shape::Hexagon => SmallVec::from_slice(&[
                Point::new(cx - hw * 0.5, cy - hh),
                Point::new(cx + hw * 0.5, cy - hh),
                Point::new(cx + hw, cy),
                Point::new(cx + hw * 0.5, cy + hh),
                Point::new(cx - hw * 0.5, cy + hh),
                Point::new(cx - hw, cy),
            ]),
            Shape::Parallelogram => {
                let skew = self.width * PARALLELOGRAM_SKEW;
                SmallVec::from_slice(&[
                    Point::new(cx - hw + skew, cy - hh),
                    Point::new(cx + hw, cy - hh),
                    Point::new(cx + hw - skew, cy + hh),
                    Point::new(cx - hw, cy + hh),
                ])
            }
            Shape::Triangle => SmallVec::from_slice(&[
                Point::new(cx, cy - hh),
                Point::new(cx + hw, cy + hh),
                Point::new(cx - hw, cy + hh),
            ]),
            Shape::Rect | Shape::Rounded | Shape::Ellipse | Shape::Circle => return None,
        };
        Some(points)
    }

    /// Where the ray from the center toward `target` leaves the outline.
    ///
    /// Returns the center when `target` coincides with it.
    pub(crate) fn boundary_toward(&self, target: Point) -> Point {
        let delta = target - self.center;
        let length = delta.length();
        if length < 1e-9 {
            return self.center;
        }
        let dir = delta * (1.0 / length);
        let (hw, hh) = (self.half_width(), self.half_height());

        let t = match self.shape {
            Shape::Rect | Shape::Rounded => {
                let tx = if dir.x.abs() > 1e-12 { hw / dir.x.abs() } else { f64::INFINITY };
                let ty = if dir.y.abs() > 1e-12 { hh / dir.y.abs() } else { f64::INFINITY };
                tx.min(ty)
            }
            Shape::Ellipse => 1.0 / ((dir.x / hw).powi(2) + (dir.y / hh).powi(2)).sqrt(),
            Shape::Circle => hw.min(hh),
            Shape::Diamond | Shape::Hexagon | Shape::Parallelogram | Shape::Triangle => self
                .polygon()
                .and_then(|points| ray_exit(self.center, dir, &points))
                .unwrap_or(hw.min(hh)),
        };
        self.center + dir * t
    }
}

/// Smallest positive ray parameter at which `origin + t * dir` crosses the polygon outline.
fn ray_exit(origin: Point, dir: Point, polygon: &[Point]) -> Option<f64> {
    let mut best: Option<f64> = None;
    for (idx, &a) in polygon.iter().enumerate() {
        let b = polygon[(idx + 1) % polygon.len()];
        let edge = b - a;
        let denom = cross(dir, edge);
        if denom.abs() < 1e-12 {
            continue;
        }
        let offset = a - origin;
        let t = cross(offset, edge) / denom;
        let s = cross(offset, dir) / denom;
        if t > 1e-9 && (-1e-9..=1.0 + 1e-9).contains(&s) {
            best = Some(best.map_or(t, |current| current.min(t)));
        }
    }
    best
}

fn cross(a: Point, b: Point) -> f64 {
    a.x * b.y - a.y * b.x
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{NodeBox, Shape};
    use crate::model::Point;

    #[rstest]
    #[case("box", Shape::Rect)]
    #[case("Rectangle", Shape::Rect)]
    #[case("oval", Shape::Ellipse)]
    #[case("rhombus", Shape::Diamond)]
    #[case("hexagon", Shape::Hexagon)]
    fn aliases_resolve(#[case] name: &str, #[case] shape: Shape) {
        assert_eq!(Shape::from_name(name), Some(shape));
    }

    #[test]
    fn non_geometric_names_are_not_shapes() {
        assert_eq!(Shape::from_name("decision"), None);
        assert_eq!(Shape::from_name("cylinder"), None);
    }

    #[test]
    fn longer_labels_get_wider_boxes() {
        let short = NodeBox::for_label(Shape::Rect, Point::ORIGIN, "A", 14.0);
        let long = NodeBox::for_label(Shape::Rect, Point::ORIGIN, "A much longer label", 14.0);
        assert!(long.width > short.width);
        assert_eq!(long.height, short.height);
    }

    #[rstest]
    #[case(Shape::Rect)]
    #[case(Shape::Rounded)]
    #[case(Shape::Ellipse)]
    #[case(Shape::Circle)]
    #[case(Shape::Diamond)]
    #[case(Shape::Hexagon)]
    #[case(Shape::Parallelogram)]
    #[case(Shape::Triangle)]
    fn boundary_points_stay_on_the_outline_side(#[case] shape: Shape) {
        let node = NodeBox::for_label(shape, Point::new(100.0, 50.0), "Label", 14.0);
        for (dx, dy) in [(1.0, 0.0), (0.0, 1.0), (-1.0, -1.0), (3.0, -1.0)] {
            let target = Point::new(100.0 + dx * 1000.0, 50.0 + dy * 1000.0);
            let exit = node.boundary_toward(target);
            assert!(exit.is_finite());
            assert!(exit.distance(node.center) > 0.0);
            assert!((exit.x - node.center.x).abs() <= node.half_width() + 1e-6);
            assert!((exit.y - node.center.y).abs() <= node.half_height() + 1e-6);
        }
    }

    #[test]
    fn rect_boundary_hits_the_side() {
        let node = NodeBox { shape: Shape::Rect, center: Point::ORIGIN, width: 40.0, height: 20.0 };
        assert_eq!(node.boundary_toward(Point::new(100.0, 0.0)), Point::new(20.0, 0.0));
        assert_eq!(node.boundary_toward(Point::new(0.0, -100.0)), Point::new(0.0, -10.0));
        assert_eq!(node.boundary_toward(Point::ORIGIN), Point::ORIGIN);
    }

    #[test]
    fn diamond_boundary_hits_the_tip() {
        let node =
            NodeBox { shape: Shape::Diamond, center: Point::ORIGIN, width: 40.0, height: 20.0 };
        let exit = node.boundary_toward(Point::new(100.0, 0.0));
        assert!((exit.x - 20.0).abs() < 1e-9 && exit.y.abs() < 1e-9, "{exit:?}");
    }
}
