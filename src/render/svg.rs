// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fmt;

use smallvec::SmallVec;

use super::shape::{NodeBox, Shape};
use super::style::{RenderLayer, Style};
use super::text::{escape_xml, text_width};
use crate::layout::GraphLayout;
use crate::model::{Edge, Graph, Node, Point, ATTR_KIND, ATTR_SHAPE, ATTR_STYLE};

const ATTR_COLOR: &str = "color";
const ATTR_FONTCOLOR: &str = "fontcolor";
const ATTR_FILL: &str = "fill";
const ATTR_FILLCOLOR: &str = "fillcolor";
const ATTR_STROKE: &str = "stroke";
const ATTR_ARROWHEAD: &str = "arrowhead";

const STROKE_WIDTH: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    UnknownShape { node: String, attribute: &'static str, value: String },
    UnknownEdgeStyle { from: String, to: String, value: String },
    UnknownArrowhead { from: String, to: String, value: String },
    MissingStyleField { field: &'static str },
    InvalidStyleValue { field: &'static str, value: String },
    /// The layout has no (finite) position for this node.
    MissingPosition { node: String },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownShape { node, attribute, value } => {
                write!(f, "node {node}: unknown {attribute} {value:?}")
            }
            Self::UnknownEdgeStyle { from, to, value } => write!(
                f,
                "edge {from} -> {to}: unknown style {value:?} (expected solid, dashed, dotted or bold)"
            ),
            Self::UnknownArrowhead { from, to, value } => write!(
                f,
                "edge {from} -> {to}: unknown arrowhead {value:?} (expected normal, open or none)"
            ),
            Self::MissingStyleField { field } => write!(f, "style field {field} is empty"),
            Self::InvalidStyleValue { field, value } => {
                write!(f, "invalid style value for {field}: {value}")
            }
            Self::MissingPosition { node } => write!(f, "layout has no position for node {node}"),
        }
    }
}

impl std::error::Error for RenderError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stroke {
    Solid,
    Dashed,
    Dotted,
    Bold,
}

impl Stroke {
    fn from_name(name: &str) -> Option<Self> {
        let stroke = match name.trim().to_ascii_lowercase().as_str() {
            "solid" => Self::Solid,
            "dashed" => Self::Dashed,
            "dotted" => Self::Dotted,
            "bold" => Self::Bold,
            _ => return None,
        };
        Some(stroke)
    }

    fn width(self) -> f64 {
        match self {
            Self::Bold => STROKE_WIDTH * 2.0,
            _ => STROKE_WIDTH,
        }
    }

    fn dasharray(self) -> Option<&'static str> {
        match self {
            Self::Dashed => Some("6 4"),
            Self::Dotted => Some("2 4"),
            Self::Solid | Self::Bold => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Arrowhead {
    Normal,
    Open,
    None,
}

impl Arrowhead {
    fn from_name(name: &str) -> Option<Self> {
        let arrowhead = match name.trim().to_ascii_lowercase().as_str() {
            "normal" | "arrow" | "filled" => Self::Normal,
            "open" | "vee" => Self::Open,
            "none" => Self::None,
            _ => return None,
        };
        Some(arrowhead)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum EdgePath {
    Line { from: Point, to: Point },
    Quad { from: Point, control: Point, to: Point },
    Cubic { from: Point, c1: Point, c2: Point, to: Point },
}

impl EdgePath {
    /// Point halfway along the curve parameter.
    fn midpoint(&self) -> Point {
        match *self {
            Self::Line { from, to } => from.midpoint(to),
            Self::Quad { from, control, to } => from * 0.25 + control * 0.5 + to * 0.25,
            Self::Cubic { from, c1, c2, to } => (from + c1 * 3.0 + c2 * 3.0 + to) * 0.125,
        }
    }

    /// Points whose hull contains the whole curve.
    fn hull(&self) -> SmallVec<[Point; 4]> {
        match *self {
            Self::Line { from, to } => SmallVec::from_slice(&[from, to]),
            Self::Quad { from, control, to } => SmallVec::from_slice(&[from, control, to]),
            Self::Cubic { from, c1, c2, to } => SmallVec::from_slice(&[from, c1, c2, to]),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
    min: Point,
    max: Point,
}

impl Bounds {
    fn around(p: Point) -> Self {
        Self { min: p, max: p }
    }

    fn include(&mut self, p: Point) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    fn include_box(&mut self, center: Point, width: f64, height: f64) {
        let half = Point::new(width / 2.0, height / 2.0);
        self.include(center - half);
        self.include(center + half);
    }

    fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

fn extend(bounds: &mut Option<Bounds>, p: Point) {
    match bounds {
        Some(bounds) => bounds.include(p),
        None => *bounds = Some(Bounds::around(p)),
    }
}

struct PlacedNode<'g> {
    node: &'g Node,
    outline: NodeBox,
}

struct LabelBox<'g> {
    text: &'g str,
    center: Point,
    width: f64,
    height: f64,
    color: &'g str,
}

struct PlacedEdge<'g> {
    edge: &'g Edge,
    path: EdgePath,
    stroke: Stroke,
    color: &'g str,
    marker: Option<usize>,
    label: Option<LabelBox<'g>>,
}

struct PlacedCluster {
    name: String,
    min: Point,
    max: Point,
}

/// Everything positioned, in layout coordinates; `shift` maps them onto the canvas.
struct Scene<'g> {
    style: &'g Style,
    layers: Vec<RenderLayer>,
    nodes: Vec<PlacedNode<'g>>,
    edges: Vec<PlacedEdge<'g>>,
    clusters: Vec<PlacedCluster>,
    markers: Vec<(Arrowhead, &'g str)>,
    shift: Point,
    width: f64,
    height: f64,
}

/// Renders `graph` at the positions in `layout` as a self-contained SVG document.
///
/// Cluster boxes are drawn first, then edges, nodes and edge labels in `style.layer_order`.
/// Node groups carry `data-id`; edge groups carry `data-source` / `data-target`.
pub fn render_svg(graph: &Graph, layout: &GraphLayout, style: &Style) -> Result<String, RenderError> {
    let layers = validate_style(style)?;
    let font_size = style.font_size;

    let mut nodes = Vec::with_capacity(graph.node_count());
    for node in graph.nodes() {
        let center = layout
            .position(node.id().as_str())
            .filter(|p| p.is_finite())
            .ok_or_else(|| RenderError::MissingPosition { node: node.id().to_string() })?;
        let shape = resolve_shape(node, style)?;
        nodes.push(PlacedNode {
            node,
            outline: NodeBox::for_label(shape, center, node.label(), font_size),
        });
    }

    let lanes = parallel_lanes(graph);
    let mut loops_seen = vec![0usize; nodes.len()];
    let mut markers: Vec<(Arrowhead, &str)> = Vec::new();
    let mut edges = Vec::with_capacity(graph.edge_count());

    for (idx, edge) in graph.edges().iter().enumerate() {
        let from_idx = endpoint_index(graph, edge.from().as_str())?;
        let to_idx = endpoint_index(graph, edge.to().as_str())?;
        let from = &nodes[from_idx].outline;
        let to = &nodes[to_idx].outline;

        let stroke = match edge.attribute(ATTR_STYLE) {
            Some(value) => Stroke::from_name(value).ok_or_else(|| RenderError::UnknownEdgeStyle {
                from: edge.from().to_string(),
                to: edge.to().to_string(),
                value: value.to_owned(),
            })?,
            None => Stroke::Solid,
        };
        let arrowhead = match edge.attribute(ATTR_ARROWHEAD) {
            Some(value) => Arrowhead::from_name(value).ok_or_else(|| {
                RenderError::UnknownArrowhead {
                    from: edge.from().to_string(),
                    to: edge.to().to_string(),
                    value: value.to_owned(),
                }
            })?,
            None => Arrowhead::Normal,
        };
        let color = edge.attribute(ATTR_COLOR).unwrap_or(&style.edge_color);

        let path = if from_idx == to_idx {
            let path = self_loop(from, loops_seen[from_idx], font_size);
            loops_seen[from_idx] += 1;
            path
        } else {
            let (lane, lane_count) = lanes[idx];
            connect(from, to, from_idx < to_idx, lane, lane_count, font_size)
        };

        let marker = (edge.is_directed() && arrowhead != Arrowhead::None).then(|| {
            let key = (arrowhead, color);
            markers.iter().position(|m| *m == key).unwrap_or_else(|| {
                markers.push(key);
                markers.len() - 1
            })
        });

        let label = edge.label().filter(|text| !text.trim().is_empty()).map(|text| LabelBox {
            text,
            center: path.midpoint(),
            width: text_width(text, font_size) + 8.0,
            height: font_size + 6.0,
            color: edge.attribute(ATTR_FONTCOLOR).unwrap_or(style.edge_text()),
        });

        edges.push(PlacedEdge { edge, path, stroke, color, marker, label });
    }

    let clusters = graph
        .clusters()
        .into_iter()
        .filter_map(|(name, members)| {
            let mut bounds: Option<Bounds> = None;
            for idx in members {
                let outline = &nodes[idx].outline;
                extend(&mut bounds, outline.center);
                if let Some(b) = bounds.as_mut() {
                    b.include_box(outline.center, outline.width, outline.height);
                }
            }
            let bounds = bounds?;
            Some(PlacedCluster {
                name: name.into_string(),
                min: bounds.min - Point::new(font_size, font_size * 2.0),
                max: bounds.max + Point::new(font_size, font_size),
            })
        })
        .collect::<Vec<_>>();

    let mut extent: Option<Bounds> = None;
    for placed in &nodes {
        let outline = &placed.outline;
        extend(&mut extent, outline.center);
        if let Some(b) = extent.as_mut() {
            b.include_box(outline.center, outline.width, outline.height);
        }
    }
    for placed in &edges {
        for p in placed.path.hull() {
            extend(&mut extent, p);
        }
        if let (Some(label), Some(b)) = (&placed.label, extent.as_mut()) {
            b.include_box(label.center, label.width, label.height);
        }
    }
    for cluster in &clusters {
        extend(&mut extent, cluster.min);
        extend(&mut extent, cluster.max);
    }

    let margin = style.margin;
    let (shift, width, height) = match extent {
        Some(b) => (
            Point::new(margin - b.min.x, margin - b.min.y),
            b.width() + 2.0 * margin,
            b.height() + 2.0 * margin,
        ),
        None => (Point::new(margin, margin), 2.0 * margin, 2.0 * margin),
    };

    tracing::debug!(
        width,
        height,
        nodes = nodes.len(),
        edges = edges.len(),
        theme = %style.name,
        "rendered svg"
    );

    let scene = Scene { style, layers, nodes, edges, clusters, markers, shift, width, height };
    Ok(scene.to_string())
}

fn validate_style(style: &Style) -> Result<Vec<RenderLayer>, RenderError> {
    if let Some(field) = style.first_empty_required() {
        return Err(RenderError::MissingStyleField { field });
    }
    if !(style.font_size.is_finite() && style.font_size > 0.0) {
        return Err(RenderError::InvalidStyleValue {
            field: "font_size",
            value: style.font_size.to_string(),
        });
    }
    if !(style.margin.is_finite() && style.margin >= 0.0) {
        return Err(RenderError::InvalidStyleValue {
            field: "margin",
            value: style.margin.to_string(),
        });
    }
    style.effective_layers().map_err(|layer| RenderError::InvalidStyleValue {
        field: "layer_order",
        value: format!("{} listed twice", layer.name()),
    })
}

fn endpoint_index(graph: &Graph, id: &str) -> Result<usize, RenderError> {
    graph.node_index(id).ok_or_else(|| RenderError::MissingPosition { node: id.to_owned() })
}

/// `shape` wins over `kind`; both accept geometric names or `shape_defaults` keys.
fn resolve_shape(node: &Node, style: &Style) -> Result<Shape, RenderError> {
    for attribute in [ATTR_SHAPE, ATTR_KIND] {
        let Some(value) = node.attribute(attribute) else {
            continue;
        };
        return lookup_shape(value, style).ok_or_else(|| RenderError::UnknownShape {
            node: node.id().to_string(),
            attribute,
            value: value.to_owned(),
        });
    }
    Ok(Shape::Rect)
}

fn lookup_shape(value: &str, style: &Style) -> Option<Shape> {
    Shape::from_name(value).or_else(|| {
        let mapped = style.shape_defaults.get(value.trim().to_ascii_lowercase().as_str())?;
        Shape::from_name(mapped)
    })
}

/// `(lane, lane_count)` per edge; edges between the same unordered pair share a lane group.
fn parallel_lanes(graph: &Graph) -> Vec<(usize, usize)> {
    let mut groups: BTreeMap<(&str, &str), Vec<usize>> = BTreeMap::new();
    for (idx, edge) in graph.edges().iter().enumerate() {
        let (a, b) = (edge.from().as_str(), edge.to().as_str());
        let key = if a <= b { (a, b) } else { (b, a) };
        groups.entry(key).or_default().push(idx);
    }

    let mut lanes = vec![(0, 1); graph.edge_count()];
    for members in groups.values() {
        for (lane, &idx) in members.iter().enumerate() {
            lanes[idx] = (lane, members.len());
        }
    }
    lanes
}

/// Straight edge for a lone pair; parallel edges fan out as quadratic curves. `forward` tells
/// whether the edge runs in the pair's canonical direction so lanes stay consistent.
fn connect(
    from: &NodeBox,
    to: &NodeBox,
    forward: bool,
    lane: usize,
    lane_count: usize,
    font_size: f64,
) -> EdgePath {
    let offset = (lane as f64 - (lane_count as f64 - 1.0) / 2.0) * font_size * 2.0;
    if offset == 0.0 {
        return EdgePath::Line {
            from: from.boundary_toward(to.center),
            to: to.boundary_toward(from.center),
        };
    }

    let (low, high) = if forward { (from.center, to.center) } else { (to.center, from.center) };
    let delta = high - low;
    let length = delta.length();
    let dir = if length > 1e-9 { delta * (1.0 / length) } else { Point::new(1.0, 0.0) };
    let normal = Point::new(-dir.y, dir.x);
    let control = low.midpoint(high) + normal * (2.0 * offset);

    EdgePath::Quad {
        from: from.boundary_toward(control),
        control,
        to: to.boundary_toward(control),
    }
}

/// Loop above the node; repeated loops on one node grow outward.
fn self_loop(node: &NodeBox, nth: usize, font_size: f64) -> EdgePath {
    let size = font_size * 2.5 * (1.0 + nth as f64 * 0.6);
    let from = node.boundary_toward(node.center + Point::new(1.0, -2.0));
    let to = node.boundary_toward(node.center + Point::new(-1.0, -2.0));
    EdgePath::Cubic {
        from,
        c1: from + Point::new(size * 0.8, -size),
        c2: to + Point::new(-size * 0.8, -size),
        to,
    }
}

struct Num(f64);

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Avoid "-0.00".
        let value = if self.0.abs() < 0.005 { 0.0 } else { self.0 };
        write!(f, "{value:.2}")
    }
}

impl Scene<'_> {
    fn at(&self, p: Point) -> (Num, Num) {
        let p = p + self.shift;
        (Num(p.x), Num(p.y))
    }

    fn write_markers(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.markers.is_empty() {
            return Ok(());
        }
        f.write_str("<defs>")?;
        for (idx, (arrowhead, color)) in self.markers.iter().enumerate() {
            let color = escape_xml(color);
            write!(
                f,
                "<marker id=\"arrow-{idx}\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"8\" markerHeight=\"8\" orient=\"auto-start-reverse\">"
            )?;
            match arrowhead {
                Arrowhead::Open => write!(
                    f,
                    "<path d=\"M 0 0 L 10 5 L 0 10\" fill=\"none\" stroke=\"{color}\" stroke-width=\"1.5\"/>"
                )?,
                Arrowhead::Normal | Arrowhead::None => {
                    write!(f, "<path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{color}\"/>")?
                }
            }
            f.write_str("</marker>")?;
        }
        f.write_str("</defs>\n")
    }

    fn write_clusters(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clusters.is_empty() {
            return Ok(());
        }
        let style = self.style;
        f.write_str("<g class=\"clusters\">\n")?;
        for cluster in &self.clusters {
            let name = escape_xml(&cluster.name);
            let (x, y) = self.at(cluster.min);
            let size = cluster.max - cluster.min;
            let (tx, ty) = self.at(cluster.min + Point::new(style.font_size * 0.6, style.font_size * 1.3));
            writeln!(
                f,
                "<g class=\"cluster\" data-id=\"{name}\"><title>{name}</title><rect x=\"{x}\" y=\"{y}\" width=\"{w}\" height=\"{h}\" rx=\"8\" ry=\"8\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"1\" stroke-dasharray=\"6 4\"/><text x=\"{tx}\" y=\"{ty}\" fill=\"{stroke}\">{name}</text></g>",
                w = Num(size.x),
                h = Num(size.y),
                fill = escape_xml(style.cluster_fill()),
                stroke = escape_xml(style.cluster_stroke()),
            )?;
        }
        f.write_str("</g>\n")
    }

    fn write_edges(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<g class=\"edges\">\n")?;
        for placed in &self.edges {
            write!(
                f,
                "<g class=\"edge\" data-source=\"{}\" data-target=\"{}\"><path d=\"",
                escape_xml(placed.edge.from().as_str()),
                escape_xml(placed.edge.to().as_str()),
            )?;
            match placed.path {
                EdgePath::Line { from, to } => {
                    let ((x1, y1), (x2, y2)) = (self.at(from), self.at(to));
                    write!(f, "M {x1} {y1} L {x2} {y2}")?;
                }
                EdgePath::Quad { from, control, to } => {
                    let ((x1, y1), (cx, cy), (x2, y2)) =
                        (self.at(from), self.at(control), self.at(to));
                    write!(f, "M {x1} {y1} Q {cx} {cy} {x2} {y2}")?;
                }
                EdgePath::Cubic { from, c1, c2, to } => {
                    let ((x1, y1), (ax, ay), (bx, by), (x2, y2)) =
                        (self.at(from), self.at(c1), self.at(c2), self.at(to));
                    write!(f, "M {x1} {y1} C {ax} {ay} {bx} {by} {x2} {y2}")?;
                }
            }
            write!(
                f,
                "\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"",
                escape_xml(placed.color),
                Num(placed.stroke.width()),
            )?;
            if let Some(dash) = placed.stroke.dasharray() {
                write!(f, " stroke-dasharray=\"{dash}\"")?;
            }
            if let Some(marker) = placed.marker {
                write!(f, " marker-end=\"url(#arrow-{marker})\"")?;
            }
            f.write_str("/></g>\n")?;
        }
        f.write_str("</g>\n")
    }

    fn write_nodes(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = self.style;
        f.write_str("<g class=\"nodes\">\n")?;
        for placed in &self.nodes {
            let node = placed.node;
            let id = escape_xml(node.id().as_str());
            let fill = node
                .attribute(ATTR_FILL)
                .or_else(|| node.attribute(ATTR_FILLCOLOR))
                .unwrap_or(&style.node_fill);
            let stroke = node.attribute(ATTR_STROKE).unwrap_or(&style.node_stroke);
            let paint = format!(
                "fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"",
                escape_xml(fill),
                escape_xml(stroke),
                Num(STROKE_WIDTH)
            );

            write!(f, "<g class=\"node\" data-id=\"{id}\"><title>{id}</title>")?;
            self.write_outline(f, &placed.outline, &paint)?;
            let (x, y) = self.at(placed.outline.center);
            write!(
                f,
                "<text x=\"{x}\" y=\"{y}\" text-anchor=\"middle\" dominant-baseline=\"central\" fill=\"{}\">{}</text></g>\n",
                escape_xml(node.attribute(ATTR_FONTCOLOR).unwrap_or(style.node_text())),
                escape_xml(node.label()),
            )?;
        }
        f.write_str("</g>\n")
    }

    fn write_outline(&self, f: &mut fmt::Formatter<'_>, outline: &NodeBox, paint: &str) -> fmt::Result {
        let (cx, cy) = self.at(outline.center);
        let (hw, hh) = (outline.half_width(), outline.half_height());
        match outline.shape {
            Shape::Rect | Shape::Rounded => {
                let (x, y) = self.at(outline.center - Point::new(hw, hh));
                let radius = if outline.shape == Shape::Rounded { outline.height * 0.3 } else { 0.0 };
                write!(
                    f,
                    "<rect x=\"{x}\" y=\"{y}\" width=\"{}\" height=\"{}\" rx=\"{r}\" ry=\"{r}\" {paint}/>",
                    Num(outline.width),
                    Num(outline.height),
                    r = Num(radius),
                )
            }
            Shape::Ellipse => {
                write!(f, "<ellipse cx=\"{cx}\" cy=\"{cy}\" rx=\"{}\" ry=\"{}\" {paint}/>", Num(hw), Num(hh))
            }
            Shape::Circle => {
                write!(f, "<circle cx=\"{cx}\" cy=\"{cy}\" r=\"{}\" {paint}/>", Num(hw.min(hh)))
            }
            Shape::Diamond | Shape::Hexagon | Shape::Parallelogram | Shape::Triangle => {
                f.write_str("<polygon points=\"")?;
                for (idx, p) in outline.polygon().unwrap_or_default().into_iter().enumerate() {
                    let (x, y) = self.at(p);
                    if idx > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{x},{y}")?;
                }
                write!(f, "\" {paint}/>")
            }
        }
    }

    fn write_labels(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = self.style;
        f.write_str("<g class=\"labels\">\n")?;
        for placed in &self.edges {
            let Some(label) = &placed.label else {
                continue;
            };
            let (x, y) = self.at(label.center - Point::new(label.width / 2.0, label.height / 2.0));
            let (tx, ty) = self.at(label.center);
            writeln!(
                f,
                "<g class=\"edge-label\" data-source=\"{}\" data-target=\"{}\"><rect x=\"{x}\" y=\"{y}\" width=\"{}\" height=\"{}\" rx=\"4\" ry=\"4\" fill=\"{}\" fill-opacity=\"0.9\"/><text x=\"{tx}\" y=\"{ty}\" text-anchor=\"middle\" dominant-baseline=\"central\" fill=\"{}\">{}</text></g>",
                escape_xml(placed.edge.from().as_str()),
                escape_xml(placed.edge.to().as_str()),
                Num(label.width),
                Num(label.height),
                escape_xml(style.label_background()),
                escape_xml(label.color),
                escape_xml(label.text),
            )?;
        }
        f.write_str("</g>\n")
    }
}

impl fmt::Display for Scene<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = self.style;
        let (w, h) = (Num(self.width), Num(self.height));
        writeln!(
            f,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" font-family=\"{}\" font-size=\"{}\">",
            escape_xml(&style.font),
            Num(style.font_size),
        )?;
        writeln!(f, "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>", escape_xml(&style.background))?;
        self.write_markers(f)?;
        self.write_clusters(f)?;
        for layer in &self.layers {
            match layer {
                RenderLayer::Edges => self.write_edges(f)?,
                RenderLayer::Nodes => self.write_nodes(f)?,
                RenderLayer::Labels => self.write_labels(f)?,
            }
        }
        f.write_str("</svg>\n")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rstest::rstest;

    use super::{render_svg, RenderError};
    use crate::format::parse_dsl;
    use crate::layout::{layout_graph, GraphLayout, LayoutConfig};
    use crate::model::{fixtures, Graph, NodeId, Point};
    use crate::render::{RenderLayer, Style};

    fn row_layout(graph: &Graph) -> GraphLayout {
        let positions = graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.id().clone(), Point::new(idx as f64 * 150.0, 0.0)))
            .collect::<BTreeMap<NodeId, Point>>();
        GraphLayout::from_positions(positions)
    }

    fn render(input: &str) -> Result<String, RenderError> {
        let graph = parse_dsl(input).expect("parse");
        render_svg(&graph, &row_layout(&graph), &Style::default())
    }

    #[test]
    fn renders_nodes_edges_and_labels() {
        let svg = render("Start -> Process : Go\nProcess -> End").expect("render");
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
        assert!(svg.trim_end().ends_with("</svg>"));
        for id in ["Start", "Process", "End"] {
            assert!(svg.contains(&format!("<g class=\"node\" data-id=\"{id}\"><title>{id}</title>")));
        }
        assert!(svg.contains("<g class=\"edge\" data-source=\"Start\" data-target=\"Process\">"));
        assert!(svg.contains(">Go</text>"));
        assert_eq!(svg.matches("marker-end=\"url(#arrow-0)\"").count(), 2);
        assert_eq!(svg.matches("<marker ").count(), 1);
    }

    #[test]
    fn default_layer_order_draws_edges_then_nodes_then_labels() {
        let svg = render("A -> B : hi").expect("render");
        let edges = svg.find("<g class=\"edges\">").expect("edges");
        let nodes = svg.find("<g class=\"nodes\">").expect("nodes");
        let labels = svg.find("<g class=\"labels\">").expect("labels");
        assert!(edges < nodes && nodes < labels);

        let graph = parse_dsl("A -> B : hi").expect("parse");
        let style = Style { layer_order: vec![RenderLayer::Nodes], ..Style::default() };
        let svg = render_svg(&graph, &row_layout(&graph), &style).expect("render");
        let nodes = svg.find("<g class=\"nodes\">").expect("nodes");
        let edges = svg.find("<g class=\"edges\">").expect("edges");
        assert!(nodes < edges);
    }

    #[test]
    fn text_and_attributes_are_escaped() {
        let svg = render("\"a<b\" -> \"c&d\" : x > \"y\"").expect("render");
        assert!(svg.contains("data-id=\"a&lt;b\""));
        assert!(svg.contains("data-target=\"c&amp;d\""));
        assert!(svg.contains(">x &gt; &quot;y&quot;</text>"));
        assert!(!svg.contains("a<b"));
    }

    #[rstest]
    #[case("A [shape=diamond]", "<polygon")]
    #[case("A [shape=ellipse]", "<ellipse")]
    #[case("A [shape=circle]", "<circle")]
    #[case("A [shape=rounded]", "rx=\"10.08\"")]
    #[case("A{decision}", "<polygon")]
    #[case("A [kind=start]", "<ellipse")]
    #[case("A [shape=box, kind=start]", "<rect x=")]
    fn shapes_resolve_through_aliases_and_defaults(#[case] input: &str, #[case] needle: &str) {
        let svg = render(input).expect("render");
        assert!(svg.contains(needle), "{input}: {svg}");
    }

    #[test]
    fn unknown_shape_is_an_error() {
        let err = render("A [shape=blob]").unwrap_err();
        assert_eq!(
            err,
            RenderError::UnknownShape {
                node: "A".to_owned(),
                attribute: "shape",
                value: "blob".to_owned()
            }
        );
        let err = render("A [kind=mystery]").unwrap_err();
        assert!(matches!(err, RenderError::UnknownShape { attribute: "kind", .. }));
    }

    #[test]
    fn edge_styles_and_arrowheads() {
        let svg = render("A{dashed} -> B\nB{dotted} -> C\nC{bold} -> D").expect("render");
        assert!(svg.contains("stroke-dasharray=\"6 4\""));
        assert!(svg.contains("stroke-dasharray=\"2 4\""));
        assert!(svg.contains("stroke-width=\"3.00\""));

        let svg = render("A -> B [arrowhead=none]\nA -- C").expect("render");
        assert!(!svg.contains("marker-end"));
        assert!(!svg.contains("<defs>"));

        let err = render("A -> B [style=wavy]").unwrap_err();
        assert!(matches!(err, RenderError::UnknownEdgeStyle { ref value, .. } if value == "wavy"));
        let err = render("A -> B [arrowhead=crow]").unwrap_err();
        assert!(matches!(err, RenderError::UnknownArrowhead { ref value, .. } if value == "crow"));
    }

    #[test]
    fn label_attribute_on_an_edge_is_drawn() {
        let svg = render("A -> B [label=hello]").expect("render");
        assert!(svg.contains(">hello</text>"), "{svg}");
    }

    #[test]
    fn per_element_colors_override_the_theme() {
        let svg = render("A [fill=\"#ff0000\", fontcolor=navy]\nA -> B [color=green]").expect("render");
        assert!(svg.contains("fill=\"#ff0000\""));
        assert!(svg.contains("fill=\"navy\""));
        assert!(svg.contains("stroke=\"green\""));
        assert!(svg.contains("<path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"green\"/>"));
    }

    #[test]
    fn parallel_edges_curve_and_self_loops_arc() {
        let graph = fixtures::multi_edges();
        let svg = render_svg(&graph, &row_layout(&graph), &Style::default()).expect("render");
        assert_eq!(svg.matches(" Q ").count(), 2);
        assert_eq!(svg.matches(" C ").count(), 1);
        assert!(svg.contains(">retry</text>"));
    }

    #[test]
    fn clusters_are_drawn_before_edges() {
        let svg = render("A [cluster=core]\nB [cluster=core]\nA -> B").expect("render");
        let cluster = svg.find("<g class=\"cluster\" data-id=\"core\">").expect("cluster");
        let edges = svg.find("<g class=\"edges\">").expect("edges");
        assert!(cluster < edges);
    }

    #[test]
    fn canvas_covers_every_node_with_margin() {
        let graph = parse_dsl("A -> B").expect("parse");
        let svg = render_svg(&graph, &row_layout(&graph), &Style::default()).expect("render");
        // One-char labels at 14px give 42 x 33.6 boxes; centers are 150 apart.
        assert!(svg.contains("width=\"232.00\" height=\"73.60\""), "{svg}");
    }

    #[test]
    fn empty_graph_renders_an_empty_canvas() {
        let svg = render_svg(&Graph::new(), &row_layout(&Graph::new()), &Style::default())
            .expect("render");
        assert!(svg.contains("width=\"40.00\" height=\"40.00\""));
    }

    #[test]
    fn style_problems_are_reported() {
        let graph = fixtures::small_dag();
        let layout = row_layout(&graph);

        let style = Style { node_fill: String::new(), ..Style::default() };
        assert_eq!(
            render_svg(&graph, &layout, &style).unwrap_err(),
            RenderError::MissingStyleField { field: "node_fill" }
        );

        let style = Style { font_size: 0.0, ..Style::default() };
        assert!(matches!(
            render_svg(&graph, &layout, &style).unwrap_err(),
            RenderError::InvalidStyleValue { field: "font_size", .. }
        ));

        let style = Style {
            layer_order: vec![RenderLayer::Edges, RenderLayer::Edges],
            ..Style::default()
        };
        assert!(matches!(
            render_svg(&graph, &layout, &style).unwrap_err(),
            RenderError::InvalidStyleValue { field: "layer_order", .. }
        ));
    }

    #[test]
    fn missing_positions_are_reported() {
        let graph = fixtures::small_dag();
        let layout = GraphLayout::from_positions(BTreeMap::new());
        assert_eq!(
            render_svg(&graph, &layout, &Style::default()).unwrap_err(),
            RenderError::MissingPosition { node: "a".to_owned() }
        );
    }

    #[test]
    fn rendering_is_deterministic_for_a_seeded_layout() {
        let graph = fixtures::small_dag();
        let config = LayoutConfig::default().with_seed(3).with_iterations(50);
        let first = render_svg(&graph, &layout_graph(&graph, &config), &Style::default());
        let second = render_svg(&graph, &layout_graph(&graph, &config), &Style::default());
        assert_eq!(first.expect("first"), second.expect("second"));
    }
}
