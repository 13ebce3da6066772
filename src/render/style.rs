// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_FONT: &str = "Helvetica, Arial, sans-serif";
pub const DEFAULT_FONT_SIZE: f64 = 14.0;
pub const DEFAULT_MARGIN: f64 = 20.0;

/// Names accepted by [`Style::builtin`].
pub const BUILTIN_STYLES: [&str; 6] = ["default", "dark", "colorful", "monochrome", "blue", "green"];

const REQUIRED_FIELDS: [&str; 5] = ["background", "node_fill", "node_stroke", "edge_color", "font"];

/// Drawing passes after the cluster boxes, which always come first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderLayer {
    Edges,
    Nodes,
    /// Edge labels and their background boxes.
    Labels,
}

impl RenderLayer {
    pub const DEFAULT_ORDER: [Self; 3] = [Self::Edges, Self::Nodes, Self::Labels];

    pub fn name(self) -> &'static str {
        match self {
            Self::Edges => "edges",
            Self::Nodes => "nodes",
            Self::Labels => "labels",
        }
    }
}

/// Colours, font and layout knobs for the SVG renderer.
///
/// Optional colours fall back to a related required one: `node_text` to `node_stroke`,
/// `edge_text` to `edge_color`, `label_background` to `background`, `cluster_stroke` to
/// `node_stroke`, `cluster_fill` to no fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Style {
    #[serde(default = "custom_name")]
    pub name: String,
    pub background: String,
    pub node_fill: String,
    pub node_stroke: String,
    #[serde(default)]
    pub node_text: Option<String>,
    pub edge_color: String,
    #[serde(default)]
    pub edge_text: Option<String>,
    #[serde(default)]
    pub label_background: Option<String>,
    #[serde(default)]
    pub cluster_fill: Option<String>,
    #[serde(default)]
    pub cluster_stroke: Option<String>,
    pub font: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_margin")]
    pub margin: f64,
    /// Maps semantic shape names and node `kind` values to geometric shapes.
    #[serde(default = "default_shape_defaults")]
    pub shape_defaults: BTreeMap<String, String>,
    #[serde(default = "default_layer_order")]
    pub layer_order: Vec<RenderLayer>,
}

fn custom_name() -> String {
    "custom".to_owned()
}

fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

fn default_margin() -> f64 {
    DEFAULT_MARGIN
}

fn default_layer_order() -> Vec<RenderLayer> {
    RenderLayer::DEFAULT_ORDER.to_vec()
}

fn default_shape_defaults() -> BTreeMap<String, String> {
    [
        ("start", "ellipse"),
        ("end", "ellipse"),
        ("terminal", "rounded"),
        ("process", "rect"),
        ("task", "rect"),
        ("decision", "diamond"),
        ("condition", "diamond"),
        ("input", "parallelogram"),
        ("output", "parallelogram"),
        ("io", "parallelogram"),
        ("data", "parallelogram"),
        ("preparation", "hexagon"),
        ("loop", "hexagon"),
        ("merge", "triangle"),
        ("connector", "circle"),
        ("event", "circle"),
    ]
    .into_iter()
    .map(|(name, shape)| (name.to_owned(), shape.to_owned()))
    .collect()
}

#[derive(Debug)]
pub enum StyleError {
    Json { source: serde_json::Error },
    NotAnObject,
    MissingField { field: &'static str },
    UnknownTheme { name: String },
}

impl fmt::Display for StyleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json { source } => write!(f, "invalid style json: {source}"),
            Self::NotAnObject => f.write_str("style json must be an object"),
            Self::MissingField { field } => write!(f, "style is missing required field {field}"),
            Self::UnknownTheme { name } => {
                write!(f, "unknown theme {name:?} (expected one of: {})", BUILTIN_STYLES.join(", "))
            }
        }
    }
}

impl std::error::Error for StyleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json { source } => Some(source),
            _ => None,
        }
    }
}

struct Palette {
    name: &'static str,
    background: &'static str,
    node_stroke: &'static str,
    node_fill: &'static str,
    node_text: &'static str,
    edge_color: &'static str,
    edge_text: &'static str,
}

const PALETTES: [Palette; 6] = [
    Palette {
        name: "default",
        background: "white",
        node_stroke: "black",
        node_fill: "white",
        node_text: "black",
        edge_color: "black",
        edge_text: "black",
    },
    Palette {
        name: "dark",
        background: "#1a202c",
        node_stroke: "white",
        node_fill: "#2d3748",
        node_text: "white",
        edge_color: "#cbd5e0",
        edge_text: "#cbd5e0",
    },
    Palette {
        name: "colorful",
        background: "#f7fafc",
        node_stroke: "#2d3748",
        node_fill: "#ecc94b",
        node_text: "#2d3748",
        edge_color: "#4a5568",
        edge_text: "#4a5568",
    },
    Palette {
        name: "monochrome",
        background: "white",
        node_stroke: "black",
        node_fill: "white",
        node_text: "black",
        edge_color: "black",
        edge_text: "black",
    },
    Palette {
        name: "blue",
        background: "#f0f9ff",
        node_stroke: "#1e40af",
        node_fill: "#dbeafe",
        node_text: "#1e3a8a",
        edge_color: "#3b82f6",
        edge_text: "#1e40af",
    },
    Palette {
        name: "green",
        background: "#f0fdf4",
        node_stroke: "#166534",
        node_fill: "#dcfce7",
        node_text: "#166534",
        edge_color: "#22c55e",
        edge_text: "#166534",
    },
];

impl Default for Style {
    fn default() -> Self {
        Self::from_palette(&PALETTES[0])
    }
}

impl Style {
    fn from_palette(palette: &Palette) -> Self {
        Self {
            name: palette.name.to_owned(),
            background: palette.background.to_owned(),
            node_fill: palette.node_fill.to_owned(),
            node_stroke: palette.node_stroke.to_owned(),
            node_text: Some(palette.node_text.to_owned()),
            edge_color: palette.edge_color.to_owned(),
            edge_text: Some(palette.edge_text.to_owned()),
            label_background: Some(palette.background.to_owned()),
            cluster_fill: None,
            cluster_stroke: Some(palette.node_stroke.to_owned()),
            font: DEFAULT_FONT.to_owned(),
            font_size: DEFAULT_FONT_SIZE,
            margin: DEFAULT_MARGIN,
            shape_defaults: default_shape_defaults(),
            layer_order: default_layer_order(),
        }
    }

    /// Looks up a built-in theme by (case-insensitive) name.
    pub fn builtin(name: &str) -> Result<Self, StyleError> {
        PALETTES
            .iter()
            .find(|palette| palette.name.eq_ignore_ascii_case(name.trim()))
            .map(Self::from_palette)
            .ok_or_else(|| StyleError::UnknownTheme { name: name.to_owned() })
    }

    /// Parses a JSON style. Required colours and `font` must be present; everything else
    /// defaults.
    pub fn from_json(text: &str) -> Result<Self, StyleError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|source| StyleError::Json { source })?;
        let object = value.as_object().ok_or(StyleError::NotAnObject)?;
        if let Some(field) = REQUIRED_FIELDS.into_iter().find(|field| !object.contains_key(*field)) {
            return Err(StyleError::MissingField { field });
        }
        serde_json::from_value(value).map_err(|source| StyleError::Json { source })
    }

    pub fn node_text(&self) -> &str {
        self.node_text.as_deref().unwrap_or(&self.node_stroke)
    }

    pub fn edge_text(&self) -> &str {
        self.edge_text.as_deref().unwrap_or(&self.edge_color)
    }

    pub fn label_background(&self) -> &str {
        self.label_background.as_deref().unwrap_or(&self.background)
    }

    pub fn cluster_fill(&self) -> &str {
        self.cluster_fill.as_deref().unwrap_or("none")
    }

    pub fn cluster_stroke(&self) -> &str {
        self.cluster_stroke.as_deref().unwrap_or(&self.node_stroke)
    }

    /// Required fields that are present but empty, in declaration order.
    pub(crate) fn first_empty_required(&self) -> Option<&'static str> {
        let values =
            [&self.background, &self.node_fill, &self.node_stroke, &self.edge_color, &self.font];
        REQUIRED_FIELDS
            .into_iter()
            .zip(values)
            .find(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| field)
    }

    /// `layer_order` with duplicates reported and missing layers appended in default order.
    pub(crate) fn effective_layers(&self) -> Result<Vec<RenderLayer>, RenderLayer> {
        let mut layers = Vec::with_capacity(RenderLayer::DEFAULT_ORDER.len());
        for &layer in &self.layer_order {
            if layers.contains(&layer) {
                return Err(layer);
            }
            layers.push(layer);
        }
        for layer in RenderLayer::DEFAULT_ORDER {
            if !layers.contains(&layer) {
                layers.push(layer);
            }
        }
        Ok(layers)
    }
}
