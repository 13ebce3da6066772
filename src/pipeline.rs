// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Parse, lay out and render in one call.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::format::{parse_dot, parse_dsl_with, DotParseError, DslParseError, ParseOptions};
use crate::layout::{layout_graph, GraphLayout, LayoutConfig, LayoutConfigError};
use crate::model::Graph;
use crate::render::{render_svg, RenderError, Style, StyleError};

/// Graph attribute naming a built-in theme.
pub const ATTR_THEME: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormat {
    #[default]
    Dsl,
    Dot,
}

impl InputFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "dsl" | "flow" | "dotflow" => Some(Self::Dsl),
            "dot" | "gv" => Some(Self::Dot),
            _ => None,
        }
    }

    /// `.dot` and `.gv` files are DOT; everything else is read as DSL.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("dot") || ext.eq_ignore_ascii_case("gv") => {
                Self::Dot
            }
            _ => Self::Dsl,
        }
    }
}

#[derive(Debug)]
pub enum PipelineError {
    Dsl(DslParseError),
    Dot(DotParseError),
    LayoutConfig(LayoutConfigError),
    Style(StyleError),
    Render(RenderError),
    Io { path: PathBuf, source: io::Error },
}

impl PipelineError {
    /// Short error category, e.g. `SyntaxError` or `RenderError`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Dsl(err) => err.kind(),
            Self::Dot(_) => "SyntaxError",
            Self::LayoutConfig(_) => "ConfigError",
            Self::Style(_) => "StyleError",
            Self::Render(_) => "RenderError",
            Self::Io { .. } => "IoError",
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Already prefixed with its kind.
            Self::Dsl(err) => write!(f, "{err}"),
            Self::Dot(err) => write!(f, "{} at {err}", self.kind()),
            Self::LayoutConfig(err) => write!(f, "{}: {err}", self.kind()),
            Self::Style(err) => write!(f, "{}: {err}", self.kind()),
            Self::Render(err) => write!(f, "{}: {err}", self.kind()),
            Self::Io { path, source } => write!(f, "{}: {}: {source}", self.kind(), path.display()),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Dsl(err) => Some(err),
            Self::Dot(err) => Some(err),
            Self::LayoutConfig(err) => Some(err),
            Self::Style(err) => Some(err),
            Self::Render(err) => Some(err),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<DslParseError> for PipelineError {
    fn from(err: DslParseError) -> Self {
        Self::Dsl(err)
    }
}

impl From<DotParseError> for PipelineError {
    fn from(err: DotParseError) -> Self {
        Self::Dot(err)
    }
}

impl From<LayoutConfigError> for PipelineError {
    fn from(err: LayoutConfigError) -> Self {
        Self::LayoutConfig(err)
    }
}

impl From<StyleError> for PipelineError {
    fn from(err: StyleError) -> Self {
        Self::Style(err)
    }
}

impl From<RenderError> for PipelineError {
    fn from(err: RenderError) -> Self {
        Self::Render(err)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub format: InputFormat,
    pub parse: ParseOptions,
    pub layout: LayoutConfig,
    /// `None` uses the graph's `theme` attribute, else the default theme.
    pub style: Option<Style>,
}

/// Result of a full run; the graph carries the computed positions.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub graph: Graph,
    pub layout: GraphLayout,
    pub svg: String,
}

pub fn parse_source(
    text: &str,
    format: InputFormat,
    options: ParseOptions,
) -> Result<Graph, PipelineError> {
    let graph = match format {
        InputFormat::Dsl => parse_dsl_with(text, options)?,
        InputFormat::Dot => parse_dot(text)?,
    };
    Ok(graph)
}

/// An explicit style wins over the graph's `theme` attribute.
pub fn resolve_style(graph: &Graph, explicit: Option<&Style>) -> Result<Style, PipelineError> {
    if let Some(style) = explicit {
        return Ok(style.clone());
    }
    match graph.attribute(ATTR_THEME) {
        Some(name) => Ok(Style::builtin(name)?),
        None => Ok(Style::default()),
    }
}

pub fn run_pipeline(text: &str, options: &PipelineOptions) -> Result<PipelineOutput, PipelineError> {
    let mut graph = parse_source(text, options.format, options.parse)?;
    let style = resolve_style(&graph, options.style.as_ref())?;
    let layout = layout_graph(&graph, &options.layout);
    let svg = render_svg(&graph, &layout, &style)?;
    layout.apply_to(&mut graph);
    Ok(PipelineOutput { graph, layout, svg })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use rstest::rstest;

    use super::{
        parse_source, resolve_style, run_pipeline, InputFormat, PipelineError, PipelineOptions,
    };
    use crate::format::ParseOptions;
    use crate::layout::LayoutConfig;

    #[rstest]
    #[case("graph.dot", InputFormat::Dot)]
    #[case("graph.GV", InputFormat::Dot)]
    #[case("graph.flow", InputFormat::Dsl)]
    #[case("graph", InputFormat::Dsl)]
    fn format_follows_extension(#[case] path: &str, #[case] expected: InputFormat) {
        assert_eq!(InputFormat::from_path(Path::new(path)), expected);
    }

    #[test]
    fn graph_theme_attribute_selects_builtin() {
        let graph = parse_source("graph [theme=dark]\nA", InputFormat::Dsl, ParseOptions::default())
            .expect("parse");
        assert_eq!(resolve_style(&graph, None).expect("style").name, "dark");

        let graph = parse_source("graph [theme=neon]\nA", InputFormat::Dsl, ParseOptions::default())
            .expect("parse");
        let err = resolve_style(&graph, None).unwrap_err();
        assert_eq!(err.kind(), "StyleError");
    }

    #[test]
    fn run_pipeline_positions_every_node() {
        let options = PipelineOptions {
            layout: LayoutConfig::default().with_seed(11).with_iterations(60),
            ..PipelineOptions::default()
        };
        let output = run_pipeline("A -> B -> C\nC -> A : back", &options).expect("run");
        assert!(output.graph.nodes().iter().all(|node| node.position().is_some()));
        assert_eq!(output.layout.seed(), 11);
        assert!(output.svg.contains(">back</text>"));
    }

    #[test]
    fn errors_report_their_kind() {
        let err = run_pipeline("A -> ", &PipelineOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Dsl(_)));
        assert_eq!(err.kind(), "SyntaxError");
        assert!(err.to_string().starts_with("SyntaxError at line 1"));

        let options = PipelineOptions { format: InputFormat::Dot, ..PipelineOptions::default() };
        let err = run_pipeline("A -> B", &options).unwrap_err();
        assert!(err.to_string().starts_with("SyntaxError at line 1, column 1"), "{err}");

        let err = run_pipeline("A [shape=blob]", &PipelineOptions::default()).unwrap_err();
        assert_eq!(err.kind(), "RenderError");
    }
}
