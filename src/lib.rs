// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Dotflow: text to diagram.
//!
//! `parse_dsl` / `parse_dot` turn source text into a [`model::Graph`], `layout_graph` positions
//! it with a force simulation, and `render_svg` draws it with a [`render::Style`].

pub mod format;
pub mod layout;
pub mod model;
pub mod pipeline;
pub mod render;

pub use format::{export_dot, parse_dot, parse_dsl, parse_dsl_with};
pub use layout::{layout_graph, GraphLayout, LayoutConfig};
pub use render::{render_svg, Style};
