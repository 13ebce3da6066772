// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! SVG rendering.
//!
//! A [`Style`] is a plain value passed to [`render_svg`]; there is no global theme state. Node
//! outlines are sized from their labels since no font metrics are available.

pub mod shape;
pub mod style;
pub mod svg;
mod text;

pub use shape::Shape;
pub use style::{RenderLayer, Style, StyleError, BUILTIN_STYLES};
pub use svg::{render_svg, RenderError};
