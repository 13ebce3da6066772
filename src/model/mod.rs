// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core graph model shared by the parsers, the layout engine, and the renderer.

#[cfg(test)]
pub(crate) mod fixtures;
pub mod graph;
pub mod ids;
pub mod point;

pub use graph::{
    Attributes, Edge, Graph, Node, ATTR_CLUSTER, ATTR_KIND, ATTR_LABEL, ATTR_POS, ATTR_SHAPE,
    ATTR_STYLE,
};
pub use ids::{ClusterId, Id, IdError, NodeId};
pub use point::Point;
