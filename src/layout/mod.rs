// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Force-directed layout.
//!
//! Positions come from an iterative simulation: every node pair repels, every edge attracts, and
//! a linearly cooling temperature caps how far a node may move per iteration. Repulsion is summed
//! exactly or through a Barnes-Hut quadtree.

pub mod config;
pub mod force;
mod quadtree;

pub use config::{Approximation, AttractionModel, LayoutConfig, LayoutConfigError};
pub use force::{layout_graph, GraphLayout, PARALLEL_MIN_NODES};
