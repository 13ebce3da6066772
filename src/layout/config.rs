// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Dotflow-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Dotflow and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_ITERATIONS: usize = 500;
pub const DEFAULT_IDEAL_EDGE_LENGTH: f64 = 80.0;
pub const DEFAULT_CONVERGENCE_EPSILON: f64 = 0.01;
pub const DEFAULT_THETA: f64 = 0.5;

/// How edges pull their endpoints together. `d` is the current distance, `L` the ideal length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttractionModel {
    /// `d^2 / L`
    #[default]
    FruchtermanReingold,
    /// `d - L`
    Spring,
    /// `L * ln(d / L)`
    Logarithmic,
}

/// Repulsion summation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Approximation {
    /// Every pair of nodes, O(n^2).
    #[default]
    Exact,
    /// Quadtree with aggregate mass per cell; a cell is treated as one body when
    /// `cell_size / distance < theta`.
    BarnesHut { theta: f64 },
}

impl Approximation {
    pub fn barnes_hut() -> Self {
        Self::BarnesHut { theta: DEFAULT_THETA }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::BarnesHut { .. } => "barnes_hut",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub iterations: usize,
    /// `None` picks a fresh seed; the seed used is reported on the result.
    pub seed: Option<u64>,
    pub ideal_edge_length: f64,
    pub repulsion_strength: f64,
    /// Repulsion is `strength * L^2 / d^exponent`.
    pub repulsion_exponent: f64,
    pub attraction: AttractionModel,
    /// Defaults to a tenth of the initial canvas side.
    pub initial_temperature: Option<f64>,
    /// Stop once the largest applied displacement drops below this. `None` always runs the
    /// full budget.
    pub convergence_epsilon: Option<f64>,
    pub approximation: Approximation,
    /// Accumulate forces on the rayon pool for larger graphs.
    pub parallel: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            seed: None,
            ideal_edge_length: DEFAULT_IDEAL_EDGE_LENGTH,
            repulsion_strength: 1.0,
            repulsion_exponent: 1.0,
            attraction: AttractionModel::default(),
            initial_temperature: None,
            convergence_epsilon: Some(DEFAULT_CONVERGENCE_EPSILON),
            approximation: Approximation::default(),
            parallel: true,
        }
    }
}

#[derive(Debug)]
pub enum LayoutConfigError {
    Json { source: serde_json::Error },
    InvalidValue { field: &'static str, value: String },
}

impl fmt::Display for LayoutConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json { source } => write!(f, "invalid layout config json: {source}"),
            Self::InvalidValue { field, value } => {
                write!(f, "invalid layout config value for {field}: {value}")
            }
        }
    }
}

impl std::error::Error for LayoutConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json { source } => Some(source),
            Self::InvalidValue { .. } => None,
        }
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

impl LayoutConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_approximation(mut self, approximation: Approximation) -> Self {
        self.approximation = approximation;
        self
    }

    /// Parses a JSON config; missing fields take their defaults. The result is validated.
    pub fn from_json(text: &str) -> Result<Self, LayoutConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|source| LayoutConfigError::Json { source })?;
        config.validate()?;
        Ok(config)
    }

    /// Reports the first numeric field that the engine would have to replace.
    pub fn validate(&self) -> Result<(), LayoutConfigError> {
        match self.first_invalid() {
            Some((field, value)) => {
                Err(LayoutConfigError::InvalidValue { field, value: value.to_string() })
            }
            None => Ok(()),
        }
    }

    /// Copy with every invalid numeric field replaced by its default.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let mut config = self.clone();

        if config.iterations == 0 {
            tracing::warn!("replacing zero iterations");
            config.iterations = defaults.iterations;
        }
        if !positive(config.ideal_edge_length) {
            tracing::warn!(value = config.ideal_edge_length, "replacing invalid ideal_edge_length");
            config.ideal_edge_length = defaults.ideal_edge_length;
        }
        if !positive(config.repulsion_strength) {
            tracing::warn!(value = config.repulsion_strength, "replacing invalid repulsion_strength");
            config.repulsion_strength = defaults.repulsion_strength;
        }
        if !non_negative(config.repulsion_exponent) {
            tracing::warn!(value = config.repulsion_exponent, "replacing invalid repulsion_exponent");
            config.repulsion_exponent = defaults.repulsion_exponent;
        }
        if config.initial_temperature.is_some_and(|t| !positive(t)) {
            tracing::warn!(value = ?config.initial_temperature, "replacing invalid initial_temperature");
            config.initial_temperature = None;
        }
        if config.convergence_epsilon.is_some_and(|eps| !non_negative(eps)) {
            tracing::warn!(value = ?config.convergence_epsilon, "replacing invalid convergence_epsilon");
            config.convergence_epsilon = defaults.convergence_epsilon;
        }
        if let Approximation::BarnesHut { theta } = config.approximation {
            if !non_negative(theta) {
                tracing::warn!(value = theta, "replacing invalid barnes-hut theta");
                config.approximation = Approximation::barnes_hut();
            }
        }
        config
    }

    fn first_invalid(&self) -> Option<(&'static str, f64)> {
        if self.iterations == 0 {
            return Some(("iterations", 0.0));
        }
        if !positive(self.ideal_edge_length) {
            return Some(("ideal_edge_length", self.ideal_edge_length));
        }
        if !positive(self.repulsion_strength) {
            return Some(("repulsion_strength", self.repulsion_strength));
        }
        if !non_negative(self.repulsion_exponent) {
            return Some(("repulsion_exponent", self.repulsion_exponent));
        }
        if let Some(t) = self.initial_temperature.filter(|t| !positive(*t)) {
            return Some(("initial_temperature", t));
        }
        if let Some(eps) = self.convergence_epsilon.filter(|eps| !non_negative(*eps)) {
            return Some(("convergence_epsilon", eps));
        }
        if let Approximation::BarnesHut { theta } = self.approximation {
            if !non_negative(theta) {
                return Some(("approximation.theta", theta));
            }
        }
        None
    }
}
