//! Placement engine
//!
//! Assigns physical (x, y, layer) coordinates to every design component:
//! - Simulated annealing with a wirelength + congestion cost function
//! - Force-directed placement (springs on nets, repulsion between cells)

mod annealing;
mod force;

pub use annealing::SimulatedAnnealing;
pub use force::ForceDirected;

use crate::budget::Budget;
use crate::design::Design;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Placement algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementAlgorithm {
    /// Simulated annealing (highest quality)
    #[default]
    SimulatedAnnealing,
    /// Force-directed placement
    ForceDirected,
}

impl PlacementAlgorithm {
    /// Resolve an algorithm name, falling back to the default
    ///
    /// Unknown or absent names resolve to the default variant; the fallback
    /// is logged so it is observable.
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("simulated_annealing") => Self::SimulatedAnnealing,
            Some("force_directed") => Self::ForceDirected,
            Some(other) => {
                log::warn!(
                    "unknown placement algorithm '{}', falling back to {}",
                    other,
                    Self::default().as_str()
                );
                Self::default()
            }
            None => Self::default(),
        }
    }

    /// Canonical algorithm name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SimulatedAnnealing => "simulated_annealing",
            Self::ForceDirected => "force_directed",
        }
    }
}

/// Placer configuration
#[derive(Debug, Clone)]
pub struct PlacerConfig {
    /// Maximum temperature levels (annealing) or iterations (force-directed)
    pub max_iterations: usize,
    /// Initial annealing temperature
    pub initial_temperature: f64,
    /// Geometric cooling rate per temperature level
    pub cooling_rate: f64,
    /// Temperature below which annealing stops
    pub min_temperature: f64,
    /// Relative cost improvement below which a level counts as converged
    pub convergence_epsilon: f64,
    /// Consecutive converged levels required to stop early
    pub convergence_window: usize,
    /// Weight for total wirelength in the cost function
    pub wirelength_weight: f64,
    /// Weight for congestion overuse in the cost function
    pub congestion_weight: f64,
    /// Spring constant for force-directed attraction
    pub spring_constant: f64,
    /// Repulsion constant for force-directed spreading
    pub repulsion_constant: f64,
    /// Force magnitude below which force-directed placement has settled
    pub force_threshold: f64,
    /// Position update damping for force-directed placement
    pub damping: f64,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Wall-clock timeout for a single placement run
    pub timeout: Option<Duration>,
}

impl Default for PlacerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            initial_temperature: 100.0,
            cooling_rate: 0.95,
            min_temperature: 0.01,
            convergence_epsilon: 1e-4,
            convergence_window: 5,
            wirelength_weight: 1.0,
            congestion_weight: 0.5,
            spring_constant: 0.05,
            repulsion_constant: 4.0,
            force_threshold: 0.05,
            damping: 0.8,
            seed: 42,
            timeout: None,
        }
    }
}

/// Coordinates assigned to a single component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentPlacement {
    /// Component id
    pub component: String,
    /// X coordinate in site units
    pub x: f64,
    /// Y coordinate in site units
    pub y: f64,
    /// Placement layer
    pub layer: u32,
}

/// Result of a placement run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementOutcome {
    /// One entry per design component
    pub placements: Vec<ComponentPlacement>,
    /// Total wirelength of the placed nets
    pub wirelength: f64,
    /// Congestion overuse score (0 when no site is over-subscribed)
    pub congestion: f64,
    /// Final combined cost
    pub cost: f64,
    /// Iterations actually executed
    pub iterations: usize,
    /// Whether the algorithm settled before exhausting its budget
    pub converged: bool,
}

/// Run the selected placement algorithm
pub fn place(
    design: &Design,
    algorithm: PlacementAlgorithm,
    config: &PlacerConfig,
    budget: &Budget,
) -> Result<PlacementOutcome> {
    match algorithm {
        PlacementAlgorithm::SimulatedAnnealing => {
            SimulatedAnnealing::new(design, config).place(budget)
        }
        PlacementAlgorithm::ForceDirected => ForceDirected::new(design, config).place(budget),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_name_falls_back_to_default() {
        assert_eq!(
            PlacementAlgorithm::from_name(Some("quantum_tunneling")),
            PlacementAlgorithm::SimulatedAnnealing
        );
        assert_eq!(
            PlacementAlgorithm::from_name(None),
            PlacementAlgorithm::SimulatedAnnealing
        );
        assert_eq!(
            PlacementAlgorithm::from_name(Some("force_directed")),
            PlacementAlgorithm::ForceDirected
        );
    }
}
