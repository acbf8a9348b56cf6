//! Logic synthesis engine
//!
//! - Technology mapping: translates abstract gates into the lowest-cost
//!   cells of a technology library (area/delay/power weighted score)
//! - Retiming: repositions registers across pipeline stages to balance
//!   stage delay without changing sequential behavior

mod retiming;
mod tech_map;

pub use retiming::{RegisterMove, Retimer, RetimingOutcome};
pub use tech_map::{
    CellLibrary, LibraryCell, MappedGate, TechMapOutcome, TechMapStats, TechnologyMapper,
};

use crate::budget::Budget;
use crate::design::Design;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Synthesis algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthAlgorithm {
    /// Map gates onto technology library cells
    #[default]
    TechnologyMapping,
    /// Balance pipeline stages by moving registers
    Retiming,
}

impl SynthAlgorithm {
    /// Resolve an algorithm name, falling back to the default
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("technology_mapping") => Self::TechnologyMapping,
            Some("retiming") => Self::Retiming,
            Some(other) => {
                log::warn!(
                    "unknown synthesis algorithm '{}', falling back to {}",
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
            Self::TechnologyMapping => "technology_mapping",
            Self::Retiming => "retiming",
        }
    }
}

/// Synthesis configuration
#[derive(Debug, Clone)]
pub struct SynthConfig {
    /// Technology library used by the mapper
    pub library: CellLibrary,
    /// Area weight in the cell score
    pub area_weight: f64,
    /// Delay weight in the cell score
    pub delay_weight: f64,
    /// Power weight in the cell score
    pub power_weight: f64,
    /// Maximum register moves attempted by retiming
    pub max_retiming_moves: usize,
    /// Relative stage-delay spread below which stages count as balanced
    pub balance_tolerance: f64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            library: CellLibrary::generic(),
            area_weight: 1.0,
            delay_weight: 1.0,
            power_weight: 0.5,
            max_retiming_moves: 100,
            balance_tolerance: 0.15,
        }
    }
}

/// Result of a synthesis run, shaped by the algorithm that ran
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SynthOutcome {
    Mapping(TechMapOutcome),
    Retiming(RetimingOutcome),
}

/// Run the selected synthesis algorithm
pub fn synthesize(
    design: &Design,
    algorithm: SynthAlgorithm,
    config: &SynthConfig,
    budget: &Budget,
) -> Result<SynthOutcome> {
    match algorithm {
        SynthAlgorithm::TechnologyMapping => Ok(SynthOutcome::Mapping(
            TechnologyMapper::new(config).map(design)?,
        )),
        SynthAlgorithm::Retiming => Ok(SynthOutcome::Retiming(
            Retimer::new(config).retime(design, budget)?,
        )),
    }
}
