//! Technology mapping
//!
//! Maps each design gate to the lowest-cost cell of a technology library,
//! using a weighted area/delay/power score. Gates whose function has no
//! direct library cell are decomposed into NAND/INV primitives (1:N,
//! reported as a decomposed mapping).

use super::SynthConfig;
use crate::design::{Design, GateFunction};
use crate::error::{OptimizeError, Result};
use serde::{Deserialize, Serialize};

/// A cell available in the technology library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryCell {
    /// Cell name (e.g. "NAND2_X1")
    pub name: String,
    /// Boolean function the cell implements
    pub function: GateFunction,
    /// Cell area in um^2
    pub area: f64,
    /// Propagation delay in ns
    pub delay: f64,
    /// Dynamic power in uW at nominal activity
    pub power: f64,
}

/// Technology library supplied as configuration data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellLibrary {
    /// Library name
    pub name: String,
    /// Available cells
    pub cells: Vec<LibraryCell>,
}

impl CellLibrary {
    /// Built-in generic library with two drive strengths per function
    pub fn generic() -> Self {
        let mut cells = Vec::new();
        let base: [(GateFunction, &str, f64, f64, f64); 9] = [
            (GateFunction::Nand, "NAND2", 1.06, 0.040, 0.55),
            (GateFunction::Nor, "NOR2", 1.06, 0.046, 0.58),
            (GateFunction::And, "AND2", 1.33, 0.058, 0.72),
            (GateFunction::Or, "OR2", 1.33, 0.062, 0.75),
            (GateFunction::Xor, "XOR2", 1.86, 0.085, 1.10),
            (GateFunction::Xnor, "XNOR2", 1.86, 0.088, 1.12),
            (GateFunction::Not, "INV", 0.53, 0.022, 0.30),
            (GateFunction::Buf, "BUF", 0.80, 0.035, 0.42),
            (GateFunction::Mux, "MUX2", 2.13, 0.095, 1.25),
        ];
        for (function, stem, area, delay, power) in base {
            cells.push(LibraryCell {
                name: format!("{stem}_X1"),
                function,
                area,
                delay,
                power,
            });
            // X2: twice the drive, faster but larger and hungrier
            cells.push(LibraryCell {
                name: format!("{stem}_X2"),
                function,
                area: area * 1.6,
                delay: delay * 0.7,
                power: power * 1.8,
            });
        }
        Self {
            name: "generic_45nm".to_string(),
            cells,
        }
    }

    /// Cells implementing the given function
    fn candidates(&self, function: GateFunction) -> impl Iterator<Item = &LibraryCell> {
        self.cells.iter().filter(move |c| c.function == function)
    }
}

/// One mapped design gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappedGate {
    /// Design gate id
    pub gate: String,
    /// Library cells implementing the gate (one for direct mappings)
    pub cells: Vec<String>,
    /// Total area of the chosen cells
    pub area: f64,
    /// Worst-case delay through the chosen cells
    pub delay: f64,
    /// Total power of the chosen cells
    pub power: f64,
    /// Whether the gate was decomposed into primitives
    pub decomposed: bool,
}

/// Statistics from a mapping run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechMapStats {
    /// Design gates processed
    pub gates_processed: usize,
    /// Library cells instantiated
    pub cells_created: usize,
    /// Direct 1:1 mappings
    pub direct_mappings: usize,
    /// Decomposed 1:N mappings
    pub decomposed_mappings: usize,
}

/// Result of technology mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechMapOutcome {
    /// Library the design was mapped onto
    pub library: String,
    /// One entry per design gate
    pub mapped: Vec<MappedGate>,
    /// Mapping statistics
    pub stats: TechMapStats,
    /// Total mapped area
    pub total_area: f64,
    /// Total mapped power
    pub total_power: f64,
    /// Warnings generated during mapping
    pub warnings: Vec<String>,
}

/// Technology mapper
pub struct TechnologyMapper<'a> {
    config: &'a SynthConfig,
}

impl<'a> TechnologyMapper<'a> {
    /// Create a mapper using the configured library and score weights
    pub fn new(config: &'a SynthConfig) -> Self {
        Self { config }
    }

    /// Map every gate in the design
    pub fn map(&self, design: &Design) -> Result<TechMapOutcome> {
        let library = &self.config.library;
        let mut mapped = Vec::with_capacity(design.gates.len());
        let mut stats = TechMapStats::default();
        let mut warnings = Vec::new();

        for gate in &design.gates {
            stats.gates_processed += 1;
            match self.best_cell(gate.function) {
                Some(cell) => {
                    stats.direct_mappings += 1;
                    stats.cells_created += 1;
                    mapped.push(MappedGate {
                        gate: gate.id.clone(),
                        cells: vec![cell.name.clone()],
                        area: cell.area,
                        delay: cell.delay,
                        power: cell.power,
                        decomposed: false,
                    });
                }
                None => {
                    let primitives = decompose(gate.function);
                    let mut cells = Vec::with_capacity(primitives.len());
                    let mut area = 0.0;
                    let mut delay = 0.0;
                    let mut power = 0.0;
                    for primitive in &primitives {
                        let cell = self.best_cell(*primitive).ok_or_else(|| {
                            OptimizeError::InternalFault(format!(
                                "library '{}' has no cell for {:?} (needed to decompose {:?})",
                                library.name, primitive, gate.function
                            ))
                        })?;
                        cells.push(cell.name.clone());
                        area += cell.area;
                        delay += cell.delay;
                        power += cell.power;
                    }
                    warnings.push(format!(
                        "gate '{}' ({:?}) has no direct library cell, decomposed into {} primitives",
                        gate.id,
                        gate.function,
                        cells.len()
                    ));
                    stats.decomposed_mappings += 1;
                    stats.cells_created += cells.len();
                    mapped.push(MappedGate {
                        gate: gate.id.clone(),
                        cells,
                        area,
                        delay,
                        power,
                        decomposed: true,
                    });
                }
            }
        }

        let total_area = mapped.iter().map(|m| m.area).sum();
        let total_power = mapped.iter().map(|m| m.power).sum();
        log::debug!(
            "tech mapping: {} gates onto '{}' ({} direct, {} decomposed)",
            stats.gates_processed,
            library.name,
            stats.direct_mappings,
            stats.decomposed_mappings
        );
        Ok(TechMapOutcome {
            library: library.name.clone(),
            mapped,
            stats,
            total_area,
            total_power,
            warnings,
        })
    }

    /// Lowest-score cell for a function
    fn best_cell(&self, function: GateFunction) -> Option<&LibraryCell> {
        self.config
            .library
            .candidates(function)
            .min_by(|a, b| {
                self.score(a)
                    .partial_cmp(&self.score(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    fn score(&self, cell: &LibraryCell) -> f64 {
        self.config.area_weight * cell.area
            + self.config.delay_weight * cell.delay
            + self.config.power_weight * cell.power
    }
}

/// NAND/INV decomposition for functions absent from the library
fn decompose(function: GateFunction) -> Vec<GateFunction> {
    use GateFunction::*;
    match function {
        And => vec![Nand, Not],
        Or => vec![Not, Not, Nand],
        Nand => vec![Nand],
        Nor => vec![Not, Not, Nand, Not],
        Xor => vec![Nand, Nand, Nand, Nand],
        Xnor => vec![Nand, Nand, Nand, Nand, Not],
        Not => vec![Not],
        Buf => vec![Not, Not],
        Mux => vec![Not, Nand, Nand, Nand],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::Design;

    #[test]
    fn maps_every_gate_once() {
        let mut design = Design::new("gates");
        design
            .add_gate("g1", GateFunction::And)
            .add_gate("g2", GateFunction::Xor)
            .add_gate("g3", GateFunction::Not);
        let config = SynthConfig::default();
        let outcome = TechnologyMapper::new(&config).map(&design).unwrap();

        assert_eq!(outcome.mapped.len(), 3);
        assert_eq!(outcome.stats.direct_mappings, 3);
        assert_eq!(outcome.stats.decomposed_mappings, 0);
        assert!(outcome.total_area > 0.0);
    }

    #[test]
    fn picks_cheaper_drive_strength_by_score() {
        let config = SynthConfig::default();
        let mapper = TechnologyMapper::new(&config);
        // With default weights the smaller X1 variant wins
        let cell = mapper.best_cell(GateFunction::Nand).unwrap();
        assert_eq!(cell.name, "NAND2_X1");
    }

    #[test]
    fn decomposes_when_library_lacks_function() {
        let mut config = SynthConfig::default();
        config.library.cells.retain(|c| c.function != GateFunction::Xor);
        let mut design = Design::new("xor_only");
        design.add_gate("g1", GateFunction::Xor);

        let outcome = TechnologyMapper::new(&config).map(&design).unwrap();
        assert_eq!(outcome.stats.decomposed_mappings, 1);
        assert!(outcome.mapped[0].decomposed);
        assert_eq!(outcome.mapped[0].cells.len(), 4);
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn delay_weighted_config_prefers_fast_cells() {
        let config = SynthConfig {
            area_weight: 0.0,
            power_weight: 0.0,
            delay_weight: 1.0,
            ..Default::default()
        };
        let mapper = TechnologyMapper::new(&config);
        let cell = mapper.best_cell(GateFunction::Nand).unwrap();
        assert_eq!(cell.name, "NAND2_X2");
    }
}
