//! Circuit design model
//!
//! The abstract design graph the engine operates on: components with physical
//! dimensions, logical nets, gates, registers, timing paths and clocks, plus
//! an advisory constraint set. Designs are supplied per call by the ingestion
//! boundary and are never mutated in place; optimization steps produce
//! payloads that the orchestrator overlays onto a working copy.

use crate::error::{OptimizeError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A placeable design component (cell, macro, IO block)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    /// Component identifier, unique within the design
    pub id: String,
    /// Category tag (e.g. "logic", "memory", "io")
    pub category: String,
    /// Physical width in site units
    pub width: f64,
    /// Physical height in site units
    pub height: f64,
}

/// An undirected logical net between two components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Connection identifier
    pub id: String,
    /// Source component id
    pub source: String,
    /// Target component id
    pub target: String,
}

/// Boolean function category of a logic gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateFunction {
    And,
    Or,
    Nand,
    Nor,
    Xor,
    Xnor,
    Not,
    Buf,
    Mux,
}

/// A logic gate to be mapped during synthesis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogicGate {
    /// Gate identifier
    pub id: String,
    /// Boolean function the gate implements
    pub function: GateFunction,
}

/// A sequential element with pipeline-stage metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Register {
    /// Register identifier
    pub id: String,
    /// Pipeline stage the register currently sits in
    pub stage: u32,
}

/// A timing path with required and actual delay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingPath {
    /// Path identifier
    pub id: String,
    /// Source endpoint identifier
    pub source: String,
    /// Target endpoint identifier
    pub target: String,
    /// Required delay in ns
    pub required_delay: f64,
    /// Actual delay in ns
    pub actual_delay: f64,
}

impl TimingPath {
    /// Slack in ns (required minus actual); negative is a violation
    pub fn slack(&self) -> f64 {
        self.required_delay - self.actual_delay
    }
}

/// A clock domain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clock {
    /// Clock identifier
    pub id: String,
    /// Frequency in MHz
    pub frequency_mhz: f64,
}

/// Advisory numeric bounds for the design
///
/// Algorithms respect these where possible and report violations rather than
/// fail when they cannot be met.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DesignConstraints {
    /// Maximum die width in site units
    pub max_width: Option<f64>,
    /// Maximum die height in site units
    pub max_height: Option<f64>,
    /// Power budget in mW
    pub power_budget: Option<f64>,
    /// Maximum path delay in ns
    pub max_delay: Option<f64>,
}

/// Physical position assigned to a component by placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate in site units
    pub x: f64,
    /// Y coordinate in site units
    pub y: f64,
    /// Placement layer
    pub layer: u32,
}

/// Waypoint on a routed path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Waypoint {
    /// Grid X coordinate
    pub x: u32,
    /// Grid Y coordinate
    pub y: u32,
}

/// Routed wire paths merged back into a design by the orchestrator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingOverlay {
    /// Waypoint sequence per connection id (routed connections only)
    pub paths: IndexMap<String, Vec<Waypoint>>,
}

/// The aggregate circuit design
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Design {
    /// Design name
    pub name: String,
    /// Placeable components
    pub components: Vec<Component>,
    /// Logical nets
    pub connections: Vec<Connection>,
    /// Logic gates for synthesis
    pub gates: Vec<LogicGate>,
    /// Sequential elements for retiming
    pub registers: Vec<Register>,
    /// Timing paths
    pub timing_paths: Vec<TimingPath>,
    /// Clock domains
    pub clocks: Vec<Clock>,
    /// Advisory constraints
    pub constraints: DesignConstraints,
    /// Placement overlay from an earlier pipeline step, if any
    pub placement: Option<IndexMap<String, Position>>,
    /// Routing overlay from an earlier pipeline step, if any
    pub routing: Option<RoutingOverlay>,
}

impl Design {
    /// Create an empty design
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a component with the given dimensions
    pub fn add_component(
        &mut self,
        id: impl Into<String>,
        category: impl Into<String>,
        width: f64,
        height: f64,
    ) -> &mut Self {
        self.components.push(Component {
            id: id.into(),
            category: category.into(),
            width,
            height,
        });
        self
    }

    /// Add a connection between two components
    pub fn add_connection(
        &mut self,
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> &mut Self {
        self.connections.push(Connection {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        });
        self
    }

    /// Add a logic gate
    pub fn add_gate(&mut self, id: impl Into<String>, function: GateFunction) -> &mut Self {
        self.gates.push(LogicGate {
            id: id.into(),
            function,
        });
        self
    }

    /// Add a register at the given pipeline stage
    pub fn add_register(&mut self, id: impl Into<String>, stage: u32) -> &mut Self {
        self.registers.push(Register {
            id: id.into(),
            stage,
        });
        self
    }

    /// Add a timing path
    pub fn add_timing_path(
        &mut self,
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        required_delay: f64,
        actual_delay: f64,
    ) -> &mut Self {
        self.timing_paths.push(TimingPath {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            required_delay,
            actual_delay,
        });
        self
    }

    /// Add a clock domain
    pub fn add_clock(&mut self, id: impl Into<String>, frequency_mhz: f64) -> &mut Self {
        self.clocks.push(Clock {
            id: id.into(),
            frequency_mhz,
        });
        self
    }

    /// Validate structural integrity of the design
    ///
    /// Checks that component ids are unique and that every connection
    /// references existing components. Runs before any algorithm work; a
    /// failure here short-circuits the operation.
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(self.components.len());
        for component in &self.components {
            if !seen.insert(component.id.as_str()) {
                return Err(OptimizeError::InvalidDesign(format!(
                    "duplicate component id '{}'",
                    component.id
                )));
            }
        }
        for connection in &self.connections {
            for endpoint in [&connection.source, &connection.target] {
                if !seen.contains(endpoint.as_str()) {
                    return Err(OptimizeError::InvalidDesign(format!(
                        "connection '{}' references unknown component '{}'",
                        connection.id, endpoint
                    )));
                }
            }
        }
        Ok(())
    }

    /// Die dimensions in site units
    ///
    /// Uses the constraint bounds when present, otherwise sizes a square die
    /// with roughly 4x the total component area. Bounds tighter than the
    /// component footprint are honored; placement reports the resulting
    /// overuse through its congestion score.
    pub fn die_size(&self) -> (f64, f64) {
        let total_area: f64 = self
            .components
            .iter()
            .map(|c| (c.width * c.height).max(1.0))
            .sum();
        let side = (total_area * 4.0).sqrt().ceil().max(4.0);
        let width = bounded_side(self.constraints.max_width, side, "max_width");
        let height = bounded_side(self.constraints.max_height, side, "max_height");
        (width, height)
    }

    /// Look up a component by id
    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }
}

/// Grid algorithms need at least one site per axis
fn bounded_side(bound: Option<f64>, fallback: f64, name: &str) -> f64 {
    match bound {
        Some(value) if value < 1.0 => {
            log::warn!("constraint {name} {value} is under one site, using 1.0");
            1.0
        }
        Some(value) => value,
        None => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_design() -> Design {
        let mut design = Design::new("chain");
        design
            .add_component("c1", "logic", 1.0, 1.0)
            .add_component("c2", "logic", 1.0, 1.0)
            .add_component("c3", "logic", 1.0, 1.0)
            .add_connection("n1", "c1", "c2")
            .add_connection("n2", "c2", "c3");
        design
    }

    #[test]
    fn valid_design_passes_validation() {
        assert!(chain_design().validate().is_ok());
    }

    #[test]
    fn dangling_connection_is_invalid() {
        let mut design = chain_design();
        design.add_connection("n3", "c3", "missing");
        let err = design.validate().unwrap_err();
        assert_eq!(err.kind(), "invalid_design");
    }

    #[test]
    fn duplicate_component_id_is_invalid() {
        let mut design = chain_design();
        design.add_component("c1", "logic", 2.0, 2.0);
        let err = design.validate().unwrap_err();
        assert_eq!(err.kind(), "invalid_design");
    }

    #[test]
    fn die_size_respects_constraints() {
        let mut design = chain_design();
        design.constraints.max_width = Some(32.0);
        design.constraints.max_height = Some(16.0);
        assert_eq!(design.die_size(), (32.0, 16.0));
    }

    #[test]
    fn die_size_honors_bounds_tighter_than_footprint() {
        let mut design = chain_design();
        design.constraints.max_width = Some(2.0);
        design.constraints.max_height = Some(2.0);
        assert_eq!(design.die_size(), (2.0, 2.0));
    }

    #[test]
    fn die_size_raises_sub_site_bounds() {
        let mut design = chain_design();
        design.constraints.max_width = Some(0.25);
        let (width, _) = design.die_size();
        assert_eq!(width, 1.0);
    }

    #[test]
    fn component_lookup_by_id() {
        let design = chain_design();
        assert_eq!(design.component("c2").map(|c| c.id.as_str()), Some("c2"));
        assert!(design.component("ghost").is_none());
    }

    #[test]
    fn slack_is_required_minus_actual() {
        let path = TimingPath {
            id: "p1".to_string(),
            source: "r1".to_string(),
            target: "r2".to_string(),
            required_delay: 5.0,
            actual_delay: 6.5,
        };
        assert!((path.slack() + 1.5).abs() < 1e-9);
    }
}
